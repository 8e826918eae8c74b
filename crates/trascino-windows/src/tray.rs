//! The tray icon.
//!
//! Lives on the worker's hidden message window. The icon carries the
//! tooltip, routes its mouse events to [`crate::messages::WM_APP_TRAY`]
//! (version-4 callback, so the anchor point arrives packed in wParam),
//! and doubles as the channel for one-shot balloon notifications.

use windows::Win32::Foundation::HWND;
use windows::Win32::UI::Shell::{
    NIF_ICON, NIF_INFO, NIF_MESSAGE, NIF_TIP, NIM_ADD, NIM_DELETE, NIM_MODIFY,
    NIM_SETVERSION, NOTIFYICON_VERSION_4, NOTIFYICONDATAW, NOTIFYICONDATAW_0,
    Shell_NotifyIconW,
};
use windows::Win32::UI::WindowsAndMessaging::{HICON, IDI_APPLICATION, LoadIconW};

use crate::messages::WM_APP_TRAY;

const TRAY_ID: u32 = 1;

fn copy_wide(dst: &mut [u16], s: &str) {
    let mut n = 0;
    for unit in s.encode_utf16() {
        if n >= dst.len() - 1 {
            break;
        }
        dst[n] = unit;
        n += 1;
    }
    dst[n] = 0;
}

fn base_data(hwnd: HWND) -> NOTIFYICONDATAW {
    NOTIFYICONDATAW {
        cbSize: std::mem::size_of::<NOTIFYICONDATAW>() as u32,
        hWnd: hwnd,
        uID: TRAY_ID,
        ..Default::default()
    }
}

pub struct TrayIcon {
    hwnd: HWND,
    added: bool,
}

impl TrayIcon {
    /// Adds the icon to the notification area. A missing tray (rare,
    /// e.g. a crashed shell) degrades to no icon rather than aborting.
    pub fn create(hwnd: HWND) -> Self {
        let mut data = base_data(hwnd);
        data.uFlags = NIF_TIP | NIF_ICON | NIF_MESSAGE;
        data.uCallbackMessage = WM_APP_TRAY;
        // SAFETY: loading the stock application icon never fails in
        // practice; a null icon just renders blank.
        data.hIcon = unsafe { LoadIconW(None, IDI_APPLICATION) }.unwrap_or(HICON::default());
        copy_wide(&mut data.szTip, "trascino");

        // SAFETY: Shell_NotifyIconW copies the struct.
        let added = unsafe { Shell_NotifyIconW(NIM_ADD, &data) }.as_bool();
        if !added {
            trascino_core::log_warn!("failed to add tray icon");
            return Self { hwnd, added };
        }

        // Version 4 must be requested after NIM_ADD; it switches the
        // callback to the richer format carrying anchor coordinates.
        let mut versioned = base_data(hwnd);
        versioned.Anonymous = NOTIFYICONDATAW_0 {
            uVersion: NOTIFYICON_VERSION_4,
        };
        // SAFETY: as above.
        if !unsafe { Shell_NotifyIconW(NIM_SETVERSION, &versioned) }.as_bool() {
            trascino_core::log_warn!("tray icon version negotiation failed");
        }

        Self { hwnd, added }
    }

    /// Shows a balloon notification.
    pub fn show_info(&self, title: &str, message: &str) {
        trascino_core::log_info!("tray notice: {message}");
        if !self.added {
            return;
        }
        let mut data = base_data(self.hwnd);
        data.uFlags = NIF_INFO;
        copy_wide(&mut data.szInfoTitle, title);
        copy_wide(&mut data.szInfo, message);
        // SAFETY: Shell_NotifyIconW copies the struct.
        unsafe {
            let _ = Shell_NotifyIconW(NIM_MODIFY, &data);
        }
    }

    /// Removes the icon. Must run before the message window dies or
    /// the shell keeps a ghost icon until the user mouses over it.
    pub fn remove(&mut self) {
        if !self.added {
            return;
        }
        self.added = false;
        let data = base_data(self.hwnd);
        // SAFETY: as above.
        unsafe {
            let _ = Shell_NotifyIconW(NIM_DELETE, &data);
        }
    }
}
