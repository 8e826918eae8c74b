//! The worker's hidden message window.
//!
//! Owns nothing visible; it exists so the hook thread, the tray icon,
//! and the console handler all have a window to post to. It must be a
//! real (hidden) window rather than a message-only one: message-only
//! windows never see the session-end broadcasts we rely on.

use windows::Win32::Foundation::{HWND, LPARAM, LRESULT, WPARAM};
use windows::Win32::UI::WindowsAndMessaging::{
    CreateWindowExW, DefWindowProcW, DestroyWindow, RegisterClassW, WNDCLASSW,
    WS_EX_TOOLWINDOW,
};
use windows::core::w;

use crate::PlatformResult;
use crate::worker;

/// Registers the class and creates the hidden window on the current
/// (worker) thread. Failure here is fatal: without this window there
/// is no control path at all.
pub fn create() -> PlatformResult<HWND> {
    let class_name = w!("TrascinoHidden");
    let wc = WNDCLASSW {
        lpfnWndProc: Some(hidden_proc),
        lpszClassName: class_name,
        ..Default::default()
    };

    // SAFETY: class registration and window creation on the thread
    // that will pump this window's messages.
    unsafe {
        if RegisterClassW(&wc) == 0 {
            return Err("failed to register the hidden window class".into());
        }

        // WS_EX_TOOLWINDOW keeps it off the taskbar; no WS_VISIBLE
        // keeps it hidden.
        let hwnd = CreateWindowExW(
            WS_EX_TOOLWINDOW,
            class_name,
            w!("TrascinoHidden"),
            Default::default(),
            0,
            0,
            0,
            0,
            None,
            None,
            None,
            None,
        )?;
        if hwnd.is_invalid() {
            return Err("failed to create the hidden window".into());
        }
        Ok(hwnd)
    }
}

pub fn destroy(hwnd: HWND) {
    // SAFETY: destroying our own window on its creating thread; a
    // second destroy of an already-dead handle fails harmlessly.
    unsafe {
        let _ = DestroyWindow(hwnd);
    }
}

/// WNDPROC for the hidden window: control messages go to the worker,
/// everything else to the default handler.
unsafe extern "system" fn hidden_proc(
    hwnd: HWND,
    msg: u32,
    wparam: WPARAM,
    lparam: LPARAM,
) -> LRESULT {
    if let Some(result) = worker::handle_message(hwnd, msg, wparam, lparam) {
        return result;
    }
    unsafe { DefWindowProcW(hwnd, msg, wparam, lparam) }
}
