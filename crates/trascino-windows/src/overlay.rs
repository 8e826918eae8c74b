//! The size overlay.
//!
//! A layered, click-through, topmost tool window centred over the
//! window being resized, showing the current size and the delta from
//! the gesture start. Owned by the worker thread and updated only from
//! the executor; the hook asks for it to be hidden via a posted
//! control message, never directly.

use std::cell::RefCell;

use trascino_core::Rect;

use windows::Win32::Foundation::{COLORREF, HWND, LPARAM, LRESULT, WPARAM};
use windows::Win32::Graphics::Gdi::{
    BLACK_BRUSH, BeginPaint, DT_CENTER, DT_SINGLELINE, DT_VCENTER, DrawTextW, EndPaint,
    FillRect, GetStockObject, HBRUSH, InvalidateRect, PAINTSTRUCT, SetBkMode, SetTextColor,
    TRANSPARENT,
};
use windows::Win32::UI::WindowsAndMessaging::{
    CreateWindowExW, DefWindowProcW, DestroyWindow, GetClientRect, HWND_TOPMOST,
    LWA_ALPHA, LWA_COLORKEY, RegisterClassW, SW_HIDE, SWP_NOACTIVATE, SWP_SHOWWINDOW,
    SetLayeredWindowAttributes, SetWindowPos, ShowWindow, WM_PAINT, WNDCLASSW, WS_EX_LAYERED,
    WS_EX_TOOLWINDOW, WS_EX_TOPMOST, WS_EX_TRANSPARENT, WS_POPUP,
};
use windows::core::w;

const OVERLAY_WIDTH: i32 = 300;
const OVERLAY_HEIGHT: i32 = 50;

/// Magenta color key: anything painted in it becomes fully
/// transparent; the rest shows at ~86% opacity.
const COLOR_KEY: COLORREF = COLORREF(0x00FF_00FF);
const OVERLAY_ALPHA: u8 = 220;
const TEXT_COLOR: COLORREF = COLORREF(0x0000_FF00);

thread_local! {
    // The readout the paint handler draws. Worker-thread only, like
    // the window itself.
    static OVERLAY_TEXT: RefCell<String> = const { RefCell::new(String::new()) };
}

pub struct Overlay {
    hwnd: Option<HWND>,
}

impl Overlay {
    /// Registers the overlay class and creates the (hidden) window.
    /// Failure is tolerable — resizing still works, just without the
    /// readout — so this never aborts startup.
    pub fn create() -> Self {
        let class_name = w!("TrascinoOverlay");
        let wc = WNDCLASSW {
            lpfnWndProc: Some(overlay_proc),
            lpszClassName: class_name,
            ..Default::default()
        };

        // SAFETY: registering a class and creating a window on the
        // thread that will pump its messages.
        let hwnd = unsafe {
            if RegisterClassW(&wc) == 0 {
                trascino_core::log_warn!("failed to register overlay class");
                return Self { hwnd: None };
            }
            CreateWindowExW(
                WS_EX_LAYERED | WS_EX_TRANSPARENT | WS_EX_TOOLWINDOW | WS_EX_TOPMOST,
                class_name,
                w!(""),
                WS_POPUP,
                0,
                0,
                OVERLAY_WIDTH,
                OVERLAY_HEIGHT,
                None,
                None,
                None,
                None,
            )
        };

        match hwnd {
            Ok(h) if !h.is_invalid() => {
                // SAFETY: valid layered window.
                unsafe {
                    let _ = SetLayeredWindowAttributes(
                        h,
                        COLOR_KEY,
                        OVERLAY_ALPHA,
                        LWA_COLORKEY | LWA_ALPHA,
                    );
                }
                Self { hwnd: Some(h) }
            }
            _ => {
                trascino_core::log_warn!("failed to create overlay window");
                Self { hwnd: None }
            }
        }
    }

    /// Repositions the overlay over the resized window and refreshes
    /// the readout.
    pub fn update(&self, rect: Rect, start_w: i32, start_h: i32) {
        let Some(hwnd) = self.hwnd else {
            return;
        };

        OVERLAY_TEXT.with_borrow_mut(|text| {
            text.clear();
            use std::fmt::Write;
            let _ = write!(
                text,
                "Size: {}x{} (delta: {}, {})",
                rect.width,
                rect.height,
                rect.width - start_w,
                rect.height - start_h,
            );
        });

        let ox = rect.x + rect.width / 2 - OVERLAY_WIDTH / 2;
        let oy = rect.y + rect.height / 2 - OVERLAY_HEIGHT / 2;

        // SAFETY: our own window; shown without activation so focus
        // never moves during a gesture.
        unsafe {
            let _ = SetWindowPos(
                hwnd,
                Some(HWND_TOPMOST),
                ox,
                oy,
                OVERLAY_WIDTH,
                OVERLAY_HEIGHT,
                SWP_NOACTIVATE | SWP_SHOWWINDOW,
            );
            let _ = InvalidateRect(Some(hwnd), None, true);
        }
    }

    pub fn hide(&self) {
        if let Some(hwnd) = self.hwnd {
            // SAFETY: our own window.
            unsafe {
                let _ = ShowWindow(hwnd, SW_HIDE);
            }
        }
    }

    pub fn destroy(&mut self) {
        if let Some(hwnd) = self.hwnd.take() {
            // SAFETY: destroyed on the creating thread.
            unsafe {
                let _ = DestroyWindow(hwnd);
            }
        }
    }
}

unsafe extern "system" fn overlay_proc(
    hwnd: HWND,
    msg: u32,
    wparam: WPARAM,
    lparam: LPARAM,
) -> LRESULT {
    if msg == WM_PAINT {
        // SAFETY: standard WM_PAINT sequence on our own window.
        unsafe {
            let mut ps = PAINTSTRUCT::default();
            let hdc = BeginPaint(hwnd, &mut ps);

            let mut rect = Default::default();
            let _ = GetClientRect(hwnd, &mut rect);

            FillRect(hdc, &rect, HBRUSH(GetStockObject(BLACK_BRUSH).0));
            SetTextColor(hdc, TEXT_COLOR);
            SetBkMode(hdc, TRANSPARENT);

            OVERLAY_TEXT.with_borrow(|text| {
                let mut wide: Vec<u16> = text.encode_utf16().collect();
                DrawTextW(
                    hdc,
                    &mut wide,
                    &mut rect,
                    DT_CENTER | DT_VCENTER | DT_SINGLELINE,
                );
            });

            let _ = EndPaint(hwnd, &ps);
        }
        return LRESULT(0);
    }
    unsafe { DefWindowProcW(hwnd, msg, wparam, lparam) }
}
