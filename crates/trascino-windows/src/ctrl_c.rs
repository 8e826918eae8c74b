//! Console Ctrl+C bridge using `SetConsoleCtrlHandler`.
//!
//! The handler runs on a dedicated control-handler thread that must
//! not touch any HWND — `DestroyWindow` from the wrong thread fails —
//! so it only posts a typed exit message to the worker window and lets
//! the worker run the normal teardown path.

use std::sync::OnceLock;

use windows::Win32::Foundation::{HWND, LPARAM, WPARAM};
use windows::Win32::System::Console::{
    CTRL_BREAK_EVENT, CTRL_C_EVENT, CTRL_CLOSE_EVENT, SetConsoleCtrlHandler,
};
use windows::Win32::UI::WindowsAndMessaging::PostMessageW;

use crate::has_console;
use crate::messages::WM_APP_CONSOLE_SIGNAL;

pub const CTRL_C: u32 = CTRL_C_EVENT;
pub const CTRL_BREAK: u32 = CTRL_BREAK_EVENT;
pub const CTRL_CLOSE: u32 = CTRL_CLOSE_EVENT;

/// Worker window the callback posts to — written once at install.
static TARGET: OnceLock<usize> = OnceLock::new();

/// Installs the handler when a real console is attached (dev builds
/// started from a shell). GUI-subsystem launches have no console and
/// no Ctrl+C to handle.
pub fn install_if_console(worker_hwnd: HWND) {
    if !has_console() {
        return;
    }
    if TARGET.set(worker_hwnd.0 as usize).is_err() {
        return;
    }
    // SAFETY: registering a process-wide console handler.
    if unsafe { SetConsoleCtrlHandler(Some(handler), true) }.is_err() {
        trascino_core::log_warn!("failed to install console Ctrl+C handler");
    } else {
        trascino_core::log_info!("console detected; Ctrl+C handler installed");
    }
}

unsafe extern "system" fn handler(ctrl_type: u32) -> windows::core::BOOL {
    if let Some(&hwnd) = TARGET.get() {
        // SAFETY: async post; the worker thread owns the window.
        unsafe {
            let _ = PostMessageW(
                Some(HWND(hwnd as *mut _)),
                WM_APP_CONSOLE_SIGNAL,
                WPARAM(ctrl_type as usize),
                LPARAM(0),
            );
        }
    }
    // Handled — suppress the default immediate termination.
    windows::core::BOOL(1)
}
