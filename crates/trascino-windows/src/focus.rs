//! Foreground focus without tripping focus-stealing prevention.
//!
//! `SetForegroundWindow` from a background process is normally refused.
//! Attaching our input queue to the target's thread for the duration
//! of the call makes the OS treat us as the active input thread, which
//! is the sanctioned way around the restriction. Runs on the worker
//! thread only.

use windows::Win32::Foundation::HWND;
use windows::Win32::System::Threading::{GetCurrentProcessId, GetCurrentThreadId};
use windows::Win32::UI::Input::KeyboardAndMouse::AttachThreadInput;
use windows::Win32::UI::WindowsAndMessaging::{
    SetForegroundWindow, WS_CHILD, WS_EX_NOACTIVATE, WS_EX_TOOLWINDOW,
};

use crate::window::Window;

/// Windows that must not be focused, and why.
fn skip_reason(window: &Window) -> Option<&'static str> {
    let style = window.style();
    let ex_style = window.ex_style();

    if style & WS_CHILD.0 != 0 {
        // Child windows cannot be foreground windows.
        return Some("child window");
    }
    if ex_style & WS_EX_TOOLWINDOW.0 != 0 {
        // Usually menus and popups; focusing them dismisses them.
        return Some("tool window");
    }
    if ex_style & WS_EX_NOACTIVATE.0 != 0 {
        return Some("marked no-activate");
    }
    None
}

/// Brings `target` to the foreground. Returns `false` only when a
/// genuine attempt failed — callers use that to decide on the click
/// fallback. Targets that should not (or need not) be focused report
/// success so the fallback never fires at them.
pub fn force_foreground(target: usize) -> bool {
    if target == 0 {
        trascino_core::log_warn!("focus requested for a null window handle");
        return false;
    }
    let window = Window::from_raw(target);
    if window.is_foreground() {
        return true;
    }
    if let Some(reason) = skip_reason(&window) {
        trascino_core::log_debug!("not focusing {target:#x}: {reason}");
        return true;
    }

    let (target_tid, target_pid) = window.thread_and_process();
    if target_tid == 0 {
        return false;
    }

    // SAFETY: simple identity queries.
    let (own_pid, own_tid) = unsafe { (GetCurrentProcessId(), GetCurrentThreadId()) };
    if target_pid == own_pid {
        if target_tid == own_tid {
            // SAFETY: SetForegroundWindow on our own window is safe.
            return unsafe { SetForegroundWindow(window.hwnd()) }.as_bool();
        }
        // A window of ours on another thread runs its own message
        // loop; attaching to it risks a deadlock. Report success so
        // the click fallback stays quiet.
        trascino_core::log_debug!("not thread-attaching to own window {target:#x}");
        return true;
    }

    // SAFETY: AttachThreadInput links our input queue to the target's;
    // detached again below regardless of the outcome.
    if !unsafe { AttachThreadInput(own_tid, target_tid, true) }.as_bool() {
        trascino_core::log_debug!("AttachThreadInput to {target_tid} refused");
        return false;
    }

    // SAFETY: valid HWND.
    let focused = unsafe { SetForegroundWindow(window.hwnd()) }.as_bool();

    // SAFETY: symmetric detach.
    unsafe {
        let _ = AttachThreadInput(own_tid, target_tid, false);
    }

    if !focused {
        // Refused even when attached — happens reliably while the
        // shell menu is open.
        trascino_core::log_debug!("SetForegroundWindow refused for {target:#x}");
    }
    focused
}

/// Makes the hidden message window foreground so a popup menu tracked
/// on it dismisses when the user clicks elsewhere.
pub fn foreground_for_menu(hwnd: HWND) {
    // SAFETY: valid HWND owned by the calling thread.
    unsafe {
        let _ = SetForegroundWindow(hwnd);
    }
}
