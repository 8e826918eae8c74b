//! The low-level hook trampolines.
//!
//! The hook ABI is a bare function pointer, so these do nothing but
//! marshal the OS arguments and call into the thread-local engine.
//! Three rules hold for every event: negative hook codes are forwarded
//! untouched, injected events are ignored (our own `SendInput` output
//! would otherwise loop back through us forever), and a non-zero
//! return swallows the event before applications see it.

use trascino_core::Point;
use trascino_core::gesture::{EventDisposition, MouseButton};

use windows::Win32::Foundation::{LPARAM, LRESULT, WPARAM};
use windows::Win32::UI::Input::KeyboardAndMouse::{VK_LWIN, VK_RWIN};
use windows::Win32::UI::WindowsAndMessaging::{
    CallNextHookEx, KBDLLHOOKSTRUCT, LLKHF_INJECTED, LLMHF_INJECTED, MSLLHOOKSTRUCT,
    WM_KEYUP, WM_LBUTTONDOWN, WM_LBUTTONUP, WM_MBUTTONDOWN, WM_MOUSEMOVE, WM_RBUTTONDOWN,
    WM_RBUTTONUP, WM_SYSKEYUP,
};

use crate::engine;

pub unsafe extern "system" fn mouse_proc(code: i32, wparam: WPARAM, lparam: LPARAM) -> LRESULT {
    if code < 0 {
        return unsafe { CallNextHookEx(None, code, wparam, lparam) };
    }

    // SAFETY: for WH_MOUSE_LL the lparam points at an MSLLHOOKSTRUCT
    // owned by the OS for the duration of the callback.
    let info = unsafe { &*(lparam.0 as *const MSLLHOOKSTRUCT) };

    if info.flags & LLMHF_INJECTED != 0 {
        // Generated by SendInput (ours or anyone's) — not user input.
        return unsafe { CallNextHookEx(None, code, wparam, lparam) };
    }

    let at = Point::new(info.pt.x, info.pt.y);
    let disposition = match wparam.0 as u32 {
        WM_MOUSEMOVE => engine::on_mouse_move(at),
        WM_LBUTTONDOWN => engine::on_button_down(MouseButton::Left, at),
        WM_LBUTTONUP => engine::on_button_up(MouseButton::Left),
        WM_RBUTTONDOWN => engine::on_button_down(MouseButton::Right, at),
        WM_RBUTTONUP => engine::on_button_up(MouseButton::Right),
        WM_MBUTTONDOWN => engine::on_button_down(MouseButton::Middle, at),
        _ => EventDisposition::Forward,
    };

    match disposition {
        EventDisposition::Swallow => LRESULT(1),
        EventDisposition::Forward => unsafe { CallNextHookEx(None, code, wparam, lparam) },
    }
}

pub unsafe extern "system" fn keyboard_proc(
    code: i32,
    wparam: WPARAM,
    lparam: LPARAM,
) -> LRESULT {
    if code < 0 {
        return unsafe { CallNextHookEx(None, code, wparam, lparam) };
    }

    // SAFETY: for WH_KEYBOARD_LL the lparam points at a KBDLLHOOKSTRUCT
    // owned by the OS for the duration of the callback.
    let info = unsafe { &*(lparam.0 as *const KBDLLHOOKSTRUCT) };

    if info.flags.contains(LLKHF_INJECTED) {
        return unsafe { CallNextHookEx(None, code, wparam, lparam) };
    }

    let msg = wparam.0 as u32;
    if (msg == WM_KEYUP || msg == WM_SYSKEYUP)
        && (info.vkCode == u32::from(VK_LWIN.0) || info.vkCode == u32::from(VK_RWIN.0))
        && engine::on_win_up(info.vkCode as u16) == EventDisposition::Swallow
    {
        return LRESULT(1);
    }

    unsafe { CallNextHookEx(None, code, wparam, lparam) }
}
