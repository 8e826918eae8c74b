//! Synthetic input via `SendInput`.
//!
//! All injection happens on the worker thread; injecting from inside a
//! low-level hook is documented as undefined, so the hook posts a
//! control message instead. Every hook callback ignores events the OS
//! marks as injected, which breaks the recursion these calls would
//! otherwise cause.

use trascino_core::Point;

use windows::Win32::UI::Input::KeyboardAndMouse::{
    INPUT, INPUT_0, INPUT_KEYBOARD, INPUT_MOUSE, KEYBD_EVENT_FLAGS, KEYBDINPUT,
    KEYEVENTF_KEYUP, KEYEVENTF_SCANCODE, MOUSE_EVENT_FLAGS, MOUSEEVENTF_ABSOLUTE,
    MOUSEEVENTF_LEFTDOWN, MOUSEEVENTF_LEFTUP, MOUSEEVENTF_MOVE, MOUSEEVENTF_VIRTUALDESK,
    MOUSEINPUT, SendInput, VIRTUAL_KEY,
};
use windows::Win32::UI::WindowsAndMessaging::{
    GetSystemMetrics, SM_CXVIRTUALSCREEN, SM_CYVIRTUALSCREEN, SM_XVIRTUALSCREEN,
    SM_YVIRTUALSCREEN,
};

/// Scancode of Right Shift — the benign key the shell counts as
/// "something happened during the Win-hold". Injected as a scancode:
/// when `KEYEVENTF_SCANCODE` is set the virtual-key field is ignored,
/// and mixing the two misbehaves on some builds.
const POISON_SCANCODE: u16 = 0x36;

fn key_scancode(scan: u16, flags: KEYBD_EVENT_FLAGS) -> INPUT {
    INPUT {
        r#type: INPUT_KEYBOARD,
        Anonymous: INPUT_0 {
            ki: KEYBDINPUT {
                wVk: VIRTUAL_KEY(0),
                wScan: scan,
                dwFlags: flags,
                time: 0,
                dwExtraInfo: 0,
            },
        },
    }
}

fn key_vk(vk: u16, flags: KEYBD_EVENT_FLAGS) -> INPUT {
    INPUT {
        r#type: INPUT_KEYBOARD,
        Anonymous: INPUT_0 {
            ki: KEYBDINPUT {
                wVk: VIRTUAL_KEY(vk),
                wScan: 0,
                dwFlags: flags,
                time: 0,
                dwExtraInfo: 0,
            },
        },
    }
}

fn mouse(flags: MOUSE_EVENT_FLAGS, dx: i32, dy: i32) -> INPUT {
    INPUT {
        r#type: INPUT_MOUSE,
        Anonymous: INPUT_0 {
            mi: MOUSEINPUT {
                dx,
                dy,
                mouseData: 0,
                dwFlags: flags,
                time: 0,
                dwExtraInfo: 0,
            },
        },
    }
}

fn send(inputs: &[INPUT], what: &str) {
    // SAFETY: SendInput copies the slice; the structs are fully
    // initialised above.
    let sent = unsafe { SendInput(inputs, std::mem::size_of::<INPUT>() as i32) };
    if sent != inputs.len() as u32 {
        trascino_core::log_warn!(
            "SendInput for {what} queued {sent} of {} events",
            inputs.len()
        );
    }
}

/// The poison: a Right Shift down/up pair. After this, the shell has
/// seen a non-Win transition inside the Win-hold and will not open its
/// menu on the eventual Win-up.
pub fn poison_solo_modifier() {
    send(
        &[
            key_scancode(POISON_SCANCODE, KEYEVENTF_SCANCODE),
            key_scancode(POISON_SCANCODE, KEYEVENTF_SCANCODE | KEYEVENTF_KEYUP),
        ],
        "poison tap",
    );
}

/// Replays a swallowed Win-up with the poison tap in front of it, in
/// one atomic `SendInput` batch so nothing can interleave. `vk` is the
/// Win key the user actually released.
pub fn poison_then_win_up(vk: u16) {
    send(
        &[
            key_scancode(POISON_SCANCODE, KEYEVENTF_SCANCODE),
            key_scancode(POISON_SCANCODE, KEYEVENTF_SCANCODE | KEYEVENTF_KEYUP),
            key_vk(vk, KEYEVENTF_KEYUP),
        ],
        "poison + win-up replay",
    );
}

/// The focus fallback: a left click at the gesture's entry point.
///
/// Hazardous by design — the click lands on whatever control sits
/// there — which is why this stays behind a default-off toggle.
pub fn click_at(entry: Point) {
    // SAFETY: GetSystemMetrics is a pure query.
    let (vx, vy, vw, vh) = unsafe {
        (
            GetSystemMetrics(SM_XVIRTUALSCREEN),
            GetSystemMetrics(SM_YVIRTUALSCREEN),
            GetSystemMetrics(SM_CXVIRTUALSCREEN),
            GetSystemMetrics(SM_CYVIRTUALSCREEN),
        )
    };
    if vw == 0 || vh == 0 {
        trascino_core::log_warn!("virtual screen metrics unavailable; focus click skipped");
        return;
    }

    // Absolute coordinates are normalised to a 0..65535 grid over the
    // virtual desktop.
    let nx = (entry.x - vx) * 65535 / vw;
    let ny = (entry.y - vy) * 65535 / vh;
    let move_flags = MOUSEEVENTF_MOVE | MOUSEEVENTF_ABSOLUTE | MOUSEEVENTF_VIRTUALDESK;

    send(
        &[
            mouse(move_flags, nx, ny),
            mouse(MOUSEEVENTF_LEFTDOWN, 0, 0),
            mouse(MOUSEEVENTF_LEFTUP, 0, 0),
        ],
        "focus click",
    );
    trascino_core::log_info!(
        "focused via synthetic click at ({}, {}) — may have hit a control",
        entry.x,
        entry.y
    );
}
