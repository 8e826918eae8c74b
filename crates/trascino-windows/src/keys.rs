//! Asynchronous key-state sampling.
//!
//! Key-up events update the global async state only after the hook
//! returns, so callers must re-sample on every event and, for keyboard
//! events, trust the event itself over the snapshot for the key it
//! concerns.

use trascino_core::ModifierSnapshot;
use windows::Win32::UI::Input::KeyboardAndMouse::{
    GetAsyncKeyState, VIRTUAL_KEY, VK_CONTROL, VK_LWIN, VK_MENU, VK_RWIN, VK_SHIFT,
};

/// Whether the key is physically down right now.
pub fn key_down(vk: VIRTUAL_KEY) -> bool {
    // SAFETY: GetAsyncKeyState is a pure state query.
    (unsafe { GetAsyncKeyState(i32::from(vk.0)) } as u16) & 0x8000 != 0
}

/// Samples the four modifiers. Win has no combined virtual key, so the
/// two physical keys are ORed.
pub fn sample_modifiers() -> ModifierSnapshot {
    ModifierSnapshot {
        win: key_down(VK_LWIN) || key_down(VK_RWIN),
        shift: key_down(VK_SHIFT),
        ctrl: key_down(VK_CONTROL),
        alt: key_down(VK_MENU),
    }
}

/// Win still physically held? Used by resets to decide whether the
/// pending Win-up still needs poisoning.
pub fn win_key_down() -> bool {
    key_down(VK_LWIN) || key_down(VK_RWIN)
}
