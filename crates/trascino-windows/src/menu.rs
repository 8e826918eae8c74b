//! The tray settings menu.
//!
//! A popup with the four user toggles and Exit. `TrackPopupMenu` runs
//! a nested modal message loop on the worker thread — which is exactly
//! why the hook's wake messages go to the window, not the thread
//! queue, and why the hook itself never waits on the worker.

use trascino_core::{Point, SharedSettings};

use windows::Win32::Foundation::{HWND, LPARAM, WPARAM};
use windows::Win32::UI::WindowsAndMessaging::{
    AppendMenuW, CreatePopupMenu, DestroyMenu, MENU_ITEM_FLAGS, MF_CHECKED, MF_DISABLED,
    MF_GRAYED, MF_STRING, PostMessageW, TPM_RETURNCMD, TrackPopupMenu, WM_NULL,
};
use windows::core::PCWSTR;

use crate::focus;

const MENU_FOCUS_ON_DRAG: usize = 1;
const MENU_CLICK_FALLBACK: usize = 2;
const MENU_RATELIMIT: usize = 3;
const MENU_LOG_RATE: usize = 4;
const MENU_EXIT: usize = 5;

/// What the user picked from the tray menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuChoice {
    ToggleFocusOnDrag,
    ToggleClickFallback,
    ToggleRatelimit,
    ToggleLogRate,
    Exit,
}

fn wide(s: &str) -> Vec<u16> {
    s.encode_utf16().chain(std::iter::once(0)).collect()
}

fn checked(on: bool) -> MENU_ITEM_FLAGS {
    if on { MF_CHECKED } else { MENU_ITEM_FLAGS(0) }
}

/// Builds and tracks the menu at `anchor`, returning the user's pick.
pub fn show(owner: HWND, anchor: Point, settings: &SharedSettings) -> Option<MenuChoice> {
    // SAFETY: menu creation/tracking/destruction all happen on this
    // thread; the item strings outlive the TrackPopupMenu call.
    unsafe {
        let menu = CreatePopupMenu().ok()?;

        let focus_text = wide("Focus the window being moved (thread-attach method)");
        let fallback_text =
            wide("Fallback: focus via left click (warning: clicks whatever is under the cursor)");
        let ratelimit_text = wide("Rate-limit window moves (less CPU, choppier)");
        let log_rate_text = wide("Log move rate (needs rate-limit on)");
        let exit_text = wide("Exit");

        let _ = AppendMenuW(
            menu,
            MF_STRING | checked(settings.focus_on_drag()),
            MENU_FOCUS_ON_DRAG,
            PCWSTR(focus_text.as_ptr()),
        );

        let mut fallback_flags = MF_STRING | checked(settings.click_to_focus_fallback());
        if !settings.focus_on_drag() {
            fallback_flags |= MF_DISABLED | MF_GRAYED;
        }
        let _ = AppendMenuW(
            menu,
            fallback_flags,
            MENU_CLICK_FALLBACK,
            PCWSTR(fallback_text.as_ptr()),
        );

        let _ = AppendMenuW(
            menu,
            MF_STRING | checked(settings.ratelimit_moves()),
            MENU_RATELIMIT,
            PCWSTR(ratelimit_text.as_ptr()),
        );

        let mut log_flags = MF_STRING | checked(settings.log_move_rate());
        if !settings.ratelimit_moves() {
            log_flags |= MF_DISABLED | MF_GRAYED;
        }
        let _ = AppendMenuW(menu, log_flags, MENU_LOG_RATE, PCWSTR(log_rate_text.as_ptr()));

        let _ = AppendMenuW(menu, MF_STRING, MENU_EXIT, PCWSTR(exit_text.as_ptr()));

        // The owner must be foreground or the menu refuses to dismiss
        // when the user clicks away.
        focus::foreground_for_menu(owner);

        let picked = TrackPopupMenu(menu, TPM_RETURNCMD, anchor.x, anchor.y, 0, owner, None);

        // Dismissal bookkeeping the menu implementation expects.
        let _ = PostMessageW(Some(owner), WM_NULL, WPARAM(0), LPARAM(0));
        let _ = DestroyMenu(menu);

        match picked.0 as usize {
            MENU_FOCUS_ON_DRAG => Some(MenuChoice::ToggleFocusOnDrag),
            MENU_CLICK_FALLBACK => Some(MenuChoice::ToggleClickFallback),
            MENU_RATELIMIT => Some(MenuChoice::ToggleRatelimit),
            MENU_LOG_RATE => Some(MenuChoice::ToggleLogRate),
            MENU_EXIT => Some(MenuChoice::Exit),
            _ => None,
        }
    }
}
