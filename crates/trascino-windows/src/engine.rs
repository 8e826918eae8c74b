//! Hook-thread-owned gesture state and the effect interpreter.
//!
//! The OS hook ABI gives callbacks no user data, so the state machine
//! lives in a thread-local on the hook thread and the trampolines in
//! `hook_procs` reach it through these entry points. Effects come out
//! of the pure engine and are interpreted here: a non-blocking queue
//! push plus posted wake-ups — nothing that could block the hook.

use std::cell::RefCell;
use std::sync::Arc;
use std::time::Instant;

use trascino_core::gesture::{Effect, EventDisposition, GestureEngine, MouseButton};
use trascino_core::{CommandSender, Point, SharedSettings};

use windows::Win32::Foundation::{HWND, LPARAM, WPARAM};
use windows::Win32::UI::Input::KeyboardAndMouse::{ReleaseCapture, SetCapture};
use windows::Win32::UI::WindowsAndMessaging::PostMessageW;

use crate::keys;
use crate::messages::{
    self, WM_APP_DRAIN_COMMANDS, WM_APP_FOCUS_WINDOW, WM_APP_HIDE_OVERLAY, WM_APP_POISON,
    WM_APP_REPLAY_WIN_UP,
};
use crate::window::WinDesktop;

/// Everything the hook thread needs, established once before the hooks
/// are installed.
pub struct HookContext {
    /// Raw handle of the worker's hidden message window. Posted to,
    /// never dereferenced, so crossing threads as `usize` is fine.
    pub worker_hwnd: usize,
    pub sender: CommandSender,
    pub settings: Arc<SharedSettings>,
}

struct HookState {
    engine: GestureEngine,
    effects: Vec<Effect>,
    sender: CommandSender,
    worker_hwnd: usize,
}

thread_local! {
    static HOOK_STATE: RefCell<Option<HookState>> = const { RefCell::new(None) };
}

/// Installs the gesture state on the current (hook) thread.
pub fn install(ctx: HookContext) {
    HOOK_STATE.with(|cell| {
        *cell.borrow_mut() = Some(HookState {
            engine: GestureEngine::new(ctx.settings),
            effects: Vec::with_capacity(8),
            sender: ctx.sender,
            worker_hwnd: ctx.worker_hwnd,
        });
    });
}

/// Ends any in-flight gesture and tears the state down. Runs on the
/// hook thread right after its message pump exits, so capture release
/// happens on the thread that took it.
pub fn uninstall() {
    HOOK_STATE.with(|cell| {
        if let Some(state) = cell.borrow_mut().as_mut() {
            let HookState {
                engine, effects, ..
            } = state;
            engine.hard_reset(keys::win_key_down(), effects);
            apply_effects(state);
        }
        *cell.borrow_mut() = None;
    });
}

pub fn on_button_down(button: MouseButton, at: Point) -> EventDisposition {
    dispatch(|state| {
        let HookState {
            engine, effects, ..
        } = state;
        engine.on_button_down(
            button,
            at,
            keys::sample_modifiers(),
            Instant::now(),
            &WinDesktop,
            effects,
        )
    })
}

pub fn on_button_up(button: MouseButton) -> EventDisposition {
    dispatch(|state| {
        let HookState {
            engine, effects, ..
        } = state;
        engine.on_button_up(button, effects)
    })
}

pub fn on_mouse_move(at: Point) -> EventDisposition {
    dispatch(|state| {
        let HookState {
            engine, effects, ..
        } = state;
        engine.on_mouse_move(at, keys::sample_modifiers(), Instant::now(), effects)
    })
}

pub fn on_win_up(vk: u16) -> EventDisposition {
    dispatch(|state| {
        let HookState {
            engine, effects, ..
        } = state;
        engine.on_win_up(vk, effects)
    })
}

fn dispatch(f: impl FnOnce(&mut HookState) -> EventDisposition) -> EventDisposition {
    HOOK_STATE.with(|cell| {
        let mut borrow = cell.borrow_mut();
        let Some(state) = borrow.as_mut() else {
            return EventDisposition::Forward;
        };
        let disposition = f(state);
        apply_effects(state);
        disposition
    })
}

fn apply_effects(state: &mut HookState) {
    let worker = HWND(state.worker_hwnd as *mut _);
    for effect in state.effects.drain(..) {
        match effect {
            Effect::PoisonSoloModifier => post(worker, WM_APP_POISON, 0, 0),
            Effect::CaptureMouse => {
                // Capture to the worker's hidden window so drag events
                // keep flowing while the cursor is outside every
                // window of ours.
                // SAFETY: SetCapture with a valid HWND is safe.
                unsafe {
                    SetCapture(worker);
                }
            }
            Effect::ReleaseMouseCapture => {
                // SAFETY: releasing capture we may or may not hold is
                // harmless.
                unsafe {
                    let _ = ReleaseCapture();
                }
            }
            Effect::Push(cmd) => {
                // Wake the worker after every successful push — posted
                // to the window, not the thread queue, so a nested
                // menu loop still delivers it.
                if state.sender.try_push(cmd) {
                    post(worker, WM_APP_DRAIN_COMMANDS, 0, 0);
                }
            }
            Effect::FocusWindow { hwnd, entry } => {
                post(
                    worker,
                    WM_APP_FOCUS_WINDOW,
                    hwnd,
                    messages::pack_coords(entry.x, entry.y),
                );
            }
            Effect::ReplayWinUp { vk } => post(worker, WM_APP_REPLAY_WIN_UP, vk as usize, 0),
            Effect::HideOverlay => post(worker, WM_APP_HIDE_OVERLAY, 0, 0),
        }
    }
}

fn post(hwnd: HWND, msg: u32, wparam: usize, lparam: isize) {
    // SAFETY: PostMessageW is async and fire-and-forget; failure just
    // means the worker window is gone, which only happens at shutdown.
    unsafe {
        let _ = PostMessageW(Some(hwnd), msg, WPARAM(wparam), LPARAM(lparam));
    }
}
