//! The worker (main) thread: initialisation, the primary message
//! loop, control-message handling, and teardown.

use std::cell::RefCell;
use std::sync::Arc;

use trascino_core::{
    COMMAND_QUEUE_CAPACITY, ExitSignal, Point, Settings, SharedSettings, command_channel,
};

use windows::Win32::Foundation::{HWND, LPARAM, LRESULT, WPARAM};
use windows::Win32::System::Threading::GetCurrentThreadId;
use windows::Win32::UI::WindowsAndMessaging::{
    DestroyWindow, DispatchMessageW, GetMessageW, MSG, PostQuitMessage, TranslateMessage,
    WM_CLOSE, WM_DESTROY, WM_ENDSESSION, WM_QUERYENDSESSION, WM_RBUTTONUP,
};

use crate::ctrl_c;
use crate::dpi;
use crate::engine::HookContext;
use crate::executor::Executor;
use crate::focus;
use crate::hook_thread;
use crate::inject;
use crate::menu::{self, MenuChoice};
use crate::message_window;
use crate::messages::{
    WM_APP_CONSOLE_SIGNAL, WM_APP_DRAIN_COMMANDS, WM_APP_FOCUS_WINDOW, WM_APP_HIDE_OVERLAY,
    WM_APP_POISON, WM_APP_REPLAY_WIN_UP, WM_APP_TRAY, unpack_coords,
};
use crate::overlay::Overlay;
use crate::panic_bridge;
use crate::priority;
use crate::single_instance::SingleInstance;
use crate::tray::TrayIcon;
use crate::window::cursor_pos;

struct WorkerState {
    executor: Executor,
    overlay: Overlay,
    tray: TrayIcon,
    settings: Arc<SharedSettings>,
    exit: Option<ExitSignal>,
}

thread_local! {
    static WORKER: RefCell<Option<WorkerState>> = const { RefCell::new(None) };
}

/// Runs the application to completion and returns the exit signal.
///
/// Must be called on the process's main thread; every HWND is created
/// and destroyed here, and the loop does not return until shutdown.
pub fn run(settings: &Settings) -> ExitSignal {
    let _instance = match SingleInstance::acquire("trascino_single_instance") {
        Ok(guard) => guard,
        Err(signal) => return signal,
    };

    dpi::enable_dpi_awareness();
    priority::elevate_process();

    let shared = SharedSettings::new(settings);

    let hwnd = match message_window::create() {
        Ok(hwnd) => hwnd,
        Err(e) => return ExitSignal::new(1, format!("init failed: {e}")),
    };

    let (sender, receiver) = command_channel(COMMAND_QUEUE_CAPACITY);
    let overlay = Overlay::create();
    let tray = TrayIcon::create(hwnd);

    WORKER.with(|cell| {
        *cell.borrow_mut() = Some(WorkerState {
            executor: Executor::new(receiver),
            overlay,
            tray,
            settings: shared.clone(),
            exit: None,
        });
    });

    // SAFETY: identity query.
    let worker_thread_id = unsafe { GetCurrentThreadId() };
    panic_bridge::arm(worker_thread_id, hwnd.0 as usize);

    let hook = match hook_thread::start(HookContext {
        worker_hwnd: hwnd.0 as usize,
        sender,
        settings: shared,
    }) {
        Ok(handle) => handle,
        Err(e) => {
            teardown(None, hwnd);
            return ExitSignal::new(1, format!("init failed: {e}"));
        }
    };

    ctrl_c::install_if_console(hwnd);

    // Everything above must be resident before the first gesture; ask
    // for a working-set floor so an idle stretch cannot page the hot
    // path out.
    priority::lock_working_set();

    trascino_core::log_info!("trascino running (worker thread {worker_thread_id})");

    // The primary loop: sleeps at zero CPU in GetMessageW until input
    // arrives — a control message, a tray event, or the hook's wake.
    let mut msg = MSG::default();
    // SAFETY: standard message loop.
    while unsafe { GetMessageW(&mut msg, None, 0, 0) }.as_bool() {
        unsafe {
            let _ = TranslateMessage(&msg);
            DispatchMessageW(&msg);
        }
    }

    // The loop exited. Either the user ended it, or the hook thread
    // died and posted our quit: re-raise that failure here so the one
    // teardown path below runs either way.
    let mut exit = take_exit().unwrap_or_else(ExitSignal::user_exit);
    if let Some(failure) = panic_bridge::payload() {
        panic_bridge::acknowledge();
        exit = ExitSignal::new(1, format!("hook thread failure: {failure}"));
    }

    teardown(Some(hook), hwnd);
    exit
}

/// Releases everything in the reverse order of creation: hooks first
/// (on their own thread), then the tray icon, overlay, and window.
fn teardown(hook: Option<hook_thread::HookThreadHandle>, hwnd: HWND) {
    if let Some(hook) = hook {
        hook.stop();
    }

    WORKER.with(|cell| {
        if let Some(mut state) = cell.borrow_mut().take() {
            state.tray.remove();
            state.overlay.destroy();
            let (dropped, peak) = state.executor.stats();
            if dropped > 0 || peak > 1 {
                trascino_core::log_info!(
                    "command queue: peak depth {peak} of {COMMAND_QUEUE_CAPACITY}, {dropped} dropped"
                );
            }
        }
    });

    message_window::destroy(hwnd);
}

fn take_exit() -> Option<ExitSignal> {
    WORKER.with(|cell| cell.borrow_mut().as_mut().and_then(|s| s.exit.take()))
}

/// Records the reason we are exiting and starts the window teardown
/// that ends the message loop.
fn request_exit(hwnd: HWND, signal: ExitSignal) {
    trascino_core::log_info!("exiting: {signal}");
    WORKER.with(|cell| {
        if let Some(state) = cell.borrow_mut().as_mut()
            && state.exit.is_none()
        {
            state.exit = Some(signal);
        }
    });
    // SAFETY: our own window; WM_DESTROY then posts the quit.
    unsafe {
        let _ = DestroyWindow(hwnd);
    }
}

/// Handles a message for the hidden window. `None` falls through to
/// `DefWindowProcW`.
pub(crate) fn handle_message(
    hwnd: HWND,
    msg: u32,
    wparam: WPARAM,
    lparam: LPARAM,
) -> Option<LRESULT> {
    match msg {
        WM_APP_DRAIN_COMMANDS => {
            WORKER.with(|cell| {
                if let Some(state) = cell.borrow_mut().as_mut() {
                    let WorkerState {
                        executor,
                        overlay,
                        tray,
                        ..
                    } = state;
                    executor.drain(overlay, tray);
                }
            });
            Some(LRESULT(0))
        }

        WM_APP_POISON => {
            inject::poison_solo_modifier();
            Some(LRESULT(0))
        }

        WM_APP_REPLAY_WIN_UP => {
            inject::poison_then_win_up(wparam.0 as u16);
            Some(LRESULT(0))
        }

        WM_APP_FOCUS_WINDOW => {
            let target = wparam.0;
            let (x, y) = unpack_coords(lparam.0);
            if !focus::force_foreground(target) {
                let fallback_enabled = WORKER.with(|cell| {
                    cell.borrow()
                        .as_ref()
                        .is_some_and(|s| s.settings.click_to_focus_fallback())
                });
                if fallback_enabled {
                    inject::click_at(Point::new(x, y));
                } else {
                    trascino_core::log_debug!(
                        "could not focus {target:#x} (click fallback disabled)"
                    );
                }
            }
            Some(LRESULT(0))
        }

        WM_APP_HIDE_OVERLAY => {
            WORKER.with(|cell| {
                if let Some(state) = cell.borrow().as_ref() {
                    state.overlay.hide();
                }
            });
            Some(LRESULT(0))
        }

        WM_APP_TRAY => {
            // Version-4 callback: the event lives in the low word of
            // lParam, the anchor point packed in wParam.
            let event = (lparam.0 as u32) & 0xFFFF;
            if event == WM_RBUTTONUP {
                let (x, y) = unpack_coords(wparam.0 as isize);
                let anchor = if (x, y) == (0, 0) {
                    cursor_pos().unwrap_or(Point::new(0, 0))
                } else {
                    Point::new(x, y)
                };
                on_tray_menu(hwnd, anchor);
            }
            Some(LRESULT(0))
        }

        WM_APP_CONSOLE_SIGNAL => {
            let signal = match wparam.0 as u32 {
                ctrl_c::CTRL_C => ExitSignal::console_signal("Ctrl+C", 128),
                ctrl_c::CTRL_BREAK => ExitSignal::console_signal("Ctrl+Break", 128),
                ctrl_c::CTRL_CLOSE => ExitSignal::console_signal("console close", 127),
                other => ExitSignal::console_signal(&format!("console event {other}"), 129),
            };
            request_exit(hwnd, signal);
            Some(LRESULT(0))
        }

        WM_QUERYENDSESSION => {
            // Allow the session to end; WM_ENDSESSION does the work.
            Some(LRESULT(1))
        }

        WM_ENDSESSION => {
            if wparam.0 != 0 {
                request_exit(hwnd, ExitSignal::session_end());
            }
            Some(LRESULT(0))
        }

        WM_CLOSE => {
            // SAFETY: our own window.
            unsafe {
                let _ = DestroyWindow(hwnd);
            }
            Some(LRESULT(0))
        }

        WM_DESTROY => {
            // SAFETY: sets the quit flag; GetMessageW then returns 0.
            unsafe {
                PostQuitMessage(0);
            }
            Some(LRESULT(0))
        }

        _ => None,
    }
}

fn on_tray_menu(hwnd: HWND, anchor: Point) {
    // The menu runs a nested modal message loop that re-enters this
    // window procedure, so no WORKER borrow may be held across it.
    let settings = WORKER.with(|cell| cell.borrow().as_ref().map(|s| s.settings.clone()));
    let Some(settings) = settings else {
        return;
    };

    match menu::show(hwnd, anchor, &settings) {
        Some(MenuChoice::ToggleFocusOnDrag) => {
            let on = settings.toggle_focus_on_drag();
            trascino_core::log_info!("focus on drag: {on}");
        }
        Some(MenuChoice::ToggleClickFallback) => {
            let on = settings.toggle_click_to_focus_fallback();
            trascino_core::log_info!("click-to-focus fallback: {on}");
        }
        Some(MenuChoice::ToggleRatelimit) => {
            let on = settings.toggle_ratelimit_moves();
            trascino_core::log_info!("rate-limit moves: {on}");
        }
        Some(MenuChoice::ToggleLogRate) => {
            let on = settings.toggle_log_move_rate();
            trascino_core::log_info!("log move rate: {on}");
        }
        Some(MenuChoice::Exit) => request_exit(hwnd, ExitSignal::user_exit()),
        None => {}
    }
}
