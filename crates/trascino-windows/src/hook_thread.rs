//! The dedicated hook thread.
//!
//! Low-level hooks deliver callbacks to the thread that installed
//! them, so this thread installs both hooks and then runs a private
//! message pump whose only job is to let the OS dispatch into the
//! trampolines. It must stay responsive: if a callback outlives the
//! OS hook timeout the system silently stops calling us.
//!
//! The same thread that installs the hooks must remove them, so
//! unhooking happens here after the pump exits, never from the worker.

use std::panic::AssertUnwindSafe;
use std::sync::mpsc;
use std::thread;

use windows::Win32::Foundation::{LPARAM, WPARAM};
use windows::Win32::System::Threading::GetCurrentThreadId;
use windows::Win32::UI::WindowsAndMessaging::{
    DispatchMessageW, GetMessageW, MSG, PostThreadMessageW, SetWindowsHookExW,
    TranslateMessage, UnhookWindowsHookEx, WH_KEYBOARD_LL, WH_MOUSE_LL, WM_QUIT,
};

use crate::PlatformResult;
use crate::engine::{self, HookContext};
use crate::hook_procs;
use crate::panic_bridge;
use crate::priority;

/// Starts the hook thread and blocks until both hooks are installed.
pub fn start(ctx: HookContext) -> PlatformResult<HookThreadHandle> {
    let (ready_tx, ready_rx) = mpsc::channel::<Result<u32, String>>();

    let handle = thread::spawn(move || {
        // A panic on this thread must not unwind into the OS hook
        // dispatcher; it is caught here and bridged to the worker,
        // which re-raises it on its own teardown path.
        let result = std::panic::catch_unwind(AssertUnwindSafe(|| run(ctx, &ready_tx)));
        if let Err(payload) = result {
            panic_bridge::report(payload);
        }
    });

    let thread_id: u32 = ready_rx
        .recv()
        .map_err(|_| -> Box<dyn std::error::Error> {
            "hook thread exited before signalling readiness".into()
        })?
        .map_err(|e| -> Box<dyn std::error::Error> { e.into() })?;

    Ok(HookThreadHandle { thread_id, handle })
}

fn run(ctx: HookContext, ready_tx: &mpsc::Sender<Result<u32, String>>) {
    // SAFETY: identity query.
    let thread_id = unsafe { GetCurrentThreadId() };

    // The mouse event's path to the executor must survive GC-free but
    // still preemptible surroundings: raise this thread above
    // everything non-realtime.
    priority::raise_hook_thread();

    engine::install(ctx);

    // SAFETY: installing a global low-level hook with no module handle
    // is the documented pattern for LL hooks; the callback runs on
    // this thread.
    let mouse_hook = match unsafe {
        SetWindowsHookExW(WH_MOUSE_LL, Some(hook_procs::mouse_proc), None, 0)
    } {
        Ok(h) => h,
        Err(e) => {
            let _ = ready_tx.send(Err(format!("failed to install mouse hook: {e}")));
            return;
        }
    };

    // SAFETY: as above.
    let keyboard_hook = match unsafe {
        SetWindowsHookExW(WH_KEYBOARD_LL, Some(hook_procs::keyboard_proc), None, 0)
    } {
        Ok(h) => h,
        Err(e) => {
            // SAFETY: undo the half-finished install on this thread.
            unsafe {
                let _ = UnhookWindowsHookEx(mouse_hook);
            }
            let _ = ready_tx.send(Err(format!("failed to install keyboard hook: {e}")));
            return;
        }
    };

    trascino_core::log_info!("hooks installed on thread {thread_id}");
    let _ = ready_tx.send(Ok(thread_id));

    // The private pump. Hook callbacks are not window messages — the
    // OS dispatches them while this thread sits inside GetMessageW —
    // but the pump is what gives it the opportunity.
    let mut msg = MSG::default();
    // SAFETY: standard message loop; GetMessageW returns 0 on WM_QUIT
    // and -1 on error, both of which end the loop.
    while unsafe { GetMessageW(&mut msg, None, 0, 0) }.as_bool() {
        unsafe {
            let _ = TranslateMessage(&msg);
            DispatchMessageW(&msg);
        }
    }

    engine::uninstall();

    // SAFETY: unhooked on the installing thread, as required.
    unsafe {
        let _ = UnhookWindowsHookEx(keyboard_hook);
        let _ = UnhookWindowsHookEx(mouse_hook);
    }
    trascino_core::log_info!("hook thread unhooked and exiting");
}

/// Handle for stopping the hook thread from the worker.
pub struct HookThreadHandle {
    thread_id: u32,
    handle: thread::JoinHandle<()>,
}

impl HookThreadHandle {
    /// Posts WM_QUIT to the hook thread's queue and waits for it to
    /// unhook and finish.
    pub fn stop(self) {
        // SAFETY: posting to a thread queue is async and safe; the
        // thread id stays valid until join() returns.
        unsafe {
            let _ = PostThreadMessageW(self.thread_id, WM_QUIT, WPARAM(0), LPARAM(0));
        }
        let _ = self.handle.join();
    }
}
