//! Bridges a hook-thread failure to the worker.
//!
//! Errors never cross the hook boundary as unwinding: a panic caught
//! on the hook thread lands here, is stored in a shared slot, and the
//! worker is told to quit twice over — WM_QUIT to its thread queue for
//! the normal case, WM_CLOSE to its window to cut through a modal menu
//! loop that discards thread messages. A short watchdog then makes
//! sure a frozen worker cannot hold teardown hostage forever.

use std::any::Any;
use std::sync::mpsc::{Receiver, SyncSender, sync_channel};
use std::sync::{Mutex, OnceLock};
use std::time::Duration;

use windows::Win32::Foundation::{HWND, LPARAM, WPARAM};
use windows::Win32::UI::WindowsAndMessaging::{
    PostMessageW, PostThreadMessageW, WM_CLOSE, WM_QUIT,
};

const WORKER_GRACE: Duration = Duration::from_secs(2);

static PAYLOAD: OnceLock<String> = OnceLock::new();
static TARGET: OnceLock<(u32, usize)> = OnceLock::new();
static ACK_TX: OnceLock<SyncSender<()>> = OnceLock::new();
static ACK_RX: Mutex<Option<Receiver<()>>> = Mutex::new(None);

/// Arms the bridge with the worker's thread id and message window.
/// Called once during initialisation, before the hooks go live.
pub fn arm(worker_thread_id: u32, worker_hwnd: usize) {
    let (tx, rx) = sync_channel::<()>(1);
    let _ = ACK_TX.set(tx);
    if let Ok(mut slot) = ACK_RX.lock() {
        *slot = Some(rx);
    }
    let _ = TARGET.set((worker_thread_id, worker_hwnd));
}

/// Records the hook thread's panic and signals the worker to die.
/// Blocks (briefly) on the watchdog; if the worker never acknowledges,
/// terminates the process so the machine is not left with dangling
/// half-dead hooks.
pub fn report(payload: Box<dyn Any + Send>) {
    let message = payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "opaque panic payload".to_string());

    trascino_core::log_error!("hook thread failed: {message}");
    let _ = PAYLOAD.set(message);

    if let Some(&(thread_id, hwnd)) = TARGET.get() {
        // SAFETY: both posts are asynchronous; the worker may already
        // be gone, in which case they fail harmlessly.
        unsafe {
            let _ = PostThreadMessageW(thread_id, WM_QUIT, WPARAM(0), LPARAM(0));
            if hwnd != 0 {
                let _ = PostMessageW(Some(HWND(hwnd as *mut _)), WM_CLOSE, WPARAM(0), LPARAM(0));
            }
        }
    }

    let rx = ACK_RX.lock().ok().and_then(|mut slot| slot.take());
    let acknowledged = rx.is_some_and(|rx| rx.recv_timeout(WORKER_GRACE).is_ok());
    if !acknowledged {
        trascino_core::log_error!(
            "worker did not acknowledge within {WORKER_GRACE:?}; terminating"
        );
        trascino_core::log::shutdown();
        std::process::exit(1);
    }
    // Acknowledged: the worker owns the rest of the teardown and the
    // final process exit.
}

/// Called by the worker once its pump has exited and it has seen the
/// failure; releases the hook thread's watchdog.
pub fn acknowledge() {
    if let Some(tx) = ACK_TX.get() {
        let _ = tx.try_send(());
    }
}

/// The stored failure, if the hook thread died.
pub fn payload() -> Option<&'static str> {
    PAYLOAD.get().map(String::as_str)
}
