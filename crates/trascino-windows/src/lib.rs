//! Win32 layer: the hook thread, the worker message loop, and every
//! call that touches the OS.
//!
//! Thread ownership is strict. The hook thread owns the two low-level
//! hooks and the gesture engine; the worker (main) thread owns every
//! HWND — hidden message window, overlay, tray icon — and the
//! executor. The bounded command queue is the only shared mutable
//! structure between them; everything else crosses as posted messages
//! or atomics.

mod ctrl_c;
mod dpi;
mod engine;
mod executor;
mod focus;
mod hook_procs;
mod hook_thread;
mod inject;
mod keys;
mod menu;
mod message_window;
mod messages;
mod overlay;
mod panic_bridge;
mod priority;
mod single_instance;
mod tray;
mod window;
mod worker;

pub use worker::run;

/// A boxed error type for platform operations.
pub type PlatformResult<T> = Result<T, Box<dyn std::error::Error>>;

/// Returns whether the process is attached to a real console window.
///
/// Decides both the log sink (stderr vs. file) and whether the Ctrl+C
/// handler is worth installing.
pub fn has_console() -> bool {
    use windows::Win32::System::Console::GetConsoleWindow;

    // SAFETY: GetConsoleWindow is a simple query; a null handle means
    // no console is attached (e.g. started from the shell GUI).
    !unsafe { GetConsoleWindow() }.is_invalid()
}
