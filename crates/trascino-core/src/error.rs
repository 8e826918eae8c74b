//! Typed process-exit signalling.
//!
//! Fatal conditions (resource-init failure, session end, user exit,
//! console signals) are converted into an [`ExitSignal`] carrying the
//! process exit code. The signal is only ever raised on the worker
//! thread's unwind path; the hook thread reports failures through the
//! panic bridge instead of throwing across the hook boundary.

use std::fmt;

/// A typed exit request with a distinct process exit code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExitSignal {
    pub code: i32,
    pub reason: String,
}

impl ExitSignal {
    pub fn new(code: i32, reason: impl Into<String>) -> Self {
        Self {
            code,
            reason: reason.into(),
        }
    }

    /// Normal exit chosen by the user (tray menu Exit).
    pub fn user_exit() -> Self {
        Self::new(0, "user chose Exit")
    }

    /// Another instance already holds the session mutex.
    pub fn already_running(name: &str) -> Self {
        Self::new(5, format!("{name} is already running in this session"))
    }

    /// The OS is ending the session.
    pub fn session_end() -> Self {
        Self::new(20, "session ended")
    }

    /// A console control signal.
    pub fn console_signal(kind: &str, code: i32) -> Self {
        Self::new(code, format!("exit via {kind}"))
    }
}

impl fmt::Display for ExitSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "exit {}: {}", self.code, self.reason)
    }
}

impl std::error::Error for ExitSignal {}
