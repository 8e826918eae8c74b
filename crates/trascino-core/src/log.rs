//! Asynchronous, bounded, non-blocking logging.
//!
//! Producers format a line and `try_send` it into a bounded channel; a
//! background worker owns the sink (stderr when a console is attached,
//! a file otherwise). A slow sink can therefore never back-pressure the
//! input hot path: when the channel is full the line is dropped and
//! counted. Shutdown flushes the backlog and reports the drop count and
//! the channel's high-water mark.

use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::mpsc::{SyncSender, TrySendError, sync_channel};
use std::sync::{Mutex, OnceLock};
use std::thread;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

/// How many lines the log channel buffers before dropping.
pub const LOG_QUEUE_CAPACITY: usize = 4096;

const DEFAULT_LOG_FILE: &str = "trascino.log";

static STATE: OnceLock<LogState> = OnceLock::new();
static WORKER: Mutex<Option<thread::JoinHandle<()>>> = Mutex::new(None);

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Whether logging is enabled.
    pub enabled: bool,
    /// Minimum log level: "debug", "info", "warn", or "error".
    pub level: String,
    /// Log file used when no console is attached. Defaults to
    /// `trascino.log` next to the executable's working directory.
    pub file: Option<PathBuf>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            level: "info".into(),
            file: None,
        }
    }
}

/// Log severity levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Level {
    Debug,
    Info,
    Warn,
    Error,
}

impl Level {
    fn as_str(self) -> &'static str {
        match self {
            Self::Debug => "DEBUG",
            Self::Info => "INFO",
            Self::Warn => "WARN",
            Self::Error => "ERROR",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s.to_ascii_lowercase().as_str() {
            "debug" => Self::Debug,
            "warn" => Self::Warn,
            "error" => Self::Error,
            _ => Self::Info,
        }
    }
}

enum LogMsg {
    Line(String),
    Flush,
}

struct LogState {
    tx: SyncSender<LogMsg>,
    min_level: Level,
    depth: AtomicUsize,
    dropped: AtomicU64,
    peak_depth: AtomicU64,
}

enum Sink {
    Stderr,
    File(File),
}

impl Sink {
    fn write_line(&mut self, line: &str) {
        match self {
            Self::Stderr => {
                eprint!("{line}");
            }
            Self::File(f) => {
                let _ = f.write_all(line.as_bytes());
                let _ = f.flush();
            }
        }
    }
}

/// Initialises the global logger and spawns the log worker.
///
/// `use_stderr` selects the sink: stderr for console sessions, the
/// configured file otherwise. Does nothing if logging is disabled or
/// already initialised.
pub fn init(config: &LogConfig, use_stderr: bool) {
    if !config.enabled {
        return;
    }

    let mut sink = if use_stderr {
        Sink::Stderr
    } else {
        let path = config
            .file
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_FILE));
        match OpenOptions::new().create(true).append(true).open(&path) {
            Ok(f) => Sink::File(f),
            Err(_) => return,
        }
    };

    let (tx, rx) = sync_channel::<LogMsg>(LOG_QUEUE_CAPACITY);

    let state = LogState {
        tx,
        min_level: Level::parse(&config.level),
        depth: AtomicUsize::new(0),
        dropped: AtomicU64::new(0),
        peak_depth: AtomicU64::new(0),
    };
    if STATE.set(state).is_err() {
        return;
    }

    let handle = thread::spawn(move || {
        while let Ok(msg) = rx.recv() {
            match msg {
                LogMsg::Line(line) => {
                    if let Some(state) = STATE.get() {
                        state.depth.fetch_sub(1, Ordering::Relaxed);
                    }
                    sink.write_line(&line);
                }
                LogMsg::Flush => break,
            }
        }
        // Drain whatever was queued behind the flush marker.
        while let Ok(LogMsg::Line(line)) = rx.try_recv() {
            sink.write_line(&line);
        }
        if let Some(state) = STATE.get() {
            let dropped = state.dropped.load(Ordering::Relaxed);
            if dropped > 0 {
                sink.write_line(&format!(
                    "{} [WARN] dropped {dropped} log lines (channel full)\n",
                    timestamp()
                ));
            }
            let peak = state.peak_depth.load(Ordering::Relaxed);
            if peak > 1 {
                sink.write_line(&format!(
                    "{} [INFO] log channel peak depth: {peak} of {LOG_QUEUE_CAPACITY}\n",
                    timestamp()
                ));
            }
        }
    });

    if let Ok(mut worker) = WORKER.lock() {
        *worker = Some(handle);
    }
}

/// Queues a log line if the level is at or above the configured
/// minimum. Never blocks: a full channel drops the line and counts it.
pub fn write(level: Level, args: fmt::Arguments<'_>) {
    let Some(state) = STATE.get() else {
        return;
    };
    if level < state.min_level {
        return;
    }

    let line = format!("{} [{}] {args}\n", timestamp(), level.as_str());
    match state.tx.try_send(LogMsg::Line(line)) {
        Ok(()) => {
            let depth = state.depth.fetch_add(1, Ordering::Relaxed) + 1;
            state.peak_depth.fetch_max(depth as u64, Ordering::Relaxed);
        }
        Err(TrySendError::Full(_)) | Err(TrySendError::Disconnected(_)) => {
            state.dropped.fetch_add(1, Ordering::Relaxed);
        }
    }
}

/// Lines dropped so far because the channel was full.
pub fn dropped_lines() -> u64 {
    STATE
        .get()
        .map_or(0, |s| s.dropped.load(Ordering::Relaxed))
}

/// Flushes the backlog and stops the log worker. Call last on the exit
/// path; logging after this is a no-op.
pub fn shutdown() {
    if let Some(state) = STATE.get() {
        // A blocking send is fine here — shutdown is not the hot path,
        // and the worker is draining on the other end.
        let _ = state.tx.send(LogMsg::Flush);
    }
    let handle = WORKER.lock().ok().and_then(|mut w| w.take());
    if let Some(handle) = handle {
        let _ = handle.join();
    }
}

fn timestamp() -> String {
    let dur = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();
    let secs = dur.as_secs();
    let (h, m, s) = (secs / 3600 % 24, secs / 60 % 60, secs % 60);
    format!("{h:02}:{m:02}:{s:02}.{:03}", dur.subsec_millis())
}

/// Logs at DEBUG level.
#[macro_export]
macro_rules! log_debug {
    ($($arg:tt)*) => { $crate::log::write($crate::log::Level::Debug, format_args!($($arg)*)) };
}

/// Logs at INFO level.
#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => { $crate::log::write($crate::log::Level::Info, format_args!($($arg)*)) };
}

/// Logs at WARN level.
#[macro_export]
macro_rules! log_warn {
    ($($arg:tt)*) => { $crate::log::write($crate::log::Level::Warn, format_args!($($arg)*)) };
}

/// Logs at ERROR level.
#[macro_export]
macro_rules! log_error {
    ($($arg:tt)*) => { $crate::log::write($crate::log::Level::Error, format_args!($($arg)*)) };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_is_case_insensitive_and_defaults_to_info() {
        // Assert
        assert_eq!(Level::parse("DEBUG"), Level::Debug);
        assert_eq!(Level::parse("Warn"), Level::Warn);
        assert_eq!(Level::parse("error"), Level::Error);
        assert_eq!(Level::parse("nonsense"), Level::Info);
        assert_eq!(Level::parse(""), Level::Info);
    }

    #[test]
    fn levels_order_by_severity() {
        // Assert
        assert!(Level::Debug < Level::Info);
        assert!(Level::Info < Level::Warn);
        assert!(Level::Warn < Level::Error);
    }

    #[test]
    fn write_before_init_is_a_noop() {
        // Act — must not panic or block.
        write(Level::Info, format_args!("not initialised yet"));

        // Assert
        assert_eq!(dropped_lines(), 0);
    }

    #[test]
    fn timestamp_has_fixed_shape() {
        // Act
        let ts = timestamp();

        // Assert — HH:MM:SS.mmm
        assert_eq!(ts.len(), 12);
        assert_eq!(&ts[2..3], ":");
        assert_eq!(&ts[5..6], ":");
        assert_eq!(&ts[8..9], ".");
    }
}
