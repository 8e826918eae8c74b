//! Per-monitor DPI awareness.

use windows::Win32::UI::HiDpi::{
    DPI_AWARENESS_CONTEXT_PER_MONITOR_AWARE_V2, PROCESS_PER_MONITOR_DPI_AWARE,
    SetProcessDpiAwareness, SetProcessDpiAwarenessContext,
};

/// Declares this process per-monitor DPI aware (V2), falling back to
/// the older per-monitor API on pre-1607 systems.
///
/// Without this, the OS rescales our coordinates against the primary
/// monitor's DPI and gestures land in the wrong place on mixed-DPI
/// setups. Must run before any window is created.
pub fn enable_dpi_awareness() {
    // SAFETY: both calls only flip process-wide flags; failure (e.g.
    // already set via manifest) is ignorable.
    unsafe {
        if SetProcessDpiAwarenessContext(DPI_AWARENESS_CONTEXT_PER_MONITOR_AWARE_V2).is_err() {
            let _ = SetProcessDpiAwareness(PROCESS_PER_MONITOR_DPI_AWARE);
        }
    }
}
