//! The window-command executor.
//!
//! Runs on the worker thread inside the message loop. Drains the
//! command queue on every wake message, applies each command with one
//! set-window-position call, and handles the two realities the state
//! machine cannot see from its side: per-window minimum sizes that
//! only show up as OS clamping, and elevated targets that refuse input
//! from a lower-integrity process.

use std::time::{Duration, Instant};

use trascino_core::resize::ResizeGrip;
use trascino_core::{CommandReceiver, Rect, WindowCommand};

use windows::Win32::Foundation::ERROR_ACCESS_DENIED;

use crate::overlay::Overlay;
use crate::tray::TrayIcon;
use crate::window::{Window, cursor_pos};

/// Floor between consecutive window operations. Monitors run at
/// 60–144 Hz; driving the window manager faster than this burns CPU
/// for motion nobody can see.
const OP_GAP: Duration = Duration::from_millis(10);

pub struct Executor {
    receiver: CommandReceiver,
    last_op: Option<Instant>,
    /// The elevated-target notification fires once per process, not
    /// once per dropped command.
    denial_notified: bool,
}

impl Executor {
    pub fn new(receiver: CommandReceiver) -> Self {
        Self {
            receiver,
            last_op: None,
            denial_notified: false,
        }
    }

    /// Commands dropped and peak queue depth, for the shutdown report.
    pub fn stats(&self) -> (u64, u64) {
        let stats = self.receiver.stats();
        (stats.dropped(), stats.peak_depth())
    }

    /// Drains the queue to empty. Called on each wake message; the
    /// queue may well be empty again by the time a redundant wake
    /// arrives, which is fine.
    pub fn drain(&mut self, overlay: &Overlay, tray: &TrayIcon) {
        while let Some(cmd) = self.receiver.try_pop() {
            self.apply(&cmd, overlay, tray);
        }
    }

    fn apply(&mut self, cmd: &WindowCommand, overlay: &Overlay, tray: &TrayIcon) {
        if let Some(last) = self.last_op
            && last.elapsed() < OP_GAP
        {
            self.receiver.stats().count_drop();
            return;
        }

        let window = Window::from_raw(cmd.hwnd);
        match window.set_pos(cmd.x, cmd.y, cmd.w, cmd.h, cmd.placement, cmd.flags) {
            Err(e) => {
                trascino_core::log_warn!(
                    "SetWindowPos failed for {:#x}: {e}",
                    cmd.hwnd
                );
                if e.code() == ERROR_ACCESS_DENIED.to_hresult() && !self.denial_notified {
                    self.denial_notified = true;
                    tray.show_info(
                        "trascino",
                        "Cannot move or resize an elevated window (access denied). \
                         Run as administrator to manage it.",
                    );
                }
            }
            Ok(()) => {
                if cmd.changes_size()
                    && let Some(grip) = &cmd.grip
                {
                    self.settle_resize(&window, cmd, grip, overlay);
                }
            }
        }
        self.last_op = Some(Instant::now());
    }

    /// The anti-slide pass. If the OS clamped the requested size, the
    /// anchor edge slid by the difference: learn the real minimum,
    /// recompute against the live cursor, and re-issue so the anchor
    /// snaps back. Then refresh the overlay with whatever the window
    /// actually became.
    fn settle_resize(
        &mut self,
        window: &Window,
        cmd: &WindowCommand,
        grip: &ResizeGrip,
        overlay: &Overlay,
    ) {
        let Some(actual) = window.rect() else {
            trascino_core::log_warn!("window {:#x} vanished mid-resize", cmd.hwnd);
            return;
        };

        let mut clamped = false;
        if actual.width > cmd.w && actual.width > grip.min.width() {
            grip.min.raise_width(actual.width);
            clamped = true;
        }
        if actual.height > cmd.h && actual.height > grip.min.height() {
            grip.min.raise_height(actual.height);
            clamped = true;
        }

        let mut shown = Rect::new(cmd.x, cmd.y, cmd.w, cmd.h);
        if clamped
            && let Some(cursor) = cursor_pos()
        {
            let corrected = grip.rect_for_cursor(cursor);
            if let Err(e) = window.set_pos(
                corrected.x,
                corrected.y,
                corrected.width,
                corrected.height,
                cmd.placement,
                cmd.flags,
            ) {
                trascino_core::log_warn!(
                    "anchor correction failed for {:#x}: {e}",
                    cmd.hwnd
                );
            }
            shown = corrected;
        }

        overlay.update(shown, grip.start_rect.width, grip.start_rect.height);
    }
}
