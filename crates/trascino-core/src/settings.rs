//! User-facing settings.
//!
//! Settings live in memory for the process lifetime — there is no
//! config file and nothing is persisted. The CLI seeds the defaults,
//! and the tray menu flips the toggles at runtime through
//! [`SharedSettings`], which both threads read lock-free.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use serde::{Deserialize, Serialize};

use crate::log::LogConfig;

/// Startup configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Also focus the window being dragged if it is not foreground.
    pub focus_on_drag: bool,
    /// When thread-attach focusing fails, fall back to a synthetic
    /// left-click at the gesture's entry point. Off by default: the
    /// click can land on an interactive control under the cursor.
    pub click_to_focus_fallback: bool,
    /// Rate-limit posted move commands (less CPU, visibly choppier).
    pub ratelimit_moves: bool,
    /// Log the potential/actual move rate once a second while a
    /// rate-limited drag is in progress.
    pub log_move_rate: bool,
    /// Preserve the window's initial aspect ratio during center-zone
    /// resizes.
    pub respect_aspect_ratio: bool,
    pub logging: LogConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            focus_on_drag: true,
            click_to_focus_fallback: false,
            ratelimit_moves: false,
            log_move_rate: false,
            respect_aspect_ratio: true,
            logging: LogConfig::default(),
        }
    }
}

/// Runtime view of the toggles, shared between the hook thread (reads)
/// and the worker's tray menu (writes).
#[derive(Debug)]
pub struct SharedSettings {
    focus_on_drag: AtomicBool,
    click_to_focus_fallback: AtomicBool,
    ratelimit_moves: AtomicBool,
    log_move_rate: AtomicBool,
    respect_aspect_ratio: AtomicBool,
}

impl SharedSettings {
    pub fn new(settings: &Settings) -> Arc<Self> {
        Arc::new(Self {
            focus_on_drag: AtomicBool::new(settings.focus_on_drag),
            click_to_focus_fallback: AtomicBool::new(settings.click_to_focus_fallback),
            ratelimit_moves: AtomicBool::new(settings.ratelimit_moves),
            log_move_rate: AtomicBool::new(settings.log_move_rate),
            respect_aspect_ratio: AtomicBool::new(settings.respect_aspect_ratio),
        })
    }

    pub fn focus_on_drag(&self) -> bool {
        self.focus_on_drag.load(Ordering::Relaxed)
    }

    pub fn click_to_focus_fallback(&self) -> bool {
        self.click_to_focus_fallback.load(Ordering::Relaxed)
    }

    pub fn ratelimit_moves(&self) -> bool {
        self.ratelimit_moves.load(Ordering::Relaxed)
    }

    pub fn log_move_rate(&self) -> bool {
        self.log_move_rate.load(Ordering::Relaxed)
    }

    pub fn respect_aspect_ratio(&self) -> bool {
        self.respect_aspect_ratio.load(Ordering::Relaxed)
    }

    pub fn toggle_focus_on_drag(&self) -> bool {
        toggle(&self.focus_on_drag)
    }

    pub fn toggle_click_to_focus_fallback(&self) -> bool {
        toggle(&self.click_to_focus_fallback)
    }

    pub fn toggle_ratelimit_moves(&self) -> bool {
        toggle(&self.ratelimit_moves)
    }

    pub fn toggle_log_move_rate(&self) -> bool {
        toggle(&self.log_move_rate)
    }
}

fn toggle(flag: &AtomicBool) -> bool {
    !flag.fetch_xor(true, Ordering::Relaxed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_shipping_behavior() {
        // Act
        let s = Settings::default();

        // Assert — the click fallback must default off, it is hazardous.
        assert!(s.focus_on_drag);
        assert!(!s.click_to_focus_fallback);
        assert!(!s.ratelimit_moves);
        assert!(!s.log_move_rate);
        assert!(s.respect_aspect_ratio);
    }

    #[test]
    fn toggle_flips_and_returns_new_value() {
        // Arrange
        let shared = SharedSettings::new(&Settings::default());

        // Act + Assert
        assert!(shared.toggle_ratelimit_moves());
        assert!(shared.ratelimit_moves());
        assert!(!shared.toggle_ratelimit_moves());
        assert!(!shared.ratelimit_moves());
    }
}
