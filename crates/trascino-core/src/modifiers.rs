//! Logical modifier state at the moment a hook callback fires.
//!
//! The OS updates its asynchronous key state only *after* a low-level
//! hook returns, so a snapshot is taken fresh on every event and never
//! cached. For keyboard events the event itself is authoritative for
//! the key it concerns; the snapshot covers everything else.

/// Down/up state of the four modifiers, sampled at event time.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ModifierSnapshot {
    pub win: bool,
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
}

impl ModifierSnapshot {
    /// Win held with no other modifier — the chord that arms the move
    /// and resize gestures. Shift/Ctrl/Alt held before Win may mean
    /// something to another application, so those pass through.
    pub fn win_alone(&self) -> bool {
        self.win && !self.shift && !self.ctrl && !self.alt
    }

    /// Win held, Shift allowed, Ctrl/Alt absent — the chord for the
    /// z-order gestures, where Shift selects the variant.
    pub fn win_maybe_shift(&self) -> bool {
        self.win && !self.ctrl && !self.alt
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mods(win: bool, shift: bool, ctrl: bool, alt: bool) -> ModifierSnapshot {
        ModifierSnapshot {
            win,
            shift,
            ctrl,
            alt,
        }
    }

    #[test]
    fn win_alone_rejects_any_extra_modifier() {
        // Assert
        assert!(mods(true, false, false, false).win_alone());
        assert!(!mods(true, true, false, false).win_alone());
        assert!(!mods(true, false, true, false).win_alone());
        assert!(!mods(true, false, false, true).win_alone());
        assert!(!mods(false, false, false, false).win_alone());
    }

    #[test]
    fn win_maybe_shift_tolerates_shift_only() {
        // Assert
        assert!(mods(true, false, false, false).win_maybe_shift());
        assert!(mods(true, true, false, false).win_maybe_shift());
        assert!(!mods(true, false, true, false).win_maybe_shift());
        assert!(!mods(true, true, false, true).win_maybe_shift());
        assert!(!mods(false, true, false, false).win_maybe_shift());
    }
}
