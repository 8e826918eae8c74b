//! Window commands crossing from the hook thread to the worker.
//!
//! A command is a value copy — no pointers cross the thread boundary.
//! The platform layer translates these into a single set-window-position
//! call.

use crate::resize::ResizeGrip;

/// Where to place the window in the z-order.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// Leave the stacking order alone.
    #[default]
    Unchanged,
    /// Put the window above all non-topmost windows.
    Top,
    /// Put the window beneath every other window.
    Bottom,
}

/// Behavioral flags for the set-window-position call.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CommandFlags {
    pub no_size: bool,
    pub no_move: bool,
    pub no_activate: bool,
    pub no_zorder: bool,
    pub async_pos: bool,
}

impl CommandFlags {
    /// A translation: size and z-order untouched, no activation, and
    /// asynchronous so a hung target cannot stall the worker.
    pub const MOVE: Self = Self {
        no_size: true,
        no_move: false,
        no_activate: true,
        no_zorder: true,
        async_pos: true,
    };

    /// A combined move+size. Not asynchronous: the executor reads the
    /// resulting rectangle back to detect clamping.
    pub const RESIZE: Self = Self {
        no_size: false,
        no_move: false,
        no_activate: true,
        no_zorder: true,
        async_pos: false,
    };

    /// Send-to-bottom: position and size untouched, no activation.
    pub const TO_BOTTOM: Self = Self {
        no_size: true,
        no_move: true,
        no_activate: true,
        no_zorder: false,
        async_pos: false,
    };

    /// Bring-to-front. Activation allowed — the target is the window
    /// that already owns focus, so this cannot steal it.
    pub const TO_TOP: Self = Self {
        no_size: true,
        no_move: true,
        no_activate: false,
        no_zorder: false,
        async_pos: false,
    };
}

/// One queued window operation.
#[derive(Debug, Clone)]
pub struct WindowCommand {
    /// Raw handle of the target top-level window.
    pub hwnd: usize,
    pub x: i32,
    pub y: i32,
    /// New width; 0 together with `h == 0` means no size change.
    pub w: i32,
    pub h: i32,
    pub placement: Placement,
    pub flags: CommandFlags,
    /// Present on resize commands so the executor can relearn minimums
    /// and recompute the rectangle after an OS clamp.
    pub grip: Option<ResizeGrip>,
}

impl WindowCommand {
    /// A pure translation of `hwnd` to `(x, y)`.
    pub fn translate(hwnd: usize, x: i32, y: i32) -> Self {
        Self {
            hwnd,
            x,
            y,
            w: 0,
            h: 0,
            placement: Placement::Unchanged,
            flags: CommandFlags::MOVE,
            grip: None,
        }
    }

    /// A move+size command carrying its resize context.
    pub fn resize(hwnd: usize, rect: crate::Rect, grip: ResizeGrip) -> Self {
        Self {
            hwnd,
            x: rect.x,
            y: rect.y,
            w: rect.width,
            h: rect.height,
            placement: Placement::Unchanged,
            flags: CommandFlags::RESIZE,
            grip: Some(grip),
        }
    }

    /// A z-order change with position and size untouched.
    pub fn restack(hwnd: usize, placement: Placement) -> Self {
        let flags = match placement {
            Placement::Top => CommandFlags::TO_TOP,
            _ => CommandFlags::TO_BOTTOM,
        };
        Self {
            hwnd,
            x: 0,
            y: 0,
            w: 0,
            h: 0,
            placement,
            flags,
            grip: None,
        }
    }

    /// Whether this command changes the window's size.
    pub fn changes_size(&self) -> bool {
        self.w != 0 || self.h != 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn translate_keeps_size_and_zorder() {
        // Act
        let cmd = WindowCommand::translate(0x1234, 150, 150);

        // Assert
        assert!(!cmd.changes_size());
        assert!(cmd.flags.no_size && cmd.flags.no_zorder && cmd.flags.no_activate);
        assert_eq!(cmd.placement, Placement::Unchanged);
    }

    #[test]
    fn restack_to_top_allows_activation() {
        // Act
        let top = WindowCommand::restack(0x1, Placement::Top);
        let bottom = WindowCommand::restack(0x1, Placement::Bottom);

        // Assert
        assert!(!top.flags.no_activate);
        assert!(bottom.flags.no_activate);
        assert!(top.flags.no_move && top.flags.no_size);
        assert!(!top.flags.no_zorder && !bottom.flags.no_zorder);
    }

    #[test]
    fn resize_carries_its_grip() {
        // Arrange
        let grip = ResizeGrip {
            start_pt: crate::Point::new(0, 0),
            start_rect: crate::Rect::new(0, 0, 400, 300),
            zone: crate::Zone::BottomRight,
            aspect: 4.0 / 3.0,
            respect_aspect: true,
            min: std::sync::Arc::new(crate::LearnedMin::seeded()),
        };

        // Act
        let cmd = WindowCommand::resize(0x2, crate::Rect::new(0, 0, 350, 300), grip);

        // Assert
        assert!(cmd.changes_size());
        assert!(cmd.grip.is_some());
        assert!(!cmd.flags.no_size);
        assert!(cmd.flags.no_zorder);
    }
}
