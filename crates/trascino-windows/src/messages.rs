//! Control messages posted to the worker's hidden window.
//!
//! The hook thread never performs window operations itself; it posts
//! one of these and returns. They go to the window, not the thread
//! queue: a nested menu loop drains window messages but discards
//! thread messages, and the wake-up must survive an open tray menu.

use windows::Win32::UI::WindowsAndMessaging::WM_USER;

/// Tray icon callback (version 4).
pub const WM_APP_TRAY: u32 = WM_USER + 2;

/// Replay a swallowed Win-up: poison tap, then the Win-up itself.
/// `wparam` carries the virtual key (left or right Win).
pub const WM_APP_REPLAY_WIN_UP: u32 = WM_USER + 100;

/// Focus the window in `wparam`; `lparam` packs the gesture entry
/// point for the click fallback.
pub const WM_APP_FOCUS_WINDOW: u32 = WM_USER + 101;

/// Inject the benign poison tap on its own (eager poisoning at gesture
/// start).
pub const WM_APP_POISON: u32 = WM_USER + 102;

/// A console control signal arrived; `wparam` carries the ctrl type.
pub const WM_APP_CONSOLE_SIGNAL: u32 = WM_USER + 150;

/// Wake-up: drain the command queue.
pub const WM_APP_DRAIN_COMMANDS: u32 = WM_USER + 200;

/// Hide the size overlay (gesture ended).
pub const WM_APP_HIDE_OVERLAY: u32 = WM_USER + 201;

/// Packs two signed 16-bit screen coordinates into one message
/// parameter, low word x, high word y.
///
/// Masking to 16 bits before shifting keeps the two's-complement bit
/// pattern of negative coordinates (left/top monitors in a multi-head
/// layout) without bleeding sign bits across words.
pub fn pack_coords(x: i32, y: i32) -> isize {
    (((y as u32 & 0xFFFF) << 16) | (x as u32 & 0xFFFF)) as i32 as isize
}

/// Inverse of [`pack_coords`]: recovers the signed coordinates.
pub fn unpack_coords(packed: isize) -> (i32, i32) {
    let v = packed as u32;
    let x = (v & 0xFFFF) as u16 as i16;
    let y = (v >> 16) as u16 as i16;
    (i32::from(x), i32::from(y))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_positive_coordinates() {
        // Act
        let (x, y) = unpack_coords(pack_coords(250, 150));

        // Assert
        assert_eq!((x, y), (250, 150));
    }

    #[test]
    fn round_trips_negative_coordinates() {
        // Monitors left of or above the primary produce negative
        // screen coordinates; the sign must survive the packing.
        let (x, y) = unpack_coords(pack_coords(-1920, -32));
        assert_eq!((x, y), (-1920, -32));
    }

    #[test]
    fn words_do_not_bleed_into_each_other() {
        // Act — a negative x must not corrupt y and vice versa.
        let (x1, y1) = unpack_coords(pack_coords(-1, 0));
        let (x2, y2) = unpack_coords(pack_coords(0, -1));

        // Assert
        assert_eq!((x1, y1), (-1, 0));
        assert_eq!((x2, y2), (0, -1));
    }

    #[test]
    fn message_codes_are_unique() {
        // Arrange
        let codes = [
            WM_APP_TRAY,
            WM_APP_REPLAY_WIN_UP,
            WM_APP_FOCUS_WINDOW,
            WM_APP_POISON,
            WM_APP_CONSOLE_SIGNAL,
            WM_APP_DRAIN_COMMANDS,
            WM_APP_HIDE_OVERLAY,
        ];

        // Assert
        for (i, a) in codes.iter().enumerate() {
            for b in &codes[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }
}
