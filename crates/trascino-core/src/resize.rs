//! Resize mathematics for the nine-zone model.
//!
//! Edge and corner zones drag their edges by the cursor delta and clamp
//! the moving edge against the learned minimum so the opposite (anchor)
//! edge never moves. The center zone resizes uniformly around the
//! window's center, optionally preserving the initial aspect ratio.

use std::sync::atomic::{AtomicI32, Ordering};

use crate::rect::{Point, Rect};
use crate::zone::Zone;

/// Floor for the learned minimum size at resize start. Windows that
/// allow smaller sizes simply stop shrinking here.
pub const MIN_SIZE_FLOOR: i32 = 300;

/// The per-window minimum size discovered empirically.
///
/// Seeded at [`MIN_SIZE_FLOOR`] when a resize gesture starts. When the
/// executor observes the OS clamping a requested size to something
/// larger, it raises these; the gesture engine picks the new values up
/// on the next mouse move. Values only ever grow within one gesture.
#[derive(Debug)]
pub struct LearnedMin {
    width: AtomicI32,
    height: AtomicI32,
}

impl LearnedMin {
    pub fn seeded() -> Self {
        Self {
            width: AtomicI32::new(MIN_SIZE_FLOOR),
            height: AtomicI32::new(MIN_SIZE_FLOOR),
        }
    }

    pub fn width(&self) -> i32 {
        self.width.load(Ordering::Relaxed)
    }

    pub fn height(&self) -> i32 {
        self.height.load(Ordering::Relaxed)
    }

    /// Raises the learned minimum width, never lowering it.
    pub fn raise_width(&self, w: i32) {
        self.width.fetch_max(w, Ordering::Relaxed);
    }

    /// Raises the learned minimum height, never lowering it.
    pub fn raise_height(&self, h: i32) {
        self.height.fetch_max(h, Ordering::Relaxed);
    }
}

/// Everything the executor needs to recompute a resize after the OS
/// clamps one: a value copy of the gesture's starting geometry plus the
/// shared learned minimum.
#[derive(Debug, Clone)]
pub struct ResizeGrip {
    pub start_pt: Point,
    pub start_rect: Rect,
    pub zone: Zone,
    /// Width divided by height of the window at gesture start.
    pub aspect: f64,
    pub respect_aspect: bool,
    pub min: std::sync::Arc<LearnedMin>,
}

impl ResizeGrip {
    /// Computes the target rectangle for the current cursor position.
    pub fn rect_for_cursor(&self, cursor: Point) -> Rect {
        resize_rect(
            self.start_rect,
            self.zone,
            self.aspect,
            self.respect_aspect,
            self.min.width(),
            self.min.height(),
            cursor.x - self.start_pt.x,
            cursor.y - self.start_pt.y,
        )
    }
}

/// Computes the resized rectangle for a cursor delta of `(dx, dy)`.
///
/// `aspect` is the width/height ratio captured at gesture start and is
/// only consulted for the center zone when `respect_aspect` is set.
#[allow(clippy::too_many_arguments)]
pub fn resize_rect(
    orig: Rect,
    zone: Zone,
    aspect: f64,
    respect_aspect: bool,
    min_w: i32,
    min_h: i32,
    dx: i32,
    dy: i32,
) -> Rect {
    if zone == Zone::Center {
        return center_resize(orig, aspect, respect_aspect, min_w, min_h, dx, dy);
    }

    let mut left = orig.left();
    let mut top = orig.top();
    let mut right = orig.right();
    let mut bottom = orig.bottom();

    if zone.moves_left() {
        left += dx;
    }
    if zone.moves_right() {
        right += dx;
    }
    if zone.moves_top() {
        top += dy;
    }
    if zone.moves_bottom() {
        bottom += dy;
    }

    // Clamp the moving edge so the anchor edge stays put.
    if zone.moves_left() && right - left < min_w {
        left = right - min_w;
    }
    if zone.moves_right() && right - left < min_w {
        right = left + min_w;
    }
    if zone.moves_top() && bottom - top < min_h {
        top = bottom - min_h;
    }
    if zone.moves_bottom() && bottom - top < min_h {
        bottom = top + min_h;
    }

    Rect::from_edges(left, top, right, bottom)
}

/// Uniform resize around the window center. The cursor delta counts
/// double because both sides grow.
fn center_resize(
    orig: Rect,
    aspect: f64,
    respect_aspect: bool,
    min_w: i32,
    min_h: i32,
    dx: i32,
    dy: i32,
) -> Rect {
    let (dw, dh) = if respect_aspect {
        if aspect >= 1.0 {
            let dw = dx * 2;
            (dw, (f64::from(dw) / aspect) as i32)
        } else {
            let dh = dy * 2;
            ((f64::from(dh) * aspect) as i32, dh)
        }
    } else {
        (dx * 2, dy * 2)
    };

    let mut w = orig.width + dw;
    let mut h = orig.height + dh;

    // Hitting a floor re-imposes the aspect ratio on the other axis.
    if w < min_w {
        w = min_w;
        if respect_aspect && aspect > 0.0 {
            h = (f64::from(w) / aspect) as i32;
        }
    }
    if h < min_h {
        h = min_h;
        if respect_aspect && aspect > 0.0 {
            w = (f64::from(h) * aspect) as i32;
        }
    }
    // The aspect correction above can push the other axis back under
    // its floor, so clamp both once more.
    w = w.max(min_w);
    h = h.max(min_h);

    Rect::new(
        orig.x + (orig.width - w) / 2,
        orig.y + (orig.height - h) / 2,
        w,
        h,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain(orig: Rect, zone: Zone, dx: i32, dy: i32) -> Rect {
        resize_rect(orig, zone, 1.0, false, MIN_SIZE_FLOOR, MIN_SIZE_FLOOR, dx, dy)
    }

    #[test]
    fn bottom_right_grows_both_axes() {
        // Act
        let r = plain(Rect::new(0, 0, 400, 400), Zone::BottomRight, 50, 70);

        // Assert — top-left anchor untouched
        assert_eq!(r, Rect::new(0, 0, 450, 470));
    }

    #[test]
    fn top_left_moves_origin_and_shrinks() {
        // Act
        let r = plain(Rect::new(100, 100, 400, 400), Zone::TopLeft, 30, 40);

        // Assert — bottom-right anchor stays at (500, 500)
        assert_eq!(r, Rect::new(130, 140, 370, 360));
        assert_eq!(r.right(), 500);
        assert_eq!(r.bottom(), 500);
    }

    #[test]
    fn edge_zones_touch_one_axis_only() {
        // Act
        let right = plain(Rect::new(0, 0, 400, 400), Zone::MidRight, -20, 999);
        let top = plain(Rect::new(0, 0, 400, 400), Zone::TopCenter, 999, 25);

        // Assert
        assert_eq!(right, Rect::new(0, 0, 380, 400));
        assert_eq!(top, Rect::new(0, 25, 400, 375));
    }

    #[test]
    fn shrink_clamps_moving_edge_and_keeps_anchor() {
        // Arrange — shrinking far past the minimum from the right edge.
        let orig = Rect::new(100, 100, 400, 400);

        // Act
        let r = plain(orig, Zone::MidRight, -350, 0);

        // Assert — the left (anchor) edge has not moved.
        assert_eq!(r.left(), 100);
        assert_eq!(r.width, MIN_SIZE_FLOOR);
    }

    #[test]
    fn shrink_from_left_keeps_right_anchor() {
        // Act
        let r = plain(Rect::new(100, 100, 400, 400), Zone::MidLeft, 350, 0);

        // Assert
        assert_eq!(r.right(), 500);
        assert_eq!(r.width, MIN_SIZE_FLOOR);
    }

    #[test]
    fn learned_minimum_overrides_requested_shrink() {
        // A window whose true minimum (350×200) has been learned:
        // dragging the bottom-right corner inward by (-100, -150) from
        // 400×300 must not request anything below the learned floor.
        let r = resize_rect(
            Rect::new(0, 0, 400, 300),
            Zone::BottomRight,
            400.0 / 300.0,
            false,
            350,
            200,
            -100,
            -150,
        );

        // Assert — anchor (0, 0) unchanged, size clamped to the minimum.
        assert_eq!(r, Rect::new(0, 0, 350, 200));
    }

    #[test]
    fn center_resize_grows_around_middle() {
        // Act — no aspect preservation, symmetric growth.
        let r = resize_rect(
            Rect::new(100, 100, 400, 400),
            Zone::Center,
            1.0,
            false,
            MIN_SIZE_FLOOR,
            MIN_SIZE_FLOOR,
            50,
            30,
        );

        // Assert — center stays at (300, 300).
        assert_eq!(r, Rect::new(50, 70, 500, 460));
        assert_eq!(r.center_x(), 300);
        assert_eq!(r.center_y(), 300);
    }

    #[test]
    fn center_resize_wide_window_is_width_driven() {
        // Arrange — 800×400, aspect 2.0. Width drives, dy is ignored.
        let r = resize_rect(
            Rect::new(0, 0, 800, 400),
            Zone::Center,
            2.0,
            true,
            MIN_SIZE_FLOOR,
            MIN_SIZE_FLOOR,
            100,
            -9999,
        );

        // Assert — dw = 200, dh = dw / aspect = 100.
        assert_eq!(r.width, 1000);
        assert_eq!(r.height, 500);
    }

    #[test]
    fn center_resize_tall_window_is_height_driven() {
        // Arrange — 400×800, aspect 0.5. Height drives, dx is ignored.
        let r = resize_rect(
            Rect::new(0, 0, 400, 800),
            Zone::Center,
            0.5,
            true,
            MIN_SIZE_FLOOR,
            MIN_SIZE_FLOOR,
            -9999,
            50,
        );

        // Assert — dh = 100, dw = dh * aspect = 50.
        assert_eq!(r.width, 450);
        assert_eq!(r.height, 900);
    }

    #[test]
    fn center_resize_floor_reimposes_aspect() {
        // Arrange — 600×300 (aspect 2.0) shrunk hard.
        let r = resize_rect(
            Rect::new(0, 0, 600, 300),
            Zone::Center,
            2.0,
            true,
            MIN_SIZE_FLOOR,
            MIN_SIZE_FLOOR,
            -400,
            0,
        );

        // Assert — height hit its floor and width follows the aspect,
        // then both respect the absolute floor.
        assert!(r.width >= MIN_SIZE_FLOOR);
        assert!(r.height >= MIN_SIZE_FLOOR);
    }

    #[test]
    fn learned_min_only_grows() {
        // Arrange
        let min = LearnedMin::seeded();

        // Act
        min.raise_width(520);
        min.raise_width(410);
        min.raise_height(100);

        // Assert
        assert_eq!(min.width(), 520);
        assert_eq!(min.height(), MIN_SIZE_FLOOR);
    }

    #[test]
    fn grip_tracks_learned_min_between_calls() {
        // Arrange
        let grip = ResizeGrip {
            start_pt: Point::new(400, 300),
            start_rect: Rect::new(0, 0, 400, 300),
            zone: Zone::BottomRight,
            aspect: 400.0 / 300.0,
            respect_aspect: false,
            min: std::sync::Arc::new(LearnedMin::seeded()),
        };
        // Seeded floor is 300×300, so height is already clamped at 300.
        let before = grip.rect_for_cursor(Point::new(300, 150));
        assert_eq!(before, Rect::new(0, 0, 300, 300));

        // Act — the executor learns that the window refuses < 350×200.
        grip.min.raise_width(350);

        // Assert — the same cursor now yields the learned width.
        let after = grip.rect_for_cursor(Point::new(300, 150));
        assert_eq!(after, Rect::new(0, 0, 350, 300));
    }
}
