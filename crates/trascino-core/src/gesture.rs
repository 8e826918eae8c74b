//! The gesture state machine.
//!
//! Runs entirely on the hook thread. Consumes low-level input events
//! plus a fresh [`ModifierSnapshot`] per event and drives the
//! Idle/Moving/Resizing machine. It performs no OS calls itself:
//! decisions come out as [`Effect`]s that the platform layer interprets
//! (queue a command and wake the worker, post a control message, take
//! or release mouse capture), and window queries go through the
//! [`Desktop`] trait so the whole machine is testable without a
//! desktop session.

use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::command::{Placement, WindowCommand};
use crate::modifiers::ModifierSnapshot;
use crate::rect::{Point, Rect};
use crate::resize::{LearnedMin, ResizeGrip};
use crate::settings::SharedSettings;
use crate::zone::Zone;

/// Minimum spacing between emitted window operations. Anything faster
/// than this outruns the compositor and is wasted work.
const EMIT_GAP: Duration = Duration::from_millis(10);

/// Spacing enforced by the optional move rate limit.
const MIN_MOVE_INTERVAL: Duration = Duration::from_millis(33);

const RATE_LOG_INTERVAL: Duration = Duration::from_secs(1);

/// Queries the gesture engine needs answered about the desktop.
///
/// The platform layer answers with real window-manager calls; tests
/// answer from a fixture.
pub trait Desktop {
    /// The top-level window under a screen point, if any.
    fn window_at(&self, at: Point) -> Option<usize>;

    /// The window's current bounding rectangle.
    fn window_rect(&self, hwnd: usize) -> Option<Rect>;

    fn is_maximized(&self, hwnd: usize) -> bool;

    /// Restores a maximized window so it can be dragged.
    fn restore(&self, hwnd: usize);

    fn is_foreground(&self, hwnd: usize) -> bool;

    /// The window currently holding foreground focus.
    fn foreground_window(&self) -> Option<usize>;
}

/// Which gesture, if any, is in progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureMode {
    Idle,
    Moving,
    Resizing,
}

/// The mouse buttons the grammar recognises.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

/// What the hook callback should do with the intercepted event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventDisposition {
    /// Return non-zero: the event never reaches applications.
    Swallow,
    /// Hand the event to the next hook in the chain.
    Forward,
}

/// A side effect requested by the state machine.
///
/// None of these run inside the hook callback itself beyond a
/// non-blocking queue push or a posted message.
#[derive(Debug, Clone)]
pub enum Effect {
    /// Ask the worker to inject the benign key tap that stops the
    /// shell from treating the current Win-hold as a solo press.
    PoisonSoloModifier,
    /// Take mouse capture so drag events keep arriving outside any
    /// window of ours.
    CaptureMouse,
    ReleaseMouseCapture,
    /// Enqueue a window command and wake the worker.
    Push(WindowCommand),
    /// Ask the worker to focus `hwnd`; `entry` is where the gesture
    /// started, for the click fallback.
    FocusWindow { hwnd: usize, entry: Point },
    /// Ask the worker to replay a swallowed Win-up preceded by the
    /// poison tap.
    ReplayWinUp { vk: u16 },
    /// Ask the worker to hide the size overlay.
    HideOverlay,
}

/// Gesture-scoped drag bookkeeping. Exists exactly while a gesture is
/// in progress; the hook thread is its only writer.
#[derive(Debug)]
struct DragState {
    start_pt: Point,
    start_rect: Rect,
    min: Arc<LearnedMin>,
    /// Set for resize gestures only.
    zone: Option<Zone>,
    aspect: f64,
}

/// Counters for the optional move rate limit.
#[derive(Debug, Default)]
struct MoveRateLimiter {
    last_post: Option<Instant>,
    last_pos: Option<(i32, i32)>,
    potential: u64,
    posted: u64,
    window_start: Option<Instant>,
}

impl MoveRateLimiter {
    /// Decides whether a move at `pos` should be posted. When the
    /// limiter is disabled every move posts and the counters stay
    /// cleared.
    fn should_post(
        &mut self,
        enabled: bool,
        log_rate: bool,
        pos: (i32, i32),
        now: Instant,
    ) -> bool {
        if !enabled {
            *self = Self::default();
            return true;
        }

        self.potential += 1;
        let moved = self.last_pos != Some(pos);
        let due = self
            .last_post
            .is_none_or(|t| now.duration_since(t) >= MIN_MOVE_INTERVAL);
        let will_post = moved && due;
        if will_post {
            self.posted += 1;
        }

        if log_rate {
            let start = *self.window_start.get_or_insert(now);
            let elapsed = now.duration_since(start);
            if elapsed >= RATE_LOG_INTERVAL {
                let secs = elapsed.as_secs_f64();
                crate::log_info!(
                    "drag rate: {} potential / {} posted in {secs:.2}s ({:.1}/s / {:.1}/s)",
                    self.potential,
                    self.posted,
                    self.potential as f64 / secs,
                    self.posted as f64 / secs,
                );
                self.potential = 0;
                self.posted = 0;
                self.window_start = Some(now);
            }
        }

        if will_post {
            self.last_post = Some(now);
            self.last_pos = Some(pos);
        }
        will_post
    }
}

/// The Idle/Moving/Resizing machine. Single-writer: lives on the hook
/// thread; nothing else touches it.
pub struct GestureEngine {
    mode: GestureMode,
    target: Option<usize>,
    drag: Option<DragState>,
    /// Has the current Win-hold consumed at least one gesture? Cleared
    /// on Win-up and by hard resets.
    win_gesture_used: bool,
    settings: Arc<SharedSettings>,
    last_emit: Option<Instant>,
    limiter: MoveRateLimiter,
}

impl GestureEngine {
    pub fn new(settings: Arc<SharedSettings>) -> Self {
        Self {
            mode: GestureMode::Idle,
            target: None,
            drag: None,
            win_gesture_used: false,
            settings,
            last_emit: None,
            limiter: MoveRateLimiter::default(),
        }
    }

    pub fn mode(&self) -> GestureMode {
        self.mode
    }

    pub fn target(&self) -> Option<usize> {
        self.target
    }

    /// A button press from the mouse hook.
    pub fn on_button_down(
        &mut self,
        button: MouseButton,
        at: Point,
        mods: ModifierSnapshot,
        now: Instant,
        desktop: &impl Desktop,
        out: &mut Vec<Effect>,
    ) -> EventDisposition {
        match button {
            MouseButton::Left => self.on_left_down(at, mods, desktop, out),
            MouseButton::Right => self.on_right_down(at, mods, desktop, out),
            MouseButton::Middle => self.on_middle_down(at, mods, now, desktop, out),
        }
    }

    fn on_left_down(
        &mut self,
        at: Point,
        mods: ModifierSnapshot,
        desktop: &impl Desktop,
        out: &mut Vec<Effect>,
    ) -> EventDisposition {
        if !mods.win_alone() {
            return EventDisposition::Forward;
        }
        self.mark_gesture_used(out);

        let Some(want) = desktop.window_at(at) else {
            // Still swallow: the Win-hold was consumed, and letting the
            // press through would click whatever is under the cursor.
            // Any stale gesture ends here rather than chasing a target
            // that no longer exists under the pointer.
            crate::log_debug!("no window under cursor; move gesture skipped");
            self.soft_reset(true, out);
            return EventDisposition::Swallow;
        };

        match self.mode {
            GestureMode::Moving => {
                let Some(current) = self.target else {
                    self.panic_reset(out, "moving with no target window");
                    return EventDisposition::Swallow;
                };
                if current == want {
                    // Leftover gesture from before a session lock; the
                    // original anchor still applies.
                    crate::log_debug!("continuing drag of {want:#x} from its original anchor");
                    return EventDisposition::Swallow;
                }
                crate::log_info!(
                    "abandoning stale drag of {current:#x}, starting on {want:#x}"
                );
                self.soft_reset(true, out);
            }
            GestureMode::Resizing => {
                // A new gesture must pass through Idle first.
                self.soft_reset(true, out);
            }
            GestureMode::Idle => {}
        }

        if desktop.is_maximized(want) {
            desktop.restore(want);
        }
        let Some(rect) = desktop.window_rect(want) else {
            self.panic_reset(out, "target window vanished at drag start");
            return EventDisposition::Swallow;
        };

        self.drag = Some(DragState {
            start_pt: at,
            start_rect: rect,
            min: Arc::new(LearnedMin::seeded()),
            zone: None,
            aspect: 0.0,
        });
        self.target = Some(want);
        self.mode = GestureMode::Moving;
        out.push(Effect::CaptureMouse);

        if self.settings.focus_on_drag() && !desktop.is_foreground(want) {
            out.push(Effect::FocusWindow {
                hwnd: want,
                entry: at,
            });
        }
        EventDisposition::Swallow
    }

    fn on_right_down(
        &mut self,
        at: Point,
        mods: ModifierSnapshot,
        desktop: &impl Desktop,
        out: &mut Vec<Effect>,
    ) -> EventDisposition {
        if !mods.win_alone() {
            return EventDisposition::Forward;
        }
        self.mark_gesture_used(out);

        let Some(want) = desktop.window_at(at) else {
            return EventDisposition::Forward;
        };

        match self.mode {
            GestureMode::Resizing => {
                if self.target == Some(want) {
                    crate::log_debug!("continuing resize of {want:#x}");
                    return EventDisposition::Swallow;
                }
                self.soft_reset(true, out);
            }
            GestureMode::Moving => {
                self.soft_reset(true, out);
            }
            GestureMode::Idle => {}
        }

        let Some(rect) = desktop.window_rect(want) else {
            return EventDisposition::Forward;
        };
        let aspect = if rect.height > 0 {
            f64::from(rect.width) / f64::from(rect.height)
        } else {
            1.0
        };

        self.drag = Some(DragState {
            start_pt: at,
            start_rect: rect,
            min: Arc::new(LearnedMin::seeded()),
            zone: Some(Zone::from_point(at, rect)),
            aspect,
        });
        self.target = Some(want);
        self.mode = GestureMode::Resizing;
        out.push(Effect::CaptureMouse);
        EventDisposition::Swallow
    }

    fn on_middle_down(
        &mut self,
        at: Point,
        mods: ModifierSnapshot,
        now: Instant,
        desktop: &impl Desktop,
        out: &mut Vec<Effect>,
    ) -> EventDisposition {
        if !mods.win_maybe_shift() {
            return EventDisposition::Forward;
        }
        self.mark_gesture_used(out);

        if self.allow_emit(now) {
            let (hwnd, placement) = if mods.shift {
                // Bring the focused window to the front, wherever it is.
                (desktop.foreground_window(), Placement::Top)
            } else {
                // Send the window under the cursor to the back.
                (desktop.window_at(at), Placement::Bottom)
            };
            if let Some(hwnd) = hwnd {
                out.push(Effect::Push(WindowCommand::restack(hwnd, placement)));
            }
        }
        EventDisposition::Swallow
    }

    /// A button release from the mouse hook.
    pub fn on_button_up(
        &mut self,
        button: MouseButton,
        out: &mut Vec<Effect>,
    ) -> EventDisposition {
        match button {
            MouseButton::Left => {
                if self.mode == GestureMode::Moving {
                    if self.drag.is_none() {
                        self.panic_reset(out, "moving with no drag state at button release");
                        return EventDisposition::Forward;
                    }
                    self.soft_reset(true, out);
                    // The matching button-down was swallowed; an orphan
                    // release would act as a click on whatever the
                    // cursor is over (menus trigger on button-up).
                    return EventDisposition::Swallow;
                }
                EventDisposition::Forward
            }
            MouseButton::Right => {
                if self.mode == GestureMode::Resizing {
                    if self.drag.is_none() {
                        self.panic_reset(out, "resizing with no drag state at button release");
                        return EventDisposition::Forward;
                    }
                    self.soft_reset(true, out);
                    return EventDisposition::Swallow;
                }
                EventDisposition::Forward
            }
            MouseButton::Middle => EventDisposition::Forward,
        }
    }

    /// A cursor move from the mouse hook. Moves always pass through;
    /// swallowing them would freeze the pointer.
    pub fn on_mouse_move(
        &mut self,
        at: Point,
        mods: ModifierSnapshot,
        now: Instant,
        out: &mut Vec<Effect>,
    ) -> EventDisposition {
        match self.mode {
            GestureMode::Idle => EventDisposition::Forward,
            GestureMode::Moving => {
                self.on_drag_move(at, mods, now, out);
                EventDisposition::Forward
            }
            GestureMode::Resizing => {
                self.on_resize_move(at, mods, now, out);
                EventDisposition::Forward
            }
        }
    }

    fn on_drag_move(
        &mut self,
        at: Point,
        mods: ModifierSnapshot,
        now: Instant,
        out: &mut Vec<Effect>,
    ) {
        // Desync check: a privileged window or a session lock can eat
        // the Win-up we were waiting for. The async state is correct by
        // the time the next event we *do* see arrives.
        if !mods.win {
            crate::log_debug!("Win no longer held; ending drag");
            self.hard_reset(false, out);
            return;
        }
        let (Some(target), Some(drag)) = (self.target, self.drag.as_ref()) else {
            self.panic_reset(out, "drag move without target or drag state");
            return;
        };
        let start_rect = drag.start_rect;
        let start_pt = drag.start_pt;
        if !self.allow_emit(now) {
            return;
        }

        let new_x = start_rect.x + (at.x - start_pt.x);
        let new_y = start_rect.y + (at.y - start_pt.y);

        let enabled = self.settings.ratelimit_moves();
        let log_rate = self.settings.log_move_rate();
        if self
            .limiter
            .should_post(enabled, log_rate, (new_x, new_y), now)
        {
            out.push(Effect::Push(WindowCommand::translate(target, new_x, new_y)));
        }
    }

    fn on_resize_move(
        &mut self,
        at: Point,
        mods: ModifierSnapshot,
        now: Instant,
        out: &mut Vec<Effect>,
    ) {
        if !mods.win {
            crate::log_debug!("Win no longer held; ending resize");
            self.hard_reset(false, out);
            return;
        }
        let (Some(target), Some(drag)) = (self.target, self.drag.as_ref()) else {
            self.panic_reset(out, "resize move without target or drag state");
            return;
        };
        let Some(zone) = drag.zone else {
            self.panic_reset(out, "resize drag without a zone");
            return;
        };
        let start_pt = drag.start_pt;
        let start_rect = drag.start_rect;
        let aspect = drag.aspect;
        let min = drag.min.clone();
        if !self.allow_emit(now) {
            return;
        }

        let grip = ResizeGrip {
            start_pt,
            start_rect,
            zone,
            aspect,
            respect_aspect: self.settings.respect_aspect_ratio(),
            min,
        };
        let rect = grip.rect_for_cursor(at);
        out.push(Effect::Push(WindowCommand::resize(target, rect, grip)));
    }

    /// A Win key release seen by the keyboard hook. The event itself is
    /// authoritative: the async state still reports the key as down at
    /// this point.
    pub fn on_win_up(&mut self, vk: u16, out: &mut Vec<Effect>) -> EventDisposition {
        let mut disposition = EventDisposition::Forward;
        if self.win_gesture_used {
            // The genuine Win-up must not reach the shell before our
            // poison does; swallow it and have the worker replay
            // poison-then-Win-up in order.
            self.win_gesture_used = false;
            out.push(Effect::ReplayWinUp { vk });
            disposition = EventDisposition::Swallow;
        }
        if self.mode != GestureMode::Idle {
            self.soft_reset(true, out);
        }
        disposition
    }

    /// Normal gesture completion: clears the drag but keeps the
    /// Win-hold bookkeeping. Idempotent.
    pub fn soft_reset(&mut self, release_capture: bool, out: &mut Vec<Effect>) {
        let was_active = self.mode != GestureMode::Idle;
        self.mode = GestureMode::Idle;
        self.target = None;
        self.drag = None;
        if was_active {
            if release_capture {
                out.push(Effect::ReleaseMouseCapture);
            }
            out.push(Effect::HideOverlay);
        }
    }

    /// Soft reset plus forgetting the Win-hold. Used when the hold
    /// itself ended behind our back (session unlock, focus loss). If
    /// Win is still physically down and a gesture already fired, the
    /// poison is re-requested so the pending Win-up stays harmless.
    pub fn hard_reset(&mut self, win_still_down: bool, out: &mut Vec<Effect>) {
        if self.win_gesture_used && win_still_down {
            out.push(Effect::PoisonSoloModifier);
        }
        self.win_gesture_used = false;
        self.soft_reset(true, out);
    }

    fn panic_reset(&mut self, out: &mut Vec<Effect>, context: &str) {
        debug_assert!(false, "gesture state anomaly: {context}");
        crate::log_error!("gesture state anomaly: {context}; resetting");
        self.win_gesture_used = false;
        self.soft_reset(true, out);
    }

    /// First gesture of this Win-hold poisons the hold eagerly, before
    /// the shell gets a chance to see the eventual Win-up as solo.
    fn mark_gesture_used(&mut self, out: &mut Vec<Effect>) {
        if !self.win_gesture_used {
            self.win_gesture_used = true;
            out.push(Effect::PoisonSoloModifier);
        }
    }

    fn allow_emit(&mut self, now: Instant) -> bool {
        if self.last_emit.is_none_or(|t| now.duration_since(t) >= EMIT_GAP) {
            self.last_emit = Some(now);
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::Settings;
    use std::cell::RefCell;

    /// In-memory desktop fixture.
    struct FakeDesktop {
        windows: Vec<(usize, Rect)>,
        foreground: Option<usize>,
        maximized: Vec<usize>,
        restored: RefCell<Vec<usize>>,
    }

    impl FakeDesktop {
        fn one_window(hwnd: usize, rect: Rect) -> Self {
            Self {
                windows: vec![(hwnd, rect)],
                foreground: Some(hwnd),
                maximized: Vec::new(),
                restored: RefCell::new(Vec::new()),
            }
        }
    }

    impl Desktop for FakeDesktop {
        fn window_at(&self, at: Point) -> Option<usize> {
            self.windows
                .iter()
                .find(|(_, r)| r.contains(at))
                .map(|(h, _)| *h)
        }

        fn window_rect(&self, hwnd: usize) -> Option<Rect> {
            self.windows
                .iter()
                .find(|(h, _)| *h == hwnd)
                .map(|(_, r)| *r)
        }

        fn is_maximized(&self, hwnd: usize) -> bool {
            self.maximized.contains(&hwnd)
        }

        fn restore(&self, hwnd: usize) {
            self.restored.borrow_mut().push(hwnd);
        }

        fn is_foreground(&self, hwnd: usize) -> bool {
            self.foreground == Some(hwnd)
        }

        fn foreground_window(&self) -> Option<usize> {
            self.foreground
        }
    }

    fn engine() -> GestureEngine {
        GestureEngine::new(SharedSettings::new(&Settings::default()))
    }

    fn engine_with(settings: Settings) -> GestureEngine {
        GestureEngine::new(SharedSettings::new(&settings))
    }

    fn win() -> ModifierSnapshot {
        ModifierSnapshot {
            win: true,
            ..Default::default()
        }
    }

    fn win_shift() -> ModifierSnapshot {
        ModifierSnapshot {
            win: true,
            shift: true,
            ..Default::default()
        }
    }

    fn no_mods() -> ModifierSnapshot {
        ModifierSnapshot::default()
    }

    fn pushes(effects: &[Effect]) -> Vec<&WindowCommand> {
        effects
            .iter()
            .filter_map(|e| match e {
                Effect::Push(cmd) => Some(cmd),
                _ => None,
            })
            .collect()
    }

    fn has_poison(effects: &[Effect]) -> bool {
        effects
            .iter()
            .any(|e| matches!(e, Effect::PoisonSoloModifier))
    }

    #[test]
    fn plain_move_end_to_end() {
        // Arrange — window at (100,100) sized 500×400, already focused.
        let desktop = FakeDesktop::one_window(0xA, Rect::new(100, 100, 500, 400));
        let mut engine = engine();
        let t0 = Instant::now();
        let mut fx = Vec::new();

        // Act — Win+LMB at (250,150).
        let d = engine.on_button_down(
            MouseButton::Left,
            Point::new(250, 150),
            win(),
            t0,
            &desktop,
            &mut fx,
        );

        // Assert — swallowed, poisoned, captured, no focus request
        // (window is already foreground).
        assert_eq!(d, EventDisposition::Swallow);
        assert_eq!(engine.mode(), GestureMode::Moving);
        assert!(has_poison(&fx));
        assert!(fx.iter().any(|e| matches!(e, Effect::CaptureMouse)));
        assert!(!fx.iter().any(|e| matches!(e, Effect::FocusWindow { .. })));

        // Act — drag to (300,200).
        fx.clear();
        let d = engine.on_mouse_move(
            Point::new(300, 200),
            win(),
            t0 + Duration::from_millis(50),
            &mut fx,
        );

        // Assert — a move command with the new top-left (150,150),
        // passed through so the cursor keeps moving.
        assert_eq!(d, EventDisposition::Forward);
        let cmds = pushes(&fx);
        assert_eq!(cmds.len(), 1);
        assert_eq!((cmds[0].x, cmds[0].y), (150, 150));
        assert!(!cmds[0].changes_size());

        // Act — release LMB.
        fx.clear();
        let d = engine.on_button_up(MouseButton::Left, &mut fx);

        // Assert — swallowed, capture released, back to Idle.
        assert_eq!(d, EventDisposition::Swallow);
        assert_eq!(engine.mode(), GestureMode::Idle);
        assert!(fx.iter().any(|e| matches!(e, Effect::ReleaseMouseCapture)));

        // Act — release Win. The gesture consumed this hold, so the
        // genuine Win-up is swallowed and replayed poisoned.
        fx.clear();
        let d = engine.on_win_up(0x5B, &mut fx);
        assert_eq!(d, EventDisposition::Swallow);
        assert!(fx.iter().any(|e| matches!(e, Effect::ReplayWinUp { vk: 0x5B })));
    }

    #[test]
    fn extra_modifier_passes_event_through() {
        // Arrange
        let desktop = FakeDesktop::one_window(0xA, Rect::new(0, 0, 400, 300));
        let mut engine = engine();
        let mut fx = Vec::new();

        // Act — Shift was held before Win; the chord belongs to apps.
        let d = engine.on_button_down(
            MouseButton::Left,
            Point::new(50, 50),
            win_shift(),
            Instant::now(),
            &desktop,
            &mut fx,
        );

        // Assert
        assert_eq!(d, EventDisposition::Forward);
        assert_eq!(engine.mode(), GestureMode::Idle);
        assert!(fx.is_empty());
    }

    #[test]
    fn no_window_under_cursor_swallows_but_starts_nothing() {
        // Arrange — cursor over empty desktop.
        let desktop = FakeDesktop::one_window(0xA, Rect::new(0, 0, 100, 100));
        let mut engine = engine();
        let mut fx = Vec::new();

        // Act
        let d = engine.on_button_down(
            MouseButton::Left,
            Point::new(5000, 5000),
            win(),
            Instant::now(),
            &desktop,
            &mut fx,
        );

        // Assert — button eaten (the Win-hold was consumed) but no
        // gesture state was created.
        assert_eq!(d, EventDisposition::Swallow);
        assert_eq!(engine.mode(), GestureMode::Idle);
        assert!(has_poison(&fx));
        assert!(!fx.iter().any(|e| matches!(e, Effect::CaptureMouse)));
    }

    #[test]
    fn poison_fires_once_per_win_hold() {
        // Arrange
        let desktop = FakeDesktop::one_window(0xA, Rect::new(0, 0, 400, 300));
        let mut engine = engine();
        let t0 = Instant::now();
        let mut fx = Vec::new();

        // Act — two gestures within one Win-hold.
        engine.on_button_down(MouseButton::Left, Point::new(10, 10), win(), t0, &desktop, &mut fx);
        engine.on_button_up(MouseButton::Left, &mut fx);
        let first_poisons = fx.iter().filter(|e| matches!(e, Effect::PoisonSoloModifier)).count();

        fx.clear();
        engine.on_button_down(
            MouseButton::Left,
            Point::new(10, 10),
            win(),
            t0 + Duration::from_millis(100),
            &desktop,
            &mut fx,
        );

        // Assert
        assert_eq!(first_poisons, 1);
        assert!(!has_poison(&fx));
    }

    #[test]
    fn unfocused_target_requests_focus_at_entry_point() {
        // Arrange — target is not the foreground window.
        let mut desktop = FakeDesktop::one_window(0xA, Rect::new(0, 0, 400, 300));
        desktop.foreground = Some(0xB);
        let mut engine = engine();
        let mut fx = Vec::new();

        // Act
        engine.on_button_down(
            MouseButton::Left,
            Point::new(42, 24),
            win(),
            Instant::now(),
            &desktop,
            &mut fx,
        );

        // Assert
        assert!(fx.iter().any(|e| matches!(
            e,
            Effect::FocusWindow { hwnd: 0xA, entry } if *entry == Point::new(42, 24)
        )));
    }

    #[test]
    fn focus_on_drag_toggle_suppresses_focus_request() {
        // Arrange
        let mut desktop = FakeDesktop::one_window(0xA, Rect::new(0, 0, 400, 300));
        desktop.foreground = Some(0xB);
        let mut engine = engine_with(Settings {
            focus_on_drag: false,
            ..Default::default()
        });
        let mut fx = Vec::new();

        // Act
        engine.on_button_down(
            MouseButton::Left,
            Point::new(10, 10),
            win(),
            Instant::now(),
            &desktop,
            &mut fx,
        );

        // Assert
        assert!(!fx.iter().any(|e| matches!(e, Effect::FocusWindow { .. })));
    }

    #[test]
    fn maximized_target_is_restored_before_rect_capture() {
        // Arrange
        let mut desktop = FakeDesktop::one_window(0xA, Rect::new(0, 0, 1920, 1080));
        desktop.maximized.push(0xA);
        let mut engine = engine();
        let mut fx = Vec::new();

        // Act
        engine.on_button_down(
            MouseButton::Left,
            Point::new(100, 100),
            win(),
            Instant::now(),
            &desktop,
            &mut fx,
        );

        // Assert
        assert_eq!(*desktop.restored.borrow(), vec![0xA]);
        assert_eq!(engine.mode(), GestureMode::Moving);
    }

    #[test]
    fn emit_gap_coalesces_bursty_moves() {
        // Arrange
        let desktop = FakeDesktop::one_window(0xA, Rect::new(0, 0, 400, 300));
        let mut engine = engine();
        let t0 = Instant::now();
        let mut fx = Vec::new();
        engine.on_button_down(MouseButton::Left, Point::new(10, 10), win(), t0, &desktop, &mut fx);

        // Act — three moves 5 ms apart; only the first and third clear
        // the 10 ms gate.
        fx.clear();
        engine.on_mouse_move(Point::new(11, 10), win(), t0 + Duration::from_millis(12), &mut fx);
        engine.on_mouse_move(Point::new(12, 10), win(), t0 + Duration::from_millis(17), &mut fx);
        engine.on_mouse_move(Point::new(13, 10), win(), t0 + Duration::from_millis(23), &mut fx);

        // Assert
        assert_eq!(pushes(&fx).len(), 2);
    }

    #[test]
    fn move_rate_limit_dedupes_and_spaces_posts() {
        // Arrange
        let desktop = FakeDesktop::one_window(0xA, Rect::new(0, 0, 400, 300));
        let mut engine = engine_with(Settings {
            ratelimit_moves: true,
            ..Default::default()
        });
        let t0 = Instant::now();
        let mut fx = Vec::new();
        engine.on_button_down(MouseButton::Left, Point::new(10, 10), win(), t0, &desktop, &mut fx);

        // Act — first move posts; a second 12 ms later (new position)
        // is inside the 33 ms window and is suppressed; a third past
        // the window posts again; a fourth with the same position is
        // deduplicated.
        fx.clear();
        engine.on_mouse_move(Point::new(20, 10), win(), t0 + Duration::from_millis(15), &mut fx);
        engine.on_mouse_move(Point::new(30, 10), win(), t0 + Duration::from_millis(27), &mut fx);
        engine.on_mouse_move(Point::new(40, 10), win(), t0 + Duration::from_millis(60), &mut fx);
        engine.on_mouse_move(Point::new(40, 10), win(), t0 + Duration::from_millis(100), &mut fx);

        // Assert — new top-left x = start_rect.x + dx.
        let cmds = pushes(&fx);
        assert_eq!(cmds.len(), 2);
        assert_eq!(cmds[0].x, 10);
        assert_eq!(cmds[1].x, 30);
    }

    #[test]
    fn win_release_mid_drag_hard_resets_and_allows_fresh_gesture() {
        // Arrange — two windows; a drag of the first is in progress.
        let mut desktop = FakeDesktop::one_window(0xA, Rect::new(0, 0, 400, 300));
        desktop.windows.push((0xB, Rect::new(1000, 0, 400, 300)));
        let mut engine = engine();
        let t0 = Instant::now();
        let mut fx = Vec::new();
        engine.on_button_down(MouseButton::Left, Point::new(10, 10), win(), t0, &desktop, &mut fx);

        // Act — session unlock: the first event we see has Win up.
        fx.clear();
        let d = engine.on_mouse_move(
            Point::new(50, 50),
            no_mods(),
            t0 + Duration::from_millis(20),
            &mut fx,
        );

        // Assert — hard reset: capture released, no command emitted,
        // and the Win-hold bookkeeping is forgotten (Win was up, so no
        // re-poison either).
        assert_eq!(d, EventDisposition::Forward);
        assert_eq!(engine.mode(), GestureMode::Idle);
        assert!(pushes(&fx).is_empty());
        assert!(!has_poison(&fx));
        assert!(fx.iter().any(|e| matches!(e, Effect::ReleaseMouseCapture)));

        // Act — a fresh Win+LMB on the *other* window starts a new
        // gesture targeting it, not the original.
        fx.clear();
        engine.on_button_down(
            MouseButton::Left,
            Point::new(1100, 100),
            win(),
            t0 + Duration::from_millis(40),
            &desktop,
            &mut fx,
        );
        fx.clear();
        engine.on_mouse_move(
            Point::new(1110, 110),
            win(),
            t0 + Duration::from_millis(60),
            &mut fx,
        );

        // Assert
        assert_eq!(engine.target(), Some(0xB));
        let cmds = pushes(&fx);
        assert_eq!(cmds[0].hwnd, 0xB);
        assert_eq!((cmds[0].x, cmds[0].y), (1010, 10));
    }

    #[test]
    fn stale_gesture_same_window_is_a_noop_continuation() {
        // Arrange
        let desktop = FakeDesktop::one_window(0xA, Rect::new(0, 0, 400, 300));
        let mut engine = engine();
        let t0 = Instant::now();
        let mut fx = Vec::new();
        engine.on_button_down(MouseButton::Left, Point::new(10, 10), win(), t0, &desktop, &mut fx);

        // Act — LMB-down again on the same window mid-gesture.
        fx.clear();
        let d = engine.on_button_down(
            MouseButton::Left,
            Point::new(20, 20),
            win(),
            t0 + Duration::from_millis(20),
            &desktop,
            &mut fx,
        );

        // Assert — swallowed, no second capture, anchor unchanged.
        assert_eq!(d, EventDisposition::Swallow);
        assert!(!fx.iter().any(|e| matches!(e, Effect::CaptureMouse)));
        assert_eq!(engine.mode(), GestureMode::Moving);
    }

    #[test]
    fn stale_gesture_different_window_restarts_cleanly() {
        // Arrange
        let mut desktop = FakeDesktop::one_window(0xA, Rect::new(0, 0, 400, 300));
        desktop.windows.push((0xB, Rect::new(1000, 0, 400, 300)));
        let mut engine = engine();
        let t0 = Instant::now();
        let mut fx = Vec::new();
        engine.on_button_down(MouseButton::Left, Point::new(10, 10), win(), t0, &desktop, &mut fx);

        // Act
        fx.clear();
        let d = engine.on_button_down(
            MouseButton::Left,
            Point::new(1100, 100),
            win(),
            t0 + Duration::from_millis(20),
            &desktop,
            &mut fx,
        );

        // Assert — old capture released, new gesture targets B.
        assert_eq!(d, EventDisposition::Swallow);
        assert!(fx.iter().any(|e| matches!(e, Effect::ReleaseMouseCapture)));
        assert!(fx.iter().any(|e| matches!(e, Effect::CaptureMouse)));
        assert_eq!(engine.target(), Some(0xB));
    }

    #[test]
    fn resize_bottom_right_emits_clamped_commands() {
        // Arrange — spec scenario: window (0,0,400,300), cursor enters
        // the bottom-right zone.
        let desktop = FakeDesktop::one_window(0xA, Rect::new(0, 0, 400, 300));
        let mut engine = engine();
        let t0 = Instant::now();
        let mut fx = Vec::new();

        // Act — Win+RMB at (390,290), then drag inward by (-100,-150).
        let d = engine.on_button_down(
            MouseButton::Right,
            Point::new(390, 290),
            win(),
            t0,
            &desktop,
            &mut fx,
        );
        assert_eq!(d, EventDisposition::Swallow);
        assert_eq!(engine.mode(), GestureMode::Resizing);

        fx.clear();
        engine.on_mouse_move(
            Point::new(290, 140),
            win(),
            t0 + Duration::from_millis(20),
            &mut fx,
        );

        // Assert — the request is clamped against the seeded 300×300
        // floor; the (0,0) anchor is untouched.
        let cmds = pushes(&fx);
        assert_eq!(cmds.len(), 1);
        assert_eq!((cmds[0].x, cmds[0].y), (0, 0));
        assert_eq!((cmds[0].w, cmds[0].h), (300, 300));
        assert!(cmds[0].grip.is_some());
    }

    #[test]
    fn executor_learned_minimum_reaches_next_resize_command() {
        // Arrange — a resize in progress.
        let desktop = FakeDesktop::one_window(0xA, Rect::new(0, 0, 400, 300));
        let mut engine = engine();
        let t0 = Instant::now();
        let mut fx = Vec::new();
        engine.on_button_down(MouseButton::Right, Point::new(390, 290), win(), t0, &desktop, &mut fx);

        fx.clear();
        engine.on_mouse_move(Point::new(290, 140), win(), t0 + Duration::from_millis(20), &mut fx);
        let first = pushes(&fx)[0].clone();

        // Act — the executor observes the OS clamp width to 350 and
        // raises the shared learned minimum.
        first.grip.as_ref().unwrap().min.raise_width(350);

        fx.clear();
        engine.on_mouse_move(Point::new(290, 140), win(), t0 + Duration::from_millis(40), &mut fx);

        // Assert — the next command never requests below the learned
        // minimum, so the anchor cannot slide again.
        let second = pushes(&fx)[0];
        assert_eq!(second.w, 350);
        assert_eq!((second.x, second.y), (0, 0));
    }

    #[test]
    fn resize_ends_on_right_button_up_with_overlay_hidden() {
        // Arrange
        let desktop = FakeDesktop::one_window(0xA, Rect::new(0, 0, 400, 300));
        let mut engine = engine();
        let mut fx = Vec::new();
        engine.on_button_down(
            MouseButton::Right,
            Point::new(390, 290),
            win(),
            Instant::now(),
            &desktop,
            &mut fx,
        );

        // Act
        fx.clear();
        let d = engine.on_button_up(MouseButton::Right, &mut fx);

        // Assert
        assert_eq!(d, EventDisposition::Swallow);
        assert_eq!(engine.mode(), GestureMode::Idle);
        assert!(fx.iter().any(|e| matches!(e, Effect::HideOverlay)));
        assert!(fx.iter().any(|e| matches!(e, Effect::ReleaseMouseCapture)));
    }

    #[test]
    fn send_to_back_targets_window_under_cursor() {
        // Arrange
        let mut desktop = FakeDesktop::one_window(0xA, Rect::new(0, 0, 400, 300));
        desktop.foreground = Some(0xC);
        let mut engine = engine();
        let mut fx = Vec::new();

        // Act — Win+MMB over A.
        let d = engine.on_button_down(
            MouseButton::Middle,
            Point::new(10, 10),
            win(),
            Instant::now(),
            &desktop,
            &mut fx,
        );

        // Assert — one z-order command: A to the bottom, no activation.
        assert_eq!(d, EventDisposition::Swallow);
        let cmds = pushes(&fx);
        assert_eq!(cmds.len(), 1);
        assert_eq!(cmds[0].hwnd, 0xA);
        assert_eq!(cmds[0].placement, Placement::Bottom);
        assert!(cmds[0].flags.no_activate);
        assert_eq!(engine.mode(), GestureMode::Idle);
    }

    #[test]
    fn bring_to_front_targets_foreground_window() {
        // Arrange — A holds focus but sits beneath other windows; the
        // cursor is over empty space.
        let mut desktop = FakeDesktop::one_window(0xA, Rect::new(0, 0, 400, 300));
        desktop.foreground = Some(0xA);
        let mut engine = engine();
        let mut fx = Vec::new();

        // Act — Win+Shift+MMB.
        let d = engine.on_button_down(
            MouseButton::Middle,
            Point::new(5000, 5000),
            win_shift(),
            Instant::now(),
            &desktop,
            &mut fx,
        );

        // Assert — A goes to the top; activation not suppressed since A
        // already owns focus.
        assert_eq!(d, EventDisposition::Swallow);
        let cmds = pushes(&fx);
        assert_eq!(cmds[0].hwnd, 0xA);
        assert_eq!(cmds[0].placement, Placement::Top);
        assert!(!cmds[0].flags.no_activate);
    }

    #[test]
    fn middle_button_with_ctrl_or_alt_passes_through() {
        // Arrange
        let desktop = FakeDesktop::one_window(0xA, Rect::new(0, 0, 400, 300));
        let mut engine = engine();
        let mut fx = Vec::new();
        let mods = ModifierSnapshot {
            win: true,
            ctrl: true,
            ..Default::default()
        };

        // Act
        let d = engine.on_button_down(
            MouseButton::Middle,
            Point::new(10, 10),
            mods,
            Instant::now(),
            &desktop,
            &mut fx,
        );

        // Assert
        assert_eq!(d, EventDisposition::Forward);
        assert!(fx.is_empty());
    }

    #[test]
    fn win_up_without_gesture_opens_shell_menu() {
        // Arrange — plain Win press-release, no gesture in between.
        let mut engine = engine();
        let mut fx = Vec::new();

        // Act
        let d = engine.on_win_up(0x5B, &mut fx);

        // Assert — passed through untouched so the shell menu opens
        // exactly as if we were absent.
        assert_eq!(d, EventDisposition::Forward);
        assert!(fx.is_empty());
    }

    #[test]
    fn soft_reset_is_idempotent() {
        // Arrange
        let desktop = FakeDesktop::one_window(0xA, Rect::new(0, 0, 400, 300));
        let mut engine = engine();
        let mut fx = Vec::new();
        engine.on_button_down(
            MouseButton::Left,
            Point::new(10, 10),
            win(),
            Instant::now(),
            &desktop,
            &mut fx,
        );

        // Act
        fx.clear();
        engine.soft_reset(true, &mut fx);
        let first = fx.len();
        fx.clear();
        engine.soft_reset(true, &mut fx);

        // Assert — the second reset emits nothing.
        assert!(first > 0);
        assert!(fx.is_empty());
        assert_eq!(engine.mode(), GestureMode::Idle);
    }

    #[test]
    fn idle_button_up_passes_through() {
        // Arrange
        let mut engine = engine();
        let mut fx = Vec::new();

        // Act + Assert
        assert_eq!(
            engine.on_button_up(MouseButton::Left, &mut fx),
            EventDisposition::Forward
        );
        assert_eq!(
            engine.on_button_up(MouseButton::Right, &mut fx),
            EventDisposition::Forward
        );
        assert!(fx.is_empty());
    }

    #[test]
    fn left_release_during_resize_does_not_disturb_the_gesture() {
        // Arrange — resize in progress; the user taps LMB by accident.
        let desktop = FakeDesktop::one_window(0xA, Rect::new(0, 0, 400, 300));
        let mut engine = engine();
        let mut fx = Vec::new();
        engine.on_button_down(
            MouseButton::Right,
            Point::new(390, 290),
            win(),
            Instant::now(),
            &desktop,
            &mut fx,
        );

        // Act
        fx.clear();
        let d = engine.on_button_up(MouseButton::Left, &mut fx);

        // Assert — passthrough, resize still active.
        assert_eq!(d, EventDisposition::Forward);
        assert_eq!(engine.mode(), GestureMode::Resizing);
        assert!(fx.is_empty());
    }

    #[test]
    fn win_up_mid_gesture_resets_and_replays() {
        // Arrange
        let desktop = FakeDesktop::one_window(0xA, Rect::new(0, 0, 400, 300));
        let mut engine = engine();
        let mut fx = Vec::new();
        engine.on_button_down(
            MouseButton::Left,
            Point::new(10, 10),
            win(),
            Instant::now(),
            &desktop,
            &mut fx,
        );

        // Act — keyboard hook sees the genuine Win-up while dragging.
        fx.clear();
        let d = engine.on_win_up(0x5C, &mut fx);

        // Assert
        assert_eq!(d, EventDisposition::Swallow);
        assert_eq!(engine.mode(), GestureMode::Idle);
        assert!(fx.iter().any(|e| matches!(e, Effect::ReplayWinUp { vk: 0x5C })));
        assert!(fx.iter().any(|e| matches!(e, Effect::ReleaseMouseCapture)));
    }
}
