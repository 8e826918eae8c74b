//! A thin wrapper around a Win32 `HWND` plus the desktop queries the
//! gesture engine needs.

use trascino_core::command::{CommandFlags, Placement};
use trascino_core::{Desktop, Point, Rect};

use windows::Win32::Foundation::{HWND, POINT, RECT};
use windows::Win32::UI::WindowsAndMessaging::{
    GA_ROOT, GWL_EXSTYLE, GWL_STYLE, GetAncestor, GetForegroundWindow, GetWindowLongPtrW,
    GetWindowRect, GetWindowThreadProcessId, HWND_BOTTOM, HWND_TOP, IsZoomed,
    SET_WINDOW_POS_FLAGS, SW_RESTORE, SWP_ASYNCWINDOWPOS, SWP_NOACTIVATE, SWP_NOMOVE,
    SWP_NOSIZE, SWP_NOZORDER, SetWindowPos, ShowWindow, WindowFromPoint,
};

/// A top-level window, wrapping a Win32 `HWND`.
///
/// `HWND` is an opaque handle; this struct holds it and queries the OS
/// lazily. Handles travel across threads as `usize` — the pointer
/// itself is just an identifier the OS owns.
#[derive(Debug, Clone, Copy)]
pub struct Window {
    hwnd: HWND,
}

impl Window {
    pub fn from_raw(handle: usize) -> Self {
        Self {
            hwnd: HWND(handle as *mut _),
        }
    }

    pub fn raw(&self) -> usize {
        self.hwnd.0 as usize
    }

    pub fn hwnd(&self) -> HWND {
        self.hwnd
    }

    /// The top-level window under a screen point, if any.
    ///
    /// `WindowFromPoint` can return a child control; `GetAncestor`
    /// walks up to the root so gestures always target the whole
    /// window.
    pub fn from_point(at: Point) -> Option<Self> {
        // SAFETY: both calls are pure queries over OS-owned state.
        unsafe {
            let hit = WindowFromPoint(POINT { x: at.x, y: at.y });
            if hit.is_invalid() {
                return None;
            }
            let root = GetAncestor(hit, GA_ROOT);
            if root.is_invalid() {
                None
            } else {
                Some(Self { hwnd: root })
            }
        }
    }

    pub fn rect(&self) -> Option<Rect> {
        let mut r = RECT::default();
        // SAFETY: GetWindowRect writes into our RECT on success.
        unsafe { GetWindowRect(self.hwnd, &mut r) }.ok()?;
        Some(Rect::from_edges(r.left, r.top, r.right, r.bottom))
    }

    /// Reads window-manager state without messaging the target, so a
    /// hung window cannot stall the caller.
    pub fn is_maximized(&self) -> bool {
        // SAFETY: IsZoomed is a pure query.
        unsafe { IsZoomed(self.hwnd) }.as_bool()
    }

    /// Restores a maximized window so it can be dragged freely.
    pub fn restore(&self) {
        // SAFETY: ShowWindow with a valid HWND is safe.
        unsafe {
            let _ = ShowWindow(self.hwnd, SW_RESTORE);
        }
    }

    pub fn is_foreground(&self) -> bool {
        // SAFETY: simple query.
        unsafe { GetForegroundWindow() } == self.hwnd
    }

    pub fn foreground() -> Option<Self> {
        // SAFETY: simple query.
        let hwnd = unsafe { GetForegroundWindow() };
        if hwnd.is_invalid() {
            None
        } else {
            Some(Self { hwnd })
        }
    }

    /// Window style bits (`GWL_STYLE`).
    pub fn style(&self) -> u32 {
        // SAFETY: GetWindowLongPtrW reads window data.
        (unsafe { GetWindowLongPtrW(self.hwnd, GWL_STYLE) }) as u32
    }

    /// Extended style bits (`GWL_EXSTYLE`).
    pub fn ex_style(&self) -> u32 {
        // SAFETY: as above.
        (unsafe { GetWindowLongPtrW(self.hwnd, GWL_EXSTYLE) }) as u32
    }

    /// The id of the thread that owns the window, plus its process id.
    pub fn thread_and_process(&self) -> (u32, u32) {
        let mut pid = 0u32;
        // SAFETY: GetWindowThreadProcessId writes the pid out-param.
        let tid = unsafe { GetWindowThreadProcessId(self.hwnd, Some(&mut pid)) };
        (tid, pid)
    }

    /// Issues the set-window-position call for a queued command.
    pub fn set_pos(
        &self,
        x: i32,
        y: i32,
        w: i32,
        h: i32,
        placement: Placement,
        flags: CommandFlags,
    ) -> windows::core::Result<()> {
        let insert_after = match placement {
            Placement::Top => Some(HWND_TOP),
            Placement::Bottom => Some(HWND_BOTTOM),
            Placement::Unchanged => None,
        };
        // SAFETY: SetWindowPos with a valid HWND is safe; a denied or
        // destroyed target surfaces as an error result.
        unsafe { SetWindowPos(self.hwnd, insert_after, x, y, w, h, swp_flags(flags)) }
    }
}

fn swp_flags(flags: CommandFlags) -> SET_WINDOW_POS_FLAGS {
    let mut out = SET_WINDOW_POS_FLAGS(0);
    if flags.no_size {
        out |= SWP_NOSIZE;
    }
    if flags.no_move {
        out |= SWP_NOMOVE;
    }
    if flags.no_activate {
        out |= SWP_NOACTIVATE;
    }
    if flags.no_zorder {
        out |= SWP_NOZORDER;
    }
    if flags.async_pos {
        out |= SWP_ASYNCWINDOWPOS;
    }
    out
}

/// The cursor's current screen position.
pub fn cursor_pos() -> Option<Point> {
    use windows::Win32::UI::WindowsAndMessaging::GetCursorPos;

    let mut pt = POINT::default();
    // SAFETY: GetCursorPos writes into our POINT on success.
    unsafe { GetCursorPos(&mut pt) }.ok()?;
    Some(Point::new(pt.x, pt.y))
}

/// The live desktop, answering the gesture engine's queries with real
/// window-manager calls.
pub struct WinDesktop;

impl Desktop for WinDesktop {
    fn window_at(&self, at: Point) -> Option<usize> {
        Window::from_point(at).map(|w| w.raw())
    }

    fn window_rect(&self, hwnd: usize) -> Option<Rect> {
        Window::from_raw(hwnd).rect()
    }

    fn is_maximized(&self, hwnd: usize) -> bool {
        Window::from_raw(hwnd).is_maximized()
    }

    fn restore(&self, hwnd: usize) {
        Window::from_raw(hwnd).restore();
    }

    fn is_foreground(&self, hwnd: usize) -> bool {
        Window::from_raw(hwnd).is_foreground()
    }

    fn foreground_window(&self) -> Option<usize> {
        Window::foreground().map(|w| w.raw())
    }
}
