use std::fmt;

use crate::{OverlayResult, Rect};

/// An opaque native window handle (an `HWND` on Windows).
///
/// Stored as a pointer-sized integer so core code and other threads can
/// hold it without depending on platform types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WindowHandle(pub usize);

impl WindowHandle {
    /// Returns the raw handle value.
    pub fn raw(self) -> usize {
        self.0
    }
}

impl fmt::Display for WindowHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:X}", self.0)
    }
}

/// A top-level window as reported by the window system's enumeration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TopLevelWindow {
    pub handle: WindowHandle,
    /// Id of the process that owns the window.
    pub process_id: u32,
    pub visible: bool,
}

/// Read-only queries against windows owned by other processes.
///
/// Each platform crate (e.g. `tether-windows`) provides its own
/// implementation. Calls must return promptly or fail; the tracking
/// loop issues them from a background thread every poll.
pub trait Desktop: Send + Sync {
    /// Lists every top-level window in the platform's native order.
    fn top_level_windows(&self) -> OverlayResult<Vec<TopLevelWindow>>;

    /// Returns whether the handle currently denotes an existing window.
    fn is_window(&self, handle: WindowHandle) -> bool;

    /// Returns the window's bounding rectangle in screen coordinates.
    fn window_rect(&self, handle: WindowHandle) -> OverlayResult<Rect>;
}
