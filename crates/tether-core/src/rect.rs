/// A rectangle representing a window's position and size.
///
/// This is the overlay geometry: the last-observed bounding rectangle of
/// the target window, in screen pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Builds a rectangle from left/top/right/bottom edges, the way
    /// Win32 reports window bounds.
    pub fn from_edges(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self::new(left, top, right - left, bottom - top)
    }

    /// Returns whether both rectangles have the same width and height.
    ///
    /// Used by tracking to tell a pure move from a resize.
    pub fn same_size(&self, other: &Rect) -> bool {
        self.width == other.width && self.height == other.height
    }

    /// Returns whether the rectangle has a non-zero area.
    pub fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }
}
