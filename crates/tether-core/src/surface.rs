use crate::OverlayResult;

/// The render backend behind a window.
///
/// Implementations own a back buffer sized to the window's client area.
/// The host resizes it when the window changes size, clears it and hands
/// it to the render callback every frame, then presents it.
pub trait RenderSurface {
    /// Current back buffer size in pixels.
    fn size(&self) -> (i32, i32);

    /// Rebuilds the back buffer for a new client size.
    fn resize(&mut self, width: i32, height: i32) -> OverlayResult<()>;

    /// Fills the back buffer with an RGBA colour (channels 0.0-1.0).
    fn clear(&mut self, color: [f32; 4]);

    /// Copies the back buffer to the window.
    fn present(&mut self) -> OverlayResult<()>;
}
