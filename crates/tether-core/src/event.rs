use crate::Rect;

/// A notification pushed by the tracking loop to the host window.
///
/// The host drains these on its own thread, between messages, so surface
/// work never runs on the tracking thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlayEvent {
    /// The target changed size; carries the new overlay geometry.
    Resized(Rect),

    /// The target window disappeared. A native close request has already
    /// been posted to the overlay.
    TargetLost,
}
