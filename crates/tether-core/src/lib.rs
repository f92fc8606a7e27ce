pub mod config;
pub mod controller;
pub mod error;
pub mod event;
pub mod locator;
pub mod log;
pub mod overlay;
pub mod process;
pub mod rect;
pub mod snapshot;
pub mod surface;
pub mod target;
pub mod tracking;
pub mod window;

#[cfg(test)]
mod testing;

pub use config::{Attachment, WindowConfig, WindowConfigBuilder};
pub use controller::{NativeWindows, OverlayController, WindowSpec, WindowStyle};
pub use error::{OverlayError, OverlayResult};
pub use event::OverlayEvent;
pub use locator::Locator;
pub use overlay::OverlaySession;
pub use process::{ProcessRecord, ProcessRecords, ProcessTable, with_resize_retry};
pub use rect::Rect;
pub use snapshot::SystemProcessSnapshot;
pub use surface::RenderSurface;
pub use target::TargetReference;
pub use tracking::{TrackingSession, TrackingState};
pub use window::{Desktop, TopLevelWindow, WindowHandle};
