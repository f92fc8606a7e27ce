//! Win32 implementation of Tether's platform traits and window host.
//!
//! Everything here is Windows-only; on other targets the crate is empty.
#![cfg(windows)]

/// Top-level window queries for other programs' windows.
pub mod desktop;

/// Per-monitor DPI awareness.
pub mod dpi;

/// Win32 window enumeration.
pub mod enumerate;

/// Visible window bounds via DWM.
pub mod frame;

/// Native window creation, styles and the window procedure.
pub mod native;

/// Process tables (raw system query and ToolHelp).
pub mod process;

/// GDI back buffer.
pub mod surface;

/// Window builder and render loop.
pub mod window;

pub use desktop::Win32Desktop;
pub use enumerate::enumerate_windows;
pub use native::Win32Windows;
pub use process::{NtProcessTable, ToolhelpProcessTable};
pub use surface::GdiSurface;
pub use window::{Callback, Window, WindowBuilder};
