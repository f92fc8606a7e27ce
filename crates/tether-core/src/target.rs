use std::fmt;

use crate::WindowHandle;

/// Identifies the window an overlay attaches to.
///
/// Resolution collapses any variant into a concrete [`WindowHandle`] once,
/// before the overlay is created; the handle never changes afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetReference {
    /// A window handle the caller already has.
    ByHandle(WindowHandle),
    /// The first visible top-level window of this process.
    ByProcessId(u32),
    /// The first process whose image name matches exactly (case-sensitive).
    ByProcessName(String),
}

impl fmt::Display for TargetReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ByHandle(handle) => write!(f, "window {handle}"),
            Self::ByProcessId(pid) => write!(f, "process {pid}"),
            Self::ByProcessName(name) => write!(f, "process '{name}'"),
        }
    }
}
