use crate::{OverlayError, OverlayResult, log_debug};

/// A single entry of a process table snapshot.
///
/// Produced fresh on every snapshot and never cached: process ids are
/// reused by the OS, so a stale record could point at the wrong program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessRecord {
    pub process_id: u32,
    /// Executable file name, e.g. `notepad.exe`.
    pub image_name: String,
}

impl ProcessRecord {
    pub fn new(process_id: u32, image_name: impl Into<String>) -> Self {
        Self {
            process_id,
            image_name: image_name.into(),
        }
    }
}

/// A lazy, finite, single-pass sequence of process records.
pub type ProcessRecords = Box<dyn Iterator<Item = ProcessRecord> + Send>;

/// Source of point-in-time process table snapshots.
///
/// Platforms may back this with the documented enumeration API or with a
/// lower-level system query. Callers must not depend on which one is used.
pub trait ProcessTable {
    /// Takes a snapshot of the live processes.
    ///
    /// Fails with [`OverlayError::EnumerationFailed`] when the platform
    /// denies the query, or [`OverlayError::BufferTooSmall`] when the table
    /// still did not fit after the single resize retry.
    fn snapshot(&self) -> OverlayResult<ProcessRecords>;
}

/// Runs a sized query, retrying exactly once when the buffer was too small.
///
/// `query` receives the buffer length to allocate. If it fails with
/// [`OverlayError::BufferTooSmall`], it is called a second time with a
/// length derived from the reported requirement. Any failure of the second
/// call, including another `BufferTooSmall`, is returned as-is.
pub fn with_resize_retry<T>(
    initial_len: usize,
    mut query: impl FnMut(usize) -> OverlayResult<T>,
) -> OverlayResult<T> {
    match query(initial_len) {
        Err(OverlayError::BufferTooSmall { required }) => {
            let len = retry_len(initial_len, required);
            log_debug!("process table needs {required} bytes, retrying with {len}");
            query(len)
        }
        other => other,
    }
}

/// Buffer length for the retry: the reported requirement plus headroom for
/// processes that start between the two calls.
fn retry_len(initial_len: usize, required: usize) -> usize {
    let required = required.max(initial_len.saturating_add(1));
    required.saturating_add(required / 8)
}
