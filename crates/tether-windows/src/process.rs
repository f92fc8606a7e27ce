use std::mem;

use tether_core::{
    OverlayError, OverlayResult, ProcessRecord, ProcessRecords, ProcessTable,
    SystemProcessSnapshot, log_warn, with_resize_retry,
};

use windows::Wdk::System::SystemInformation::{NtQuerySystemInformation, SystemProcessInformation};
use windows::Win32::Foundation::{
    CloseHandle, HANDLE, STATUS_BUFFER_TOO_SMALL, STATUS_INFO_LENGTH_MISMATCH,
};
use windows::Win32::System::Diagnostics::ToolHelp::{
    CreateToolhelp32Snapshot, PROCESSENTRY32W, Process32FirstW, Process32NextW, TH32CS_SNAPPROCESS,
};

/// First buffer size tried for the raw process table. A typical desktop
/// fits; larger tables take the single resize retry.
const INITIAL_TABLE_LEN: usize = 512 * 1024;

/// Process table read with `NtQuerySystemInformation`.
///
/// One system call returns every process, which is cheaper than walking a
/// ToolHelp snapshot entry by entry.
#[derive(Debug, Clone, Copy, Default)]
pub struct NtProcessTable;

impl ProcessTable for NtProcessTable {
    fn snapshot(&self) -> OverlayResult<ProcessRecords> {
        let snapshot = with_resize_retry(INITIAL_TABLE_LEN, query_process_table)?;
        Ok(Box::new(snapshot))
    }
}

/// Fills a `len`-byte buffer with the system process table.
///
/// A too-small buffer is reported as `BufferTooSmall` carrying the length
/// the kernel asked for.
fn query_process_table(len: usize) -> OverlayResult<SystemProcessSnapshot> {
    let mut snapshot = SystemProcessSnapshot::zeroed(len);
    let buffer = snapshot.buffer_mut();
    let capacity = u32::try_from(buffer.len())
        .map_err(|_| OverlayError::EnumerationFailed(format!("{len} byte buffer too large")))?;

    let mut required = 0u32;
    // SAFETY: the buffer is valid for `capacity` writable bytes and
    // 8-byte aligned. `required` receives the filled or needed length.
    let status = unsafe {
        NtQuerySystemInformation(
            SystemProcessInformation,
            buffer.as_mut_ptr().cast(),
            capacity,
            &mut required,
        )
    };

    if status == STATUS_INFO_LENGTH_MISMATCH || status == STATUS_BUFFER_TOO_SMALL {
        return Err(OverlayError::BufferTooSmall {
            required: required as usize,
        });
    }
    if status.is_err() {
        return Err(OverlayError::EnumerationFailed(format!(
            "NtQuerySystemInformation returned 0x{:08X}",
            status.0
        )));
    }

    Ok(snapshot.filled(required as usize))
}

/// Process table read through a ToolHelp snapshot.
///
/// The documented API. Slower than [`NtProcessTable`] but available to
/// callers that avoid undocumented structures.
#[derive(Debug, Clone, Copy, Default)]
pub struct ToolhelpProcessTable;

impl ProcessTable for ToolhelpProcessTable {
    fn snapshot(&self) -> OverlayResult<ProcessRecords> {
        // SAFETY: creates a new snapshot handle owned by ToolhelpRecords.
        let handle = unsafe { CreateToolhelp32Snapshot(TH32CS_SNAPPROCESS, 0) }
            .map_err(|e| OverlayError::EnumerationFailed(e.to_string()))?;

        Ok(Box::new(ToolhelpRecords {
            handle,
            started: false,
            finished: false,
        }))
    }
}

/// Walks a ToolHelp snapshot lazily and closes it on drop.
struct ToolhelpRecords {
    handle: HANDLE,
    started: bool,
    finished: bool,
}

// SAFETY: a ToolHelp snapshot handle is a kernel object with no thread
// affinity, and this iterator is its only user.
unsafe impl Send for ToolhelpRecords {}

impl Iterator for ToolhelpRecords {
    type Item = ProcessRecord;

    fn next(&mut self) -> Option<ProcessRecord> {
        if self.finished {
            return None;
        }

        let mut entry = PROCESSENTRY32W {
            dwSize: mem::size_of::<PROCESSENTRY32W>() as u32,
            ..Default::default()
        };
        // SAFETY: `entry` is a properly sized PROCESSENTRY32W and the
        // handle is open for the iterator's lifetime.
        let result = unsafe {
            if self.started {
                Process32NextW(self.handle, &mut entry)
            } else {
                Process32FirstW(self.handle, &mut entry)
            }
        };
        self.started = true;

        if let Err(e) = result {
            // ERROR_NO_MORE_FILES ends every walk; anything else is logged.
            if e.code() != windows::Win32::Foundation::ERROR_NO_MORE_FILES.to_hresult() {
                log_warn!("process walk stopped early: {e}");
            }
            self.finished = true;
            return None;
        }

        let name_len = entry
            .szExeFile
            .iter()
            .position(|&c| c == 0)
            .unwrap_or(entry.szExeFile.len());
        Some(ProcessRecord::new(
            entry.th32ProcessID,
            String::from_utf16_lossy(&entry.szExeFile[..name_len]),
        ))
    }
}

impl Drop for ToolhelpRecords {
    fn drop(&mut self) {
        // SAFETY: the handle came from CreateToolhelp32Snapshot and is
        // closed exactly once.
        unsafe {
            let _ = CloseHandle(self.handle);
        }
    }
}
