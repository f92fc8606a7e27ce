//! Decoder for the raw system process table.
//!
//! The kernel fills a caller-provided buffer with variable-length
//! `SYSTEM_PROCESS_INFORMATION` records. Each record starts with the byte
//! offset of its successor (zero on the last one) and carries the image
//! name as a counted UTF-16 string whose characters live elsewhere in the
//! same buffer. Nothing in the buffer is trusted: every offset and pointer
//! is checked against the filled region before it is read.

use std::mem::size_of;

use crate::{ProcessRecord, log_warn};

/// Offset of the successor offset (`NextEntryOffset`, u32).
const NEXT_ENTRY_OFFSET: usize = 0x00;

/// Offset of the image name byte length (`ImageName.Length`, u16).
const IMAGE_NAME_LENGTH: usize = 0x38;

/// Offset of the image name character pointer (`ImageName.Buffer`).
const IMAGE_NAME_BUFFER: usize = IMAGE_NAME_LENGTH + size_of::<usize>();

/// Offset of the process id (`UniqueProcessId`, pointer-sized).
#[cfg(target_pointer_width = "64")]
const PROCESS_ID: usize = 0x50;
#[cfg(target_pointer_width = "32")]
const PROCESS_ID: usize = 0x44;

/// Bytes of a record this decoder reads.
const RECORD_HEADER_LEN: usize = PROCESS_ID + size_of::<usize>();

/// An owned process table buffer, iterated record by record.
///
/// Backed by `u64` words so the kernel sees a suitably aligned region.
/// Iteration is lazy and consumes the cursor; a snapshot cannot be
/// restarted, take a new one instead.
pub struct SystemProcessSnapshot {
    words: Vec<u64>,
    len: usize,
    cursor: Option<usize>,
}

impl SystemProcessSnapshot {
    /// Allocates a zeroed buffer able to hold `capacity` bytes.
    pub fn zeroed(capacity: usize) -> Self {
        Self {
            words: vec![0; capacity.div_ceil(size_of::<u64>())],
            len: 0,
            cursor: None,
        }
    }

    /// The writable buffer handed to the platform query.
    pub fn buffer_mut(&mut self) -> &mut [u8] {
        bytemuck::cast_slice_mut(&mut self.words)
    }

    /// Marks the first `len` bytes as filled and rewinds to the first record.
    pub fn filled(mut self, len: usize) -> Self {
        self.len = len.min(self.words.len() * size_of::<u64>());
        self.cursor = (self.len > 0).then_some(0);
        self
    }

    fn bytes(&self) -> &[u8] {
        &bytemuck::cast_slice::<u64, u8>(&self.words)[..self.len]
    }
}

impl Iterator for SystemProcessSnapshot {
    type Item = ProcessRecord;

    fn next(&mut self) -> Option<ProcessRecord> {
        loop {
            let offset = self.cursor.take()?;
            let table_len = self.len;

            let (header, successor) = match decode_header(self.bytes(), offset) {
                Ok(decoded) => decoded,
                Err(reason) => {
                    log_warn!("process snapshot: stopping at {offset}: {reason}");
                    return None;
                }
            };

            self.cursor = match successor {
                Successor::Next(next) => Some(next),
                Successor::End => None,
                Successor::Invalid(delta) => {
                    log_warn!(
                        "process snapshot: record at {offset} points {delta} bytes past a {table_len}-byte table"
                    );
                    None
                }
            };

            match header.image_name(self.bytes()) {
                Ok(image_name) => return Some(ProcessRecord::new(header.process_id, image_name)),
                Err(reason) => {
                    log_warn!("process snapshot: dropping record at {offset}: {reason}");
                }
            }
        }
    }
}

enum Successor {
    Next(usize),
    End,
    Invalid(u32),
}

struct RecordHeader {
    process_id: u32,
    name_ptr: usize,
    name_len: usize,
}

impl RecordHeader {
    fn image_name(&self, bytes: &[u8]) -> Result<String, &'static str> {
        // The idle process has no image name.
        if self.name_len == 0 || self.name_ptr == 0 {
            return Ok(String::new());
        }
        decode_name(bytes, self.name_ptr, self.name_len)
    }
}

/// Reads the fixed part of the record at `offset` and locates its successor.
///
/// The image name is left undecoded so a bad name costs one record, not the
/// rest of the table.
fn decode_header(bytes: &[u8], offset: usize) -> Result<(RecordHeader, Successor), &'static str> {
    let header = offset
        .checked_add(RECORD_HEADER_LEN)
        .and_then(|end| bytes.get(offset..end))
        .ok_or("header runs past the table")?;

    let delta = u32::from_ne_bytes(field(header, NEXT_ENTRY_OFFSET));
    let name_len = u16::from_ne_bytes(field(header, IMAGE_NAME_LENGTH)) as usize;
    let name_ptr = usize::from_ne_bytes(field(header, IMAGE_NAME_BUFFER));
    let process_id = usize::from_ne_bytes(field(header, PROCESS_ID)) as u32;

    let successor = if delta == 0 {
        Successor::End
    } else {
        match offset.checked_add(delta as usize) {
            Some(next) if delta as usize >= RECORD_HEADER_LEN && next < bytes.len() => {
                Successor::Next(next)
            }
            _ => Successor::Invalid(delta),
        }
    };

    Ok((
        RecordHeader {
            process_id,
            name_ptr,
            name_len,
        },
        successor,
    ))
}

/// Decodes the image name, translating its absolute pointer into an offset
/// inside the filled region.
fn decode_name(bytes: &[u8], ptr: usize, len: usize) -> Result<String, &'static str> {
    if len % 2 != 0 {
        return Err("odd image name length");
    }
    let start = ptr
        .checked_sub(bytes.as_ptr() as usize)
        .ok_or("image name points before the table")?;
    let raw = start
        .checked_add(len)
        .and_then(|end| bytes.get(start..end))
        .ok_or("image name points past the table")?;

    let units: Vec<u16> = raw
        .chunks_exact(2)
        .map(|pair| u16::from_ne_bytes([pair[0], pair[1]]))
        .collect();
    Ok(String::from_utf16_lossy(&units))
}

fn field<const N: usize>(header: &[u8], at: usize) -> [u8; N] {
    header
        .get(at..at + N)
        .and_then(|slice| slice.try_into().ok())
        .unwrap_or([0; N])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn put(buf: &mut [u8], at: usize, value: &[u8]) {
        buf[at..at + value.len()].copy_from_slice(value);
    }

    /// Lays out records the way the kernel does and returns the filled snapshot.
    fn build(records: &[(u32, &str)]) -> SystemProcessSnapshot {
        let mut snapshot = SystemProcessSnapshot::zeroed(4096);
        let base = snapshot.buffer_mut().as_ptr() as usize;
        let buf = snapshot.buffer_mut();

        let mut offset = 0;
        for (i, (pid, name)) in records.iter().enumerate() {
            let units: Vec<u16> = name.encode_utf16().collect();
            let name_at = offset + RECORD_HEADER_LEN;
            let record_len = (RECORD_HEADER_LEN + units.len() * 2).next_multiple_of(8);
            let delta = if i + 1 == records.len() { 0 } else { record_len as u32 };
            let name_ptr = if units.is_empty() { 0 } else { base + name_at };

            put(buf, offset + NEXT_ENTRY_OFFSET, &delta.to_ne_bytes());
            put(buf, offset + IMAGE_NAME_LENGTH, &((units.len() * 2) as u16).to_ne_bytes());
            put(buf, offset + IMAGE_NAME_BUFFER, &name_ptr.to_ne_bytes());
            put(buf, offset + PROCESS_ID, &(*pid as usize).to_ne_bytes());
            for (j, unit) in units.iter().enumerate() {
                put(buf, name_at + j * 2, &unit.to_ne_bytes());
            }
            offset += record_len;
        }

        snapshot.filled(offset)
    }

    #[test]
    fn decodes_records_in_table_order() {
        // Arrange
        let snapshot = build(&[(0, ""), (4, "System"), (1234, "notepad.exe")]);

        // Act
        let records: Vec<ProcessRecord> = snapshot.collect();

        // Assert
        assert_eq!(
            records,
            vec![
                ProcessRecord::new(0, ""),
                ProcessRecord::new(4, "System"),
                ProcessRecord::new(1234, "notepad.exe"),
            ]
        );
    }

    #[test]
    fn decodes_non_ascii_names() {
        let records: Vec<ProcessRecord> = build(&[(42, "spiel\u{e4}.exe")]).collect();

        assert_eq!(records, vec![ProcessRecord::new(42, "spiel\u{e4}.exe")]);
    }

    #[test]
    fn empty_table_yields_nothing() {
        let mut snapshot = SystemProcessSnapshot::zeroed(256).filled(0);

        assert!(snapshot.next().is_none());
    }

    #[test]
    fn snapshot_is_single_pass() {
        let mut snapshot = build(&[(7, "a.exe"), (8, "b.exe")]);

        assert_eq!(snapshot.by_ref().count(), 2);
        assert!(snapshot.next().is_none());
    }

    #[test]
    fn successor_past_the_table_ends_iteration() {
        // Arrange
        let mut snapshot = build(&[(7, "a.exe")]);
        let len = snapshot.len;
        put(snapshot.buffer_mut(), NEXT_ENTRY_OFFSET, &0x10_000u32.to_ne_bytes());
        let snapshot = snapshot.filled(len);

        // Act
        let records: Vec<ProcessRecord> = snapshot.collect();

        // Assert
        assert_eq!(records, vec![ProcessRecord::new(7, "a.exe")]);
    }

    #[test]
    fn successor_inside_the_header_ends_iteration() {
        let mut snapshot = build(&[(7, "a.exe"), (8, "b.exe")]);
        let len = snapshot.len;
        put(snapshot.buffer_mut(), NEXT_ENTRY_OFFSET, &4u32.to_ne_bytes());
        let snapshot = snapshot.filled(len);

        assert_eq!(snapshot.count(), 1);
    }

    #[test]
    fn name_pointer_outside_the_table_drops_the_record() {
        let mut snapshot = build(&[(7, "a.exe")]);
        let len = snapshot.len;
        put(snapshot.buffer_mut(), IMAGE_NAME_BUFFER, &8usize.to_ne_bytes());
        let snapshot = snapshot.filled(len);

        assert_eq!(snapshot.count(), 0);
    }

    #[test]
    fn corrupt_name_skips_only_that_record() {
        let mut snapshot = build(&[(7, "a.exe"), (1234, "notepad.exe")]);
        let len = snapshot.len;
        put(snapshot.buffer_mut(), IMAGE_NAME_BUFFER, &8usize.to_ne_bytes());
        let snapshot = snapshot.filled(len);

        let records: Vec<_> = snapshot.collect();

        assert_eq!(records, vec![ProcessRecord::new(1234, "notepad.exe")]);
    }

    #[test]
    fn odd_name_length_skips_only_that_record() {
        let mut snapshot = build(&[(7, "a.exe"), (1234, "notepad.exe")]);
        let len = snapshot.len;
        put(snapshot.buffer_mut(), IMAGE_NAME_LENGTH, &3u16.to_ne_bytes());
        let snapshot = snapshot.filled(len);

        let records: Vec<_> = snapshot.collect();

        assert_eq!(records, vec![ProcessRecord::new(1234, "notepad.exe")]);
    }

    #[test]
    fn truncated_header_yields_nothing() {
        let snapshot = build(&[(7, "a.exe")]);
        let snapshot = snapshot.filled(RECORD_HEADER_LEN - 1);

        assert_eq!(snapshot.count(), 0);
    }
}
