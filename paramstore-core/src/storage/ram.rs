//! RAM-backed storage device
//!
//! Simulates a byte-addressable EEPROM in memory for host tests and
//! software-in-the-loop runs. Supports:
//! - Write journal (offset and length of recent writes)
//! - Write failure injection, including power loss between two writes
//! - Read failure injection

use heapless::Deque;

use crate::traits::{NvStorage, StorageError};

/// Number of writes remembered by the journal
pub const JOURNAL_CAPACITY: usize = 32;

/// One write issued to the device
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct WriteRecord {
    /// Start offset of the write
    pub offset: u32,
    /// Number of bytes written
    pub len: usize,
}

impl WriteRecord {
    /// Byte range covered by this write
    pub fn range(&self) -> core::ops::Range<usize> {
        let start = self.offset as usize;
        start..start + self.len
    }
}

/// In-memory storage device
///
/// # Example
///
/// ```
/// use paramstore_core::storage::RamStorage;
/// use paramstore_core::traits::NvStorage;
///
/// let mut eeprom = RamStorage::<64>::new();
/// eeprom.write(3, &[0xAA, 0xBB]).unwrap();
///
/// let mut buf = [0u8; 2];
/// eeprom.read(3, &mut buf).unwrap();
/// assert_eq!(buf, [0xAA, 0xBB]);
/// assert_eq!(eeprom.journal().count(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct RamStorage<const SIZE: usize> {
    /// Device contents
    data: [u8; SIZE],
    /// Most recent writes, oldest first
    journal: Deque<WriteRecord, JOURNAL_CAPACITY>,
    /// Remaining writes before injected failures start
    writes_before_failure: Option<usize>,
    /// Fail every read
    fail_reads: bool,
    /// Total bytes written since creation
    bytes_written: usize,
}

impl<const SIZE: usize> Default for RamStorage<SIZE> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const SIZE: usize> RamStorage<SIZE> {
    /// Create a zero-filled device
    pub const fn new() -> Self {
        Self::filled(0x00)
    }

    /// Create a device with every byte set to `value`
    ///
    /// Use `0xFF` to mimic a factory-fresh EEPROM.
    pub const fn filled(value: u8) -> Self {
        Self {
            data: [value; SIZE],
            journal: Deque::new(),
            writes_before_failure: None,
            fail_reads: false,
            bytes_written: 0,
        }
    }

    /// Create a device whose contents start with `bytes`; the rest is zero
    pub fn from_bytes(bytes: &[u8]) -> Self {
        let mut storage = Self::new();
        let len = bytes.len().min(SIZE);
        storage.data[..len].copy_from_slice(&bytes[..len]);
        storage
    }

    /// Device contents
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Mutable device contents, bypassing the journal and fault injection
    ///
    /// Use this to plant corruption.
    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Recent writes, oldest first
    pub fn journal(&self) -> impl Iterator<Item = &WriteRecord> {
        self.journal.iter()
    }

    /// Forget recorded writes
    pub fn clear_journal(&mut self) {
        self.journal.clear();
    }

    /// Total bytes written since creation
    pub fn bytes_written(&self) -> usize {
        self.bytes_written
    }

    /// Let `count` more writes succeed, then fail every write after them
    ///
    /// `fail_writes_after(1)` models power loss between the first and second
    /// write of a sequence.
    pub fn fail_writes_after(&mut self, count: usize) {
        self.writes_before_failure = Some(count);
    }

    /// Make every read fail (or succeed again)
    pub fn set_fail_reads(&mut self, fail: bool) {
        self.fail_reads = fail;
    }

    /// Remove all injected faults
    pub fn clear_faults(&mut self) {
        self.writes_before_failure = None;
        self.fail_reads = false;
    }

    fn record_write(&mut self, offset: u32, len: usize) {
        if self.journal.is_full() {
            self.journal.pop_front();
        }
        // Cannot fail: a slot was freed above
        let _ = self.journal.push_back(WriteRecord { offset, len });
        self.bytes_written += len;
    }
}

impl<const SIZE: usize> NvStorage for RamStorage<SIZE> {
    fn capacity(&self) -> u32 {
        SIZE as u32
    }

    fn read(&mut self, offset: u32, buf: &mut [u8]) -> Result<(), StorageError> {
        if self.fail_reads {
            return Err(StorageError::Bus);
        }
        self.check_range(offset, buf.len())?;

        let start = offset as usize;
        buf.copy_from_slice(&self.data[start..start + buf.len()]);
        Ok(())
    }

    fn write(&mut self, offset: u32, data: &[u8]) -> Result<(), StorageError> {
        self.check_range(offset, data.len())?;

        match self.writes_before_failure {
            Some(0) => return Err(StorageError::WriteFailed),
            Some(ref mut remaining) => *remaining -= 1,
            None => {}
        }

        let start = offset as usize;
        self.data[start..start + data.len()].copy_from_slice(data);
        self.record_write(offset, data.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_write() {
        let mut storage = RamStorage::<32>::new();
        storage.write(10, &[1, 2, 3]).unwrap();

        let mut buf = [0u8; 5];
        storage.read(9, &mut buf).unwrap();
        assert_eq!(buf, [0, 1, 2, 3, 0]);
    }

    #[test]
    fn test_filled() {
        let storage = RamStorage::<8>::filled(0xFF);
        assert!(storage.as_bytes().iter().all(|&b| b == 0xFF));
    }

    #[test]
    fn test_out_of_bounds() {
        let mut storage = RamStorage::<16>::new();
        let mut buf = [0u8; 4];

        assert_eq!(storage.read(14, &mut buf), Err(StorageError::OutOfBounds));
        assert_eq!(storage.write(13, &[0; 4]), Err(StorageError::OutOfBounds));
        assert_eq!(storage.write(u32::MAX, &[0]), Err(StorageError::OutOfBounds));
        assert_eq!(storage.journal().count(), 0);
    }

    #[test]
    fn test_journal_records_writes() {
        let mut storage = RamStorage::<32>::new();
        storage.write(0, &[0; 21]).unwrap();
        storage.write(11, &[0; 4]).unwrap();

        let writes: std::vec::Vec<_> = storage.journal().copied().collect();
        assert_eq!(
            writes,
            [
                WriteRecord { offset: 0, len: 21 },
                WriteRecord { offset: 11, len: 4 }
            ]
        );
        assert_eq!(storage.bytes_written(), 25);
        assert_eq!(writes[1].range(), 11..15);
    }

    #[test]
    fn test_journal_drops_oldest() {
        let mut storage = RamStorage::<64>::new();
        for i in 0..(JOURNAL_CAPACITY as u32 + 4) {
            storage.write(i, &[0xAA]).unwrap();
        }

        assert_eq!(storage.journal().count(), JOURNAL_CAPACITY);
        assert_eq!(storage.journal().next().map(|w| w.offset), Some(4));
    }

    #[test]
    fn test_fail_writes_after() {
        let mut storage = RamStorage::<16>::new();
        storage.fail_writes_after(1);

        assert!(storage.write(0, &[1]).is_ok());
        assert_eq!(storage.write(1, &[2]), Err(StorageError::WriteFailed));
        assert_eq!(storage.as_bytes()[1], 0);

        storage.clear_faults();
        assert!(storage.write(1, &[2]).is_ok());
    }

    #[test]
    fn test_fail_reads() {
        let mut storage = RamStorage::<16>::new();
        storage.set_fail_reads(true);

        let mut buf = [0u8; 1];
        assert_eq!(storage.read(0, &mut buf), Err(StorageError::Bus));
    }

    #[test]
    fn test_from_bytes_truncates() {
        let storage = RamStorage::<4>::from_bytes(&[1, 2, 3, 4, 5, 6]);
        assert_eq!(storage.as_bytes(), &[1, 2, 3, 4]);
    }
}
