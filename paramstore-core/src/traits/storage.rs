//! Non-volatile storage abstraction
//!
//! A flat, byte-addressable region (EEPROM, FRAM, emulated EEPROM) that
//! the parameter record is read from and written back to.

/// Errors from storage device operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StorageError {
    /// Access extends past the end of the device
    OutOfBounds,
    /// Bus transfer failed (NACK, arbitration loss, etc.)
    Bus,
    /// Device did not become ready in time
    Timeout,
    /// Device rejected or failed the write
    WriteFailed,
}

/// Byte-addressable non-volatile storage
///
/// Implementations must be synchronous: a call returns once the bytes are
/// durable (for EEPROMs, after the internal write cycle has completed).
/// Writes of a few bytes must stay cheap enough to run inside one control
/// loop tick.
pub trait NvStorage {
    /// Total addressable size in bytes
    fn capacity(&self) -> u32;

    /// Read `buf.len()` bytes starting at `offset`
    fn read(&mut self, offset: u32, buf: &mut [u8]) -> Result<(), StorageError>;

    /// Write `data` starting at `offset`
    ///
    /// The bytes are assumed durable once this returns `Ok`.
    fn write(&mut self, offset: u32, data: &[u8]) -> Result<(), StorageError>;

    /// Check that `len` bytes starting at `offset` fit inside the device
    fn check_range(&self, offset: u32, len: usize) -> Result<(), StorageError> {
        let end = (offset as u64) + (len as u64);
        if end > self.capacity() as u64 {
            return Err(StorageError::OutOfBounds);
        }
        Ok(())
    }
}

impl<T: NvStorage + ?Sized> NvStorage for &mut T {
    fn capacity(&self) -> u32 {
        T::capacity(self)
    }

    fn read(&mut self, offset: u32, buf: &mut [u8]) -> Result<(), StorageError> {
        T::read(self, offset, buf)
    }

    fn write(&mut self, offset: u32, data: &[u8]) -> Result<(), StorageError> {
        T::write(self, offset, data)
    }
}
