//! AT24C serial EEPROM driver (I2C)
//!
//! The AT24C family (and compatible 24LC/M24C parts) are byte-addressable
//! EEPROMs with an internal page buffer. This makes them a natural home for
//! the parameter record: a single field can be rewritten without touching
//! its neighbours.
//!
//! # I2C Protocol
//!
//! - Device address: `0b1010_A2A1A0` (0x50 with all address pins low)
//! - Word address: 1 byte (≤ 16 Kbit parts, upper bits go into the device
//!   address as block select) or 2 bytes big-endian (≥ 32 Kbit parts)
//! - Write: address + up to one page of data; bytes past the page end wrap
//!   to the page start, so writes are split at page boundaries
//! - After a write the device NACKs its address until the internal write
//!   cycle (≤ 5 ms) completes ("acknowledge polling")

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::I2c;
use heapless::Vec;

use paramstore_core::traits::{NvStorage, StorageError};

/// Device address with A2..A0 tied low
pub const DEFAULT_ADDRESS: u8 = 0x50;

/// Largest page buffer supported by the driver
pub const MAX_PAGE_SIZE: usize = 256;

/// Interval between acknowledge polls
const POLL_INTERVAL_US: u32 = 500;

/// Size of one block-select window for 1-byte addressing
const BLOCK_SIZE: u32 = 256;

/// Address bytes + one page
type Frame = Vec<u8, { 2 + MAX_PAGE_SIZE }>;

/// Word address width
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AddressWidth {
    /// 1-byte word address; A8..A10 carried in the device address
    OneByte,
    /// 2-byte big-endian word address
    TwoBytes,
}

/// AT24C driver configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct At24cConfig {
    /// 7-bit device address
    pub address: u8,
    /// Memory size in bytes
    pub capacity: u32,
    /// Page buffer size in bytes
    pub page_size: u16,
    /// Word address width
    pub address_width: AddressWidth,
    /// Maximum write cycle time in milliseconds
    pub write_cycle_ms: u8,
}

impl Default for At24cConfig {
    fn default() -> Self {
        Self::AT24C32
    }
}

impl At24cConfig {
    /// 2 Kbit (256 B), 8-byte pages
    pub const AT24C02: Self = Self {
        address: DEFAULT_ADDRESS,
        capacity: 256,
        page_size: 8,
        address_width: AddressWidth::OneByte,
        write_cycle_ms: 5,
    };

    /// 16 Kbit (2 KB), 16-byte pages, block select in the device address
    pub const AT24C16: Self = Self {
        address: DEFAULT_ADDRESS,
        capacity: 2048,
        page_size: 16,
        address_width: AddressWidth::OneByte,
        write_cycle_ms: 5,
    };

    /// 32 Kbit (4 KB), 32-byte pages
    pub const AT24C32: Self = Self {
        address: DEFAULT_ADDRESS,
        capacity: 4096,
        page_size: 32,
        address_width: AddressWidth::TwoBytes,
        write_cycle_ms: 10,
    };

    /// 256 Kbit (32 KB), 64-byte pages
    pub const AT24C256: Self = Self {
        address: DEFAULT_ADDRESS,
        capacity: 32768,
        page_size: 64,
        address_width: AddressWidth::TwoBytes,
        write_cycle_ms: 5,
    };

    /// Same part at a different device address
    pub const fn with_address(mut self, address: u8) -> Self {
        self.address = address;
        self
    }

    /// Page size clamped to what the driver can buffer
    fn effective_page_size(&self) -> u32 {
        (self.page_size as u32).clamp(1, MAX_PAGE_SIZE as u32)
    }
}

/// AT24C EEPROM on an I2C bus
pub struct At24c<I2C, D> {
    i2c: I2C,
    delay: D,
    config: At24cConfig,
}

impl<I2C: I2c, D: DelayNs> At24c<I2C, D> {
    /// Create a driver for the EEPROM described by `config`
    pub fn new(i2c: I2C, delay: D, config: At24cConfig) -> Self {
        Self { i2c, delay, config }
    }

    /// Driver configuration
    pub fn config(&self) -> &At24cConfig {
        &self.config
    }

    /// Release the bus and delay provider
    pub fn release(self) -> (I2C, D) {
        (self.i2c, self.delay)
    }

    /// Device address for a memory offset (adds block select bits if needed)
    fn device_address(&self, offset: u32) -> u8 {
        match self.config.address_width {
            AddressWidth::OneByte => self.config.address | (((offset / BLOCK_SIZE) as u8) & 0x07),
            AddressWidth::TwoBytes => self.config.address,
        }
    }

    /// Append the word address for `offset` to a frame
    fn push_word_address(&self, frame: &mut Frame, offset: u32) -> Result<(), StorageError> {
        let result = match self.config.address_width {
            AddressWidth::OneByte => frame.push(offset as u8).map_err(|_| ()),
            AddressWidth::TwoBytes => frame.extend_from_slice(&(offset as u16).to_be_bytes()),
        };
        result.map_err(|_| StorageError::WriteFailed)
    }

    /// Largest chunk starting at `offset` that stays inside one `window`
    fn chunk_len(offset: u32, remaining: usize, window: u32) -> usize {
        let room = (window - offset % window) as usize;
        remaining.min(room)
    }

    /// Write one chunk that does not cross a page boundary
    fn write_page(&mut self, offset: u32, data: &[u8]) -> Result<(), StorageError> {
        let mut frame = Frame::new();
        self.push_word_address(&mut frame, offset)?;
        frame
            .extend_from_slice(data)
            .map_err(|_| StorageError::WriteFailed)?;

        let address = self.device_address(offset);
        self.i2c
            .write(address, &frame)
            .map_err(|_| StorageError::Bus)?;

        self.wait_ready(address)
    }

    /// Acknowledge-poll until the internal write cycle completes
    fn wait_ready(&mut self, address: u8) -> Result<(), StorageError> {
        let attempts = (self.config.write_cycle_ms as u32 * 1000 / POLL_INTERVAL_US).max(1) + 1;
        let mut probe = [0u8; 1];

        for _ in 0..attempts {
            self.delay.delay_us(POLL_INTERVAL_US);
            if self.i2c.read(address, &mut probe).is_ok() {
                return Ok(());
            }
        }

        #[cfg(feature = "defmt")]
        defmt::warn!("EEPROM 0x{:02x} still busy after write cycle", address);
        Err(StorageError::Timeout)
    }
}

impl<I2C: I2c, D: DelayNs> NvStorage for At24c<I2C, D> {
    fn capacity(&self) -> u32 {
        self.config.capacity
    }

    fn read(&mut self, offset: u32, buf: &mut [u8]) -> Result<(), StorageError> {
        self.check_range(offset, buf.len())?;

        let mut offset = offset;
        let mut rest = buf;
        while !rest.is_empty() {
            let len = match self.config.address_width {
                AddressWidth::OneByte => Self::chunk_len(offset, rest.len(), BLOCK_SIZE),
                AddressWidth::TwoBytes => rest.len(),
            };
            let (chunk, tail) = rest.split_at_mut(len);

            let mut frame = Frame::new();
            self.push_word_address(&mut frame, offset)?;
            let address = self.device_address(offset);
            self.i2c
                .write_read(address, &frame, chunk)
                .map_err(|_| StorageError::Bus)?;

            offset += len as u32;
            rest = tail;
        }
        Ok(())
    }

    fn write(&mut self, offset: u32, data: &[u8]) -> Result<(), StorageError> {
        self.check_range(offset, data.len())?;

        let page = self.config.effective_page_size();
        let mut offset = offset;
        let mut rest = data;
        while !rest.is_empty() {
            let len = Self::chunk_len(offset, rest.len(), page);
            let (chunk, tail) = rest.split_at(len);

            self.write_page(offset, chunk)?;

            offset += len as u32;
            rest = tail;
        }
        Ok(())
    }
}
