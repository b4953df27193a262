//! Store configuration
//!
//! Where the parameter record lives on the storage device. The parameter
//! count is a compile-time constant shared with the telemetry link and is
//! carried by the store's type instead.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Parameter store configuration
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct StoreConfig {
    /// Byte offset of the record within the storage device
    pub base_offset: u32,
}

impl StoreConfig {
    /// Configuration for a record at the given offset
    pub const fn at_offset(base_offset: u32) -> Self {
        Self { base_offset }
    }
}
