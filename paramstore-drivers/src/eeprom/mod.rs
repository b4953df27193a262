//! EEPROM drivers

pub mod at24c;

pub use at24c::{AddressWidth, At24c, At24cConfig};
