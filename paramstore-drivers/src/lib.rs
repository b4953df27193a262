//! Storage driver implementations
//!
//! This crate provides concrete implementations of the
//! [`NvStorage`](paramstore_core::NvStorage) trait defined in
//! paramstore-core:
//!
//! - Serial EEPROMs (AT24C family, I2C)

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod eeprom;
