//! Storage device implementations that need no hardware

pub mod ram;

pub use ram::{RamStorage, WriteRecord};
