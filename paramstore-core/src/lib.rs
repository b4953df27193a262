//! Board-agnostic persistent parameter store for flight-control firmware
//!
//! This crate contains all parameter persistence logic that does not depend
//! on a specific storage chip or telemetry protocol:
//!
//! - Fletcher-16 checksum engine
//! - Fixed-layout parameter record codec
//! - Parameter store (load / initialize / recover / incremental update)
//! - Telemetry sync bridge between the store and a telemetry link
//! - Storage and telemetry traits, plus a RAM-backed storage device
//!
//! # Record Layout
//!
//! ```text
//! ┌────────────┬──────────────────────────┬────────────┐
//! │ MAGIC "BFS"│ N × f32 (little-endian)  │ FLETCHER16 │
//! │ 3B         │ 4N B                     │ 2B (BE)    │
//! └────────────┴──────────────────────────┴────────────┘
//! ```

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

// Must come first so the logging macros are visible to every module below
#[macro_use]
mod fmt;

pub mod bridge;
pub mod checksum;
pub mod config;
pub mod record;
pub mod storage;
pub mod store;
pub mod traits;

pub use bridge::{BridgeError, TelemetrySyncBridge};
pub use checksum::{fletcher16, Fletcher16};
pub use config::StoreConfig;
pub use record::{RecordStatus, MAGIC_HEADER, MAX_PARAMS};
pub use storage::RamStorage;
pub use store::{LoadOutcome, LoadReport, ParameterStore, StoreError, StoreState};
pub use traits::{NvStorage, ParamUpdate, StorageError, TelemetryLink};
