//! Device and link abstraction traits
//!
//! These traits define the interface between the parameter store and
//! the hardware or protocol implementations around it.

pub mod storage;
pub mod telemetry;

pub use storage::{NvStorage, StorageError};
pub use telemetry::{ParamUpdate, TelemetryLink};
