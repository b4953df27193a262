//! Embassy async tasks
//!
//! Each task runs independently and communicates via channels/signals.

pub mod params;
pub mod tick;

pub use params::{param_sync_task, ParamBridge};
pub use tick::tick_task;
