//! Inter-task communication channels
//!
//! The telemetry protocol task and the parameter sync task share only these
//! statics. Uses embassy-sync primitives for safe cross-task access.

use core::cell::RefCell;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::channel::Channel;
use heapless::Vec;

use paramstore_core::ParamUpdate;

use crate::config::PARAM_COUNT;

/// Channel capacity for decoded parameter writes
const PARAM_UPDATE_CHANNEL_SIZE: usize = 8;

/// Parameter writes decoded off the telemetry stream
pub static PARAM_UPDATES: Channel<CriticalSectionRawMutex, ParamUpdate, PARAM_UPDATE_CHANNEL_SIZE> =
    Channel::new();

/// Parameter table advertised on the telemetry stream
pub static PARAM_TABLE: Mutex<CriticalSectionRawMutex, RefCell<Vec<f32, PARAM_COUNT>>> =
    Mutex::new(RefCell::new(Vec::new()));
