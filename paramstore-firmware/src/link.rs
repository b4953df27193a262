//! Channel-backed telemetry link
//!
//! Adapts the statics in [`crate::channels`] to the store's
//! [`TelemetryLink`] interface so the sync task never blocks on the
//! telemetry protocol.

use paramstore_core::{ParamUpdate, TelemetryLink};

use crate::channels::{PARAM_TABLE, PARAM_UPDATES};
use crate::config::PARAM_COUNT;

/// Telemetry link over the static parameter channel and table
#[derive(Default)]
pub struct ChannelTelemetryLink;

impl ChannelTelemetryLink {
    pub const fn new() -> Self {
        Self
    }
}

impl TelemetryLink for ChannelTelemetryLink {
    fn set_parameter_table(&mut self, params: &[f32]) {
        let count = params.len().min(PARAM_COUNT);
        PARAM_TABLE.lock(|table| {
            let mut table = table.borrow_mut();
            table.clear();
            // Length is clamped to capacity above
            let _ = table.extend_from_slice(&params[..count]);
        });
    }

    fn poll_updated_parameter(&mut self) -> Option<ParamUpdate> {
        PARAM_UPDATES.try_receive().ok()
    }
}

