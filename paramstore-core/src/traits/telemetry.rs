//! Telemetry link abstraction
//!
//! The telemetry link exposes parameters to a ground station and accepts
//! changes from it. Its wire encoding is not the store's concern; the
//! store only needs the two narrow operations below.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A parameter change received from the ground station
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ParamUpdate {
    /// Parameter index as decoded off the wire (may be out of range)
    pub index: i32,
    /// New parameter value
    pub value: f32,
}

impl ParamUpdate {
    /// Create a new parameter update
    pub const fn new(index: i32, value: f32) -> Self {
        Self { index, value }
    }
}

/// Telemetry link as seen by the parameter store
pub trait TelemetryLink {
    /// Replace the link's table of current parameter values
    fn set_parameter_table(&mut self, params: &[f32]);

    /// Take the pending remote parameter update, if any
    ///
    /// Non-blocking. Returns at most one update per call.
    fn poll_updated_parameter(&mut self) -> Option<ParamUpdate>;
}

impl<T: TelemetryLink + ?Sized> TelemetryLink for &mut T {
    fn set_parameter_table(&mut self, params: &[f32]) {
        T::set_parameter_table(self, params)
    }

    fn poll_updated_parameter(&mut self) -> Option<ParamUpdate> {
        T::poll_updated_parameter(self)
    }
}
