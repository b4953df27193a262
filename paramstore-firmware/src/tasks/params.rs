//! Parameter sync task
//!
//! Owns the telemetry sync bridge: loads the store once, publishes the
//! parameter table, then applies at most one remote update per tick.

use defmt::*;
use embassy_rp::i2c::{Blocking, I2c};
use embassy_rp::peripherals::I2C0;
use embassy_time::Delay;

use paramstore_core::{BridgeError, LoadOutcome, StoreError, TelemetrySyncBridge};
use paramstore_drivers::eeprom::At24c;

use super::tick::TICK_SIGNAL;
use crate::config::PARAM_COUNT;
use crate::link::ChannelTelemetryLink;

/// EEPROM on the blocking I2C0 bus
pub type Eeprom = At24c<I2c<'static, I2C0, Blocking>, Delay>;

/// Bridge type owned by the sync task
pub type ParamBridge = TelemetrySyncBridge<Eeprom, ChannelTelemetryLink, PARAM_COUNT>;

/// Parameter sync task
#[embassy_executor::task]
pub async fn param_sync_task(mut bridge: ParamBridge) {
    info!("Parameter sync task started ({} parameters)", PARAM_COUNT);

    match bridge.start() {
        Ok(LoadOutcome::Loaded) => info!("Parameters loaded from EEPROM"),
        Ok(outcome) => warn!("Parameters reset to defaults ({})", outcome),
        Err(e) => error!("Parameter store failed to load: {}", e),
    }

    let mut was_persisted = bridge.store().is_persisted();

    loop {
        TICK_SIGNAL.wait().await;

        match bridge.update() {
            Ok(Some(update)) => {
                debug!("Parameter {} = {}", update.index, update.value);
            }
            Ok(None) => {}
            Err(BridgeError::Store(StoreError::NotLoaded)) => {
                // Load failed; pending updates stay queued until a retry succeeds
                match bridge.start() {
                    Ok(outcome) => info!("Parameter store loaded on retry ({})", outcome),
                    Err(e) => error!("Parameter store retry failed: {}", e),
                }
            }
            Err(e) => error!("Parameter update rejected: {}", e),
        }

        let persisted = bridge.store().is_persisted();
        if persisted != was_persisted {
            if persisted {
                info!("Parameter record persisted");
            } else {
                warn!("Parameter record out of sync with EEPROM");
            }
            was_persisted = persisted;
        }
    }
}
