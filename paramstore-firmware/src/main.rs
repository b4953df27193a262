//! Paramstore - Flight Parameter Store Firmware
//!
//! Firmware binary for RP2040-based flight computers. Keeps the tunable
//! parameters in a checksum-guarded record on an external I2C EEPROM and
//! syncs them with the telemetry link once per tick.

#![no_std]
#![no_main]

use defmt::*;
use embassy_executor::Spawner;
use embassy_rp::i2c::{self, I2c};
use embassy_time::Delay;
use {defmt_rtt as _, panic_probe as _};

use paramstore_core::{ParameterStore, TelemetrySyncBridge};
use paramstore_drivers::eeprom::At24c;

use crate::link::ChannelTelemetryLink;
use crate::tasks::ParamBridge;

mod channels;
mod config;
mod link;
mod tasks;

/// Main entry point
#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("Paramstore firmware starting...");

    let p = embassy_rp::init(Default::default());
    info!("Peripherals initialized");

    // EEPROM on I2C0: SCL = GP5, SDA = GP4
    let mut i2c_config = i2c::Config::default();
    i2c_config.frequency = config::EEPROM_FREQUENCY_HZ;
    let bus = I2c::new_blocking(p.I2C0, p.PIN_5, p.PIN_4, i2c_config);

    let eeprom_config = config::EEPROM_PART;
    info!(
        "EEPROM: addr=0x{:02x}, {} bytes, {}-byte pages",
        eeprom_config.address, eeprom_config.capacity, eeprom_config.page_size
    );
    let eeprom = At24c::new(bus, Delay, eeprom_config);

    let store = match ParameterStore::new(eeprom, config::store_config()) {
        Ok(store) => store,
        Err(e) => {
            error!("Parameter record does not fit the EEPROM: {}", e);
            return;
        }
    };
    let bridge: ParamBridge = TelemetrySyncBridge::new(store, ChannelTelemetryLink::new());

    spawner.spawn(tasks::tick_task()).unwrap();
    spawner.spawn(tasks::param_sync_task(bridge)).unwrap();

    info!("All tasks spawned");
}
