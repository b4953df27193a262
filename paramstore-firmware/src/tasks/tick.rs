//! Tick task for the parameter sync cycle
//!
//! Provides periodic ticks to the sync task; one tick applies at most one
//! remote parameter update.

use defmt::*;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use embassy_time::{Duration, Ticker};

use crate::config::TICK_INTERVAL_MS;

/// Signal to notify the sync task of a tick
pub static TICK_SIGNAL: Signal<CriticalSectionRawMutex, ()> = Signal::new();

/// Tick task - sends periodic tick signals
#[embassy_executor::task]
pub async fn tick_task() {
    info!("Tick task started ({} ms)", TICK_INTERVAL_MS);

    let mut ticker = Ticker::every(Duration::from_millis(TICK_INTERVAL_MS));
    loop {
        ticker.next().await;
        TICK_SIGNAL.signal(());
    }
}
