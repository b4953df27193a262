//! Build-time store configuration
//!
//! Constants are generated by build.rs from `store.toml`.

use paramstore_core::StoreConfig;

include!(concat!(env!("OUT_DIR"), "/store_config.rs"));

/// Location of the parameter record on the EEPROM
pub const fn store_config() -> StoreConfig {
    StoreConfig::at_offset(BASE_OFFSET)
}
