//! Build script for paramstore-firmware
//!
//! - Sets up linker search paths for memory.x
//! - Validates store.toml at compile time
//! - Generates `store_config.rs` with the validated settings

use std::env;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Must match `paramstore_core::MAX_PARAMS`
const MAX_PARAMS: i64 = 64;

/// Magic header + checksum
const RECORD_OVERHEAD: i64 = 3 + 2;

/// Supported EEPROM parts: (name, capacity in bytes, preset constant)
const PARTS: &[(&str, i64, &str)] = &[
    ("at24c02", 256, "AT24C02"),
    ("at24c16", 2048, "AT24C16"),
    ("at24c32", 4096, "AT24C32"),
    ("at24c256", 32768, "AT24C256"),
];

/// Settings extracted from store.toml
struct StoreSettings {
    param_count: i64,
    base_offset: i64,
    preset: &'static str,
    address: i64,
    frequency_hz: i64,
    tick_interval_ms: i64,
}

fn main() {
    setup_linker();
    let settings = validate_config();
    generate_config(&settings);
}

/// Set up linker search paths for memory.x
fn setup_linker() {
    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());

    // Copy memory.x to the output directory
    let memory_x = include_bytes!("memory.x");
    let mut f = File::create(out_dir.join("memory.x")).unwrap();
    f.write_all(memory_x).unwrap();

    println!("cargo:rustc-link-search={}", out_dir.display());
    println!("cargo:rerun-if-changed=memory.x");
    println!("cargo:rerun-if-changed=build.rs");
}

/// Validate store.toml and extract the settings
fn validate_config() -> StoreSettings {
    println!("cargo:rerun-if-changed=store.toml");

    let config_path = Path::new("store.toml");

    if !config_path.exists() {
        panic!(
            "\n\
            ╔══════════════════════════════════════════════════════════════════╗\n\
            ║  ERROR: store.toml not found!                                    ║\n\
            ║                                                                  ║\n\
            ║  The firmware requires a store.toml configuration file.          ║\n\
            ║  Please create one in the paramstore-firmware directory.         ║\n\
            ╚══════════════════════════════════════════════════════════════════╝\n"
        );
    }

    let config_content = match fs::read_to_string(config_path) {
        Ok(content) => content,
        Err(e) => {
            panic!(
                "\n\
                ╔══════════════════════════════════════════════════════════════════╗\n\
                ║  ERROR: Failed to read store.toml                                ║\n\
                ║                                                                  ║\n\
                ║  Error: {:<56} ║\n\
                ╚══════════════════════════════════════════════════════════════════╝\n",
                e
            );
        }
    };

    let config: toml::Value = match toml::from_str(&config_content) {
        Ok(value) => value,
        Err(e) => {
            panic!(
                "\n\
                ╔══════════════════════════════════════════════════════════════════╗\n\
                ║  ERROR: Invalid TOML syntax in store.toml                        ║\n\
                ╠══════════════════════════════════════════════════════════════════╣\n\
                {}\n\
                ╚══════════════════════════════════════════════════════════════════╝\n",
                format_error_lines(&e.to_string())
            );
        }
    };

    let mut errors = Vec::new();

    for section in ["store", "eeprom", "sync"] {
        if config.get(section).and_then(|s| s.as_table()).is_none() {
            errors.push(format!("Missing [{}] section", section));
        }
    }
    report("Missing required sections in store.toml", &errors);

    let param_count = integer(&config, "store", "param_count", 1..=MAX_PARAMS, &mut errors);
    let base_offset = integer(&config, "store", "base_offset", 0..=i64::from(u16::MAX), &mut errors);
    let address = integer(&config, "eeprom", "address", 0x50..=0x57, &mut errors);
    let frequency_hz = integer(&config, "eeprom", "frequency_hz", 1_000..=1_000_000, &mut errors);
    let tick_interval_ms = integer(&config, "sync", "tick_interval_ms", 1..=10_000, &mut errors);

    let part = match config.get("eeprom").and_then(|e| e.get("part")) {
        Some(toml::Value::String(name)) => match PARTS.iter().find(|(p, _, _)| p == name) {
            Some(part) => Some(*part),
            None => {
                errors.push(format!(
                    "[eeprom] part '{}' is not one of: {}",
                    name,
                    PARTS.iter().map(|(p, _, _)| *p).collect::<Vec<_>>().join(", ")
                ));
                None
            }
        },
        Some(_) => {
            errors.push("[eeprom] part must be a string".to_string());
            None
        }
        None => {
            errors.push("[eeprom] missing 'part'".to_string());
            None
        }
    };

    if let Some((name, capacity, _)) = part {
        let record_end = base_offset + RECORD_OVERHEAD + 4 * param_count;
        if record_end > capacity {
            errors.push(format!(
                "record ends at byte {} but {} holds {} bytes",
                record_end, name, capacity
            ));
        }
    }

    report("Invalid store configuration", &errors);

    println!("cargo:warning=store.toml validated successfully");

    StoreSettings {
        param_count,
        base_offset,
        preset: part.map(|(_, _, preset)| preset).unwrap_or("AT24C32"),
        address,
        frequency_hz,
        tick_interval_ms,
    }
}

/// Read an integer field and check its range
fn integer(
    config: &toml::Value,
    section: &str,
    key: &str,
    range: std::ops::RangeInclusive<i64>,
    errors: &mut Vec<String>,
) -> i64 {
    match config.get(section).and_then(|s| s.get(key)) {
        Some(toml::Value::Integer(value)) if range.contains(value) => *value,
        Some(toml::Value::Integer(_)) => {
            errors.push(format!(
                "[{}] {} must be {}-{}",
                section,
                key,
                range.start(),
                range.end()
            ));
            0
        }
        Some(_) => {
            errors.push(format!("[{}] {} must be an integer", section, key));
            0
        }
        None => {
            errors.push(format!("[{}] missing '{}'", section, key));
            0
        }
    }
}

/// Abort the build with a boxed error list
fn report(title: &str, errors: &[String]) {
    if errors.is_empty() {
        return;
    }

    panic!(
        "\n\
        ╔══════════════════════════════════════════════════════════════════╗\n\
        ║  ERROR: {:<56} ║\n\
        ╠══════════════════════════════════════════════════════════════════╣\n\
        {}\n\
        ╚══════════════════════════════════════════════════════════════════╝\n",
        title,
        errors
            .iter()
            .map(|e| format!("║  • {:<62} ║", e))
            .collect::<Vec<_>>()
            .join("\n")
    );
}

/// Format error message lines with box drawing
fn format_error_lines(msg: &str) -> String {
    msg.lines()
        .map(|line| {
            let truncated = if line.len() > 64 {
                format!("{}...", &line[..61])
            } else {
                line.to_string()
            };
            format!("║  {:<64} ║", truncated)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Write the validated settings as Rust constants
fn generate_config(settings: &StoreSettings) {
    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());
    let mut f = File::create(out_dir.join("store_config.rs")).unwrap();

    writeln!(f, "// Generated from store.toml by build.rs").unwrap();
    writeln!(f, "pub const PARAM_COUNT: usize = {};", settings.param_count).unwrap();
    writeln!(f, "pub const BASE_OFFSET: u32 = {};", settings.base_offset).unwrap();
    writeln!(
        f,
        "pub const EEPROM_PART: paramstore_drivers::eeprom::At24cConfig = \
         paramstore_drivers::eeprom::At24cConfig::{}.with_address(0x{:02x});",
        settings.preset, settings.address
    )
    .unwrap();
    writeln!(f, "pub const EEPROM_FREQUENCY_HZ: u32 = {};", settings.frequency_hz).unwrap();
    writeln!(f, "pub const TICK_INTERVAL_MS: u64 = {};", settings.tick_interval_ms).unwrap();
}
