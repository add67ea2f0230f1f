//! Build script for ptw-firmware
//!
//! - Sets up linker search paths for memory.x
//! - Validates wall.toml at compile time

use std::env;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

fn main() {
    setup_linker();
    validate_config();
}

/// Set up linker search paths for memory.x
fn setup_linker() {
    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());

    // Copy memory.x to the output directory
    let memory_x = include_bytes!("memory.x");
    let mut f = File::create(out_dir.join("memory.x")).unwrap();
    f.write_all(memory_x).unwrap();

    // Tell rustc where to find memory.x
    println!("cargo:rustc-link-search={}", out_dir.display());

    println!("cargo:rustc-link-arg-bins=--nmagic");
    println!("cargo:rustc-link-arg-bins=-Tlink.x");
    println!("cargo:rustc-link-arg-bins=-Tdefmt.x");

    // Re-run if memory.x changes
    println!("cargo:rerun-if-changed=memory.x");
    println!("cargo:rerun-if-changed=build.rs");
}

/// Validate wall.toml configuration at compile time
fn validate_config() {
    println!("cargo:rerun-if-changed=wall.toml");

    let config_path = Path::new("wall.toml");

    if !config_path.exists() {
        panic!(
            "\n\
            ╔══════════════════════════════════════════════════════════════════╗\n\
            ║  ERROR: wall.toml not found!                                     ║\n\
            ║                                                                  ║\n\
            ║  The firmware embeds wall.toml as its configuration.             ║\n\
            ║  Please create one in the ptw-firmware directory.                ║\n\
            ╚══════════════════════════════════════════════════════════════════╝\n"
        );
    }

    let config_content = match fs::read_to_string(config_path) {
        Ok(content) => content,
        Err(e) => {
            panic!(
                "\n\
                ╔══════════════════════════════════════════════════════════════════╗\n\
                ║  ERROR: Failed to read wall.toml                                 ║\n\
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
            let error_msg = e.to_string();
            panic!(
                "\n\
                ╔══════════════════════════════════════════════════════════════════╗\n\
                ║  ERROR: Invalid TOML syntax in wall.toml                         ║\n\
                ╠══════════════════════════════════════════════════════════════════╣\n\
                ║                                                                  ║\n\
                {}\n\
                ║                                                                  ║\n\
                ╚══════════════════════════════════════════════════════════════════╝\n",
                format_error_lines(&error_msg)
            );
        }
    };

    let mut errors = Vec::new();
    validate_known_keys(&config, &mut errors);
    validate_ranges(&config, &mut errors);

    if !errors.is_empty() {
        panic!(
            "\n\
            ╔══════════════════════════════════════════════════════════════════╗\n\
            ║  ERROR: Invalid wall configuration                               ║\n\
            ╠══════════════════════════════════════════════════════════════════╣\n\
            {}\n\
            ╚══════════════════════════════════════════════════════════════════╝\n",
            errors
                .iter()
                .map(|e| format!("║  • {:<62} ║", e))
                .collect::<Vec<_>>()
                .join("\n")
        );
    }

    println!("cargo:warning=wall.toml validated successfully");
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

/// Keys the firmware parser understands, per section ("" is the root)
const KNOWN_KEYS: &[(&str, &[&str])] = &[
    ("", &["tick_period_ms", "startup_delay_ms"]),
    ("sound", &["enabled", "reminder_beeps", "reminder_interval_ms"]),
    ("serial", &["baud_rate"]),
    ("leds", &["brightness"]),
    ("expander", &["address", "buzzer_pin"]),
];

/// Reject sections and keys the firmware would silently ignore
fn validate_known_keys(config: &toml::Value, errors: &mut Vec<String>) {
    let Some(root) = config.as_table() else {
        return;
    };

    for (key, value) in root {
        match value {
            toml::Value::Table(section) => {
                let Some((_, keys)) = KNOWN_KEYS.iter().find(|(name, _)| name == key) else {
                    errors.push(format!("unknown section [{}]", key));
                    continue;
                };
                for inner in section.keys() {
                    if !keys.contains(&inner.as_str()) {
                        errors.push(format!("[{}] unknown key '{}'", key, inner));
                    }
                }
            }
            _ => {
                if !KNOWN_KEYS[0].1.contains(&key.as_str()) {
                    errors.push(format!("unknown key '{}'", key));
                }
            }
        }
    }
}

fn integer(config: &toml::Value, section: Option<&str>, key: &str) -> Option<i64> {
    let table = match section {
        Some(name) => config.get(name)?,
        None => config,
    };
    table.get(key)?.as_integer()
}

/// Check the same ranges the firmware enforces at boot
fn validate_ranges(config: &toml::Value, errors: &mut Vec<String>) {
    if let Some(tick) = integer(config, None, "tick_period_ms") {
        if tick < 50 {
            errors.push("tick_period_ms must be at least 50".to_string());
        }
    }

    if let Some(interval) = integer(config, Some("sound"), "reminder_interval_ms") {
        if interval < 500 {
            errors.push("[sound] reminder_interval_ms must be at least 500".to_string());
        }
    }

    if let Some(baud) = integer(config, Some("serial"), "baud_rate") {
        if baud <= 0 {
            errors.push("[serial] baud_rate must be positive".to_string());
        }
    }

    if let Some(brightness) = integer(config, Some("leds"), "brightness") {
        if !(0..=7).contains(&brightness) {
            errors.push("[leds] brightness must be 0-7".to_string());
        }
    }

    if let Some(address) = integer(config, Some("expander"), "address") {
        if !(0x20..=0x27).contains(&address) {
            errors.push("[expander] address must be 0x20-0x27".to_string());
        }
    }
    if let Some(pin) = integer(config, Some("expander"), "buzzer_pin") {
        if !(0..=15).contains(&pin) {
            errors.push("[expander] buzzer_pin must be 0-15".to_string());
        }
    }

    if let Some(sound) = config.get("sound") {
        if let Some(enabled) = sound.get("enabled") {
            if !enabled.is_bool() {
                errors.push("[sound] enabled must be true or false".to_string());
            }
        }
    }
}
