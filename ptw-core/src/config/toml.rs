//! Minimal TOML parser for the wall configuration
//!
//! Handles only the subset `wall.toml` uses:
//! - Key = value pairs (integer, boolean)
//! - Hexadecimal integers (`0x20`) and `_` digit separators
//! - [section] headers
//! - Comments (# ...)
//!
//! Keys that are left out keep their [`WallConfig::default`] value.

use super::types::WallConfig;

/// Parse error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ParseError {
    /// Unknown or malformed section header
    InvalidSection,
    /// Unknown key in a known section
    UnknownKey,
    /// Value does not fit the key's type
    InvalidValue,
    /// Line is neither a header nor a key/value pair
    InvalidLine,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Root,
    Sound,
    Serial,
    Leds,
    Expander,
}

/// Parse TOML text into a [`WallConfig`]
pub fn parse_config(input: &str) -> Result<WallConfig, ParseError> {
    let mut config = WallConfig::default();
    let mut section = Section::Root;

    for line in input.lines() {
        let line = strip_comment(line).trim();
        if line.is_empty() {
            continue;
        }

        if line.starts_with('[') && line.ends_with(']') {
            section = parse_section_header(&line[1..line.len() - 1])?;
            continue;
        }

        let (key, value) = parse_key_value(line).ok_or(ParseError::InvalidLine)?;
        apply_value(&mut config, section, key, value)?;
    }

    Ok(config)
}

fn parse_section_header(header: &str) -> Result<Section, ParseError> {
    match header.trim() {
        "sound" => Ok(Section::Sound),
        "serial" => Ok(Section::Serial),
        "leds" => Ok(Section::Leds),
        "expander" => Ok(Section::Expander),
        _ => Err(ParseError::InvalidSection),
    }
}

fn apply_value(
    config: &mut WallConfig,
    section: Section,
    key: &str,
    value: &str,
) -> Result<(), ParseError> {
    match (section, key) {
        (Section::Root, "tick_period_ms") => config.tick_period_ms = parse_int(value)?,
        (Section::Root, "startup_delay_ms") => config.startup_delay_ms = parse_int(value)?,
        (Section::Sound, "enabled") => config.sound_enabled = parse_bool(value)?,
        (Section::Sound, "reminder_beeps") => config.reminder_beeps = parse_int(value)?,
        (Section::Sound, "reminder_interval_ms") => {
            config.reminder_interval_ms = parse_int(value)?
        }
        (Section::Serial, "baud_rate") => config.baud_rate = parse_int(value)?,
        (Section::Leds, "brightness") => config.led_brightness = parse_int(value)?,
        (Section::Expander, "address") => config.expander_address = parse_int(value)?,
        (Section::Expander, "buzzer_pin") => config.buzzer_pin = parse_int(value)?,
        _ => return Err(ParseError::UnknownKey),
    }
    Ok(())
}

/// Drop a trailing comment; the subset has no strings, so any `#` starts one
fn strip_comment(line: &str) -> &str {
    match line.find('#') {
        Some(pos) => &line[..pos],
        None => line,
    }
}

/// Parse "key = value" line
fn parse_key_value(line: &str) -> Option<(&str, &str)> {
    let (key, value) = line.split_once('=')?;
    let key = key.trim();
    let value = value.trim();
    if key.is_empty() || value.is_empty() {
        return None;
    }
    Some((key, value))
}

/// Parse a decimal or `0x` hexadecimal integer
fn parse_int<T: TryFrom<u32>>(value: &str) -> Result<T, ParseError> {
    let mut digits: heapless::String<16> = heapless::String::new();
    for c in value.chars().filter(|&c| c != '_') {
        digits.push(c).map_err(|_| ParseError::InvalidValue)?;
    }

    let parsed = match digits.strip_prefix("0x") {
        Some(hex) => u32::from_str_radix(hex, 16),
        None => digits.parse::<u32>(),
    }
    .map_err(|_| ParseError::InvalidValue)?;

    T::try_from(parsed).map_err(|_| ParseError::InvalidValue)
}

/// Parse a boolean value
fn parse_bool(value: &str) -> Result<bool, ParseError> {
    match value {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(ParseError::InvalidValue),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_int() {
        assert_eq!(parse_int::<u32>("115_200"), Ok(115_200));
        assert_eq!(parse_int::<u8>("0x20"), Ok(0x20));
        assert_eq!(parse_int::<u8>("256"), Err(ParseError::InvalidValue));
        assert_eq!(parse_int::<u32>("-1"), Err(ParseError::InvalidValue));
    }

    #[test]
    fn test_parse_bool() {
        assert_eq!(parse_bool("true"), Ok(true));
        assert_eq!(parse_bool("false"), Ok(false));
        assert_eq!(parse_bool("yes"), Err(ParseError::InvalidValue));
    }

    #[test]
    fn test_empty_input_is_default() {
        assert_eq!(parse_config("# nothing\n\n"), Ok(WallConfig::default()));
    }

    #[test]
    fn test_parse_full_config() {
        let config_str = r#"
tick_period_ms = 300   # faster blink
startup_delay_ms = 0

[sound]
enabled = false
reminder_beeps = 2
reminder_interval_ms = 1_500

[serial]
baud_rate = 9600

[leds]
brightness = 3

[expander]
address = 0x21
buzzer_pin = 14
"#;

        let config = parse_config(config_str).unwrap();
        assert_eq!(config.tick_period_ms, 300);
        assert_eq!(config.startup_delay_ms, 0);
        assert!(!config.sound_enabled);
        assert_eq!(config.reminder_beeps, 2);
        assert_eq!(config.reminder_interval_ms, 1500);
        assert_eq!(config.baud_rate, 9600);
        assert_eq!(config.led_brightness, 3);
        assert_eq!(config.expander_address, 0x21);
        assert_eq!(config.buzzer_pin, 14);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_reminder_interval_fails_validation() {
        let config = parse_config("[sound]\nreminder_interval_ms = 0\n").unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_unknown_entries() {
        assert_eq!(parse_config("[motors]\n"), Err(ParseError::InvalidSection));
        assert_eq!(parse_config("[display]\ncolumns = 20\n"), Err(ParseError::InvalidSection));
        assert_eq!(parse_config("[sound]\nvolume = 3\n"), Err(ParseError::UnknownKey));
        assert_eq!(parse_config("baud_rate = 9600\n"), Err(ParseError::UnknownKey));
        assert_eq!(parse_config("tick_period_ms\n"), Err(ParseError::InvalidLine));
    }

    #[test]
    fn test_section_scopes_keys() {
        let config = parse_config("[sound]\nenabled = false\n[leds]\nbrightness = 1\n").unwrap();
        assert!(!config.sound_enabled);
        assert_eq!(config.led_brightness, 1);
    }
}
