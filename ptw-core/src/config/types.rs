//! Configuration type definitions
//!
//! Wall timing, sound and peripheral settings. Defaults reproduce the
//! reference wall.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Shortest accepted LED tick period
pub const MIN_TICK_PERIOD_MS: u32 = 50;

/// Shortest accepted reminder interval
pub const MIN_REMINDER_INTERVAL_MS: u32 = 500;

/// Highest TM1638 brightness level
pub const MAX_LED_BRIGHTNESS: u8 = 7;

/// Configuration validation errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// LED tick period below [`MIN_TICK_PERIOD_MS`]
    TickTooShort,
    /// Reminder interval below [`MIN_REMINDER_INTERVAL_MS`]
    ReminderTooShort,
    /// Baud rate of zero
    InvalidBaudRate,
    /// Brightness above [`MAX_LED_BRIGHTNESS`]
    InvalidBrightness,
    /// Expander address outside 0x20-0x27
    InvalidExpanderAddress,
    /// Expander pin above 15
    InvalidPin,
}

/// Wall configuration
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct WallConfig {
    /// LED refresh period (ms)
    pub tick_period_ms: u32,
    /// Settle delay before the peripherals are initialized (ms)
    pub startup_delay_ms: u32,
    /// Buzzer enabled at boot
    pub sound_enabled: bool,
    /// Reminder beeps after the batch is finished
    pub reminder_beeps: u8,
    /// Interval between finished-batch reminders (ms)
    pub reminder_interval_ms: u32,
    /// Host serial baud rate
    pub baud_rate: u32,
    /// LED driver brightness (0-7)
    pub led_brightness: u8,
    /// I2C address of the I/O expander
    pub expander_address: u8,
    /// Expander pin driving the buzzer
    pub buzzer_pin: u8,
}

impl Default for WallConfig {
    fn default() -> Self {
        Self {
            tick_period_ms: 450,
            startup_delay_ms: 5000,
            sound_enabled: true,
            reminder_beeps: 4,
            reminder_interval_ms: 2000,
            baud_rate: 115_200,
            led_brightness: MAX_LED_BRIGHTNESS,
            expander_address: 0x20,
            buzzer_pin: 15,
        }
    }
}

impl WallConfig {
    /// Check value ranges
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tick_period_ms < MIN_TICK_PERIOD_MS {
            return Err(ConfigError::TickTooShort);
        }
        if self.reminder_interval_ms < MIN_REMINDER_INTERVAL_MS {
            return Err(ConfigError::ReminderTooShort);
        }
        if self.baud_rate == 0 {
            return Err(ConfigError::InvalidBaudRate);
        }
        if self.led_brightness > MAX_LED_BRIGHTNESS {
            return Err(ConfigError::InvalidBrightness);
        }
        if !(0x20..=0x27).contains(&self.expander_address) {
            return Err(ConfigError::InvalidExpanderAddress);
        }
        if self.buzzer_pin > 15 {
            return Err(ConfigError::InvalidPin);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = WallConfig::default();
        assert_eq!(config.validate(), Ok(()));
        assert_eq!(config.tick_period_ms, 450);
        assert_eq!(config.reminder_beeps, 4);
    }

    #[test]
    fn test_rejects_out_of_range() {
        let config = WallConfig {
            tick_period_ms: 10,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::TickTooShort));

        let config = WallConfig {
            reminder_interval_ms: 0,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::ReminderTooShort));

        let config = WallConfig {
            led_brightness: 9,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::InvalidBrightness));

        let config = WallConfig {
            expander_address: 0x40,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::InvalidExpanderAddress));
    }
}
