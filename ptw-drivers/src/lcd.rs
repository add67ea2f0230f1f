//! HD44780 displays behind an I/O expander
//!
//! All displays of the wall share the RS and D4-D7 lines and have one
//! enable line each, so only the display whose enable is pulsed latches
//! the nibble. The buzzer hangs off a spare expander pin.

use embedded_hal::delay::DelayNs;
use ptw_core::traits::{IoExpander, TextDisplay};

use crate::DriverError;

/// Displays on the bank: nine slots plus the batch display
pub const DISPLAY_COUNT: usize = 10;

/// Index of the batch display
pub const BATCH_DISPLAY: u8 = 9;

const CMD_CLEAR: u8 = 0x01;
const CMD_ENTRY_MODE: u8 = 0x06;
const CMD_DISPLAY_ON: u8 = 0x0C;
const CMD_FUNCTION_4BIT_2LINE: u8 = 0x28;
const CMD_SET_DDRAM: u8 = 0x80;

/// DDRAM address of each row
const ROW_OFFSETS: [u8; 4] = [0x00, 0x40, 0x14, 0x54];

const ENABLE_PULSE_US: u32 = 1;
const COMMAND_SETTLE_US: u32 = 50;
const CLEAR_SETTLE_US: u32 = 2_000;

/// Expander pins used by the bank
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LcdPins {
    pub rs: u8,
    /// D4, D5, D6, D7
    pub data: [u8; 4],
    /// One enable pin per display, batch display last
    pub enable: [u8; DISPLAY_COUNT],
}

impl Default for LcdPins {
    fn default() -> Self {
        Self {
            rs: 0,
            data: [1, 2, 3, 4],
            enable: [5, 6, 7, 8, 9, 10, 11, 12, 13, 14],
        }
    }
}

/// All displays and the buzzer on one expander
pub struct LcdBank<X, D> {
    expander: X,
    delay: D,
    pins: LcdPins,
    buzzer_pin: u8,
}

impl<X: IoExpander, D: DelayNs> LcdBank<X, D> {
    pub fn new(expander: X, delay: D, pins: LcdPins, buzzer_pin: u8) -> Self {
        Self {
            expander,
            delay,
            pins,
            buzzer_pin,
        }
    }

    #[cfg(test)]
    fn free(self) -> X {
        self.expander
    }

    /// Put every display into 4-bit two-line mode and clear it
    pub fn init(&mut self) -> Result<(), DriverError<X::Error>> {
        self.set_buzzer(false)?;
        for &enable in &self.pins.enable {
            self.expander
                .write_pin(enable, false)
                .map_err(DriverError::Bus)?;
        }

        for index in 0..DISPLAY_COUNT as u8 {
            // 8-bit resets, then switch to 4-bit
            self.write8(index, 0x33, false)?;
            self.write8(index, 0x32, false)?;
            self.write8(index, CMD_FUNCTION_4BIT_2LINE, false)?;
            self.write8(index, CMD_DISPLAY_ON, false)?;
            self.write8(index, CMD_ENTRY_MODE, false)?;
            self.write8(index, CMD_CLEAR, false)?;
            self.delay.delay_us(CLEAR_SETTLE_US);
        }
        Ok(())
    }

    /// Handle to one display
    pub fn display(&mut self, index: u8) -> Result<LcdDisplay<'_, X, D>, DriverError<X::Error>> {
        if index as usize >= DISPLAY_COUNT {
            return Err(DriverError::InvalidDisplay(index));
        }
        Ok(LcdDisplay { bank: self, index })
    }

    pub fn set_buzzer(&mut self, on: bool) -> Result<(), DriverError<X::Error>> {
        self.expander
            .write_pin(self.buzzer_pin, on)
            .map_err(DriverError::Bus)
    }

    fn write8(&mut self, index: u8, value: u8, char_mode: bool) -> Result<(), DriverError<X::Error>> {
        self.expander
            .write_pin(self.pins.rs, char_mode)
            .map_err(DriverError::Bus)?;
        self.write4(index, value >> 4)?;
        self.write4(index, value & 0x0F)
    }

    fn write4(&mut self, index: u8, nibble: u8) -> Result<(), DriverError<X::Error>> {
        for (bit, &pin) in self.pins.data.iter().enumerate() {
            self.expander
                .write_pin(pin, nibble & (1 << bit) != 0)
                .map_err(DriverError::Bus)?;
        }

        let enable = self.pins.enable[index as usize];
        self.expander.write_pin(enable, true).map_err(DriverError::Bus)?;
        self.delay.delay_us(ENABLE_PULSE_US);
        self.expander.write_pin(enable, false).map_err(DriverError::Bus)?;
        self.delay.delay_us(COMMAND_SETTLE_US);
        Ok(())
    }
}

/// One display of a [`LcdBank`]
pub struct LcdDisplay<'a, X, D> {
    bank: &'a mut LcdBank<X, D>,
    index: u8,
}

impl<X: IoExpander, D: DelayNs> TextDisplay for LcdDisplay<'_, X, D> {
    type Error = DriverError<X::Error>;

    fn clear(&mut self) -> Result<(), Self::Error> {
        self.bank.write8(self.index, CMD_CLEAR, false)?;
        self.bank.delay.delay_us(CLEAR_SETTLE_US);
        Ok(())
    }

    fn set_cursor(&mut self, col: u8, row: u8) -> Result<(), Self::Error> {
        let offset = ROW_OFFSETS[(row as usize).min(ROW_OFFSETS.len() - 1)];
        self.bank
            .write8(self.index, CMD_SET_DDRAM | (offset + col), false)
    }

    fn write_text(&mut self, text: &str) -> Result<(), Self::Error> {
        for byte in text.bytes() {
            let byte = if byte.is_ascii() { byte } else { b'?' };
            self.bank.write8(self.index, byte, true)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::convert::Infallible;
    use heapless::Vec;

    /// Byte latched by one display: (display, rs, value)
    type Latched = (u8, bool, u8);

    /// Expander that decodes the shared HD44780 bus
    struct MockExpander {
        levels: u16,
        high_nibble: Option<u8>,
        latched: Vec<Latched, 128>,
    }

    impl MockExpander {
        fn new() -> Self {
            Self {
                levels: 0,
                high_nibble: None,
                latched: Vec::new(),
            }
        }

        fn for_display(&self, display: u8) -> impl Iterator<Item = &Latched> {
            self.latched.iter().filter(move |l| l.0 == display)
        }
    }

    impl IoExpander for MockExpander {
        type Error = Infallible;

        fn read_pin(&mut self, pin: u8) -> Result<bool, Infallible> {
            Ok(self.levels & (1 << pin) != 0)
        }

        fn write_pin(&mut self, pin: u8, high: bool) -> Result<(), Infallible> {
            let was_high = self.levels & (1 << pin) != 0;
            if high {
                self.levels |= 1 << pin;
            } else {
                self.levels &= !(1 << pin);
            }

            // Falling enable edge latches the data lines
            if (5..=14).contains(&pin) && was_high && !high {
                let nibble = ((self.levels >> 1) & 0x0F) as u8;
                let rs = self.levels & 1 != 0;
                match self.high_nibble.take() {
                    Some(high) => {
                        let _ = self.latched.push((pin - 5, rs, (high << 4) | nibble));
                    }
                    None => self.high_nibble = Some(nibble),
                }
            }
            Ok(())
        }
    }

    struct NoDelay;

    impl DelayNs for NoDelay {
        fn delay_ns(&mut self, _ns: u32) {}
    }

    fn bank() -> LcdBank<MockExpander, NoDelay> {
        LcdBank::new(MockExpander::new(), NoDelay, LcdPins::default(), 15)
    }

    #[test]
    fn test_init_sequence_per_display() {
        let mut bank = bank();
        bank.init().unwrap();

        let expander = bank.free();
        for display in 0..DISPLAY_COUNT as u8 {
            let bytes: Vec<u8, 8> = expander.for_display(display).map(|l| l.2).collect();
            assert_eq!(bytes.as_slice(), &[0x33, 0x32, 0x28, 0x0C, 0x06, 0x01]);
        }
    }

    #[test]
    fn test_text_goes_to_one_display() {
        let mut bank = bank();
        {
            let mut display = bank.display(3).unwrap();
            display.set_cursor(2, 1).unwrap();
            display.write_text("Hi").unwrap();
        }

        let expander = bank.free();
        let latched: Vec<Latched, 8> = expander.latched.iter().copied().collect();
        assert_eq!(
            latched.as_slice(),
            &[(3, false, 0xC2), (3, true, b'H'), (3, true, b'i')]
        );
    }

    #[test]
    fn test_invalid_display() {
        let mut bank = bank();
        assert!(matches!(bank.display(10), Err(DriverError::InvalidDisplay(10))));
    }

    #[test]
    fn test_buzzer_pin() {
        let mut bank = bank();
        bank.set_buzzer(true).unwrap();
        assert!(bank.expander.read_pin(15).unwrap());
        bank.set_buzzer(false).unwrap();
        assert!(!bank.expander.read_pin(15).unwrap());
    }
}
