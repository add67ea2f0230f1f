//! TM1638 LED driver
//!
//! The TM1638 takes commands over a three-wire serial interface: strobe
//! low frames a command, bytes are clocked in LSB first on the rising
//! clock edge.
//!
//! Only writes are used. The display RAM is 16 bytes; the wall wires its
//! lights to the first eight.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;
use ptw_core::traits::LedDriver;

use crate::DriverError;

/// Data command: write, auto-increment address
const CMD_DATA_WRITE: u8 = 0x40;
/// Address command base
const CMD_ADDRESS: u8 = 0xC0;
/// Display control: display on, brightness in the low three bits
const CMD_DISPLAY_ON: u8 = 0x88;
/// Display control: display off
const CMD_DISPLAY_OFF: u8 = 0x80;

/// Size of the display RAM
pub const RAM_SIZE: usize = 16;

/// Half clock period in microseconds
const CLOCK_HALF_PERIOD_US: u32 = 1;

/// TM1638 on three output pins
pub struct Tm1638<STB, CLK, DIO, D> {
    stb: STB,
    clk: CLK,
    dio: DIO,
    delay: D,
    brightness: u8,
}

impl<STB, CLK, DIO, D, E> Tm1638<STB, CLK, DIO, D>
where
    STB: OutputPin<Error = E>,
    CLK: OutputPin<Error = E>,
    DIO: OutputPin<Error = E>,
    D: DelayNs,
{
    pub fn new(stb: STB, clk: CLK, dio: DIO, delay: D, brightness: u8) -> Self {
        Self {
            stb,
            clk,
            dio,
            delay,
            brightness: brightness & 0x07,
        }
    }

    /// Idle the bus, clear the RAM and switch the display on
    pub fn init(&mut self) -> Result<(), DriverError<E>> {
        self.stb.set_high().map_err(DriverError::Bus)?;
        self.clk.set_high().map_err(DriverError::Bus)?;
        self.write_registers(&[0; RAM_SIZE], 0)?;
        self.set_display(true)
    }

    pub fn set_display(&mut self, on: bool) -> Result<(), DriverError<E>> {
        let cmd = if on {
            CMD_DISPLAY_ON | self.brightness
        } else {
            CMD_DISPLAY_OFF
        };
        self.command(cmd)
    }

    /// Write consecutive RAM bytes starting at `start`
    pub fn write_registers(&mut self, data: &[u8], start: u8) -> Result<(), DriverError<E>> {
        if start as usize + data.len() > RAM_SIZE {
            return Err(DriverError::InvalidAddress(start));
        }

        self.command(CMD_DATA_WRITE)?;
        self.stb.set_low().map_err(DriverError::Bus)?;
        self.send_byte(CMD_ADDRESS | start)?;
        for &byte in data {
            self.send_byte(byte)?;
        }
        self.stb.set_high().map_err(DriverError::Bus)
    }

    fn command(&mut self, cmd: u8) -> Result<(), DriverError<E>> {
        self.stb.set_low().map_err(DriverError::Bus)?;
        self.send_byte(cmd)?;
        self.stb.set_high().map_err(DriverError::Bus)
    }

    fn send_byte(&mut self, byte: u8) -> Result<(), DriverError<E>> {
        for bit in 0..8 {
            self.clk.set_low().map_err(DriverError::Bus)?;
            if byte & (1 << bit) != 0 {
                self.dio.set_high().map_err(DriverError::Bus)?;
            } else {
                self.dio.set_low().map_err(DriverError::Bus)?;
            }
            self.delay.delay_us(CLOCK_HALF_PERIOD_US);
            self.clk.set_high().map_err(DriverError::Bus)?;
            self.delay.delay_us(CLOCK_HALF_PERIOD_US);
        }
        Ok(())
    }
}

impl<STB, CLK, DIO, D, E> LedDriver for Tm1638<STB, CLK, DIO, D>
where
    STB: OutputPin<Error = E>,
    CLK: OutputPin<Error = E>,
    DIO: OutputPin<Error = E>,
    D: DelayNs,
{
    type Error = DriverError<E>;

    fn write(&mut self, registers: &[u8], start: u8) -> Result<(), Self::Error> {
        self.write_registers(registers, start)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::cell::RefCell;
    use core::convert::Infallible;
    use embedded_hal::digital::ErrorType;
    use heapless::Vec;

    type Frame = Vec<u8, 20>;

    /// Decodes what the chip would receive
    #[derive(Default)]
    struct Wire {
        stb_low: bool,
        clk: bool,
        dio: bool,
        shift: u8,
        bits: u8,
        current: Frame,
        frames: Vec<Frame, 8>,
    }

    impl Wire {
        fn strobe(&mut self, high: bool) {
            if high && self.stb_low {
                let _ = self.frames.push(core::mem::take(&mut self.current));
            }
            self.stb_low = !high;
            self.bits = 0;
            self.shift = 0;
        }

        fn clock(&mut self, high: bool) {
            if high && !self.clk && self.stb_low {
                self.shift |= (self.dio as u8) << self.bits;
                self.bits += 1;
                if self.bits == 8 {
                    let _ = self.current.push(self.shift);
                    self.bits = 0;
                    self.shift = 0;
                }
            }
            self.clk = high;
        }
    }

    #[derive(Clone, Copy)]
    enum Line {
        Stb,
        Clk,
        Dio,
    }

    /// Mock pin wired to a shared [`Wire`]
    struct MockPin<'a> {
        wire: &'a RefCell<Wire>,
        line: Line,
    }

    impl ErrorType for MockPin<'_> {
        type Error = Infallible;
    }

    impl OutputPin for MockPin<'_> {
        fn set_low(&mut self) -> Result<(), Infallible> {
            self.set(false);
            Ok(())
        }

        fn set_high(&mut self) -> Result<(), Infallible> {
            self.set(true);
            Ok(())
        }
    }

    impl MockPin<'_> {
        fn set(&mut self, high: bool) {
            let mut wire = self.wire.borrow_mut();
            match self.line {
                Line::Stb => wire.strobe(high),
                Line::Clk => wire.clock(high),
                Line::Dio => wire.dio = high,
            }
        }
    }

    struct NoDelay;

    impl DelayNs for NoDelay {
        fn delay_ns(&mut self, _ns: u32) {}
    }

    fn driver(wire: &RefCell<Wire>) -> Tm1638<MockPin<'_>, MockPin<'_>, MockPin<'_>, NoDelay> {
        Tm1638::new(
            MockPin { wire, line: Line::Stb },
            MockPin { wire, line: Line::Clk },
            MockPin { wire, line: Line::Dio },
            NoDelay,
            7,
        )
    }

    #[test]
    fn test_write_frames() {
        let wire = RefCell::new(Wire::default());
        let mut tm = driver(&wire);

        tm.write(&[0x01, 0x80, 0x55], 0).unwrap();

        let wire = wire.borrow();
        assert_eq!(wire.frames.len(), 2);
        assert_eq!(wire.frames[0].as_slice(), &[CMD_DATA_WRITE]);
        assert_eq!(wire.frames[1].as_slice(), &[0xC0, 0x01, 0x80, 0x55]);
    }

    #[test]
    fn test_init_clears_and_switches_on() {
        let wire = RefCell::new(Wire::default());
        let mut tm = driver(&wire);

        tm.init().unwrap();

        let wire = wire.borrow();
        assert_eq!(wire.frames.len(), 3);
        assert_eq!(wire.frames[1].len(), 1 + RAM_SIZE);
        assert_eq!(wire.frames[2].as_slice(), &[0x8F]);
    }

    #[test]
    fn test_brightness_is_masked() {
        let wire = RefCell::new(Wire::default());
        let mut tm = Tm1638::new(
            MockPin { wire: &wire, line: Line::Stb },
            MockPin { wire: &wire, line: Line::Clk },
            MockPin { wire: &wire, line: Line::Dio },
            NoDelay,
            12,
        );

        tm.set_display(true).unwrap();
        assert_eq!(wire.borrow().frames[0].as_slice(), &[0x8C]);
    }

    #[test]
    fn test_write_past_ram_rejected() {
        let wire = RefCell::new(Wire::default());
        let mut tm = driver(&wire);

        assert!(tm.write(&[0; 8], 10).is_err());
        assert!(wire.borrow().frames.is_empty());
    }
}
