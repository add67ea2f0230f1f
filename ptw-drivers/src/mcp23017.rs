//! MCP23017 16-bit I/O expander
//!
//! Register map in the power-on bank 0 layout. Pins 0-7 are port A,
//! pins 8-15 port B. Direction and output latches are cached so single
//! pin writes need one bus transaction.

use embedded_hal::i2c::I2c;
use ptw_core::traits::IoExpander;

use crate::DriverError;

const REG_IODIRA: u8 = 0x00;
const REG_GPPUA: u8 = 0x0C;
const REG_GPIOA: u8 = 0x12;
const REG_OLATA: u8 = 0x14;

/// Pins per device
pub const PIN_COUNT: u8 = 16;

/// MCP23017 on an I2C bus
pub struct Mcp23017<I> {
    i2c: I,
    address: u8,
    /// Direction bits, 1 = input
    iodir: u16,
    /// Output latch bits
    olat: u16,
}

impl<I: I2c> Mcp23017<I> {
    /// Create a driver; every pin starts as an input
    pub fn new(i2c: I, address: u8) -> Self {
        Self {
            i2c,
            address,
            iodir: 0xFFFF,
            olat: 0,
        }
    }

    pub fn address(&self) -> u8 {
        self.address
    }

    /// Write the cached direction and latch registers
    pub fn init(&mut self) -> Result<(), DriverError<I::Error>> {
        self.write_pair(REG_OLATA, self.olat)?;
        self.write_pair(REG_IODIRA, self.iodir)
    }

    /// Configure a pin as output (`true`) or input
    pub fn set_output(&mut self, pin: u8, output: bool) -> Result<(), DriverError<I::Error>> {
        let mask = Self::mask(pin)?;
        let iodir = if output {
            self.iodir & !mask
        } else {
            self.iodir | mask
        };
        if iodir != self.iodir {
            self.iodir = iodir;
            self.write_pair(REG_IODIRA, iodir)?;
        }
        Ok(())
    }

    /// Enable the internal pull-ups of the pins in `mask`
    pub fn set_pull_ups(&mut self, mask: u16) -> Result<(), DriverError<I::Error>> {
        self.write_pair(REG_GPPUA, mask)
    }

    /// Read both ports
    pub fn read_all(&mut self) -> Result<u16, DriverError<I::Error>> {
        let mut buf = [0u8; 2];
        self.i2c
            .write_read(self.address, &[REG_GPIOA], &mut buf)
            .map_err(DriverError::Bus)?;
        Ok(u16::from_le_bytes(buf))
    }

    /// Cached output latch
    pub fn outputs(&self) -> u16 {
        self.olat
    }

    fn mask(pin: u8) -> Result<u16, DriverError<I::Error>> {
        if pin >= PIN_COUNT {
            return Err(DriverError::InvalidPin(pin));
        }
        Ok(1 << pin)
    }

    /// Write a port A/B register pair, relying on sequential addressing
    fn write_pair(&mut self, reg_a: u8, value: u16) -> Result<(), DriverError<I::Error>> {
        let [a, b] = value.to_le_bytes();
        self.i2c
            .write(self.address, &[reg_a, a, b])
            .map_err(DriverError::Bus)
    }
}

impl<I: I2c> IoExpander for Mcp23017<I> {
    type Error = DriverError<I::Error>;

    fn read_pin(&mut self, pin: u8) -> Result<bool, Self::Error> {
        let mask = Self::mask(pin)?;
        Ok(self.read_all()? & mask != 0)
    }

    fn write_pin(&mut self, pin: u8, high: bool) -> Result<(), Self::Error> {
        self.set_output(pin, true)?;
        let mask = Self::mask(pin)?;
        self.olat = if high { self.olat | mask } else { self.olat & !mask };
        self.write_pair(REG_OLATA, self.olat)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_hal::i2c::{ErrorKind, ErrorType, Operation};
    use proptest::prelude::*;

    /// Register file behind a fake I2C bus
    struct MockBus {
        address: u8,
        registers: [u8; 0x16],
        pointer: usize,
        writes: usize,
    }

    impl MockBus {
        fn new(address: u8) -> Self {
            Self {
                address,
                registers: [0; 0x16],
                pointer: 0,
                writes: 0,
            }
        }
    }

    impl ErrorType for MockBus {
        type Error = ErrorKind;
    }

    impl I2c for MockBus {
        fn transaction(
            &mut self,
            address: u8,
            operations: &mut [Operation<'_>],
        ) -> Result<(), ErrorKind> {
            if address != self.address {
                return Err(ErrorKind::Other);
            }
            for op in operations {
                match op {
                    Operation::Write(bytes) => {
                        self.writes += 1;
                        if let Some((&reg, data)) = bytes.split_first() {
                            self.pointer = reg as usize;
                            for &byte in data {
                                self.registers[self.pointer] = byte;
                                self.pointer += 1;
                            }
                        }
                    }
                    Operation::Read(buf) => {
                        for byte in buf.iter_mut() {
                            *byte = self.registers[self.pointer];
                            self.pointer += 1;
                        }
                    }
                }
            }
            Ok(())
        }
    }

    #[test]
    fn test_write_pin_sets_direction_and_latch() {
        let mut mcp = Mcp23017::new(MockBus::new(0x20), 0x20);
        mcp.init().unwrap();

        mcp.write_pin(15, true).unwrap();
        assert_eq!(mcp.i2c.registers[REG_IODIRA as usize], 0xFF);
        assert_eq!(mcp.i2c.registers[REG_IODIRA as usize + 1], 0x7F);
        assert_eq!(mcp.i2c.registers[REG_OLATA as usize + 1], 0x80);

        mcp.write_pin(15, false).unwrap();
        assert_eq!(mcp.i2c.registers[REG_OLATA as usize + 1], 0x00);
        assert_eq!(mcp.outputs(), 0);
    }

    #[test]
    fn test_direction_written_once() {
        let mut mcp = Mcp23017::new(MockBus::new(0x20), 0x20);
        mcp.write_pin(3, true).unwrap();
        let writes = mcp.i2c.writes;
        mcp.write_pin(3, false).unwrap();
        assert_eq!(mcp.i2c.writes, writes + 1);
    }

    #[test]
    fn test_read_pin() {
        let mut bus = MockBus::new(0x20);
        bus.registers[REG_GPIOA as usize] = 0b0000_0100;
        bus.registers[REG_GPIOA as usize + 1] = 0b0000_0001;
        let mut mcp = Mcp23017::new(bus, 0x20);

        assert!(mcp.read_pin(2).unwrap());
        assert!(!mcp.read_pin(3).unwrap());
        assert!(mcp.read_pin(8).unwrap());
    }

    #[test]
    fn test_invalid_pin() {
        let mut mcp = Mcp23017::new(MockBus::new(0x20), 0x20);
        assert_eq!(mcp.write_pin(16, true), Err(DriverError::InvalidPin(16)));
    }

    proptest! {
        #[test]
        fn prop_latch_tracks_pin_writes(
            writes in prop::collection::vec((0u8..PIN_COUNT, any::<bool>()), 0..40)
        ) {
            let mut mcp = Mcp23017::new(MockBus::new(0x20), 0x20);
            let mut expected: u16 = 0;
            for (pin, high) in writes {
                mcp.write_pin(pin, high).unwrap();
                if high {
                    expected |= 1 << pin;
                } else {
                    expected &= !(1 << pin);
                }
            }

            let bus = &mcp.i2c.registers;
            let latched = u16::from_le_bytes([bus[REG_OLATA as usize], bus[REG_OLATA as usize + 1]]);
            prop_assert_eq!(mcp.outputs(), expected);
            prop_assert_eq!(latched, expected);
        }
    }

    #[test]
    fn test_bus_error_propagates() {
        let mut mcp = Mcp23017::new(MockBus::new(0x21), 0x20);
        assert_eq!(mcp.read_pin(0), Err(DriverError::Bus(ErrorKind::Other)));
    }
}
