//! I/O expander trait

/// A bank of digital pins behind a bus, such as an MCP23017
pub trait IoExpander {
    type Error;

    /// Read a pin level
    ///
    /// Takes `&mut self` because reading goes over the bus.
    fn read_pin(&mut self, pin: u8) -> Result<bool, Self::Error>;

    /// Drive an output pin
    fn write_pin(&mut self, pin: u8, high: bool) -> Result<(), Self::Error>;
}
