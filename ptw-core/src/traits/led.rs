//! LED driver trait

/// A multiplexed LED driver such as the TM1638
pub trait LedDriver {
    type Error;

    /// Write grid registers starting at register `start`
    fn write(&mut self, registers: &[u8], start: u8) -> Result<(), Self::Error>;
}
