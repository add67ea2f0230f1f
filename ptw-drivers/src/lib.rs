//! Hardware driver implementations
//!
//! This crate provides concrete implementations of the traits defined
//! in ptw-core for the reference wall hardware:
//!
//! - TM1638 LED driver (bit-banged over three GPIOs)
//! - MCP23017 16-bit I/O expander (I2C)
//! - HD44780 character displays in 4-bit mode behind the expander

#![no_std]
#![deny(unsafe_code)]

pub mod lcd;
pub mod mcp23017;
pub mod tm1638;

pub use lcd::{LcdBank, LcdDisplay, LcdPins};
pub use mcp23017::Mcp23017;
pub use tm1638::Tm1638;

/// Errors reported by the drivers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DriverError<E> {
    /// Bus or pin failure
    Bus(E),
    /// Pin number outside the device
    InvalidPin(u8),
    /// Register address outside the device
    InvalidAddress(u8),
    /// Display index outside the bank
    InvalidDisplay(u8),
}
