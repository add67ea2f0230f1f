//! Hardware abstraction traits
//!
//! These traits define the interface between the wall logic and the
//! peripheral drivers.

pub mod display;
pub mod expander;
pub mod led;

pub use display::{TextDisplay, TextDisplayExt};
pub use expander::IoExpander;
pub use led::LedDriver;
