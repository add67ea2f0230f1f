//! Board-agnostic core logic for the Put-to-Wall controller
//!
//! This crate contains all wall logic that does not depend on specific
//! hardware:
//!
//! - Slot and batch state machines
//! - Host command dispatch and button reconciliation
//! - LED register encoding
//! - Status rendering and the selftest plan
//! - Hardware abstraction traits (display, I/O expander, LED driver)
//! - Configuration type definitions

#![no_std]
#![deny(unsafe_code)]

pub mod config;
pub mod dispatch;
pub mod led;
pub mod render;
pub mod selftest;
pub mod state;
pub mod sync;
pub mod traits;
