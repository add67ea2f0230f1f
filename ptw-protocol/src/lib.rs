//! Put-to-Wall Host Protocol
//!
//! This crate defines the serial protocol between the host application
//! (warehouse order management) and the pick-to-light wall controller.
//! The protocol is textual so it can be driven from a terminal.
//!
//! # Protocol Overview
//!
//! Every message is one frame:
//! ```text
//! ┌───────┬──────────────────────────────┬─────┬───────┐
//! │ START │ FIELDS (joined by '#')       │ END │ CR LF │
//! │ '!'   │ KIND#TARGET#SLOT#ID#...      │ '%' │       │
//! └───────┴──────────────────────────────┴─────┴───────┘
//! ```
//!
//! The host assigns batches and orders; the wall confirms physical button
//! presses. Every outbound frame has exactly five fields.

#![no_std]
#![deny(unsafe_code)]

pub mod commands;
pub mod frame;
pub mod messages;

pub use commands::{CommandError, InboundCommand, Target, UpdateCommand};
pub use frame::{encode, Field, Fields, FrameDecoder, FrameError, Frames, FRAME_START};
pub use messages::{ConfirmCode, ErrorCode, MessageKind, OutboundMessage, Reply};

/// Number of shelf slots on the wall
pub const SLOT_COUNT: usize = 9;

/// Address used for the batch display and for wall-wide messages
pub const BATCH_ADDRESS: u16 = 9;

/// Order and batch identifiers as they appear on the wire
pub type Id = heapless::String<{ frame::MAX_FIELD_LEN }>;
