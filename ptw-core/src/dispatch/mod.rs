//! Host command dispatch
//!
//! Turns queued host commands and latched button presses into wall state
//! changes plus an ordered list of [`Action`]s.

pub mod action;
pub mod dispatcher;

pub use action::{Action, Actions, BeepPattern, MAX_ACTIONS};
pub use dispatcher::{Dispatcher, PendingConfirmation, ReceiveError, INBOUND_QUEUE_CAPACITY};
