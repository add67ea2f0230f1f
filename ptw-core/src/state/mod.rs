//! Wall state
//!
//! Slots, the batch and the button events that drive them. All state is
//! fixed-size and lives in one [`Wall`] value.

pub mod batch;
pub mod events;
pub mod slot;
pub mod wall;

pub use batch::{Batch, BatchError};
pub use events::ButtonEvent;
pub use slot::{
    Mismatch, PickConfirmation, ReconcileError, ReturnedOrder, ShelfSlot, SlotError, SlotState,
};
pub use wall::Wall;
