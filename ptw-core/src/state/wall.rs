//! The whole wall: nine slots and the batch

use ptw_protocol::SLOT_COUNT;

use super::batch::{Batch, BatchError};
use super::events::ButtonEvent;
use super::slot::ShelfSlot;

/// All mutable wall state, allocated once
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Wall {
    slots: [ShelfSlot; SLOT_COUNT],
    batch: Batch,
}

impl Default for Wall {
    fn default() -> Self {
        Self::new()
    }
}

impl Wall {
    pub const fn new() -> Self {
        Self {
            slots: [
                ShelfSlot::new(0),
                ShelfSlot::new(1),
                ShelfSlot::new(2),
                ShelfSlot::new(3),
                ShelfSlot::new(4),
                ShelfSlot::new(5),
                ShelfSlot::new(6),
                ShelfSlot::new(7),
                ShelfSlot::new(8),
            ],
            batch: Batch::new(),
        }
    }

    /// Slot by index, `None` if out of range
    pub fn slot(&self, index: u8) -> Option<&ShelfSlot> {
        self.slots.get(index as usize)
    }

    pub fn slot_mut(&mut self, index: u8) -> Option<&mut ShelfSlot> {
        self.slots.get_mut(index as usize)
    }

    pub fn slots(&self) -> &[ShelfSlot; SLOT_COUNT] {
        &self.slots
    }

    pub fn batch(&self) -> &Batch {
        &self.batch
    }

    pub fn batch_mut(&mut self) -> &mut Batch {
        &mut self.batch
    }

    /// Apply one button edge
    ///
    /// Returns false if the event had no effect on the wall.
    pub fn apply_button(&mut self, event: ButtonEvent, now_ms: u32) -> bool {
        match event {
            ButtonEvent::Front(index) => self
                .slot_mut(index)
                .is_some_and(|slot| slot.on_front_button_event(now_ms)),
            ButtonEvent::Back(index) => self
                .slot_mut(index)
                .is_some_and(|slot| slot.on_back_button_event(now_ms)),
            ButtonEvent::Batch => {
                self.batch.on_button_event();
                true
            }
        }
    }

    /// End the active batch and reset every slot
    ///
    /// Nothing changes if `batch_id` does not name the active batch.
    pub fn unregister(&mut self, batch_id: &str, now_ms: u32) -> Result<u32, BatchError> {
        self.batch.check_id(batch_id)?;

        for slot in self.slots.iter_mut() {
            slot.reset();
        }
        self.batch.unregister(batch_id, now_ms)
    }
}
