//! Button events posted by the button tasks

use ptw_protocol::SLOT_COUNT;

/// A rising edge on one of the wall's buttons
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ButtonEvent {
    /// Front (pick) button of a slot
    Front(u8),
    /// Back (return) button of a slot
    Back(u8),
    /// Batch button
    Batch,
}

impl ButtonEvent {
    /// Slot index addressed by this event, if any
    pub fn slot(&self) -> Option<u8> {
        match self {
            ButtonEvent::Front(slot) | ButtonEvent::Back(slot) => {
                ((*slot as usize) < SLOT_COUNT).then_some(*slot)
            }
            ButtonEvent::Batch => None,
        }
    }
}
