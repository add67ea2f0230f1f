//! Side effects requested by the dispatcher
//!
//! The dispatcher only mutates wall state. Everything that touches the
//! serial link, the displays or the buzzer is returned as an ordered list
//! of actions for the firmware to execute.

use heapless::Vec;
use ptw_protocol::OutboundMessage;

/// Maximum actions produced by one dispatch or reconcile step
pub const MAX_ACTIONS: usize = 24;

/// Ordered actions of one step
pub type Actions = Vec<Action, MAX_ACTIONS>;

/// Buzzer pattern: `count` beeps of `on_ms`, each followed by `off_ms`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BeepPattern {
    pub count: u8,
    pub on_ms: u16,
    pub off_ms: u16,
}

impl BeepPattern {
    pub const fn new(count: u8, on_ms: u16, off_ms: u16) -> Self {
        Self {
            count,
            on_ms,
            off_ms,
        }
    }

    /// Total duration of the pattern in milliseconds
    pub fn duration_ms(&self) -> u32 {
        self.count as u32 * (self.on_ms as u32 + self.off_ms as u32)
    }
}

/// Batch assigned
pub const BEEP_BATCH_ASSIGNED: BeepPattern = BeepPattern::new(3, 30, 40);
/// Batch unregistered
pub const BEEP_UNREGISTERED: BeepPattern = BeepPattern::new(3, 20, 20);
/// Closing tone after unregistering
pub const BEEP_UNREGISTER_DONE: BeepPattern = BeepPattern::new(1, 500, 1);
/// Unregister rejected
pub const BEEP_UNREGISTER_FAILED: BeepPattern = BeepPattern::new(5, 20, 20);
/// Pick confirmed
pub const BEEP_PICK: BeepPattern = BeepPattern::new(1, 8, 1);
/// Return confirmed
pub const BEEP_RETURN: BeepPattern = BeepPattern::new(1, 10, 1);
/// Finished batch reminder
pub const BEEP_REMINDER: BeepPattern = BeepPattern::new(5, 40, 40);
/// Selftest start and end
pub const BEEP_SELFTEST: BeepPattern = BeepPattern::new(4, 70, 40);
/// Selftest flash
pub const BEEP_SELFTEST_FLASH: BeepPattern = BeepPattern::new(1, 70, 40);

/// One side effect
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Action {
    /// Send a message to the host
    Send(OutboundMessage),
    /// Redraw the first `rows` rows of a slot display
    RenderSlot { slot: u8, rows: u8 },
    /// Redraw the first `rows` rows of the batch display
    RenderBatch { rows: u8 },
    /// Show the empty screen on a slot display
    ClearSlot(u8),
    /// Show the empty screen on the batch display
    ClearBatch,
    /// Centered operator notice on the batch display
    Notice { row: u8, text: &'static str },
    /// Sound the buzzer
    Beep(BeepPattern),
    /// Wait before the next action
    Pause(u16),
    /// Run the selftest plan
    SelfTest,
    /// An order left the wall
    OrderReturned { slot: u8, cycle_ms: u32 },
    /// The batch was unregistered
    BatchEnded { cycle_ms: u32 },
}

pub(crate) fn push(actions: &mut Actions, action: Action) {
    // MAX_ACTIONS covers the longest sequence the dispatcher emits
    let _ = actions.push(action);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_beep_duration() {
        assert_eq!(BEEP_REMINDER.duration_ms(), 400);
        assert_eq!(BEEP_UNREGISTER_DONE.duration_ms(), 501);
    }
}
