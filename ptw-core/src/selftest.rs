//! Selftest choreography
//!
//! A fixed sequence that exercises every light, display and the buzzer.
//! The firmware runs it with the LED tick paused.

use heapless::Vec;

use crate::dispatch::action::{BeepPattern, BEEP_SELFTEST, BEEP_SELFTEST_FLASH};
use crate::led::GRID_REGISTERS;
use ptw_protocol::SLOT_COUNT;

/// Upper bound on the number of steps
pub const MAX_STEPS: usize = 72;

/// Duration of one sweep and flash phase
const STEP_MS: u16 = 250;

/// Sweep positions: one per slot plus the final all-grid step
const SWEEP_STEPS: u8 = SLOT_COUNT as u8 + 1;

/// Batch display only, everything else dark
const BATCH_ONLY: [u8; GRID_REGISTERS] = [0, 2, 0, 0, 0, 0, 0, 0];
const ALL_ON: [u8; GRID_REGISTERS] = [255, 3, 255, 1, 255, 1, 255, 1];
const ALL_OFF: [u8; GRID_REGISTERS] = [0; GRID_REGISTERS];

/// One selftest step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SelfTestStep {
    Beep(BeepPattern),
    Pause(u16),
    /// Write all grid registers
    Leds([u8; GRID_REGISTERS]),
    /// Centered text on the batch display
    Notice { row: u8, text: &'static str },
    /// Show the 1-based slot number on a slot display
    SlotNumber(u8),
    ClearSlot(u8),
    ClearBatch,
}

/// Build the selftest plan
///
/// With sound disabled every beep becomes a pause of the same length.
pub fn plan(sound_enabled: bool) -> Vec<SelfTestStep, MAX_STEPS> {
    let mut steps = Vec::new();
    let mut add = |step: SelfTestStep| {
        let _ = steps.push(step);
    };
    let beep = |pattern: BeepPattern| {
        if sound_enabled {
            SelfTestStep::Beep(pattern)
        } else {
            SelfTestStep::Pause(pattern.duration_ms() as u16)
        }
    };

    add(beep(BEEP_SELFTEST));
    add(SelfTestStep::Leds(BATCH_ONLY));
    add(SelfTestStep::Notice { row: 0, text: "SELFTEST" });
    add(SelfTestStep::Notice { row: 1, text: "PROCEDURE" });

    // Running light over the slot bits, then the second grid register
    let mut low: u8 = 1;
    let mut high: u8 = 2;
    for step in 0..SWEEP_STEPS {
        if step == 8 {
            high += 1;
            low = 0;
        } else if step == 9 {
            high = 2;
        }
        if step < SLOT_COUNT as u8 {
            add(SelfTestStep::SlotNumber(step));
        }
        add(SelfTestStep::Leds([low, high, low, high, low, high, low, high]));
        if step > 0 {
            add(SelfTestStep::ClearSlot(step - 1));
        }
        add(SelfTestStep::Pause(STEP_MS));
        low = low.wrapping_mul(2);
    }

    for _ in 0..3 {
        add(beep(BEEP_SELFTEST_FLASH));
        add(SelfTestStep::Leds(ALL_ON));
        add(SelfTestStep::Pause(STEP_MS));
        add(SelfTestStep::Leds(ALL_OFF));
        add(SelfTestStep::Pause(STEP_MS));
    }

    add(SelfTestStep::Leds(BATCH_ONLY));
    add(SelfTestStep::Notice { row: 0, text: "Test" });
    add(SelfTestStep::Notice { row: 1, text: "finished" });
    add(beep(BEEP_SELFTEST));
    add(SelfTestStep::ClearBatch);

    steps
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plan_fits() {
        let steps = plan(true);
        assert!(steps.len() < MAX_STEPS);
        assert_eq!(steps.first(), Some(&SelfTestStep::Beep(BEEP_SELFTEST)));
        assert_eq!(steps.last(), Some(&SelfTestStep::ClearBatch));
    }

    #[test]
    fn test_every_slot_shown_and_cleared() {
        let steps = plan(true);
        for slot in 0..SLOT_COUNT as u8 {
            let shown = steps.iter().position(|s| *s == SelfTestStep::SlotNumber(slot));
            let cleared = steps.iter().position(|s| *s == SelfTestStep::ClearSlot(slot));
            assert!(shown.unwrap() < cleared.unwrap());
        }
    }

    #[test]
    fn test_sweep_pattern() {
        let leds: Vec<[u8; GRID_REGISTERS], MAX_STEPS> = plan(true)
            .iter()
            .filter_map(|s| match s {
                SelfTestStep::Leds(r) => Some(*r),
                _ => None,
            })
            .collect();

        assert_eq!(leds[1][0], 1);
        assert_eq!(leds[8][0], 128);
        // Slot 8 step lights the second register
        assert_eq!(leds[9][..2], [0, 3]);
        assert_eq!(leds[10][..2], [0, 2]);
    }

    #[test]
    fn test_silent_plan_has_no_beeps() {
        let steps = plan(false);
        assert!(!steps.iter().any(|s| matches!(s, SelfTestStep::Beep(_))));
        assert_eq!(steps.len(), plan(true).len());
        assert_eq!(steps[0], SelfTestStep::Pause(440));
    }
}
