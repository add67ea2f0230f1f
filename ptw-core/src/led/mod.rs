//! LED register encoding
//!
//! The LED driver exposes eight grid registers. Each slot owns one bit
//! value in a base register; its four lights sit at fixed register
//! offsets from that base:
//!
//! ```text
//! base + 0  display backlight
//! base + 2  front (pick) light
//! base + 4  back red light
//! base + 6  back green light
//! ```
//!
//! Slots 0-7 use base register 0 with bit values 1..=128, slot 8 uses
//! base register 1 with bit value 1. The batch display uses register 1
//! with bit value 2.
//!
//! Blinking is expressed with two frames: `on` is sent on odd ticks and
//! `off` on even ticks. A steady light is set in both frames.

use ptw_protocol::SLOT_COUNT;

use crate::state::Wall;

/// Number of grid registers
pub const GRID_REGISTERS: usize = 8;

/// `(base register, bit value)` of each slot
pub const SLOT_POSITIONS: [(usize, u8); SLOT_COUNT] = [
    (0, 1),
    (0, 2),
    (0, 4),
    (0, 8),
    (0, 16),
    (0, 32),
    (0, 64),
    (0, 128),
    (1, 1),
];

pub const BACKLIGHT_OFFSET: usize = 0;
pub const FRONT_OFFSET: usize = 2;
pub const BACK_RED_OFFSET: usize = 4;
pub const BACK_GREEN_OFFSET: usize = 6;

/// Register of the batch display backlight
pub const BATCH_REGISTER: usize = 1;
/// Bit value of the batch display backlight
pub const BATCH_BIT: u8 = 2;

/// Blink frames for the LED driver
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LedPattern {
    pub on: [u8; GRID_REGISTERS],
    pub off: [u8; GRID_REGISTERS],
}

impl Default for LedPattern {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl LedPattern {
    /// All lights off
    pub const EMPTY: Self = Self {
        on: [0; GRID_REGISTERS],
        off: [0; GRID_REGISTERS],
    };

    /// Set one light of a slot in either frame
    pub fn set(&mut self, position: (usize, u8), offset: usize, on: bool, off: bool) {
        let (base, bit) = position;
        let register = base + offset;
        if on {
            self.on[register] |= bit;
        }
        if off {
            self.off[register] |= bit;
        }
    }

    /// Combine two patterns
    pub fn merge(mut self, other: &LedPattern) -> Self {
        for i in 0..GRID_REGISTERS {
            self.on[i] |= other.on[i];
            self.off[i] |= other.off[i];
        }
        self
    }

    /// Frame to transmit for a tick phase
    pub fn frame(&self, phase_on: bool) -> &[u8; GRID_REGISTERS] {
        if phase_on {
            &self.on
        } else {
            &self.off
        }
    }
}

/// Compute the LED frames of the whole wall
///
/// Pure function of the wall state.
pub fn encode(wall: &Wall) -> LedPattern {
    wall.slots()
        .iter()
        .fold(wall.batch().led_pattern(), |pattern, slot| {
            pattern.merge(&slot.led_pattern())
        })
}

/// Alternates between the two blink frames
#[derive(Debug, Clone, Copy, Default)]
pub struct Blinker {
    ticks: u32,
}

impl Blinker {
    pub const fn new() -> Self {
        Self { ticks: 0 }
    }

    /// Advance one tick
    ///
    /// Returns the frame to transmit and the status indicator level. Odd
    /// ticks send `on` with the indicator high.
    pub fn tick<'a>(&mut self, pattern: &'a LedPattern) -> (&'a [u8; GRID_REGISTERS], bool) {
        self.ticks = self.ticks.wrapping_add(1);
        let phase_on = self.ticks % 2 == 1;
        (pattern.frame(phase_on), phase_on)
    }

    pub fn ticks(&self) -> u32 {
        self.ticks
    }
}
