//! Inter-task communication channels and shared state
//!
//! Defines the statics shared between Embassy tasks. Uses embassy-sync
//! primitives for safe async communication.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use portable_atomic::{AtomicU32, Ordering};

use ptw_core::state::ButtonEvent;
use ptw_core::sync::{SharedWall, TickGate};
use ptw_protocol::Fields;

/// Channel capacity for button edges
const BUTTON_CHANNEL_SIZE: usize = 16;

/// Channel capacity for decoded host frames
const FRAME_CHANNEL_SIZE: usize = 8;

/// Button edges from the button tasks
pub static BUTTON_CHANNEL: Channel<CriticalSectionRawMutex, ButtonEvent, BUTTON_CHANNEL_SIZE> =
    Channel::new();

/// Decoded frames from the serial RX task
pub static FRAME_CHANNEL: Channel<CriticalSectionRawMutex, Fields, FRAME_CHANNEL_SIZE> =
    Channel::new();

/// Slots and batch, shared by the controller and the LED tick
pub static WALL: SharedWall<CriticalSectionRawMutex> = SharedWall::new();

/// Closed while the selftest owns the lights
pub static TICK_GATE: TickGate = TickGate::new();

static DROPPED_BUTTON_EVENTS: AtomicU32 = AtomicU32::new(0);

/// Post a button edge; a full channel drops it
pub fn post_button(event: ButtonEvent) -> bool {
    if BUTTON_CHANNEL.try_send(event).is_ok() {
        return true;
    }
    DROPPED_BUTTON_EVENTS.fetch_add(1, Ordering::Relaxed);
    false
}

/// Button edges dropped since boot
pub fn dropped_button_events() -> u32 {
    DROPPED_BUTTON_EVENTS.load(Ordering::Relaxed)
}
