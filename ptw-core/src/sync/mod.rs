//! Shared wall state and the LED tick gate
//!
//! The wall lives in a blocking mutex so the controller and the LED tick
//! task see consistent state. Locks are short and never held across an
//! await point.

use core::cell::RefCell;
use core::sync::atomic::{AtomicBool, Ordering};

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::blocking_mutex::Mutex;

use crate::led::{self, LedPattern};
use crate::state::{Batch, ButtonEvent, ShelfSlot, Wall};

/// The wall behind a blocking mutex
pub struct SharedWall<M: RawMutex> {
    inner: Mutex<M, RefCell<Wall>>,
}

impl<M: RawMutex> Default for SharedWall<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: RawMutex> SharedWall<M> {
    pub const fn new() -> Self {
        Self {
            inner: Mutex::new(RefCell::new(Wall::new())),
        }
    }

    /// Run `f` with exclusive access to the wall
    pub fn with<R>(&self, f: impl FnOnce(&mut Wall) -> R) -> R {
        self.inner.lock(|cell| f(&mut cell.borrow_mut()))
    }

    /// Apply a button edge
    pub fn apply_button(&self, event: ButtonEvent, now_ms: u32) -> bool {
        self.with(|wall| wall.apply_button(event, now_ms))
    }

    /// LED frames of the current state
    pub fn led_pattern(&self) -> LedPattern {
        self.inner.lock(|cell| led::encode(&cell.borrow()))
    }

    /// Copy of one slot
    pub fn slot(&self, index: u8) -> Option<ShelfSlot> {
        self.inner.lock(|cell| cell.borrow().slot(index).cloned())
    }

    /// Copy of the batch
    pub fn batch(&self) -> Batch {
        self.inner.lock(|cell| cell.borrow().batch().clone())
    }
}

/// Lets the LED tick run or suspends it
pub struct TickGate {
    open: AtomicBool,
}

impl Default for TickGate {
    fn default() -> Self {
        Self::new()
    }
}

impl TickGate {
    pub const fn new() -> Self {
        Self {
            open: AtomicBool::new(true),
        }
    }

    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::Acquire)
    }

    /// Close the gate until the returned guard is dropped
    pub fn pause(&self) -> TickPause<'_> {
        self.open.store(false, Ordering::Release);
        TickPause { gate: self }
    }
}

/// Reopens the tick gate on drop
pub struct TickPause<'a> {
    gate: &'a TickGate,
}

impl Drop for TickPause<'_> {
    fn drop(&mut self) {
        self.gate.open.store(true, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embassy_sync::blocking_mutex::raw::NoopRawMutex;
    use ptw_protocol::Id;

    #[test]
    fn test_shared_wall_snapshot() {
        let shared: SharedWall<NoopRawMutex> = SharedWall::new();
        shared.with(|wall| {
            wall.batch_mut()
                .assign(Id::try_from("B1").unwrap(), 1, 1, 0)
                .unwrap();
            wall.slot_mut(0)
                .unwrap()
                .assign(Id::try_from("ORD1").unwrap(), 2)
                .unwrap();
        });

        assert!(shared.apply_button(ButtonEvent::Front(0), 5));
        assert_eq!(shared.slot(0).unwrap().items_picked(), 1);
        assert!(shared.batch().is_active());
        assert_eq!(shared.led_pattern(), shared.with(|wall| led::encode(wall)));
    }

    #[test]
    fn test_tick_gate_reopens_on_drop() {
        let gate = TickGate::new();
        assert!(gate.is_open());
        {
            let _pause = gate.pause();
            assert!(!gate.is_open());
        }
        assert!(gate.is_open());
    }
}
