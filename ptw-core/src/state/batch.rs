//! The active batch
//!
//! At most one batch is active. Orders are counted down as slots are
//! emptied; the batch is finished when the last order is returned and
//! stays on the wall until the host unregisters it.

use ptw_protocol::Id;

use crate::led::{LedPattern, BATCH_BIT, BATCH_REGISTER};

/// Batch operation errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BatchError {
    /// A batch is already active
    AlreadyActive {
        /// The active batch has the requested id
        same_id: bool,
    },
    /// No batch is active, or its id differs
    BatchMismatch,
    /// More returns than orders in the batch
    NoOrdersRemaining,
}

/// The batch currently worked on the wall
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Batch {
    batch_id: Option<Id>,
    orders_remaining: u16,
    carts_total: u16,
    is_finished: bool,
    start_time: u32,
    end_time: u32,
    pending_button_event: bool,
}

impl Default for Batch {
    fn default() -> Self {
        Self::new()
    }
}

impl Batch {
    pub const fn new() -> Self {
        Self {
            batch_id: None,
            orders_remaining: 0,
            carts_total: 0,
            is_finished: false,
            start_time: 0,
            end_time: 0,
            pending_button_event: false,
        }
    }

    pub fn batch_id(&self) -> Option<&Id> {
        self.batch_id.as_ref()
    }

    pub fn is_active(&self) -> bool {
        self.batch_id.is_some()
    }

    pub fn orders_remaining(&self) -> u16 {
        self.orders_remaining
    }

    pub fn carts_total(&self) -> u16 {
        self.carts_total
    }

    pub fn is_finished(&self) -> bool {
        self.is_finished
    }

    pub fn start_time(&self) -> u32 {
        self.start_time
    }

    pub fn end_time(&self) -> u32 {
        self.end_time
    }

    /// The batch display blinks while no batch is active or it is finished
    pub fn display_should_blink(&self) -> bool {
        self.batch_id.is_none() || self.is_finished
    }

    /// Start a new batch
    pub fn assign(
        &mut self,
        batch_id: Id,
        orders_total: u16,
        carts_total: u16,
        now_ms: u32,
    ) -> Result<(), BatchError> {
        if let Some(current) = &self.batch_id {
            return Err(BatchError::AlreadyActive {
                same_id: *current == batch_id,
            });
        }

        self.batch_id = Some(batch_id);
        self.orders_remaining = orders_total;
        self.carts_total = carts_total;
        self.is_finished = false;
        self.start_time = now_ms;
        self.end_time = 0;
        self.pending_button_event = false;
        Ok(())
    }

    /// End the batch if `batch_id` matches
    ///
    /// Returns the batch cycle time in milliseconds.
    pub fn unregister(&mut self, batch_id: &str, now_ms: u32) -> Result<u32, BatchError> {
        self.check_id(batch_id)?;

        let cycle_ms = now_ms.wrapping_sub(self.start_time);
        *self = Self::new();
        self.end_time = now_ms;
        Ok(cycle_ms)
    }

    /// Check that `batch_id` names the active batch
    pub fn check_id(&self, batch_id: &str) -> Result<(), BatchError> {
        match &self.batch_id {
            Some(current) if current.as_str() == batch_id => Ok(()),
            _ => Err(BatchError::BatchMismatch),
        }
    }

    /// Count one returned order
    ///
    /// Returns true if this was the last order of the batch.
    pub fn complete_one_order(&mut self) -> Result<bool, BatchError> {
        if self.orders_remaining == 0 {
            return Err(BatchError::NoOrdersRemaining);
        }

        self.orders_remaining -= 1;
        if self.orders_remaining == 0 {
            self.is_finished = true;
        }
        Ok(self.is_finished)
    }

    /// Batch button edge
    pub fn on_button_event(&mut self) {
        self.pending_button_event = true;
    }

    /// Consume the batch button latch
    pub fn take_button_event(&mut self) -> bool {
        core::mem::take(&mut self.pending_button_event)
    }

    /// Light contribution of the batch display
    pub fn led_pattern(&self) -> LedPattern {
        let mut pattern = LedPattern::EMPTY;
        pattern.on[BATCH_REGISTER] |= BATCH_BIT;
        if !self.display_should_blink() {
            pattern.off[BATCH_REGISTER] |= BATCH_BIT;
        }
        pattern
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> Id {
        Id::try_from(s).unwrap()
    }

    #[test]
    fn test_assign_and_count_down() {
        let mut batch = Batch::new();
        batch.assign(id("B1"), 2, 1, 100).unwrap();

        assert!(batch.is_active());
        assert!(!batch.display_should_blink());
        assert_eq!(batch.complete_one_order(), Ok(false));
        assert_eq!(batch.complete_one_order(), Ok(true));
        assert!(batch.is_finished());
        assert!(batch.display_should_blink());
        assert_eq!(batch.complete_one_order(), Err(BatchError::NoOrdersRemaining));
        assert_eq!(batch.orders_remaining(), 0);
    }

    #[test]
    fn test_assign_while_active() {
        let mut batch = Batch::new();
        batch.assign(id("B1"), 2, 1, 0).unwrap();

        assert_eq!(
            batch.assign(id("B1"), 3, 1, 0),
            Err(BatchError::AlreadyActive { same_id: true })
        );
        assert_eq!(
            batch.assign(id("B2"), 3, 1, 0),
            Err(BatchError::AlreadyActive { same_id: false })
        );
        assert_eq!(batch.orders_remaining(), 2);
    }

    #[test]
    fn test_unregister() {
        let mut batch = Batch::new();
        batch.assign(id("B1"), 2, 1, 1_000).unwrap();

        assert_eq!(batch.unregister("B2", 5_000), Err(BatchError::BatchMismatch));
        assert!(batch.is_active());

        assert_eq!(batch.unregister("B1", 5_000), Ok(4_000));
        assert!(!batch.is_active());
        assert_eq!(batch.end_time(), 5_000);
    }

    #[test]
    fn test_unregister_without_batch() {
        let mut batch = Batch::new();
        assert_eq!(batch.unregister("B1", 0), Err(BatchError::BatchMismatch));
    }

    #[test]
    fn test_button_latch() {
        let mut batch = Batch::new();
        assert!(!batch.take_button_event());
        batch.on_button_event();
        assert!(batch.take_button_event());
        assert!(!batch.take_button_event());
    }

    #[test]
    fn test_led_pattern() {
        let mut batch = Batch::new();
        let idle = batch.led_pattern();
        assert_eq!(idle.on[1], 2);
        assert_eq!(idle.off[1], 0);

        batch.assign(id("B1"), 1, 1, 0).unwrap();
        let active = batch.led_pattern();
        assert_eq!(active.on[1], 2);
        assert_eq!(active.off[1], 2);
    }
}
