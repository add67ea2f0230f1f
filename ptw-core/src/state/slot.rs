//! Shelf slot state machine
//!
//! A slot is assigned one order at a time. The host claims item counts,
//! the worker confirms each item with the front button, and the emptied
//! slot is acknowledged with the back button.
//!
//! ```text
//! Empty ──assign──▶ AwaitingPickConfirm ──front──▶ PickLatched
//!                        ▲                              │
//!                        └──────────reconcile───────────┤
//!                                                       │ reconcile (last item)
//! Empty ◀──reconcile── ReturnLatched ◀──back── AwaitingReturnConfirm
//! ```

use ptw_protocol::Id;

use crate::led::{LedPattern, BACKLIGHT_OFFSET, BACK_GREEN_OFFSET, BACK_RED_OFFSET, FRONT_OFFSET, SLOT_POSITIONS};

/// Coarse slot states derived from the slot flags
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SlotState {
    /// No order assigned
    Empty,
    /// Front button armed for the next item
    AwaitingPickConfirm,
    /// Front press recorded, waiting for reconciliation
    PickLatched,
    /// All items picked, back button armed
    AwaitingReturnConfirm,
    /// Back press recorded, waiting for reconciliation
    ReturnLatched,
}

/// Which consistency checks of a host claim failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Mismatch {
    /// Order id differs from the assigned order
    pub order_id: bool,
    /// Claimed item number is not ahead of the picked count
    pub item_count: bool,
    /// Order quantity differs
    pub items_total: bool,
    /// Slot is already full
    pub slot_full: bool,
}

impl Mismatch {
    pub fn any(&self) -> bool {
        self.order_id || self.item_count || self.items_total || self.slot_full
    }
}

/// Slot operation errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SlotError {
    /// Assign called on a slot that holds an order
    AlreadyAssigned,
    /// Item update for a slot without an order
    NotAssigned,
    /// Order quantity of zero
    InvalidQuantity,
    /// Host claim disagrees with the observed slot state
    ConsistencyMismatch(Mismatch),
}

/// Reconciliation failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ReconcileError {
    /// No button event latched
    NothingPending,
    /// Observed count differs from the host claim; the latch is kept
    CountMismatch { picked: u16, expected: u16 },
}

/// Result of a reconciled front press
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PickConfirmation {
    pub items_picked: u16,
    /// The slot became full with this pick
    pub full: bool,
}

/// Result of a reconciled back press
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ReturnedOrder {
    pub order_id: Id,
    /// Time from first pick to return, in milliseconds
    pub cycle_ms: u32,
}

/// One shelf slot
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ShelfSlot {
    index: u8,
    order_id: Option<Id>,
    items_total: u16,
    items_picked: u16,
    is_full: bool,
    awaiting_pick_confirm: bool,
    awaiting_return_confirm: bool,
    pending_front_event: bool,
    pending_return_event: bool,
    pick_start_time: u32,
    pick_end_time: u32,
}

impl ShelfSlot {
    /// Create an empty slot
    pub const fn new(index: u8) -> Self {
        Self {
            index,
            order_id: None,
            items_total: 0,
            items_picked: 0,
            is_full: false,
            awaiting_pick_confirm: false,
            awaiting_return_confirm: false,
            pending_front_event: false,
            pending_return_event: false,
            pick_start_time: 0,
            pick_end_time: 0,
        }
    }

    /// Return the slot to `Empty` in place
    pub fn reset(&mut self) {
        *self = Self::new(self.index);
    }

    pub fn index(&self) -> u8 {
        self.index
    }

    pub fn order_id(&self) -> Option<&Id> {
        self.order_id.as_ref()
    }

    pub fn is_assigned(&self) -> bool {
        self.order_id.is_some()
    }

    pub fn items_total(&self) -> u16 {
        self.items_total
    }

    pub fn items_picked(&self) -> u16 {
        self.items_picked
    }

    pub fn is_full(&self) -> bool {
        self.is_full
    }

    pub fn awaiting_pick_confirm(&self) -> bool {
        self.awaiting_pick_confirm
    }

    pub fn awaiting_return_confirm(&self) -> bool {
        self.awaiting_return_confirm
    }

    pub fn pending_front_event(&self) -> bool {
        self.pending_front_event
    }

    pub fn pending_return_event(&self) -> bool {
        self.pending_return_event
    }

    pub fn pick_start_time(&self) -> u32 {
        self.pick_start_time
    }

    pub fn pick_end_time(&self) -> u32 {
        self.pick_end_time
    }

    /// Current coarse state
    pub fn state(&self) -> SlotState {
        if self.order_id.is_none() {
            SlotState::Empty
        } else if self.pending_return_event {
            SlotState::ReturnLatched
        } else if self.is_full {
            SlotState::AwaitingReturnConfirm
        } else if self.pending_front_event {
            SlotState::PickLatched
        } else {
            SlotState::AwaitingPickConfirm
        }
    }

    /// Assign an order to an empty slot and arm the front button
    pub fn assign(&mut self, order_id: Id, items_total: u16) -> Result<(), SlotError> {
        if self.order_id.is_some() {
            return Err(SlotError::AlreadyAssigned);
        }
        if items_total == 0 {
            return Err(SlotError::InvalidQuantity);
        }

        self.order_id = Some(order_id);
        self.items_total = items_total;
        self.items_picked = 0;
        self.is_full = false;
        self.awaiting_pick_confirm = true;
        self.awaiting_return_confirm = false;
        Ok(())
    }

    /// Check a host claim for the next item and re-arm the front button
    ///
    /// All checks are evaluated; the slot is only modified if every one
    /// passes.
    pub fn request_item_update(
        &mut self,
        order_id: &str,
        claimed_item_no: u16,
        items_total: u16,
    ) -> Result<(), SlotError> {
        let current = self.order_id.as_ref().ok_or(SlotError::NotAssigned)?;

        let mismatch = Mismatch {
            order_id: current.as_str() != order_id,
            item_count: self.items_picked >= claimed_item_no,
            items_total: self.items_total != items_total,
            slot_full: self.is_full || self.awaiting_return_confirm,
        };

        if mismatch.any() {
            return Err(SlotError::ConsistencyMismatch(mismatch));
        }

        self.awaiting_pick_confirm = true;
        Ok(())
    }

    /// True if a host claim names the press that is already latched
    ///
    /// The worker may press before the host claims the item; such a claim
    /// confirms the latch instead of being a mismatch.
    pub fn claim_matches_latch(
        &self,
        order_id: &str,
        claimed_item_no: u16,
        items_total: u16,
    ) -> bool {
        self.pending_front_event
            && self.items_picked == claimed_item_no
            && self.items_total == items_total
            && self.order_id.as_ref().is_some_and(|id| id.as_str() == order_id)
    }

    /// Front button edge
    ///
    /// Counts one item. Further presses are ignored until the latch is
    /// reconciled. Returns false if the press was ignored.
    pub fn on_front_button_event(&mut self, now_ms: u32) -> bool {
        if !self.awaiting_pick_confirm
            || self.pending_front_event
            || self.items_picked >= self.items_total
        {
            return false;
        }

        if self.items_picked == 0 {
            self.pick_start_time = now_ms;
        }
        self.items_picked += 1;
        self.pending_front_event = true;
        true
    }

    /// Back button edge, only effective on a full slot
    pub fn on_back_button_event(&mut self, now_ms: u32) -> bool {
        if !self.is_full || !self.awaiting_return_confirm {
            return false;
        }

        self.pending_return_event = true;
        self.pick_end_time = now_ms;
        true
    }

    /// Consume a latched front press against the host's claimed count
    pub fn reconcile_front(
        &mut self,
        expected_item_no: u16,
    ) -> Result<PickConfirmation, ReconcileError> {
        if !self.pending_front_event {
            return Err(ReconcileError::NothingPending);
        }
        if self.items_picked != expected_item_no {
            return Err(ReconcileError::CountMismatch {
                picked: self.items_picked,
                expected: expected_item_no,
            });
        }

        self.pending_front_event = false;
        let full = self.items_picked == self.items_total;
        if full {
            self.is_full = true;
            self.awaiting_return_confirm = true;
            self.awaiting_pick_confirm = false;
        }

        Ok(PickConfirmation {
            items_picked: self.items_picked,
            full,
        })
    }

    /// Consume a latched back press and empty the slot
    pub fn reconcile_return(&mut self) -> Result<ReturnedOrder, ReconcileError> {
        if !self.pending_return_event {
            return Err(ReconcileError::NothingPending);
        }

        let order_id = self.order_id.take().unwrap_or_default();
        let cycle_ms = self.pick_end_time.wrapping_sub(self.pick_start_time);
        self.reset();

        Ok(ReturnedOrder { order_id, cycle_ms })
    }

    /// Light contribution of this slot
    ///
    /// - backlight: on while assigned, blinking while awaiting return
    /// - front: blinking while armed
    /// - back red: steady unless full
    /// - back green: blinking while full
    pub fn led_pattern(&self) -> LedPattern {
        let mut pattern = LedPattern::EMPTY;
        let position = SLOT_POSITIONS[self.index as usize];

        if self.order_id.is_some() {
            let blink = self.is_full && self.awaiting_return_confirm;
            pattern.set(position, BACKLIGHT_OFFSET, true, !blink);
        }

        if self.awaiting_pick_confirm {
            pattern.set(position, FRONT_OFFSET, true, false);
        }

        if !self.awaiting_return_confirm && !self.is_full {
            pattern.set(position, BACK_RED_OFFSET, true, true);
        } else {
            pattern.set(position, BACK_GREEN_OFFSET, true, false);
        }

        pattern
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn id(s: &str) -> Id {
        Id::try_from(s).unwrap()
    }

    fn assigned(total: u16) -> ShelfSlot {
        let mut slot = ShelfSlot::new(0);
        slot.assign(id("ORD1"), total).unwrap();
        slot
    }

    #[test]
    fn test_assign_arms_front_button() {
        let slot = assigned(3);
        assert_eq!(slot.state(), SlotState::AwaitingPickConfirm);
        assert_eq!(slot.items_total(), 3);
        assert!(slot.awaiting_pick_confirm());
        assert!(!slot.is_full());
    }

    #[test]
    fn test_assign_twice_fails() {
        let mut slot = assigned(3);
        assert_eq!(slot.assign(id("ORD2"), 1), Err(SlotError::AlreadyAssigned));
        assert_eq!(slot.order_id().unwrap().as_str(), "ORD1");
    }

    #[test]
    fn test_assign_zero_quantity() {
        let mut slot = ShelfSlot::new(2);
        assert_eq!(slot.assign(id("ORD1"), 0), Err(SlotError::InvalidQuantity));
        assert_eq!(slot.state(), SlotState::Empty);
    }

    #[test]
    fn test_front_press_counts_once_per_reconcile() {
        let mut slot = assigned(3);
        assert!(slot.on_front_button_event(100));
        // Bounce: ignored while the press is latched
        assert!(!slot.on_front_button_event(101));
        assert_eq!(slot.items_picked(), 1);
        assert_eq!(slot.pick_start_time(), 100);
        assert_eq!(slot.state(), SlotState::PickLatched);
    }

    #[test]
    fn test_front_press_on_empty_slot_ignored() {
        let mut slot = ShelfSlot::new(0);
        assert!(!slot.on_front_button_event(0));
        assert!(!slot.pending_front_event());
    }

    #[test]
    fn test_reconcile_front_confirms_pick() {
        let mut slot = assigned(3);
        slot.on_front_button_event(0);

        let confirmation = slot.reconcile_front(1).unwrap();
        assert_eq!(confirmation, PickConfirmation { items_picked: 1, full: false });
        assert!(!slot.pending_front_event());
        assert!(slot.awaiting_pick_confirm());
        assert_eq!(slot.state(), SlotState::AwaitingPickConfirm);
    }

    #[test]
    fn test_three_picks_without_new_claims() {
        let mut slot = ShelfSlot::new(0);
        slot.assign(id("ORD1"), 3).unwrap();
        assert!(slot.awaiting_pick_confirm());

        assert!(slot.on_front_button_event(0));
        assert_eq!(slot.items_picked(), 1);
        let first = slot.reconcile_front(1).unwrap();
        assert!(!first.full);
        assert_eq!(slot.state(), SlotState::AwaitingPickConfirm);

        assert!(slot.on_front_button_event(10));
        assert!(!slot.reconcile_front(2).unwrap().full);
        assert!(slot.on_front_button_event(20));
        let third = slot.reconcile_front(3).unwrap();

        assert_eq!(third, PickConfirmation { items_picked: 3, full: true });
        assert_eq!(slot.state(), SlotState::AwaitingReturnConfirm);
        assert!(!slot.awaiting_pick_confirm());

        assert!(slot.on_back_button_event(30));
        slot.reconcile_return().unwrap();
        assert_eq!(slot.state(), SlotState::Empty);
    }

    #[test]
    fn test_reconcile_front_mismatch_keeps_latch() {
        let mut slot = assigned(3);
        slot.on_front_button_event(0);

        assert_eq!(
            slot.reconcile_front(2),
            Err(ReconcileError::CountMismatch { picked: 1, expected: 2 })
        );
        assert!(slot.pending_front_event());
    }

    #[test]
    fn test_latched_press_waits_for_matching_claim() {
        let mut slot = assigned(3);
        slot.on_front_button_event(0);
        assert!(slot.reconcile_front(2).is_err());

        // A second press does not count while the first is latched
        assert!(!slot.on_front_button_event(10));
        assert!(slot.claim_matches_latch("ORD1", 1, 3));
        assert!(!slot.claim_matches_latch("ORD1", 2, 3));
        assert!(!slot.claim_matches_latch("ORD2", 1, 3));
        assert_eq!(slot.reconcile_front(1).unwrap().items_picked, 1);
        assert!(!slot.claim_matches_latch("ORD1", 1, 3));
    }

    #[test]
    fn test_claim_above_total_accepted() {
        let mut slot = assigned(3);
        assert_eq!(slot.request_item_update("ORD1", 5, 3), Ok(()));
        assert!(slot.awaiting_pick_confirm());
    }

    #[test]
    fn test_full_cycle_to_return() {
        let mut slot = assigned(2);

        slot.on_front_button_event(1_000);
        slot.reconcile_front(1).unwrap();
        slot.on_front_button_event(2_000);
        let confirmation = slot.reconcile_front(2).unwrap();

        assert!(confirmation.full);
        assert_eq!(slot.state(), SlotState::AwaitingReturnConfirm);
        assert!(slot.awaiting_return_confirm());
        assert!(!slot.awaiting_pick_confirm());

        assert!(slot.on_back_button_event(4_500));
        assert_eq!(slot.state(), SlotState::ReturnLatched);

        let returned = slot.reconcile_return().unwrap();
        assert_eq!(returned.order_id.as_str(), "ORD1");
        assert_eq!(returned.cycle_ms, 3_500);
        assert_eq!(slot, ShelfSlot::new(0));
    }

    #[test]
    fn test_back_press_ignored_until_full() {
        let mut slot = assigned(2);
        assert!(!slot.on_back_button_event(0));
        assert_eq!(slot.reconcile_return(), Err(ReconcileError::NothingPending));
    }

    #[test]
    fn test_update_rejected_on_unassigned_slot() {
        let mut slot = ShelfSlot::new(0);
        assert_eq!(
            slot.request_item_update("ORD1", 1, 3),
            Err(SlotError::NotAssigned)
        );
    }

    #[test]
    fn test_update_rejected_on_full_slot() {
        let mut slot = assigned(1);
        slot.on_front_button_event(0);
        slot.reconcile_front(1).unwrap();
        let before = slot.clone();

        let result = slot.request_item_update("ORD1", 2, 1);
        assert!(matches!(
            result,
            Err(SlotError::ConsistencyMismatch(Mismatch { slot_full: true, .. }))
        ));
        assert_eq!(slot, before);
    }

    #[test]
    fn test_each_single_mismatch_rejects_without_mutation() {
        let mut slot = assigned(3);
        slot.on_front_button_event(0);
        slot.reconcile_front(1).unwrap();
        let before = slot.clone();

        let cases = [("ORD2", 2, 3), ("ORD1", 1, 3), ("ORD1", 2, 4)];
        for (order, claimed, total) in cases {
            assert!(slot.request_item_update(order, claimed, total).is_err());
            assert_eq!(slot, before);
        }

        slot.request_item_update("ORD1", 2, 3).unwrap();
        assert!(slot.awaiting_pick_confirm());
    }

    #[test]
    fn test_led_pattern_of_armed_slot() {
        let slot = assigned(3);
        let pattern = slot.led_pattern();

        // Slot 0 lives in grid 0 with bit value 1
        assert_eq!(pattern.on, [1, 0, 1, 0, 1, 0, 0, 0]);
        assert_eq!(pattern.off, [1, 0, 0, 0, 1, 0, 0, 0]);
    }

    #[test]
    fn test_led_pattern_of_full_slot() {
        let mut slot = ShelfSlot::new(8);
        slot.assign(id("ORD9"), 1).unwrap();
        slot.on_front_button_event(0);
        slot.reconcile_front(1).unwrap();

        let pattern = slot.led_pattern();
        // Slot 8 lives in grid 1 with bit value 1: backlight and green blink
        assert_eq!(pattern.on, [0, 1, 0, 0, 0, 0, 0, 1]);
        assert_eq!(pattern.off, [0, 0, 0, 0, 0, 0, 0, 0]);
    }

    #[derive(Debug, Clone)]
    enum Op {
        Front,
        Back,
        Claim(u16),
        Reconcile(u16),
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            Just(Op::Front),
            Just(Op::Back),
            (0u16..8).prop_map(Op::Claim),
            (0u16..8).prop_map(Op::Reconcile),
        ]
    }

    proptest! {
        #[test]
        fn pick_progress_is_monotonic_and_bounded(
            total in 1u16..6,
            ops in prop::collection::vec(op(), 0..64),
        ) {
            let mut slot = assigned(total);
            let mut last_picked = 0;

            for (t, op) in ops.into_iter().enumerate() {
                match op {
                    Op::Front => { slot.on_front_button_event(t as u32); }
                    Op::Back => { slot.on_back_button_event(t as u32); }
                    Op::Claim(n) => { let _ = slot.request_item_update("ORD1", n, total); }
                    Op::Reconcile(n) => { let _ = slot.reconcile_front(n); }
                }

                if slot.is_assigned() {
                    prop_assert!(slot.items_picked() >= last_picked);
                    prop_assert!(slot.items_picked() <= slot.items_total());
                    last_picked = slot.items_picked();
                }
                prop_assert!(!(slot.awaiting_pick_confirm() && slot.is_full()));
                prop_assert!(slot.is_full() || !slot.is_assigned() || slot.awaiting_pick_confirm());
                prop_assert!(!(slot.awaiting_pick_confirm() && slot.awaiting_return_confirm()));
            }
        }

        #[test]
        fn conformity_gate(
            order_matches in any::<bool>(),
            claimed in 0u16..6,
            total_matches in any::<bool>(),
        ) {
            let mut slot = assigned(4);
            slot.on_front_button_event(0);
            slot.reconcile_front(1).unwrap();
            let before = slot.clone();

            let order = if order_matches { "ORD1" } else { "ORD2" };
            let total = if total_matches { 4 } else { 5 };
            let result = slot.request_item_update(order, claimed, total);

            let should_pass = order_matches && total_matches && claimed > 1;
            prop_assert_eq!(result.is_ok(), should_pass);
            if !should_pass {
                prop_assert_eq!(slot, before);
            }
        }
    }
}
