//! Host command dispatcher
//!
//! Owns the inbound command queue and the pending confirmations. Commands
//! are popped before they are interpreted, so each one is handled at most
//! once. Button latches are reconciled per slot against the host's last
//! accepted claim.

use heapless::Deque;
use ptw_protocol::{
    CommandError, ConfirmCode, ErrorCode, Fields, Id, InboundCommand, OutboundMessage, Reply,
    Target, UpdateCommand, BATCH_ADDRESS, SLOT_COUNT,
};

use super::action::{
    push, Action, Actions, BeepPattern, BEEP_BATCH_ASSIGNED, BEEP_PICK, BEEP_REMINDER,
    BEEP_RETURN, BEEP_UNREGISTERED, BEEP_UNREGISTER_DONE, BEEP_UNREGISTER_FAILED,
};
use crate::config::WallConfig;
use crate::state::{BatchError, ReconcileError, Wall};

/// Inbound queue capacity
pub const INBOUND_QUEUE_CAPACITY: usize = 16;

/// Settle time after a confirmed pick
const PICK_SETTLE_MS: u16 = 350;
/// Hold time of the unregistered notice
const UNREGISTERED_HOLD_MS: u16 = 500;
/// Hold time of the unregister mismatch notice
const UNREGISTER_FAILED_HOLD_MS: u16 = 1000;
/// Hold time of the first reminder notice
const REMINDER_HOLD_MS: u16 = 900;

type Queued = Result<InboundCommand, CommandError>;

/// Why a received frame was not queued
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ReceiveError {
    /// Unknown command kind, dropped
    UnknownKind,
    /// Inbound queue is full, dropped
    QueueFull,
}

/// The host's last accepted claim for a slot
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PendingConfirmation {
    pub order_id: Id,
    pub claimed_item_no: u16,
}

/// Interprets host commands against the wall
pub struct Dispatcher {
    queue: Deque<Queued, INBOUND_QUEUE_CAPACITY>,
    pending: [Option<PendingConfirmation>; SLOT_COUNT],
    sound_enabled: bool,
    reminder_beeps: u8,
    reminders_left: u8,
}

impl Dispatcher {
    pub fn new(config: &WallConfig) -> Self {
        Self {
            queue: Deque::new(),
            pending: Default::default(),
            sound_enabled: config.sound_enabled,
            reminder_beeps: config.reminder_beeps,
            reminders_left: 0,
        }
    }

    pub fn sound_enabled(&self) -> bool {
        self.sound_enabled
    }

    /// Number of queued commands
    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    /// Pending confirmation of a slot
    pub fn pending(&self, slot: u8) -> Option<&PendingConfirmation> {
        self.pending.get(slot as usize).and_then(|p| p.as_ref())
    }

    /// Drop every queued command
    pub fn clear_queue(&mut self) {
        self.queue.clear();
    }

    /// Parse one decoded frame and queue it
    ///
    /// Malformed commands of a known kind are queued as errors so they are
    /// answered in order.
    pub fn receive(&mut self, fields: &Fields) -> Result<(), ReceiveError> {
        let parsed = InboundCommand::parse(fields);
        if let Err(CommandError::UnknownKind) = parsed {
            return Err(ReceiveError::UnknownKind);
        }
        self.queue
            .push_back(parsed)
            .map_err(|_| ReceiveError::QueueFull)
    }

    /// Pop and handle the oldest queued command
    ///
    /// Returns `None` when the queue is empty.
    pub fn dispatch_next(&mut self, wall: &mut Wall, now_ms: u32) -> Option<Actions> {
        let queued = self.queue.pop_front()?;
        let mut actions = Actions::new();

        match queued {
            Ok(InboundCommand::Update(update)) => {
                self.handle_update(update, wall, now_ms, &mut actions)
            }
            Ok(InboundCommand::Unregister { batch_id }) => {
                self.handle_unregister(&batch_id, wall, now_ms, &mut actions)
            }
            Ok(InboundCommand::Sound { enabled }) => self.sound_enabled = enabled,
            Ok(InboundCommand::SelfTest) => {
                push(&mut actions, send(OutboundMessage::batch(Reply::SelfTestInProgress, None)));
                push(&mut actions, Action::SelfTest);
                push(&mut actions, send(OutboundMessage::batch(Reply::SelfTestFinished, None)));
            }
            Ok(InboundCommand::Ready) => {
                push(&mut actions, send(OutboundMessage::batch(Reply::AwaitingSelfTest, None)));
                self.clear_queue();
            }
            Ok(InboundCommand::Blip {
                count,
                on_ms,
                off_ms,
            }) => self.beep(&mut actions, BeepPattern::new(count, on_ms, off_ms)),
            Err(_) => {
                push(&mut actions, send(OutboundMessage::error(BATCH_ADDRESS, ErrorCode::Malformed)));
            }
        }

        Some(actions)
    }

    fn handle_update(
        &mut self,
        update: UpdateCommand,
        wall: &mut Wall,
        now_ms: u32,
        actions: &mut Actions,
    ) {
        if update.target == Target::Batch {
            self.handle_batch_update(update, wall, now_ms, actions);
            return;
        }

        if !wall.batch().is_active() {
            push(actions, Action::Notice { row: 0, text: "First" });
            push(actions, Action::Notice { row: 1, text: "assign batch !" });
            push(actions, send(OutboundMessage::error(BATCH_ADDRESS, ErrorCode::NoBatchAssigned)));
            self.clear_queue();
            return;
        }

        match update.target {
            Target::Shelf => self.handle_shelf_update(update, wall, actions),
            _ => {
                push(actions, Action::Notice { row: 0, text: "Type error" });
                push(actions, send(OutboundMessage::error(BATCH_ADDRESS, ErrorCode::TargetType)));
            }
        }
    }

    fn handle_batch_update(
        &mut self,
        update: UpdateCommand,
        wall: &mut Wall,
        now_ms: u32,
        actions: &mut Actions,
    ) {
        let id = update.id.clone();
        let carts = update.arg2.unwrap_or(0);

        match wall.batch_mut().assign(update.id, update.arg1, carts, now_ms) {
            Ok(()) => {
                self.reminders_left = 0;
                push(actions, Action::RenderBatch { rows: 2 });
                push(actions, send(OutboundMessage::confirm(BATCH_ADDRESS, ConfirmCode::BatchAssigned, Some(id))));
                self.beep(actions, BEEP_BATCH_ASSIGNED);
            }
            Err(BatchError::AlreadyActive { same_id: true }) => {
                push(actions, Action::Notice { row: 0, text: "Batch exist !!!" });
                push(actions, send(OutboundMessage::error(BATCH_ADDRESS, ErrorCode::BatchExists)));
            }
            Err(_) => {
                push(actions, Action::Notice { row: 0, text: "Batch error" });
                push(actions, send(OutboundMessage::error(BATCH_ADDRESS, ErrorCode::BatchFieldInvalid)));
            }
        }
    }

    fn handle_shelf_update(&mut self, update: UpdateCommand, wall: &mut Wall, actions: &mut Actions) {
        let in_range = |i: &u8| (*i as usize) < SLOT_COUNT;
        let Some(index) = u8::try_from(update.slot).ok().filter(in_range) else {
            push(actions, Action::Notice { row: 0, text: "Type error" });
            push(actions, send(OutboundMessage::error(update.slot, ErrorCode::ShelfType)));
            return;
        };
        let (Some(slot), Some(items_total)) = (wall.slot_mut(index), update.arg2) else {
            // Order quantity missing
            push(actions, send(OutboundMessage::error(BATCH_ADDRESS, ErrorCode::Malformed)));
            return;
        };

        let claim = PendingConfirmation {
            order_id: update.id.clone(),
            claimed_item_no: update.arg1,
        };

        let result = if slot.claim_matches_latch(&update.id, update.arg1, items_total) {
            Ok(false)
        } else if slot.is_assigned() {
            slot.request_item_update(&update.id, update.arg1, items_total)
                .map(|()| false)
        } else {
            slot.assign(update.id, items_total).map(|()| true)
        };

        match result {
            Ok(newly_assigned) => {
                self.pending[index as usize] = Some(claim);
                if newly_assigned {
                    push(actions, Action::RenderSlot { slot: index, rows: 2 });
                }
            }
            Err(_) => {
                push(actions, send(OutboundMessage::error(index.into(), ErrorCode::StateMismatch)));
            }
        }
    }

    fn handle_unregister(&mut self, batch_id: &Id, wall: &mut Wall, now_ms: u32, actions: &mut Actions) {
        match wall.unregister(batch_id, now_ms) {
            Ok(cycle_ms) => {
                self.pending = Default::default();
                self.reminders_left = 0;

                push(actions, Action::Notice { row: 0, text: "UNREGISTERING" });
                for slot in 0..SLOT_COUNT as u8 {
                    push(actions, Action::ClearSlot(slot));
                }
                self.beep(actions, BEEP_UNREGISTERED);
                push(actions, send(OutboundMessage::batch(Reply::BatchUnregistered, Some(batch_id.clone()))));
                push(actions, Action::Notice { row: 0, text: "BATCH" });
                push(actions, Action::Notice { row: 1, text: "UNREGISTERED" });
                push(actions, Action::Pause(UNREGISTERED_HOLD_MS));
                self.beep(actions, BEEP_UNREGISTER_DONE);
                push(actions, Action::ClearBatch);
                push(actions, Action::BatchEnded { cycle_ms });
            }
            Err(_) => {
                push(actions, Action::Notice { row: 0, text: "Batch  number" });
                push(actions, Action::Notice { row: 1, text: "doesn't match" });
                self.beep(actions, BEEP_UNREGISTER_FAILED);
                push(actions, Action::Pause(UNREGISTER_FAILED_HOLD_MS));
                let current = wall.batch().batch_id().cloned();
                push(actions, send(OutboundMessage::batch(Reply::UnregisterFailed, current)));
                push(actions, Action::RenderBatch { rows: 2 });
            }
        }
    }

    /// Reconcile the button latches of one slot
    pub fn reconcile_slot(&mut self, wall: &mut Wall, index: u8) -> Actions {
        let mut actions = Actions::new();
        let Some(slot) = wall.slot_mut(index) else {
            return actions;
        };

        if slot.pending_front_event() {
            let Some(claim) = self.pending[index as usize].as_ref() else {
                return actions;
            };
            match slot.reconcile_front(claim.claimed_item_no) {
                Ok(confirmation) => {
                    let order_id = slot.order_id().cloned();
                    self.pending[index as usize] = None;

                    self.beep(&mut actions, BEEP_PICK);
                    push(&mut actions, send(OutboundMessage::confirm(index.into(), ConfirmCode::FrontPressed, order_id.clone())));
                    push(&mut actions, Action::RenderSlot { slot: index, rows: 1 });
                    push(&mut actions, Action::Pause(PICK_SETTLE_MS));
                    if confirmation.full {
                        push(&mut actions, send(OutboundMessage::confirm(index.into(), ConfirmCode::ShelfFull, order_id)));
                    }
                }
                Err(ReconcileError::CountMismatch { .. }) | Err(ReconcileError::NothingPending) => {}
            }
        } else if slot.pending_return_event() {
            let Ok(returned) = slot.reconcile_return() else {
                return actions;
            };
            self.pending[index as usize] = None;

            self.beep(&mut actions, BEEP_RETURN);
            push(&mut actions, send(OutboundMessage::confirm(index.into(), ConfirmCode::BackPressed, Some(returned.order_id))));
            push(&mut actions, Action::ClearSlot(index));
            push(&mut actions, Action::OrderReturned { slot: index, cycle_ms: returned.cycle_ms });

            match wall.batch_mut().complete_one_order() {
                Ok(true) => {
                    self.reminders_left = self.reminder_beeps;
                    let batch_id = wall.batch().batch_id().cloned();
                    push(&mut actions, send(OutboundMessage::confirm(BATCH_ADDRESS, ConfirmCode::BatchFinished, batch_id)));
                }
                Ok(false) => {}
                Err(_) => {
                    push(&mut actions, Action::Notice { row: 0, text: "Qty. orders error" });
                    push(&mut actions, send(OutboundMessage::error(BATCH_ADDRESS, ErrorCode::OrderQuantity)));
                }
            }
            push(&mut actions, Action::RenderBatch { rows: 1 });
        }

        actions
    }

    /// Consume the batch button latch
    ///
    /// A press while the batch is finished silences the reminder. Returns
    /// true if a press was consumed.
    pub fn acknowledge_batch_button(&mut self, wall: &mut Wall) -> bool {
        if !wall.batch_mut().take_button_event() {
            return false;
        }
        if wall.batch().is_finished() {
            self.reminders_left = 0;
        }
        true
    }

    /// Periodic reminder while the batch is finished but not unregistered
    pub fn reminder(&mut self, wall: &Wall) -> Actions {
        let mut actions = Actions::new();
        let batch = wall.batch();
        if !batch.is_active() || !batch.is_finished() {
            return actions;
        }

        push(&mut actions, Action::Notice { row: 0, text: "Batch completed" });
        push(&mut actions, Action::Pause(REMINDER_HOLD_MS));
        push(&mut actions, Action::Notice { row: 0, text: "Unregister Batch" });
        if self.reminders_left > 0 {
            self.reminders_left -= 1;
            self.beep(&mut actions, BEEP_REMINDER);
        }
        actions
    }

    /// Beep, or keep the same timing silently when sound is off
    fn beep(&self, actions: &mut Actions, pattern: BeepPattern) {
        if self.sound_enabled {
            push(actions, Action::Beep(pattern));
        } else {
            let silent = pattern.duration_ms().min(u16::MAX as u32) as u16;
            push(actions, Action::Pause(silent));
        }
    }
}

fn send(message: OutboundMessage) -> Action {
    Action::Send(message)
}
