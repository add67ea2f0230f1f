//! Outbound messages sent to the host
//!
//! Every outbound frame has five fields:
//! `KIND#TARGET#SLOT#ID#COMMAND`. The kind is implied by the reply.

use heapless::Vec;

use crate::commands::Target;
use crate::frame::{self, FrameError, MAX_FRAME_SIZE};
use crate::{Id, BATCH_ADDRESS};

/// Outbound message kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MessageKind {
    /// `C`: confirmation
    Confirm,
    /// `E`: error
    Error,
    /// Echo of `UNREGISTER`
    Unregister,
    /// Echo of `SELFTEST`
    SelfTest,
    /// Answer to `READY?`
    Ready,
}

impl MessageKind {
    pub fn as_str(self) -> &'static str {
        match self {
            MessageKind::Confirm => "C",
            MessageKind::Error => "E",
            MessageKind::Unregister => "UNREGISTER",
            MessageKind::SelfTest => "SELFTEST",
            MessageKind::Ready => "READY",
        }
    }
}

/// Confirmation codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfirmCode {
    /// `BA`: batch assigned
    BatchAssigned,
    /// `BFP`: front button pressed, pick confirmed
    FrontPressed,
    /// `SFD`: shelf full
    ShelfFull,
    /// `BBP`: back button pressed, shelf emptied
    BackPressed,
    /// Last order of the batch returned
    BatchFinished,
}

impl ConfirmCode {
    pub fn as_str(self) -> &'static str {
        match self {
            ConfirmCode::BatchAssigned => "BA",
            ConfirmCode::FrontPressed => "BFP",
            ConfirmCode::ShelfFull => "SFD",
            ConfirmCode::BackPressed => "BBP",
            ConfirmCode::BatchFinished => "BATCH FINISHED",
        }
    }
}

/// Error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ErrorCode {
    /// `ET`: shelf address out of range
    ShelfType,
    /// `TE`: target is neither shelf nor batch
    TargetType,
    /// `SA`: host claim disagrees with the shelf state
    StateMismatch,
    /// `NE`: the batch already exists
    BatchExists,
    /// `FI`: another batch is already active
    BatchFieldInvalid,
    /// `BNA`: no batch assigned
    NoBatchAssigned,
    /// `FQ`: more returns than orders in the batch
    OrderQuantity,
    /// `ERROR`: malformed command
    Malformed,
}

impl ErrorCode {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::ShelfType => "ET",
            ErrorCode::TargetType => "TE",
            ErrorCode::StateMismatch => "SA",
            ErrorCode::BatchExists => "NE",
            ErrorCode::BatchFieldInvalid => "FI",
            ErrorCode::NoBatchAssigned => "BNA",
            ErrorCode::OrderQuantity => "FQ",
            ErrorCode::Malformed => "ERROR",
        }
    }
}

/// The command field of an outbound message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Reply {
    Confirm(ConfirmCode),
    Error(ErrorCode),
    BatchUnregistered,
    UnregisterFailed,
    SelfTestInProgress,
    SelfTestFinished,
    AwaitingSelfTest,
}

impl Reply {
    /// Message kind implied by this reply
    pub fn kind(self) -> MessageKind {
        match self {
            Reply::Confirm(_) => MessageKind::Confirm,
            Reply::Error(_) => MessageKind::Error,
            Reply::BatchUnregistered | Reply::UnregisterFailed => MessageKind::Unregister,
            Reply::SelfTestInProgress | Reply::SelfTestFinished => MessageKind::SelfTest,
            Reply::AwaitingSelfTest => MessageKind::Ready,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Reply::Confirm(code) => code.as_str(),
            Reply::Error(code) => code.as_str(),
            Reply::BatchUnregistered => "BATCH UNREGISTERED",
            Reply::UnregisterFailed => "FAILED",
            Reply::SelfTestInProgress => "IN PROGRESS",
            Reply::SelfTestFinished => "FINISHED",
            Reply::AwaitingSelfTest => "SELFTEST?",
        }
    }
}

/// A message to the host
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct OutboundMessage {
    /// Slot 0-8, 9 for the batch, or the rejected address of an `ET` error
    pub slot: u16,
    /// Order or batch identifier
    pub id: Option<Id>,
    pub reply: Reply,
}

impl OutboundMessage {
    /// Confirmation about a slot or the batch
    pub fn confirm(slot: u16, code: ConfirmCode, id: Option<Id>) -> Self {
        Self {
            slot,
            id,
            reply: Reply::Confirm(code),
        }
    }

    /// Error about a slot or the batch
    pub fn error(slot: u16, code: ErrorCode) -> Self {
        Self {
            slot,
            id: None,
            reply: Reply::Error(code),
        }
    }

    /// Wall-wide message on the batch address
    pub fn batch(reply: Reply, id: Option<Id>) -> Self {
        Self {
            slot: BATCH_ADDRESS,
            id,
            reply,
        }
    }

    pub fn kind(&self) -> MessageKind {
        self.reply.kind()
    }

    /// Encode this message into a wire frame
    pub fn encode(&self) -> Result<Vec<u8, MAX_FRAME_SIZE>, FrameError> {
        frame::encode(
            self.kind().as_str(),
            Target::for_slot(self.slot),
            self.slot,
            self.id.as_ref().map(|id| id.as_str()),
            self.reply.as_str(),
        )
    }
}
