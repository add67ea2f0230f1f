//! Inbound commands sent by the host
//!
//! A decoded frame is a list of text fields; the first field selects the
//! command kind. Field positions follow the host application's layout,
//! where every command carries `KIND#TARGET#SLOT#...`.

use crate::frame::Fields;
use crate::Id;

// Command kinds on the wire
const KIND_UPDATE: &str = "U";
const KIND_UNREGISTER: &str = "UNREGISTER";
const KIND_SOUND: &str = "SOUND";
const KIND_SELFTEST: &str = "SELFTEST";
const KIND_READY: &str = "READY?";
const KIND_BLIP: &str = "BLIP";

/// Minimum field count of an update command (kind included)
pub const UPDATE_MIN_FIELDS: usize = 5;

/// Errors raised while interpreting a decoded frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CommandError {
    /// First field is not a known command kind
    UnknownKind,
    /// Fewer fields than the command requires
    MissingField,
    /// A numeric field does not parse
    InvalidNumber,
    /// A field holds a value outside its allowed set
    InvalidValue,
}

/// Addressed object of an update command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Target {
    /// `S`: a shelf slot
    Shelf,
    /// `B`: the batch
    Batch,
    /// Anything else
    Other,
}

impl Target {
    /// Parse a target field
    pub fn from_field(field: &str) -> Self {
        match field {
            "S" => Target::Shelf,
            "B" => Target::Batch,
            _ => Target::Other,
        }
    }

    /// Wire representation of an address: `S` for slots, `B` for the batch
    pub fn for_slot(slot: u16) -> &'static str {
        if (slot as usize) < crate::SLOT_COUNT {
            "S"
        } else {
            "B"
        }
    }
}

/// Item or batch update (`U`)
///
/// For shelves: `id` is the order, `arg1` the claimed item number and
/// `arg2` the order quantity. For the batch: `id` is the batch, `arg1` the
/// number of orders and `arg2` the number of carts.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct UpdateCommand {
    pub target: Target,
    /// Requested address, not yet range checked
    pub slot: u16,
    pub id: Id,
    pub arg1: u16,
    pub arg2: Option<u16>,
}

/// Commands parsed from host frames
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum InboundCommand {
    /// Item or batch update
    Update(UpdateCommand),
    /// End the active batch
    Unregister { batch_id: Id },
    /// Enable or disable the buzzer
    Sound { enabled: bool },
    /// Run the blocking diagnostic sequence
    SelfTest,
    /// Handshake reset
    Ready,
    /// One-shot buzzer pattern
    Blip { count: u8, on_ms: u16, off_ms: u16 },
}

fn field(fields: &Fields, index: usize) -> Result<&str, CommandError> {
    fields
        .get(index)
        .map(|f| f.as_str())
        .ok_or(CommandError::MissingField)
}

fn number<T: core::str::FromStr>(fields: &Fields, index: usize) -> Result<T, CommandError> {
    field(fields, index)?
        .trim()
        .parse()
        .map_err(|_| CommandError::InvalidNumber)
}

fn id(fields: &Fields, index: usize) -> Result<Id, CommandError> {
    let mut id = Id::new();
    id.push_str(field(fields, index)?)
        .map_err(|_| CommandError::InvalidValue)?;
    Ok(id)
}

impl InboundCommand {
    /// Parse a command from the fields of one frame
    pub fn parse(fields: &Fields) -> Result<Self, CommandError> {
        match field(fields, 0).map_err(|_| CommandError::UnknownKind)? {
            KIND_UPDATE => {
                if fields.len() < UPDATE_MIN_FIELDS {
                    return Err(CommandError::MissingField);
                }
                let arg2 = match fields.get(5) {
                    Some(_) => Some(number(fields, 5)?),
                    None => None,
                };
                Ok(InboundCommand::Update(UpdateCommand {
                    target: Target::from_field(field(fields, 1)?),
                    slot: number(fields, 2)?,
                    id: id(fields, 3)?,
                    arg1: number(fields, 4)?,
                    arg2,
                }))
            }
            KIND_UNREGISTER => Ok(InboundCommand::Unregister {
                batch_id: id(fields, 3)?,
            }),
            KIND_SOUND => match field(fields, 4)? {
                "ENABLED" => Ok(InboundCommand::Sound { enabled: true }),
                "DISABLED" => Ok(InboundCommand::Sound { enabled: false }),
                _ => Err(CommandError::InvalidValue),
            },
            KIND_SELFTEST => Ok(InboundCommand::SelfTest),
            KIND_READY => Ok(InboundCommand::Ready),
            KIND_BLIP => Ok(InboundCommand::Blip {
                count: number(fields, 3)?,
                on_ms: number(fields, 4)?,
                off_ms: number(fields, 5)?,
            }),
            _ => Err(CommandError::UnknownKind),
        }
    }
}
