//! Frame encoding and decoding for the host protocol.
//!
//! Frame format:
//! - START (1 byte): `!`
//! - FIELDS: ASCII text fields separated by `#`
//! - END (1 byte): `%`
//! - CR LF on outbound frames (ignored between inbound frames)

use core::fmt::Write;

use heapless::{String, Vec};

/// Frame start marker
pub const FRAME_START: u8 = b'!';

/// Frame end marker
pub const FRAME_END: u8 = b'%';

/// Field separator
pub const FIELD_SEPARATOR: u8 = b'#';

/// Appended to every outbound frame
pub const LINE_TERMINATOR: &str = "\r\n";

/// Maximum number of fields in one frame
pub const MAX_FIELDS: usize = 8;

/// Maximum length of a single field
pub const MAX_FIELD_LEN: usize = 24;

/// Maximum encoded outbound frame size
pub const MAX_FRAME_SIZE: usize = 96;

/// One text field of a frame
pub type Field = String<MAX_FIELD_LEN>;

/// The ordered fields of one decoded frame
pub type Fields = Vec<Field, MAX_FIELDS>;

/// Errors that can occur during frame decoding or encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FrameError {
    /// End marker without a preceding start marker
    UnexpectedEnd,
    /// Start marker inside an unfinished frame
    UnexpectedStart,
    /// A field exceeds `MAX_FIELD_LEN`
    FieldTooLong,
    /// More than `MAX_FIELDS` fields
    TooManyFields,
    /// Non-printable or non-ASCII byte inside a frame
    InvalidByte,
    /// Buffer too small for encoding
    BufferTooSmall,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DecodeState {
    /// Skipping bytes until `!`
    WaitingForStart,
    /// Collecting fields
    InFrame,
    /// Dropping the rest of a rejected frame
    Discarding,
}

/// Incremental frame decoder
///
/// State survives between calls, so a frame split across several serial
/// reads is decoded exactly once.
#[derive(Debug, Clone)]
pub struct FrameDecoder {
    state: DecodeState,
    fields: Fields,
    current: Field,
}

impl Default for FrameDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameDecoder {
    /// Create a new decoder waiting for a frame start
    pub const fn new() -> Self {
        Self {
            state: DecodeState::WaitingForStart,
            fields: Vec::new(),
            current: String::new(),
        }
    }

    /// Drop any partially received frame
    pub fn reset(&mut self) {
        self.state = DecodeState::WaitingForStart;
        self.fields.clear();
        self.current.clear();
    }

    /// Returns true if a frame has been started but not finished
    pub fn in_frame(&self) -> bool {
        self.state == DecodeState::InFrame
    }

    fn begin(&mut self) {
        self.fields.clear();
        self.current.clear();
        self.state = DecodeState::InFrame;
    }

    fn discard(&mut self, error: FrameError) -> Result<Option<Fields>, FrameError> {
        self.fields.clear();
        self.current.clear();
        self.state = DecodeState::Discarding;
        Err(error)
    }

    fn finish_field(&mut self) -> Result<(), FrameError> {
        let field = core::mem::take(&mut self.current);
        self.fields
            .push(field)
            .map_err(|_| FrameError::TooManyFields)
    }

    /// Feed a single byte to the decoder
    ///
    /// Returns `Ok(Some(fields))` when a frame is complete, `Ok(None)` when
    /// more bytes are needed, or `Err` when a malformed frame was dropped.
    pub fn feed(&mut self, byte: u8) -> Result<Option<Fields>, FrameError> {
        match self.state {
            DecodeState::WaitingForStart => match byte {
                FRAME_START => {
                    self.begin();
                    Ok(None)
                }
                FRAME_END => Err(FrameError::UnexpectedEnd),
                // Line terminators and noise between frames
                _ => Ok(None),
            },
            DecodeState::Discarding => {
                match byte {
                    FRAME_START => self.begin(),
                    FRAME_END => self.state = DecodeState::WaitingForStart,
                    _ => {}
                }
                Ok(None)
            }
            DecodeState::InFrame => match byte {
                FRAME_START => {
                    // Resynchronise on the newer start marker
                    self.begin();
                    Err(FrameError::UnexpectedStart)
                }
                FRAME_END => {
                    let result = self.finish_field();
                    self.state = DecodeState::WaitingForStart;
                    match result {
                        Ok(()) => Ok(Some(core::mem::take(&mut self.fields))),
                        Err(e) => {
                            self.fields.clear();
                            Err(e)
                        }
                    }
                }
                FIELD_SEPARATOR => match self.finish_field() {
                    Ok(()) => Ok(None),
                    Err(e) => self.discard(e),
                },
                b' '..=b'~' => match self.current.push(byte as char) {
                    Ok(()) => Ok(None),
                    Err(()) => self.discard(FrameError::FieldTooLong),
                },
                _ => self.discard(FrameError::InvalidByte),
            },
        }
    }

    /// Decode all frames contained in `bytes`
    ///
    /// The returned iterator is lazy: bytes are consumed only as frames are
    /// pulled from it. Bytes left over after the last complete frame stay
    /// buffered in the decoder for the next call.
    pub fn decode<'d, 'b>(&'d mut self, bytes: &'b [u8]) -> Frames<'d, 'b> {
        Frames {
            decoder: self,
            bytes: bytes.iter(),
        }
    }
}

/// Iterator over the frames decoded from one input chunk
pub struct Frames<'d, 'b> {
    decoder: &'d mut FrameDecoder,
    bytes: core::slice::Iter<'b, u8>,
}

impl Iterator for Frames<'_, '_> {
    type Item = Result<Fields, FrameError>;

    fn next(&mut self) -> Option<Self::Item> {
        for &byte in self.bytes.by_ref() {
            match self.decoder.feed(byte) {
                Ok(None) => continue,
                Ok(Some(fields)) => return Some(Ok(fields)),
                Err(e) => return Some(Err(e)),
            }
        }
        None
    }
}

/// Encode a five-field outbound frame including the line terminator
///
/// An absent `id` is written as `None`, which is what the host expects.
pub fn encode(
    kind: &str,
    target: &str,
    slot: u16,
    id: Option<&str>,
    command: &str,
) -> Result<Vec<u8, MAX_FRAME_SIZE>, FrameError> {
    let mut out: String<MAX_FRAME_SIZE> = String::new();
    write!(
        out,
        "!{}#{}#{}#{}#{}%{}",
        kind,
        target,
        slot,
        id.unwrap_or("None"),
        command,
        LINE_TERMINATOR
    )
    .map_err(|_| FrameError::BufferTooSmall)?;
    Ok(out.into_bytes())
}
