//! Record encoding for the settings buffers
//!
//! Record format:
//! ```text
//! ┌──────────┬──────────────────────┬──────────────────────────┐
//! │ TYPE     │ NAME                 │ VALUE                    │
//! │ 1B       │ LEN │ bytes │ NUL    │ per type                 │
//! └──────────┴──────────────────────┴──────────────────────────┘
//! ```
//! - TYPE: value type in the low nibble, modifier flags in the high nibble
//! - text fields (name and string values): LEN counts itself, the bytes and
//!   the NUL terminator, so a field occupies exactly LEN bytes (max 255)
//! - Integer: i32 little-endian, Boolean: one byte 0/1, Number: f64
//!   little-endian
//!
//! A stream is a plain concatenation of records; its end is the used length
//! tracked by the store.

use super::cursor::{CursorError, Reader, Writer};
use super::descriptor::{Descriptor, Modifiers, SettingValue, ValueType, MAX_NAME_LEN};

/// Mask for the type code in the type byte
pub const TYPE_MASK: u8 = 0x0f;

/// Mask for the modifier flags in the type byte
pub const MODIFIER_MASK: u8 = 0xf0;

/// Largest encoded text field (limited by the single length byte)
pub const MAX_FIELD_LEN: usize = u8::MAX as usize;

/// Length byte and NUL terminator around every text field
const FIELD_OVERHEAD: usize = 2;

/// Longest string value that can be stored
pub const MAX_STRING_LEN: usize = MAX_FIELD_LEN - FIELD_OVERHEAD;

/// Errors that can occur during record encoding or decoding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RecordError {
    /// Output buffer has no room for the record
    BufferTooSmall,
    /// Name is empty or longer than [`MAX_NAME_LEN`]
    InvalidName,
    /// Text field does not fit in a single length byte
    FieldTooLong,
    /// Record extends past the end of the stream
    Truncated,
    /// Unknown type code
    InvalidType(u8),
    /// Malformed text field (bad length, missing NUL or invalid UTF-8)
    InvalidField,
}

/// Encoded size of a descriptor, `None` if it can never be encoded
pub fn encoded_len(descriptor: &Descriptor<'_>) -> Option<usize> {
    let name = field_len(descriptor.name)?;
    if descriptor.name.is_empty() || descriptor.name.len() > MAX_NAME_LEN {
        return None;
    }
    let value = match descriptor.value {
        SettingValue::Str(s) => field_len(s)?,
        SettingValue::Integer(_) => 4,
        SettingValue::Boolean(_) => 1,
        SettingValue::Number(_) => 8,
    };
    Some(1 + name + value)
}

/// Encoded size of a record with a `name_len` byte name
///
/// `string_len` is the value length for string records and ignored
/// otherwise. Usable in constant sizing checks.
pub const fn record_len(name_len: usize, value_type: ValueType, string_len: usize) -> usize {
    let value = match value_type {
        ValueType::String => string_len + FIELD_OVERHEAD,
        ValueType::Integer => 4,
        ValueType::Boolean => 1,
        ValueType::Number => 8,
    };
    1 + name_len + FIELD_OVERHEAD + value
}

fn field_len(text: &str) -> Option<usize> {
    text.len()
        .checked_add(FIELD_OVERHEAD)
        .filter(|&len| len <= MAX_FIELD_LEN)
}

fn no_room(_: CursorError) -> RecordError {
    RecordError::BufferTooSmall
}

fn put_field(out: &mut Writer<'_>, text: &str) -> Result<(), RecordError> {
    let len = field_len(text).ok_or(RecordError::FieldTooLong)?;
    out.put_u8(len as u8).map_err(no_room)?;
    out.put_bytes(text.as_bytes()).map_err(no_room)?;
    out.put_u8(0).map_err(no_room)
}

/// Append one record
///
/// On error the writer may hold a partial record; callers discard the
/// whole output buffer in that case.
pub fn encode(descriptor: &Descriptor<'_>, out: &mut Writer<'_>) -> Result<(), RecordError> {
    if descriptor.name.is_empty() || descriptor.name.len() > MAX_NAME_LEN {
        return Err(RecordError::InvalidName);
    }
    let type_byte =
        descriptor.value_type().as_u8() | (descriptor.modifiers.bits() & MODIFIER_MASK);
    out.put_u8(type_byte).map_err(no_room)?;
    put_field(out, descriptor.name)?;
    match descriptor.value {
        SettingValue::Str(s) => put_field(out, s),
        SettingValue::Integer(v) => out.put_i32(v).map_err(no_room),
        SettingValue::Boolean(v) => out.put_u8(v as u8).map_err(no_room),
        SettingValue::Number(v) => out.put_f64(v).map_err(no_room),
    }
}

fn take_field<'b>(input: &mut Reader<'b>) -> Result<&'b str, RecordError> {
    let len = input.take_u8()? as usize;
    if len < FIELD_OVERHEAD {
        return Err(RecordError::InvalidField);
    }
    let bytes = input.take(len - 1)?;
    let (text, terminator) = bytes.split_at(len - FIELD_OVERHEAD);
    if terminator != [0] {
        return Err(RecordError::InvalidField);
    }
    core::str::from_utf8(text).map_err(|_| RecordError::InvalidField)
}

/// Decode one record from the front of `input`
pub fn decode<'b>(input: &mut Reader<'b>) -> Result<Descriptor<'b>, RecordError> {
    let type_byte = input.take_u8()?;
    let code = type_byte & TYPE_MASK;
    let value_type = ValueType::from_u8(code).ok_or(RecordError::InvalidType(code))?;
    let modifiers = Modifiers::from_bits_truncate(type_byte & MODIFIER_MASK);

    let name = take_field(input)?;
    if name.is_empty() || name.len() > MAX_NAME_LEN {
        return Err(RecordError::InvalidName);
    }

    let value = match value_type {
        ValueType::String => SettingValue::Str(take_field(input)?),
        ValueType::Integer => SettingValue::Integer(input.take_i32()?),
        ValueType::Boolean => match input.take_u8()? {
            0 => SettingValue::Boolean(false),
            1 => SettingValue::Boolean(true),
            _ => return Err(RecordError::InvalidField),
        },
        ValueType::Number => SettingValue::Number(input.take_f64()?),
    };

    Ok(Descriptor {
        name,
        modifiers,
        value,
    })
}

/// A decoded record and the bytes it was decoded from
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Record<'b> {
    pub descriptor: Descriptor<'b>,
    pub raw: &'b [u8],
}

/// Iterator over the records of a stream
///
/// Yields `Err` once for a malformed record and then stops.
#[derive(Debug, Clone)]
pub struct Records<'b> {
    input: Reader<'b>,
    stream: &'b [u8],
    failed: bool,
}

impl<'b> Records<'b> {
    pub fn new(stream: &'b [u8]) -> Self {
        Self {
            input: Reader::new(stream),
            stream,
            failed: false,
        }
    }
}

impl<'b> Iterator for Records<'b> {
    type Item = Result<Record<'b>, RecordError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.input.is_empty() {
            return None;
        }
        let start = self.input.position();
        match decode(&mut self.input) {
            Ok(descriptor) => Some(Ok(Record {
                descriptor,
                raw: &self.stream[start..self.input.position()],
            })),
            Err(e) => {
                self.failed = true;
                Some(Err(e))
            }
        }
    }
}

impl From<CursorError> for RecordError {
    fn from(e: CursorError) -> Self {
        match e {
            CursorError::OutOfBounds => RecordError::Truncated,
        }
    }
}
