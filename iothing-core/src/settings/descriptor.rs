//! Setting descriptors and typed values
//!
//! A [`Descriptor`] names one setting, its modifiers and its value. The
//! defaults table is a static slice of descriptors; decoded records borrow
//! the same type from the active buffer.

use bitflags::bitflags;

/// Maximum length of a setting name in bytes
pub const MAX_NAME_LEN: usize = 32;

/// Value type of a setting
///
/// The discriminant is the low nibble of the record's type byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum ValueType {
    /// UTF-8 string
    String = 1,
    /// Signed 32-bit integer
    Integer = 2,
    /// Boolean flag
    Boolean = 3,
    /// Double-precision float
    Number = 4,
}

impl ValueType {
    /// Get the type code as a byte value
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// Create a type from its code
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            1 => Some(ValueType::String),
            2 => Some(ValueType::Integer),
            3 => Some(ValueType::Boolean),
            4 => Some(ValueType::Number),
            _ => None,
        }
    }

    /// Lower-case type name used by the description view
    pub fn as_str(self) -> &'static str {
        match self {
            ValueType::String => "string",
            ValueType::Integer => "integer",
            ValueType::Boolean => "boolean",
            ValueType::Number => "number",
        }
    }
}

bitflags! {
    /// Access modifiers, stored in the high nibble of the type byte
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Modifiers: u8 {
        /// Excluded from enumeration and description views
        const HIDDEN = 0x80;
        /// Rejects every write
        const READ_ONLY = 0x40;
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for Modifiers {
    fn format(&self, fmt: defmt::Formatter) {
        defmt::write!(
            fmt,
            "Modifiers {{ hidden: {}, read_only: {} }}",
            self.contains(Modifiers::HIDDEN),
            self.contains(Modifiers::READ_ONLY)
        )
    }
}

/// The value held by a setting
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SettingValue<'a> {
    Str(&'a str),
    Integer(i32),
    Boolean(bool),
    Number(f64),
}

impl SettingValue<'_> {
    /// The type tag matching this value
    pub fn value_type(&self) -> ValueType {
        match self {
            SettingValue::Str(_) => ValueType::String,
            SettingValue::Integer(_) => ValueType::Integer,
            SettingValue::Boolean(_) => ValueType::Boolean,
            SettingValue::Number(_) => ValueType::Number,
        }
    }
}

/// Description of a single setting
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Descriptor<'a> {
    /// Setting name, unique within a table
    pub name: &'a str,
    /// Access modifiers
    pub modifiers: Modifiers,
    /// Current (or default) value
    pub value: SettingValue<'a>,
}

impl<'a> Descriptor<'a> {
    /// String setting
    pub const fn string(name: &'a str, modifiers: Modifiers, value: &'a str) -> Self {
        Self {
            name,
            modifiers,
            value: SettingValue::Str(value),
        }
    }

    /// Integer setting
    pub const fn integer(name: &'a str, modifiers: Modifiers, value: i32) -> Self {
        Self {
            name,
            modifiers,
            value: SettingValue::Integer(value),
        }
    }

    /// Boolean setting
    pub const fn boolean(name: &'a str, modifiers: Modifiers, value: bool) -> Self {
        Self {
            name,
            modifiers,
            value: SettingValue::Boolean(value),
        }
    }

    /// Floating point setting
    pub const fn number(name: &'a str, modifiers: Modifiers, value: f64) -> Self {
        Self {
            name,
            modifiers,
            value: SettingValue::Number(value),
        }
    }

    pub fn value_type(&self) -> ValueType {
        self.value.value_type()
    }

    pub fn is_hidden(&self) -> bool {
        self.modifiers.contains(Modifiers::HIDDEN)
    }

    pub fn is_read_only(&self) -> bool {
        self.modifiers.contains(Modifiers::READ_ONLY)
    }

    /// Same setting carrying a different value
    pub fn with_value<'v>(&self, value: SettingValue<'v>) -> Descriptor<'v>
    where
        'a: 'v,
    {
        Descriptor {
            name: self.name,
            modifiers: self.modifiers,
            value,
        }
    }
}

/// Rust types that map onto exactly one [`ValueType`]
///
/// Implemented for `&str`, `i32`, `bool` and `f64`; drives the typed
/// [`Settings::get`](super::Settings::get) and
/// [`Settings::set`](super::Settings::set).
pub trait SettingKind<'a>: Sized {
    /// The stored type this Rust type reads and writes
    const TYPE: ValueType;

    /// Extract from a value, `None` on a type mismatch
    fn from_value(value: SettingValue<'a>) -> Option<Self>;

    /// Wrap into a value
    fn into_value(self) -> SettingValue<'a>;
}

impl<'a> SettingKind<'a> for &'a str {
    const TYPE: ValueType = ValueType::String;

    fn from_value(value: SettingValue<'a>) -> Option<Self> {
        match value {
            SettingValue::Str(s) => Some(s),
            _ => None,
        }
    }

    fn into_value(self) -> SettingValue<'a> {
        SettingValue::Str(self)
    }
}

impl<'a> SettingKind<'a> for i32 {
    const TYPE: ValueType = ValueType::Integer;

    fn from_value(value: SettingValue<'a>) -> Option<Self> {
        match value {
            SettingValue::Integer(v) => Some(v),
            _ => None,
        }
    }

    fn into_value(self) -> SettingValue<'a> {
        SettingValue::Integer(self)
    }
}

impl<'a> SettingKind<'a> for bool {
    const TYPE: ValueType = ValueType::Boolean;

    fn from_value(value: SettingValue<'a>) -> Option<Self> {
        match value {
            SettingValue::Boolean(v) => Some(v),
            _ => None,
        }
    }

    fn into_value(self) -> SettingValue<'a> {
        SettingValue::Boolean(self)
    }
}

impl<'a> SettingKind<'a> for f64 {
    const TYPE: ValueType = ValueType::Number;

    fn from_value(value: SettingValue<'a>) -> Option<Self> {
        match value {
            SettingValue::Number(v) => Some(v),
            _ => None,
        }
    }

    fn into_value(self) -> SettingValue<'a> {
        SettingValue::Number(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_code_roundtrip() {
        for ty in [
            ValueType::String,
            ValueType::Integer,
            ValueType::Boolean,
            ValueType::Number,
        ] {
            assert_eq!(ValueType::from_u8(ty.as_u8()), Some(ty));
        }
        assert_eq!(ValueType::from_u8(0), None);
        assert_eq!(ValueType::from_u8(5), None);
    }

    #[test]
    fn test_modifiers_fit_high_nibble() {
        let all = Modifiers::all().bits();
        assert_eq!(all & 0x0f, 0);
    }

    #[test]
    fn test_kind_rejects_other_types() {
        assert_eq!(<i32 as SettingKind>::from_value(SettingValue::Boolean(true)), None);
        assert_eq!(<&str as SettingKind>::from_value(SettingValue::Integer(1)), None);
        assert_eq!(<f64 as SettingKind>::from_value(SettingValue::Number(2.5)), Some(2.5));
    }

    #[test]
    fn test_descriptor_flags() {
        let d = Descriptor::string(
            "password",
            Modifiers::HIDDEN.union(Modifiers::READ_ONLY),
            "",
        );
        assert!(d.is_hidden());
        assert!(d.is_read_only());
        assert_eq!(d.value_type(), ValueType::String);
    }
}
