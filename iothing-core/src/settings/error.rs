//! Settings store error types

use crate::traits::MediumError;

use super::record::RecordError;

/// Errors from settings store operations
///
/// Reads never surface these; `get` falls back instead. Every failing
/// operation leaves the active buffer exactly as it was.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SettingsError {
    /// No setting with that name
    NotFound,
    /// Setting exists with a different type
    TypeMismatch,
    /// Setting is marked read-only
    ReadOnly,
    /// The record set does not fit in one buffer half
    CapacityExceeded,
    /// The defaults table names the same setting twice
    DuplicateName,
    /// The active stream failed to decode
    Corrupted,
    /// The persistence medium failed
    Medium(MediumError),
}

impl From<MediumError> for SettingsError {
    fn from(e: MediumError) -> Self {
        SettingsError::Medium(e)
    }
}

impl From<RecordError> for SettingsError {
    fn from(e: RecordError) -> Self {
        match e {
            RecordError::BufferTooSmall | RecordError::FieldTooLong | RecordError::InvalidName => {
                SettingsError::CapacityExceeded
            }
            RecordError::Truncated | RecordError::InvalidType(_) | RecordError::InvalidField => {
                SettingsError::Corrupted
            }
        }
    }
}

impl core::fmt::Display for SettingsError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            SettingsError::NotFound => write!(f, "setting not found"),
            SettingsError::TypeMismatch => write!(f, "setting has a different type"),
            SettingsError::ReadOnly => write!(f, "setting is read-only"),
            SettingsError::CapacityExceeded => write!(f, "settings do not fit in buffer"),
            SettingsError::DuplicateName => write!(f, "duplicate setting name"),
            SettingsError::Corrupted => write!(f, "settings buffer corrupted"),
            SettingsError::Medium(e) => write!(f, "storage medium failed: {}", e),
        }
    }
}
