//! Hardware abstraction traits
//!
//! These traits define the interface between the settings logic and the
//! device's non-volatile storage.

pub mod medium;

pub use medium::{MediumError, NullMedium, RamMedium, SettingsMedium};
