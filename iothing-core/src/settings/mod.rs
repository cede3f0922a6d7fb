//! Typed key/value settings
//!
//! Settings live as a packed record stream inside one half of a
//! caller-owned region. The other half is the write target for the next
//! mutation:
//!
//! ```text
//! region: [ half A                 | half B                 ]
//!           active: rec rec rec ..   shadow: rebuilt on set
//! ```
//!
//! A successful mutation swaps the designation; a failed one leaves the
//! active half untouched.

pub mod buffer;
pub mod cursor;
pub mod descriptor;
pub mod error;
pub mod record;
pub mod store;

pub use buffer::{DoubleBuffer, Half};
pub use descriptor::{Descriptor, Modifiers, SettingKind, SettingValue, ValueType, MAX_NAME_LEN};
pub use error::SettingsError;
pub use record::{Record, RecordError, Records, MAX_STRING_LEN};
pub use store::{LoadSource, Settings};
