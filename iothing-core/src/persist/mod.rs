//! Persisted settings image format
//!
//! The store writes its active buffer to a [`SettingsMedium`] wrapped in a
//! small header so that erased, foreign, torn or bit-rotted data is never
//! mistaken for settings.
//!
//! [`SettingsMedium`]: crate::traits::SettingsMedium

pub mod image;

pub use image::{ImageError, ImageHeader, HEADER_LEN, IMAGE_MAGIC, IMAGE_VERSION};
