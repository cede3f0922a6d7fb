//! Board-agnostic core logic for IoThing nodes
//!
//! This crate contains all application logic that does not depend on
//! specific hardware implementations:
//!
//! - Typed settings store over a double-buffered record stream
//! - Persisted settings image format (header and checksum)
//! - Storage medium abstraction
//! - WiFi provisioning state machine
//! - The device settings table

#![no_std]
#![deny(unsafe_code)]

pub mod config;
pub mod persist;
pub mod provisioning;
pub mod settings;
pub mod traits;
