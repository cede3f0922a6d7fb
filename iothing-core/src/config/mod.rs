//! Device configuration
//!
//! The static defaults table and sizing constants of an IoThing node.

pub mod device;

pub use device::*;
