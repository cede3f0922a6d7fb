//! IoThing configuration protocol
//!
//! This crate implements the JSON configuration endpoint a node serves
//! over HTTP, both on its station network and behind the captive portal
//! of its access point. It is transport-free: the HTTP server passes in
//! the method, path and body and writes out the produced response.
//!
//! # Wire format
//!
//! Settings map 1:1 onto JSON object members:
//! ```text
//! {"ssid":"home","node":"","mqtt":"","mqtt_port":1883,"topic":"",
//!  "dhcp":true,"report_interval":60.0,"firmware":"0.1.0"}
//! ```
//! Hidden settings (the WiFi password) are accepted on update but never
//! written out.

#![no_std]
#![deny(unsafe_code)]

pub mod config;
pub mod endpoint;

pub use config::{apply, ApplyReport, ConfigError, ConfigRequest, ConfigView, DescribeView, Field};
pub use endpoint::{handle, ContentType, Method, Request, Response};
