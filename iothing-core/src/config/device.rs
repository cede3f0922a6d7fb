//! IoThing device settings schema
//!
//! The settings every IoThing node carries: WiFi credentials, node
//! identity and the MQTT reporting target.

use crate::settings::record::record_len;
use crate::settings::{Descriptor, Modifiers, ValueType};

/// WiFi network name
pub const SSID: &str = "ssid";
/// WiFi passphrase (hidden)
pub const PASSWORD: &str = "password";
/// Node UUID
pub const NODE: &str = "node";
/// MQTT server host name
pub const MQTT: &str = "mqtt";
/// MQTT server port
pub const MQTT_PORT: &str = "mqtt_port";
/// MQTT topic prefix
pub const TOPIC: &str = "topic";
/// Use DHCP on the station interface
pub const DHCP: &str = "dhcp";
/// Seconds between sensor reports
pub const REPORT_INTERVAL: &str = "report_interval";
/// Firmware version (read-only)
pub const FIRMWARE: &str = "firmware";

/// Maximum SSID length (IEEE 802.11)
pub const MAX_SSID_LEN: usize = 32;

/// Maximum WiFi passphrase length
pub const MAX_PASSWORD_LEN: usize = 64;

/// Maximum node id length (textual UUID)
pub const MAX_NODE_LEN: usize = 36;

/// Maximum MQTT server name length
pub const MAX_SERVER_LEN: usize = 64;

/// Maximum MQTT topic length
pub const MAX_TOPIC_LEN: usize = 128;

/// Default MQTT port
pub const DEFAULT_MQTT_PORT: i32 = 1883;

/// Default report interval in seconds
pub const DEFAULT_REPORT_INTERVAL: f64 = 60.0;

/// Version string stored in the read-only `firmware` setting
pub const FIRMWARE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Access point address while in configuration mode
pub const AP_ADDRESS: [u8; 4] = [192, 168, 4, 1];

/// Access point netmask
pub const AP_NETMASK: [u8; 4] = [255, 255, 255, 0];

/// Access point SSID prefix, followed by two digits of the chip id
pub const AP_SSID_PREFIX: &str = "IoThing";

/// Size of one settings buffer half in bytes
pub const SETTINGS_BLOCK_SIZE: usize = 512;

/// Size of the region backing the settings store (both halves)
pub const SETTINGS_REGION_SIZE: usize = 2 * SETTINGS_BLOCK_SIZE;

/// Default settings of an IoThing node
pub const DEVICE_SETTINGS: &[Descriptor<'static>] = &[
    Descriptor::string(SSID, Modifiers::empty(), ""),
    Descriptor::string(PASSWORD, Modifiers::HIDDEN, ""),
    Descriptor::string(NODE, Modifiers::empty(), ""),
    Descriptor::string(MQTT, Modifiers::empty(), ""),
    Descriptor::integer(MQTT_PORT, Modifiers::empty(), DEFAULT_MQTT_PORT),
    Descriptor::string(TOPIC, Modifiers::empty(), ""),
    Descriptor::boolean(DHCP, Modifiers::empty(), true),
    Descriptor::number(REPORT_INTERVAL, Modifiers::empty(), DEFAULT_REPORT_INTERVAL),
    Descriptor::string(FIRMWARE, Modifiers::READ_ONLY, FIRMWARE_VERSION),
];

/// Encoded size of the device settings with every string at its limit
pub const MAX_DEVICE_SETTINGS_LEN: usize = record_len(SSID.len(), ValueType::String, MAX_SSID_LEN)
    + record_len(PASSWORD.len(), ValueType::String, MAX_PASSWORD_LEN)
    + record_len(NODE.len(), ValueType::String, MAX_NODE_LEN)
    + record_len(MQTT.len(), ValueType::String, MAX_SERVER_LEN)
    + record_len(MQTT_PORT.len(), ValueType::Integer, 0)
    + record_len(TOPIC.len(), ValueType::String, MAX_TOPIC_LEN)
    + record_len(DHCP.len(), ValueType::Boolean, 0)
    + record_len(REPORT_INTERVAL.len(), ValueType::Number, 0)
    + record_len(FIRMWARE.len(), ValueType::String, FIRMWARE_VERSION.len());

const _: () = assert!(
    MAX_DEVICE_SETTINGS_LEN <= SETTINGS_BLOCK_SIZE,
    "SETTINGS_BLOCK_SIZE is too small for the device settings"
);
