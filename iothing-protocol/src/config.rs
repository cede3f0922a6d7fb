//! JSON views of the settings store
//!
//! Settings map 1:1 onto JSON object members. Hidden settings are never
//! written out.

#[cfg(feature = "defmt")]
use defmt::debug;

use core::fmt;
use core::marker::PhantomData;

use heapless::String;
use serde::de::{self, DeserializeSeed, IgnoredAny, MapAccess, Visitor};
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json_core::str::{EscapedStr, EscapedStringFragment};

use iothing_core::config::{
    DHCP, FIRMWARE, MAX_NODE_LEN, MAX_PASSWORD_LEN, MAX_SERVER_LEN, MAX_SSID_LEN, MAX_TOPIC_LEN,
    MQTT, MQTT_PORT, NODE, PASSWORD, REPORT_INTERVAL, SSID, TOPIC,
};
use iothing_core::settings::{SettingValue, Settings, SettingsError, MAX_STRING_LEN};

/// Errors from encoding or decoding configuration JSON
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Request body is not a JSON object
    Malformed,
    /// Output buffer too small for the response
    OutputTooLarge,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Malformed => write!(f, "malformed configuration"),
            ConfigError::OutputTooLarge => write!(f, "response too large"),
        }
    }
}

/// One member of a request body
#[derive(Debug, Clone, PartialEq)]
pub enum Field<T> {
    Absent,
    Value(T),
    /// Present, but not of the expected JSON type or too long
    Invalid,
}

impl<T> Default for Field<T> {
    fn default() -> Self {
        Field::Absent
    }
}

impl<T> Field<T> {
    pub fn as_ref(&self) -> Field<&T> {
        match self {
            Field::Absent => Field::Absent,
            Field::Value(value) => Field::Value(value),
            Field::Invalid => Field::Invalid,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Field<U> {
        match self {
            Field::Absent => Field::Absent,
            Field::Value(value) => Field::Value(f(value)),
            Field::Invalid => Field::Invalid,
        }
    }

    pub fn is_present(&self) -> bool {
        !matches!(self, Field::Absent)
    }
}

/// Fields accepted by `POST /config`
///
/// Absent fields are left alone; unknown fields are ignored. String
/// values are unescaped and bounded by the device limits.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigRequest {
    pub ssid: Field<String<MAX_SSID_LEN>>,
    pub password: Field<String<MAX_PASSWORD_LEN>>,
    pub node: Field<String<MAX_NODE_LEN>>,
    pub mqtt: Field<String<MAX_SERVER_LEN>>,
    pub mqtt_port: Field<i32>,
    pub topic: Field<String<MAX_TOPIC_LEN>>,
    pub dhcp: Field<bool>,
    pub report_interval: Field<f64>,
    pub firmware: Field<String<MAX_STRING_LEN>>,
}

impl ConfigRequest {
    /// Parse a request body
    ///
    /// Only a body that is not a JSON object fails. Each member is then
    /// decoded on its own, so one badly typed member does not hide the
    /// others.
    pub fn parse(body: &[u8]) -> Result<Self, ConfigError> {
        serde_json_core::from_slice::<Shape>(body).map_err(|_| ConfigError::Malformed)?;

        Ok(Self {
            ssid: member::<Text<MAX_SSID_LEN>>(body, SSID).map(Text::into_inner),
            password: member::<Text<MAX_PASSWORD_LEN>>(body, PASSWORD).map(Text::into_inner),
            node: member::<Text<MAX_NODE_LEN>>(body, NODE).map(Text::into_inner),
            mqtt: member::<Text<MAX_SERVER_LEN>>(body, MQTT).map(Text::into_inner),
            mqtt_port: member(body, MQTT_PORT),
            topic: member::<Text<MAX_TOPIC_LEN>>(body, TOPIC).map(Text::into_inner),
            dhcp: member(body, DHCP),
            report_interval: member(body, REPORT_INTERVAL),
            firmware: member::<Text<MAX_STRING_LEN>>(body, FIRMWARE).map(Text::into_inner),
        })
    }

    /// Present fields as setting names and values
    pub fn fields(&self) -> impl Iterator<Item = (&'static str, Field<SettingValue<'_>>)> {
        [
            (SSID, self.ssid.as_ref().map(|s| SettingValue::Str(s.as_str()))),
            (PASSWORD, self.password.as_ref().map(|s| SettingValue::Str(s.as_str()))),
            (NODE, self.node.as_ref().map(|s| SettingValue::Str(s.as_str()))),
            (MQTT, self.mqtt.as_ref().map(|s| SettingValue::Str(s.as_str()))),
            (MQTT_PORT, self.mqtt_port.as_ref().map(|v| SettingValue::Integer(*v))),
            (TOPIC, self.topic.as_ref().map(|s| SettingValue::Str(s.as_str()))),
            (DHCP, self.dhcp.as_ref().map(|v| SettingValue::Boolean(*v))),
            (
                REPORT_INTERVAL,
                self.report_interval.as_ref().map(|v| SettingValue::Number(*v)),
            ),
            (FIRMWARE, self.firmware.as_ref().map(|s| SettingValue::Str(s.as_str()))),
        ]
        .into_iter()
        .filter(|(_, field)| field.is_present())
    }
}

/// Decode the member `name` of an object, skipping every other member
fn member<'de, T: Deserialize<'de>>(body: &'de [u8], name: &'static str) -> Field<T> {
    let mut deserializer = serde_json_core::de::Deserializer::new(body, None);
    let seed = Member {
        name,
        marker: PhantomData,
    };
    match seed.deserialize(&mut deserializer) {
        Ok(Some(value)) => Field::Value(value),
        Ok(None) => Field::Absent,
        Err(_) => Field::Invalid,
    }
}

/// Any JSON object
struct Shape;

impl<'de> Deserialize<'de> for Shape {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(ShapeVisitor)
    }
}

struct ShapeVisitor;

impl<'de> Visitor<'de> for ShapeVisitor {
    type Value = Shape;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a JSON object")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Shape, A::Error> {
        while map.next_entry::<&'de str, IgnoredAny>()?.is_some() {}
        Ok(Shape)
    }
}

/// Finds one member of an object; the last occurrence wins
struct Member<T> {
    name: &'static str,
    marker: PhantomData<T>,
}

impl<'de, T: Deserialize<'de>> DeserializeSeed<'de> for Member<T> {
    type Value = Option<T>;

    fn deserialize<D: Deserializer<'de>>(self, deserializer: D) -> Result<Option<T>, D::Error> {
        deserializer.deserialize_map(self)
    }
}

impl<'de, T: Deserialize<'de>> Visitor<'de> for Member<T> {
    type Value = Option<T>;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "an object with member {}", self.name)
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Option<T>, A::Error> {
        let mut found = None;
        while let Some(key) = map.next_key::<&'de str>()? {
            if key == self.name {
                found = Some(map.next_value::<T>()?);
            } else {
                map.next_value::<IgnoredAny>()?;
            }
        }
        Ok(found)
    }
}

/// Unescaped JSON string of at most `N` bytes
struct Text<const N: usize>(String<N>);

impl<const N: usize> Text<N> {
    fn into_inner(self) -> String<N> {
        self.0
    }
}

impl<'de, const N: usize> Deserialize<'de> for Text<N> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let escaped = EscapedStr::deserialize(deserializer)?;
        let mut text = String::new();
        for fragment in escaped.fragments() {
            let pushed = match fragment.map_err(de::Error::custom)? {
                EscapedStringFragment::NotEscaped(s) => text.push_str(s),
                EscapedStringFragment::Escaped(c) => text.push(c),
            };
            pushed.map_err(|_| de::Error::custom("string too long"))?;
        }
        Ok(Text(text))
    }
}

/// Outcome of applying a request
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ApplyReport {
    /// Fields written to the store
    pub applied: usize,
    /// Fields that were invalid or that the store refused
    pub rejected: usize,
    /// The SSID or password was written
    pub credentials_changed: bool,
}

impl ApplyReport {
    pub fn all_applied(&self) -> bool {
        self.rejected == 0
    }

    pub fn changed(&self) -> bool {
        self.applied > 0
    }
}

/// Write every valid field, skipping the ones the store refuses
pub fn apply(settings: &mut Settings<'_, '_>, request: &ConfigRequest) -> ApplyReport {
    let mut report = ApplyReport::default();
    for (name, field) in request.fields() {
        let result = match field {
            Field::Absent => continue,
            Field::Value(value) => settings.set_value(name, value),
            Field::Invalid => Err(SettingsError::TypeMismatch),
        };
        match result {
            Ok(()) => {
                report.applied += 1;
                if name == SSID || name == PASSWORD {
                    report.credentials_changed = true;
                }
            }
            Err(_e) => {
                #[cfg(feature = "defmt")]
                debug!("config: skipped {}: {}", name, _e);
                report.rejected += 1;
            }
        }
    }
    report
}

/// JSON value of a single setting
struct Value<'a>(SettingValue<'a>);

impl Serialize for Value<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.0 {
            SettingValue::Str(s) => serializer.serialize_str(s),
            SettingValue::Integer(v) => serializer.serialize_i32(v),
            SettingValue::Boolean(v) => serializer.serialize_bool(v),
            SettingValue::Number(v) => serializer.serialize_f64(v),
        }
    }
}

/// Object of all visible settings, optionally led by a `status` member
pub struct ConfigView<'s, 't, 'b> {
    settings: &'s Settings<'t, 'b>,
    status: Option<bool>,
}

impl<'s, 't, 'b> ConfigView<'s, 't, 'b> {
    pub fn new(settings: &'s Settings<'t, 'b>) -> Self {
        Self {
            settings,
            status: None,
        }
    }

    pub fn with_status(settings: &'s Settings<'t, 'b>, status: bool) -> Self {
        Self {
            settings,
            status: Some(status),
        }
    }
}

impl Serialize for ConfigView<'_, '_, '_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        if let Some(status) = self.status {
            map.serialize_entry("status", &status)?;
        }
        for d in self.settings.visible() {
            map.serialize_entry(d.name, &Value(d.value))?;
        }
        map.end()
    }
}

/// One entry of the description array
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
struct DescribeEntry<'a> {
    name: &'a str,
    #[serde(rename = "type")]
    value_type: &'static str,
    readonly: bool,
}

/// Array describing every visible setting
pub struct DescribeView<'s, 't, 'b> {
    settings: &'s Settings<'t, 'b>,
}

impl<'s, 't, 'b> DescribeView<'s, 't, 'b> {
    pub fn new(settings: &'s Settings<'t, 'b>) -> Self {
        Self { settings }
    }
}

impl Serialize for DescribeView<'_, '_, '_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(None)?;
        for d in self.settings.visible() {
            seq.serialize_element(&DescribeEntry {
                name: d.name,
                value_type: d.value_type().as_str(),
                readonly: d.is_read_only(),
            })?;
        }
        seq.end()
    }
}

/// Serialize `value` into `out`, returning the length written
pub fn write_json<T: Serialize>(value: &T, out: &mut [u8]) -> Result<usize, ConfigError> {
    serde_json_core::to_slice(value, out).map_err(|_| ConfigError::OutputTooLarge)
}
