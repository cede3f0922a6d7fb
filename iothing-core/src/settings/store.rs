//! The settings store
//!
//! Reads scan the active half. Every mutation rebuilds the complete record
//! stream in the shadow half and only then swaps the designation, so a
//! failed or interrupted write never leaves the active stream half-edited.

#[cfg(feature = "defmt")]
use defmt::{info, warn};

use crate::persist::{ImageError, ImageHeader, HEADER_LEN};
use crate::traits::{MediumError, SettingsMedium};

use super::buffer::DoubleBuffer;
use super::cursor::Writer;
use super::descriptor::{Descriptor, SettingKind, SettingValue};
use super::error::SettingsError;
use super::record::{self, Records};

/// Where the active settings came from after [`Settings::load`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LoadSource {
    /// A valid image was read from the medium
    Medium,
    /// Nothing usable was stored; the defaults table was applied
    Defaults,
}

/// Why a stored image was not used
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
enum Rejected {
    Medium(MediumError),
    Image(ImageError),
    /// Decodes, but the names or types differ from the defaults table
    Schema,
    /// Does not fit once read-only values are refreshed
    Refresh(SettingsError),
}

impl From<MediumError> for Rejected {
    fn from(e: MediumError) -> Self {
        Rejected::Medium(e)
    }
}

impl From<ImageError> for Rejected {
    fn from(e: ImageError) -> Self {
        Rejected::Image(e)
    }
}

impl From<SettingsError> for Rejected {
    fn from(e: SettingsError) -> Self {
        Rejected::Refresh(e)
    }
}

/// Typed key/value settings over a double-buffered record stream
///
/// `'t` is the lifetime of the defaults table, `'b` that of the
/// caller-owned buffer region.
pub struct Settings<'t, 'b> {
    defaults: &'t [Descriptor<'t>],
    buffers: DoubleBuffer<'b>,
    /// Length of the record stream in the active half
    used: usize,
}

impl<'t, 'b> Settings<'t, 'b> {
    /// Create an empty store
    ///
    /// Holds no settings until [`reset`](Self::reset) or
    /// [`load`](Self::load) succeeds.
    pub fn new(defaults: &'t [Descriptor<'t>], region: &'b mut [u8]) -> Self {
        Self {
            defaults,
            buffers: DoubleBuffer::new(region),
            used: 0,
        }
    }

    /// Create a store populated from the defaults table
    pub fn with_defaults(
        defaults: &'t [Descriptor<'t>],
        region: &'b mut [u8],
    ) -> Result<Self, SettingsError> {
        let mut settings = Self::new(defaults, region);
        settings.reset()?;
        Ok(settings)
    }

    /// Half size a region needs to hold `defaults`
    ///
    /// Returns `None` if some default can never be encoded.
    pub fn required_len(defaults: &[Descriptor<'_>]) -> Option<usize> {
        defaults
            .iter()
            .try_fold(0usize, |acc, d| acc.checked_add(record::encoded_len(d)?))
    }

    pub fn defaults(&self) -> &'t [Descriptor<'t>] {
        self.defaults
    }

    /// Bytes available to the record stream (one half)
    pub fn capacity(&self) -> usize {
        self.buffers.half_len()
    }

    /// Bytes used by the active record stream
    pub fn used(&self) -> usize {
        self.used
    }

    /// The active record stream
    pub fn as_bytes(&self) -> &[u8] {
        &self.buffers.active()[..self.used]
    }

    /// Iterate over the active records
    pub fn records(&self) -> Records<'_> {
        Records::new(self.as_bytes())
    }

    /// Settings not marked hidden, in stream order
    pub fn visible(&self) -> impl Iterator<Item = Descriptor<'_>> + '_ {
        self.records()
            .filter_map(Result::ok)
            .map(|record| record.descriptor)
            .filter(|d| !d.is_hidden())
    }

    /// Replace every value with its default
    ///
    /// On failure the previous settings stay active.
    pub fn reset(&mut self) -> Result<(), SettingsError> {
        match self.stage_reset() {
            Ok(len) => {
                self.commit(len);
                Ok(())
            }
            Err(e) => {
                #[cfg(feature = "defmt")]
                warn!("settings reset failed: {}", e);
                Err(e)
            }
        }
    }

    fn stage_reset(&mut self) -> Result<usize, SettingsError> {
        let defaults = self.defaults;
        for (i, d) in defaults.iter().enumerate() {
            if defaults[..i].iter().any(|earlier| earlier.name == d.name) {
                return Err(SettingsError::DuplicateName);
            }
        }

        let mut out = Writer::new(self.buffers.shadow_mut());
        for d in defaults {
            record::encode(d, &mut out)?;
        }
        Ok(out.position())
    }

    /// Find a setting by name
    pub fn lookup(&self, name: &str) -> Result<Descriptor<'_>, SettingsError> {
        for record in self.records() {
            let record = record.map_err(|_| SettingsError::Corrupted)?;
            if record.descriptor.name == name {
                return Ok(record.descriptor);
            }
        }
        Err(SettingsError::NotFound)
    }

    /// Read a typed value
    ///
    /// Returns `fallback` if the setting is absent or has another type.
    /// Borrowed strings stay valid until the next mutation.
    pub fn get<'s, T: SettingKind<'s>>(&'s self, name: &str, fallback: T) -> T {
        self.lookup(name)
            .ok()
            .and_then(|d| T::from_value(d.value))
            .unwrap_or(fallback)
    }

    /// Write a typed value
    pub fn set<'v, T: SettingKind<'v>>(&mut self, name: &str, value: T) -> Result<(), SettingsError> {
        self.set_value(name, value.into_value())
    }

    /// Write a dynamically typed value
    ///
    /// Fails without touching the active settings if the setting is
    /// missing, read-only, of another type, or the rebuilt stream does not
    /// fit.
    pub fn set_value(&mut self, name: &str, value: SettingValue<'_>) -> Result<(), SettingsError> {
        match self.stage_set(name, value) {
            Ok(len) => {
                self.commit(len);
                Ok(())
            }
            Err(SettingsError::CapacityExceeded) => {
                #[cfg(feature = "defmt")]
                warn!("setting {} does not fit", name);
                Err(SettingsError::CapacityExceeded)
            }
            Err(e) => Err(e),
        }
    }

    /// Copy the active stream into the shadow half, substituting `value`
    fn stage_set(&mut self, name: &str, value: SettingValue<'_>) -> Result<usize, SettingsError> {
        let (active, shadow) = self.buffers.split();
        let stream = &active[..self.used];
        let mut out = Writer::new(shadow);
        let mut found = false;

        for record in Records::new(stream) {
            let record = record.map_err(|_| SettingsError::Corrupted)?;
            let current = record.descriptor;
            if current.name != name {
                out.put_bytes(record.raw)
                    .map_err(|_| SettingsError::CapacityExceeded)?;
                continue;
            }
            if current.is_read_only() {
                return Err(SettingsError::ReadOnly);
            }
            if current.value_type() != value.value_type() {
                return Err(SettingsError::TypeMismatch);
            }
            record::encode(&current.with_value(value), &mut out)?;
            found = true;
        }

        if found {
            Ok(out.position())
        } else {
            Err(SettingsError::NotFound)
        }
    }

    /// Promote a fully written shadow half
    fn commit(&mut self, len: usize) {
        self.used = len;
        self.buffers.swap();
    }

    /// Restore settings from `medium`, falling back to defaults
    ///
    /// Read-only settings take their values from the defaults table, not
    /// from the image. Returns `Err` only if the fallback reset itself
    /// fails.
    pub fn load<M: SettingsMedium>(&mut self, medium: &mut M) -> Result<LoadSource, SettingsError> {
        match self.restore(medium) {
            Ok(len) => {
                self.commit(len);
                #[cfg(feature = "defmt")]
                info!("settings loaded ({} bytes)", len);
                Ok(LoadSource::Medium)
            }
            Err(_reason) => {
                #[cfg(feature = "defmt")]
                warn!("stored settings rejected: {}", _reason);
                self.reset()?;
                #[cfg(feature = "defmt")]
                info!("using default settings");
                Ok(LoadSource::Defaults)
            }
        }
    }

    /// Activate the stored stream and stage its refreshed copy
    fn restore<M: SettingsMedium>(&mut self, medium: &mut M) -> Result<usize, Rejected> {
        let len = self.stage_load(medium)?;
        self.commit(len);
        Ok(self.stage_refresh()?)
    }

    fn stage_load<M: SettingsMedium>(&mut self, medium: &mut M) -> Result<usize, Rejected> {
        let mut raw = [0u8; HEADER_LEN];
        medium.read(0, &mut raw)?;
        let header = ImageHeader::decode(&raw)?;

        let len = header.payload_len();
        let fits_medium = HEADER_LEN
            .checked_add(len)
            .is_some_and(|end| end <= medium.capacity());
        if len > self.capacity() || !fits_medium {
            return Err(ImageError::TooLarge.into());
        }

        let defaults = self.defaults;
        let payload = &mut self.buffers.shadow_mut()[..len];
        medium.read(HEADER_LEN, payload)?;
        header.verify(payload)?;

        if matches_schema(defaults, payload) {
            Ok(len)
        } else {
            Err(Rejected::Schema)
        }
    }

    /// Copy the active stream into the shadow half with modifiers and
    /// read-only values taken from the defaults table
    ///
    /// The active stream must match the defaults' schema.
    fn stage_refresh(&mut self) -> Result<usize, SettingsError> {
        let defaults = self.defaults;
        let (active, shadow) = self.buffers.split();
        let mut out = Writer::new(shadow);

        for (d, record) in defaults.iter().zip(Records::new(&active[..self.used])) {
            let stored = record.map_err(|_| SettingsError::Corrupted)?.descriptor;
            if d.is_read_only() {
                record::encode(d, &mut out)?;
            } else {
                record::encode(&d.with_value(stored.value), &mut out)?;
            }
        }
        Ok(out.position())
    }

    /// Write the active settings to `medium`
    ///
    /// The payload goes first and the header last, so an interrupted save
    /// never validates. In-memory settings are unchanged either way.
    pub fn save<M: SettingsMedium>(&self, medium: &mut M) -> Result<(), SettingsError> {
        let payload = self.as_bytes();
        let header = ImageHeader::for_payload(payload).ok_or(MediumError::OutOfRange)?;
        let fits = HEADER_LEN
            .checked_add(payload.len())
            .is_some_and(|end| end <= medium.capacity());
        if !fits {
            return Err(MediumError::OutOfRange.into());
        }

        medium.write(HEADER_LEN, payload)?;
        medium.write(0, &header.encode())?;

        #[cfg(feature = "defmt")]
        info!("settings saved ({} bytes)", payload.len());
        Ok(())
    }
}

/// Whether `stream` holds exactly the defaults' names and types, in order
fn matches_schema(defaults: &[Descriptor<'_>], stream: &[u8]) -> bool {
    let mut records = Records::new(stream);
    for d in defaults {
        match records.next() {
            Some(Ok(r)) if r.descriptor.name == d.name && r.descriptor.value_type() == d.value_type() => {}
            _ => return false,
        }
    }
    records.next().is_none()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::descriptor::Modifiers;
    use crate::traits::RamMedium;

    const WIFI: &[Descriptor<'static>] = &[
        Descriptor::string("ssid", Modifiers::empty(), ""),
        Descriptor::string("password", Modifiers::HIDDEN, ""),
        Descriptor::integer("retries", Modifiers::empty(), 3),
    ];

    const MIXED: &[Descriptor<'static>] = &[
        Descriptor::string("name", Modifiers::empty(), "thing"),
        Descriptor::integer("port", Modifiers::empty(), 1883),
        Descriptor::boolean("dhcp", Modifiers::empty(), true),
        Descriptor::number("interval", Modifiers::empty(), 60.0),
        Descriptor::string("version", Modifiers::READ_ONLY, "1.0"),
    ];

    fn text(bytes: &[u8]) -> &str {
        core::str::from_utf8(bytes).unwrap()
    }

    #[test]
    fn test_wifi_scenario() {
        let mut region = [0u8; 256];
        let mut settings = Settings::with_defaults(WIFI, &mut region).unwrap();
        assert_eq!(settings.capacity(), 128);

        settings.set("retries", 5).unwrap();
        assert_eq!(settings.get("retries", -1), 5);

        let long = [b'A'; 300];
        assert_eq!(
            settings.set("ssid", text(&long)),
            Err(SettingsError::CapacityExceeded)
        );
        assert_eq!(settings.get("ssid", "x"), "");
        assert_eq!(settings.get("retries", -1), 5);
    }

    #[test]
    fn test_empty_store_falls_back() {
        let mut region = [0u8; 64];
        let settings = Settings::new(WIFI, &mut region);
        assert_eq!(settings.used(), 0);
        assert_eq!(settings.get("retries", 7), 7);
        assert_eq!(settings.lookup("retries"), Err(SettingsError::NotFound));
    }

    #[test]
    fn test_get_falls_back_on_type_mismatch() {
        let mut region = [0u8; 256];
        let settings = Settings::with_defaults(MIXED, &mut region).unwrap();
        assert_eq!(settings.get("port", false), false);
        assert_eq!(settings.get("name", 0), 0);
        assert_eq!(settings.get("missing", 2.5), 2.5);
        assert_eq!(settings.get("interval", 0.0), 60.0);
        assert!(settings.get("dhcp", false));
    }

    #[test]
    fn test_set_every_type() {
        let mut region = [0u8; 256];
        let mut settings = Settings::with_defaults(MIXED, &mut region).unwrap();

        settings.set("name", "kitchen").unwrap();
        settings.set("port", 8883).unwrap();
        settings.set("dhcp", false).unwrap();
        settings.set("interval", 12.5).unwrap();

        assert_eq!(settings.get("name", ""), "kitchen");
        assert_eq!(settings.get("port", 0), 8883);
        assert!(!settings.get("dhcp", true));
        assert_eq!(settings.get("interval", 0.0), 12.5);
        assert_eq!(settings.get("version", ""), "1.0");
    }

    #[test]
    fn test_set_rejections_leave_state() {
        let mut region = [0u8; 256];
        let mut settings = Settings::with_defaults(MIXED, &mut region).unwrap();
        let mut before = [0u8; 128];
        let used = settings.used();
        before[..used].copy_from_slice(settings.as_bytes());

        assert_eq!(settings.set("missing", 1), Err(SettingsError::NotFound));
        assert_eq!(settings.set("port", "1883"), Err(SettingsError::TypeMismatch));
        assert_eq!(settings.set("version", "2.0"), Err(SettingsError::ReadOnly));
        assert_eq!(settings.set("version", 2), Err(SettingsError::ReadOnly));

        assert_eq!(settings.as_bytes(), &before[..used]);
        assert_eq!(settings.get("version", ""), "1.0");
    }

    #[test]
    fn test_set_swaps_halves() {
        let mut region = [0u8; 256];
        let mut settings = Settings::with_defaults(WIFI, &mut region).unwrap();
        let first = settings.buffers.active_half();

        settings.set("retries", 1).unwrap();
        assert_ne!(settings.buffers.active_half(), first);
        settings.set("retries", 2).unwrap();
        assert_eq!(settings.buffers.active_half(), first);

        // Failed writes do not swap
        assert!(settings.set("retries", true).is_err());
        assert_eq!(settings.buffers.active_half(), first);
    }

    #[test]
    fn test_abandoned_set_keeps_previous_value() {
        let mut region = [0u8; 256];
        let mut settings = Settings::with_defaults(WIFI, &mut region).unwrap();

        // Shadow fully written, but the swap never happens (power loss)
        let staged = settings.stage_set("retries", SettingValue::Integer(9));
        assert!(staged.is_ok());

        assert_eq!(settings.get("retries", -1), 3);
        assert_eq!(settings.records().count(), 3);
    }

    #[test]
    fn test_torn_shadow_write_is_ignored() {
        let mut region = [0u8; 256];
        let mut settings = Settings::with_defaults(WIFI, &mut region).unwrap();
        settings.set("ssid", "home").unwrap();
        let used = settings.used();
        let mut before = [0u8; 128];
        before[..used].copy_from_slice(settings.as_bytes());

        // Power lost while staging: the tail of the shadow copy is garbage
        let staged = settings.stage_set("ssid", SettingValue::Str("elsewhere")).unwrap();
        settings.buffers.shadow_mut()[staged / 2..staged].fill(0xA5);

        assert_eq!(settings.as_bytes(), &before[..used]);
        assert_eq!(settings.get("ssid", ""), "home");
        assert_eq!(settings.get("retries", -1), 3);
        assert_eq!(settings.records().count(), 3);

        // The next write rebuilds the shadow half from the active one
        settings.set("retries", 4).unwrap();
        assert_eq!(settings.get("ssid", ""), "home");
        assert_eq!(settings.get("retries", -1), 4);
    }

    #[test]
    fn test_capacity_exact_fit() {
        const ONE: &[Descriptor<'static>] = &[Descriptor::string("s", Modifiers::empty(), "")];
        let need = Settings::required_len(ONE).unwrap();
        assert_eq!(need, 1 + 3 + 2);

        // Room for exactly three more bytes of value
        let mut region = [0u8; 2 * (6 + 3)];
        let mut settings = Settings::with_defaults(ONE, &mut region).unwrap();
        settings.set("s", "abc").unwrap();
        assert_eq!(settings.used(), settings.capacity());

        assert_eq!(settings.set("s", "abcd"), Err(SettingsError::CapacityExceeded));
        assert_eq!(settings.get("s", ""), "abc");
    }

    #[test]
    fn test_reset_capacity_boundary() {
        let need = Settings::required_len(WIFI).unwrap();

        let mut exact = [0u8; 128];
        let exact = &mut exact[..2 * need];
        let settings = Settings::with_defaults(WIFI, exact).unwrap();
        assert_eq!(settings.used(), need);

        let mut short = [0u8; 128];
        let short = &mut short[..2 * (need - 1)];
        let mut settings = Settings::new(WIFI, short);
        assert_eq!(settings.reset(), Err(SettingsError::CapacityExceeded));
        assert_eq!(settings.used(), 0);
    }

    #[test]
    fn test_reset_restores_defaults() {
        let mut region = [0u8; 256];
        let mut settings = Settings::with_defaults(WIFI, &mut region).unwrap();
        settings.set("ssid", "home").unwrap();
        settings.reset().unwrap();
        assert_eq!(settings.get("ssid", "x"), "");
    }

    #[test]
    fn test_duplicate_names_rejected() {
        const DUP: &[Descriptor<'static>] = &[
            Descriptor::integer("a", Modifiers::empty(), 1),
            Descriptor::boolean("a", Modifiers::empty(), true),
        ];
        let mut region = [0u8; 64];
        assert!(matches!(
            Settings::with_defaults(DUP, &mut region),
            Err(SettingsError::DuplicateName)
        ));
    }

    #[test]
    fn test_visible_skips_hidden() {
        let mut region = [0u8; 256];
        let settings = Settings::with_defaults(WIFI, &mut region).unwrap();
        let mut names = settings.visible().map(|d| d.name);
        assert_eq!(names.next(), Some("ssid"));
        assert_eq!(names.next(), Some("retries"));
        assert_eq!(names.next(), None);
    }

    #[test]
    fn test_save_then_load() {
        let mut medium = RamMedium::<256>::new();
        let mut region = [0u8; 256];
        let mut settings = Settings::with_defaults(WIFI, &mut region).unwrap();
        settings.set("ssid", "home").unwrap();
        settings.save(&mut medium).unwrap();

        let mut region = [0u8; 256];
        let mut restored = Settings::new(WIFI, &mut region);
        assert_eq!(restored.load(&mut medium), Ok(LoadSource::Medium));
        assert_eq!(restored.get("ssid", ""), "home");
    }

    #[test]
    fn test_load_erased_medium_uses_defaults() {
        let mut medium = RamMedium::<256>::new();
        let mut region = [0u8; 256];
        let mut settings = Settings::new(WIFI, &mut region);
        assert_eq!(settings.load(&mut medium), Ok(LoadSource::Defaults));
        assert_eq!(settings.get("retries", -1), 3);
    }

    #[test]
    fn test_load_rejects_other_schema() {
        let mut medium = RamMedium::<256>::new();
        let mut region = [0u8; 256];
        let settings = Settings::with_defaults(MIXED, &mut region).unwrap();
        settings.save(&mut medium).unwrap();

        let mut region = [0u8; 256];
        let mut settings = Settings::new(WIFI, &mut region);
        assert_eq!(settings.load(&mut medium), Ok(LoadSource::Defaults));
        assert_eq!(settings.get("ssid", "x"), "");
    }

    #[test]
    fn test_load_refreshes_read_only_values() {
        const OLD: &[Descriptor<'static>] = &[
            Descriptor::string("name", Modifiers::empty(), "thing"),
            Descriptor::string("version", Modifiers::READ_ONLY, "0.1.0"),
            Descriptor::integer("port", Modifiers::empty(), 1883),
        ];
        const NEW: &[Descriptor<'static>] = &[
            Descriptor::string("name", Modifiers::empty(), "thing"),
            Descriptor::string("version", Modifiers::READ_ONLY, "0.2.0-rc1"),
            Descriptor::integer("port", Modifiers::empty(), 1883),
        ];

        let mut medium = RamMedium::<256>::new();
        let mut region = [0u8; 256];
        let mut settings = Settings::with_defaults(OLD, &mut region).unwrap();
        settings.set("name", "kitchen").unwrap();
        settings.set("port", 8883).unwrap();
        settings.save(&mut medium).unwrap();

        let mut region = [0u8; 256];
        let mut upgraded = Settings::new(NEW, &mut region);
        assert_eq!(upgraded.load(&mut medium), Ok(LoadSource::Medium));
        assert_eq!(upgraded.get("version", ""), "0.2.0-rc1");
        assert_eq!(upgraded.get("name", ""), "kitchen");
        assert_eq!(upgraded.get("port", 0), 8883);
        assert_eq!(upgraded.records().count(), 3);
        assert_eq!(upgraded.set("version", "9.9"), Err(SettingsError::ReadOnly));
    }

    #[test]
    fn test_load_rejects_image_without_room_for_refresh() {
        const OLD: &[Descriptor<'static>] = &[
            Descriptor::string("name", Modifiers::empty(), ""),
            Descriptor::string("version", Modifiers::READ_ONLY, "1"),
        ];
        const NEW: &[Descriptor<'static>] = &[
            Descriptor::string("name", Modifiers::empty(), ""),
            Descriptor::string("version", Modifiers::READ_ONLY, "1.0.1"),
        ];
        let need = Settings::required_len(NEW).unwrap();

        // The stored name fills the half left over by the new defaults
        let mut medium = RamMedium::<256>::new();
        let mut region = [0u8; 128];
        let mut settings = Settings::with_defaults(OLD, &mut region[..2 * need]).unwrap();
        settings.set("name", "abcd").unwrap();
        assert_eq!(settings.used(), need);
        settings.save(&mut medium).unwrap();

        let mut region = [0u8; 128];
        let mut upgraded = Settings::new(NEW, &mut region[..2 * need]);
        assert_eq!(upgraded.load(&mut medium), Ok(LoadSource::Defaults));
        assert_eq!(upgraded.get("name", "x"), "");
        assert_eq!(upgraded.get("version", ""), "1.0.1");
    }

    #[test]
    fn test_save_to_small_medium() {
        let mut medium = RamMedium::<16>::new();
        let mut region = [0u8; 256];
        let settings = Settings::with_defaults(WIFI, &mut region).unwrap();
        assert_eq!(
            settings.save(&mut medium),
            Err(SettingsError::Medium(MediumError::OutOfRange))
        );
        assert_eq!(medium.write_count, 0);
    }
}
