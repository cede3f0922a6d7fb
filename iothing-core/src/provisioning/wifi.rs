//! WiFi credentials and access point identity

use core::fmt::Write;

use heapless::String;

use crate::config::{
    AP_ADDRESS, AP_NETMASK, AP_SSID_PREFIX, MAX_PASSWORD_LEN, MAX_SSID_LEN, PASSWORD, SSID,
};
use crate::settings::Settings;

/// Length of an access point SSID ("IoThing NN")
pub const AP_SSID_LEN: usize = 10;

/// Station credentials copied out of the settings store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WifiCredentials {
    pub ssid: String<MAX_SSID_LEN>,
    pub password: String<MAX_PASSWORD_LEN>,
}

impl WifiCredentials {
    /// Read credentials from `settings`
    ///
    /// Returns `None` when no SSID is configured or a stored value is
    /// longer than WiFi allows.
    pub fn from_settings(settings: &Settings<'_, '_>) -> Option<Self> {
        let ssid = settings.get(SSID, "");
        if ssid.is_empty() {
            return None;
        }
        let password = settings.get(PASSWORD, "");
        Some(Self {
            ssid: String::try_from(ssid).ok()?,
            password: String::try_from(password).ok()?,
        })
    }

    /// Check if the network is open (no passphrase)
    pub fn is_open(&self) -> bool {
        self.password.is_empty()
    }
}

/// Soft access point parameters for configuration mode
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessPointConfig {
    pub ssid: String<AP_SSID_LEN>,
    pub address: [u8; 4],
    pub netmask: [u8; 4],
}

impl AccessPointConfig {
    /// Access point for the chip with id `chip_id`
    pub fn for_chip(chip_id: u32) -> Self {
        Self {
            ssid: ap_ssid(chip_id),
            address: AP_ADDRESS,
            netmask: AP_NETMASK,
        }
    }
}

/// Access point SSID, "IoThing NN" with NN the chip id modulo 100
pub fn ap_ssid(chip_id: u32) -> String<AP_SSID_LEN> {
    let mut ssid = String::new();
    // Always 10 characters, cannot overflow
    let _ = write!(ssid, "{} {:02}", AP_SSID_PREFIX, chip_id % 100);
    ssid
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEVICE_SETTINGS;

    #[test]
    fn test_ap_ssid_format() {
        assert_eq!(ap_ssid(0).as_str(), "IoThing 00");
        assert_eq!(ap_ssid(7).as_str(), "IoThing 07");
        assert_eq!(ap_ssid(1_234_599).as_str(), "IoThing 99");
        assert_eq!(ap_ssid(u32::MAX).as_str(), "IoThing 95");
    }

    #[test]
    fn test_access_point_config() {
        let ap = AccessPointConfig::for_chip(42);
        assert_eq!(ap.ssid.as_str(), "IoThing 42");
        assert_eq!(ap.address, [192, 168, 4, 1]);
        assert_eq!(ap.netmask, [255, 255, 255, 0]);
    }

    #[test]
    fn test_no_credentials_by_default() {
        let mut region = [0u8; 1024];
        let settings = Settings::with_defaults(DEVICE_SETTINGS, &mut region).unwrap();
        assert_eq!(WifiCredentials::from_settings(&settings), None);
    }

    #[test]
    fn test_credentials_from_settings() {
        let mut region = [0u8; 1024];
        let mut settings = Settings::with_defaults(DEVICE_SETTINGS, &mut region).unwrap();
        settings.set(SSID, "home").unwrap();

        let creds = WifiCredentials::from_settings(&settings).unwrap();
        assert_eq!(creds.ssid.as_str(), "home");
        assert!(creds.is_open());

        settings.set(PASSWORD, "hunter22").unwrap();
        let creds = WifiCredentials::from_settings(&settings).unwrap();
        assert_eq!(creds.password.as_str(), "hunter22");
    }

    #[test]
    fn test_overlong_ssid_rejected() {
        let mut region = [0u8; 1024];
        let mut settings = Settings::with_defaults(DEVICE_SETTINGS, &mut region).unwrap();
        let long = [b's'; MAX_SSID_LEN + 1];
        settings.set(SSID, core::str::from_utf8(&long).unwrap()).unwrap();
        assert_eq!(WifiCredentials::from_settings(&settings), None);
    }
}
