//! Provisioning state machine
//!
//! Decides whether the node joins the stored network or opens its own
//! access point with the configuration portal.

use super::events::ProvisioningEvent;

/// Provisioning states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ProvisioningState {
    /// Before setup; radio off
    Idle,
    /// Joining the configured network
    Connecting,
    /// Access point and captive portal active
    SystemConfig,
    /// Joined the configured network
    Connected,
}

/// Radio configuration required by a state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RadioMode {
    Off,
    Station,
    AccessPoint,
}

impl ProvisioningState {
    pub fn radio_mode(&self) -> RadioMode {
        match self {
            ProvisioningState::Idle => RadioMode::Off,
            ProvisioningState::Connecting | ProvisioningState::Connected => RadioMode::Station,
            ProvisioningState::SystemConfig => RadioMode::AccessPoint,
        }
    }

    /// Check if unknown paths should get the configuration page
    ///
    /// Only the access point runs the wildcard DNS responder; on the
    /// station network unknown paths are plain 404s.
    pub fn serves_portal(&self) -> bool {
        matches!(self, ProvisioningState::SystemConfig)
    }

    /// Process an event and return the next state
    pub fn transition(self, event: ProvisioningEvent) -> Self {
        use ProvisioningEvent::*;
        use ProvisioningState::*;

        match (self, event) {
            // Setup
            (Idle, Setup { force: true, .. }) => SystemConfig,
            (Idle, Setup { configured: false, .. }) => SystemConfig,
            (Idle, Setup { .. }) => Connecting,

            // Connecting
            (Connecting, ConnectSucceeded) => Connected,
            (Connecting, ConnectFailed) => SystemConfig,
            (Connecting, ForceConfig) => SystemConfig,

            // Connected
            (Connected, LinkLost) => Connecting,
            (Connected, CredentialsUpdated) => Connecting,
            (Connected, ForceConfig) => SystemConfig,

            // SystemConfig
            (SystemConfig, CredentialsUpdated) => Connecting,

            // Default: stay in current state
            _ => self,
        }
    }
}
