//! WiFi provisioning
//!
//! On setup the node either joins the network stored in its settings or
//! opens an access point ("IoThing NN") serving the configuration portal.
//! The radio driver feeds link events in; the state decides the radio
//! mode and how the HTTP endpoint answers unknown paths.

pub mod events;
pub mod machine;
pub mod wifi;

#[cfg(feature = "defmt")]
use defmt::debug;

use crate::settings::Settings;

pub use events::ProvisioningEvent;
pub use machine::{ProvisioningState, RadioMode};
pub use wifi::{ap_ssid, AccessPointConfig, WifiCredentials};

/// Receives every provisioning state change
pub trait StateObserver {
    fn state_changed(&mut self, state: ProvisioningState);
}

impl<F: FnMut(ProvisioningState)> StateObserver for F {
    fn state_changed(&mut self, state: ProvisioningState) {
        self(state)
    }
}

/// Observer that ignores state changes
#[derive(Debug, Clone, Copy, Default)]
pub struct NoObserver;

impl StateObserver for NoObserver {
    fn state_changed(&mut self, _state: ProvisioningState) {}
}

/// Provisioning state holder
pub struct Provisioner<O: StateObserver> {
    state: ProvisioningState,
    observer: O,
}

impl<O: StateObserver> Provisioner<O> {
    pub fn new(observer: O) -> Self {
        Self {
            state: ProvisioningState::Idle,
            observer,
        }
    }

    pub fn state(&self) -> ProvisioningState {
        self.state
    }

    pub fn radio_mode(&self) -> RadioMode {
        self.state.radio_mode()
    }

    pub fn serves_portal(&self) -> bool {
        self.state.serves_portal()
    }

    /// Apply an event, notifying the observer if the state changes
    pub fn handle(&mut self, event: ProvisioningEvent) -> ProvisioningState {
        let next = self.state.transition(event);
        if next != self.state {
            #[cfg(feature = "defmt")]
            debug!("provisioning: {} -> {} on {}", self.state, next, event);
            self.state = next;
            self.observer.state_changed(next);
        }
        next
    }

    /// Start provisioning from loaded settings
    ///
    /// Returns the credentials to join with, or `None` when the node
    /// should open its access point instead.
    pub fn setup(&mut self, settings: &Settings<'_, '_>, force: bool) -> Option<WifiCredentials> {
        let credentials = WifiCredentials::from_settings(settings);
        let state = self.handle(ProvisioningEvent::Setup {
            force,
            configured: credentials.is_some(),
        });
        match state {
            ProvisioningState::Connecting => credentials,
            _ => None,
        }
    }
}
