//! Events that drive the provisioning state machine

/// Events that can trigger provisioning transitions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ProvisioningEvent {
    /// Startup finished loading settings
    Setup {
        /// Enter configuration mode regardless of stored credentials
        force: bool,
        /// Valid WiFi credentials are stored
        configured: bool,
    },

    // Station events
    /// Joined the configured network
    ConnectSucceeded,
    /// Could not join the configured network
    ConnectFailed,
    /// Connection to the network dropped
    LinkLost,

    // Configuration events
    /// New credentials were written through the configuration endpoint
    CredentialsUpdated,
    /// User requested configuration mode (button held at boot, etc.)
    ForceConfig,
}
