use serde::{Serialize, Deserialize};

/// Peer admission configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PeerConfig {
    /// Admit peers with private or otherwise non-routable addresses.
    /// Meant for integration setups running several nodes on one LAN;
    /// leave off for public deployments.
    pub allow_private_ips: bool,

    /// Client banners that are never admitted to the peer table
    /// (API-only clients that cannot relay blocks)
    pub restricted_client_banners: Vec<String>,
}

impl Default for PeerConfig {
    fn default() -> Self {
        Self {
            allow_private_ips: false,
            restricted_client_banners: vec!["ember-js-api".to_string()],
        }
    }
}
