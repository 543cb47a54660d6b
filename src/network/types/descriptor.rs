use serde::{Serialize, Deserialize};

/// Health of a remote peer, ordered from worst to best
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PeerState {
    /// Excluded from all traffic
    Banned = 0,

    /// Known but not currently connected
    Disconnected = 1,

    /// Live connection established
    Connected = 2,
}

impl Default for PeerState {
    fn default() -> Self {
        PeerState::Disconnected
    }
}

/// Plain, externally shareable form of a peer
///
/// This is the loose shape that crosses module boundaries: discovery
/// payloads, RPC responses and config seeds all use it. Fields a remote
/// node did not report stay `None`. Canonicalization into a
/// `PeerRecord` validates the identity fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PeerDescriptor {
    /// Address the peer listens on
    pub ip: String,

    /// Port the peer listens on
    pub port: u16,

    /// Reported health
    #[serde(default)]
    pub state: PeerState,

    /// Reported chain height, `None` or 0 when unknown
    pub height: Option<u64>,

    /// Fingerprint of the peer's perceived chain tip
    pub broadhash: Option<String>,

    /// Session token of the running node instance
    pub nonce: Option<String>,

    /// Reported client banner
    pub os: Option<String>,
}
