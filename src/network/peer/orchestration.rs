use serde::{Serialize, Deserialize};

use crate::network::peer::record::SharedPeerRecord;
use crate::network::types::descriptor::{PeerDescriptor, PeerState};

/// Error surface of the peer orchestration layer
#[derive(Debug, thiserror::Error)]
pub enum OrchestrationError {
    /// Transport failure while reaching a peer
    #[error("peer transport error: {0}")]
    Transport(String),

    /// Peer did not answer in time
    #[error("peer request timed out: {0}")]
    Timeout(String),

    /// Discovery round failed
    #[error("discovery failed: {0}")]
    Discovery(String),
}

/// Field-level filter for peer queries
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PeerFilter {
    /// Match a specific address
    pub ip: Option<String>,

    /// Match a specific port
    pub port: Option<u16>,

    /// Match a specific health state
    pub state: Option<PeerState>,

    /// Match a specific reported height
    pub height: Option<u64>,

    /// Match a specific chain-tip fingerprint
    pub broadhash: Option<String>,

    /// Match a specific client banner
    pub os: Option<String>,

    /// Cap the number of results
    pub limit: Option<usize>,
}

/// Options for a consensus-weighted peer listing
#[derive(Debug, Clone, Default)]
pub struct ListOptions {
    /// Cap the number of results
    pub limit: Option<usize>,

    /// Prefer peers on this chain-tip fingerprint
    pub broadhash: Option<String>,

    /// Restrict to these health states
    pub allowed_states: Option<Vec<PeerState>>,
}

/// A peer listing together with the network agreement estimate
#[derive(Debug, Clone)]
pub struct PeerList {
    /// Percentage (0-100) of listed peers sharing the local chain tip
    pub consensus: u8,

    /// The listed peers in their plain shareable form
    pub peers: Vec<PeerDescriptor>,
}

/// Capability contract the higher-level peers service fulfils
///
/// The registry is the bookkeeping core; pinging, discovery rounds and
/// filtered queries against remote nodes are driven by an orchestrator
/// living alongside the transport. This trait is what the rest of the
/// node codes against.
#[async_trait::async_trait]
pub trait PeersOrchestrator: Send + Sync {
    /// Ping a peer and fold the response into its record
    async fn ping(&self, peer: &SharedPeerRecord) -> Result<(), OrchestrationError>;

    /// Mark a peer active and upsert it into the table
    fn update(&self, peer: &PeerDescriptor) -> bool;

    /// Remove a peer by identity
    fn remove(&self, ip: &str, port: u16) -> bool;

    /// Run one discovery round and admit validated findings
    async fn discover(&self) -> Result<(), OrchestrationError>;

    /// Query peers matching the given filter
    async fn get_by_filter(&self, filter: PeerFilter) -> Vec<PeerDescriptor>;

    /// List peers together with the consensus estimate
    async fn list(&self, options: ListOptions) -> PeerList;
}

/// Percentage of peers whose broadhash matches the local chain tip
///
/// An empty sample carries no evidence of disagreement, so it reads as
/// full agreement; an isolated freshly started node is not penalized.
pub fn matching_broadhash_ratio(peers: &[PeerDescriptor], local_broadhash: &str) -> u8 {
    if peers.is_empty() {
        return 100;
    }

    let matched = peers
        .iter()
        .filter(|peer| peer.broadhash.as_deref() == Some(local_broadhash))
        .count();

    ((matched * 100 + peers.len() / 2) / peers.len()) as u8
}
