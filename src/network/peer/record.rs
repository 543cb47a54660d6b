use std::net::IpAddr;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::network::types::descriptor::{PeerDescriptor, PeerState};

/// Error raised while canonicalizing a peer descriptor
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PeerError {
    /// The descriptor is missing or malforms its identity fields
    #[error("invalid peer descriptor: {0}")]
    InvalidDescriptor(String),
}

/// Canonical, validated form of one remote peer
///
/// The identity fields (`ip`, `port`) are fixed at construction and private;
/// everything else is observed state that later sightings may revise.
#[derive(Debug, Clone, PartialEq)]
pub struct PeerRecord {
    ip: IpAddr,
    port: u16,

    /// Current health
    pub state: PeerState,

    /// Reported chain height, `None` or 0 when unknown
    pub height: Option<u64>,

    /// Fingerprint of the peer's perceived chain tip
    pub broadhash: Option<String>,

    /// Session token of the running node instance
    pub nonce: Option<String>,

    /// Reported client banner
    pub os: Option<String>,

    /// Unix millis of the last successful write, `None` until first admitted
    pub updated: Option<i64>,
}

/// Live handle to a record stored in the registry
///
/// Holders of the handle observe later upsert merges in place; the record
/// behind it is never replaced while it stays in the table.
pub type SharedPeerRecord = Arc<RwLock<PeerRecord>>;

impl PeerRecord {
    /// Create a record from validated identity fields
    pub fn new(ip: IpAddr, port: u16) -> Self {
        Self {
            ip,
            port,
            state: PeerState::default(),
            height: None,
            broadhash: None,
            nonce: None,
            os: None,
            updated: None,
        }
    }

    /// Canonicalize a loose descriptor, validating the identity fields
    pub fn from_descriptor(descriptor: &PeerDescriptor) -> Result<Self, PeerError> {
        let ip: IpAddr = descriptor.ip.parse().map_err(|_| {
            PeerError::InvalidDescriptor(format!("unparsable ip {:?}", descriptor.ip))
        })?;

        if descriptor.port == 0 {
            return Err(PeerError::InvalidDescriptor("port must be 1-65535".to_string()));
        }

        Ok(Self {
            ip,
            port: descriptor.port,
            state: descriptor.state,
            height: descriptor.height,
            broadhash: descriptor.broadhash.clone(),
            nonce: descriptor.nonce.clone(),
            os: descriptor.os.clone(),
            updated: None,
        })
    }

    /// The peer's address
    pub fn ip(&self) -> IpAddr {
        self.ip
    }

    /// The peer's port
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Identity key, stable for the record's whole lifetime
    pub fn key(&self) -> String {
        format!("{}:{}", self.ip, self.port)
    }

    /// Identity key a descriptor would canonicalize to
    pub fn key_of(descriptor: &PeerDescriptor) -> String {
        format!("{}:{}", descriptor.ip, descriptor.port)
    }

    /// Merge another sighting of the same peer into this record
    ///
    /// Fields the incoming record does not carry are left alone. Returns
    /// the names of the fields that actually changed; `updated` and the
    /// identity fields never participate.
    pub fn merge(&mut self, incoming: &PeerRecord) -> Vec<&'static str> {
        debug_assert_eq!(self.key(), incoming.key());

        let mut changed = Vec::new();

        if self.state != incoming.state {
            self.state = incoming.state;
            changed.push("state");
        }

        if let Some(height) = incoming.height {
            if self.height != Some(height) {
                self.height = Some(height);
                changed.push("height");
            }
        }

        if let Some(broadhash) = incoming.broadhash.as_deref() {
            if self.broadhash.as_deref() != Some(broadhash) {
                self.broadhash = Some(broadhash.to_string());
                changed.push("broadhash");
            }
        }

        if let Some(nonce) = incoming.nonce.as_deref() {
            if self.nonce.as_deref() != Some(nonce) {
                self.nonce = Some(nonce.to_string());
                changed.push("nonce");
            }
        }

        if let Some(os) = incoming.os.as_deref() {
            if self.os.as_deref() != Some(os) {
                self.os = Some(os.to_string());
                changed.push("os");
            }
        }

        changed
    }

    /// Stamp the last-write timestamp
    pub fn touch(&mut self, now_ms: i64) {
        self.updated = Some(now_ms);
    }

    /// Normalize back into the plain shareable form
    pub fn descriptor(&self) -> PeerDescriptor {
        PeerDescriptor {
            ip: self.ip.to_string(),
            port: self.port,
            state: self.state,
            height: self.height,
            broadhash: self.broadhash.clone(),
            nonce: self.nonce.clone(),
            os: self.os.clone(),
        }
    }
}
