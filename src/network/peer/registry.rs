use std::collections::HashSet;
use std::net::IpAddr;
use std::sync::Arc;
use chrono::Utc;
use dashmap::DashMap;
use log::{debug, info, trace, warn};
use once_cell::sync::OnceCell;
use tokio::sync::RwLock;

use crate::config::PeerConfig;
use crate::network::peer::record::{PeerError, PeerRecord, SharedPeerRecord};
use crate::network::types::descriptor::{PeerDescriptor, PeerState};
use crate::network::types::system::SystemInfo;

/// Aggregate counters over the whole peer table
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PeerStats {
    /// All records in the table
    pub total: usize,

    /// Records in the `Connected` state
    pub alive: usize,

    /// Records with no usable height
    pub empty_height: usize,

    /// Records with no usable broadhash
    pub empty_broadhash: usize,
}

/// Authoritative in-memory table of known peers
///
/// Owns the admission policy, dedup and diffed updates. Exactly one record
/// exists per `ip:port` identity; every record present passed `acceptable`
/// at insertion time.
pub struct PeerRegistry {
    /// Map of identity keys to live peer records
    peers: DashMap<String, SharedPeerRecord>,

    /// Local node identity, bound once before real network input arrives
    system: OnceCell<Arc<dyn SystemInfo>>,

    /// Admission policy configuration
    config: PeerConfig,
}

impl PeerRegistry {
    /// Create a registry with the given admission configuration
    pub fn new(config: PeerConfig) -> Self {
        Self {
            peers: DashMap::new(),
            system: OnceCell::new(),
            config,
        }
    }

    /// One-time wiring of the system accessor used by the admission policy
    ///
    /// Must precede any admission evaluation against real network input.
    /// A second call is ignored.
    pub fn bind_modules(&self, system: Arc<dyn SystemInfo>) {
        if self.system.set(system).is_err() {
            warn!("System module already bound, ignoring rebind");
        }
    }

    /// Canonicalize a loose descriptor into a validated record
    pub fn create(&self, candidate: &PeerDescriptor) -> Result<PeerRecord, PeerError> {
        PeerRecord::from_descriptor(candidate)
    }

    /// Membership test by canonicalized identity
    pub fn exists(&self, candidate: &PeerDescriptor) -> Result<bool, PeerError> {
        Ok(self.peers.contains_key(&self.create(candidate)?.key()))
    }

    /// Membership test by raw identity key
    pub fn exists_key(&self, key: &str) -> bool {
        self.peers.contains_key(key)
    }

    /// Resolve a raw identity key to the stored live record
    pub fn get(&self, key: &str) -> Option<SharedPeerRecord> {
        self.peers.get(key).map(|entry| entry.value().clone())
    }

    /// Resolve a descriptor to the stored live record
    pub fn get_peer(&self, candidate: &PeerDescriptor) -> Result<Option<SharedPeerRecord>, PeerError> {
        Ok(self.get(&self.create(candidate)?.key()))
    }

    /// Number of records in the table
    pub fn len(&self) -> usize {
        self.peers.len()
    }

    /// Whether the table is empty
    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }

    /// Admit a new sighting of a peer, or fold it into the stored record
    ///
    /// With `insert_only` set an already-present identity is left untouched
    /// and the call returns `Ok(false)`, protecting live connection state
    /// from stale discovery data. Otherwise an existing record absorbs the
    /// changed fields in place, so holders of its handle see the update.
    ///
    /// An absent candidate runs through the admission policy first. Note
    /// that a rejected candidate still yields `Ok(true)`: only the
    /// `insert_only` conflict reports `Ok(false)`, so callers must not
    /// infer insertion from the return value.
    pub async fn upsert(&self, candidate: &PeerDescriptor, insert_only: bool) -> Result<bool, PeerError> {
        let incoming = self.create(candidate)?;
        let key = incoming.key();

        let existing = self.get(&key);
        match existing {
            Some(record) => {
                if insert_only {
                    return Ok(false);
                }

                let mut stored = record.write().await;
                let changed = stored.merge(&incoming);
                stored.touch(Utc::now().timestamp_millis());

                if changed.is_empty() {
                    trace!("Peer not changed {}", key);
                } else {
                    debug!("Updated peer {} {:?}", key, changed);
                }
            }
            None => {
                if self.acceptable(std::slice::from_ref(candidate)).is_empty() {
                    debug!("Rejecting unacceptable peer {}", key);
                } else {
                    let mut record = incoming;
                    record.touch(Utc::now().timestamp_millis());
                    self.peers.insert(key.clone(), Arc::new(RwLock::new(record)));
                    debug!("Inserted new peer {}", key);
                }
            }
        }

        let stats = self.stats().await;
        trace!("Peer table stats {:?}", stats);

        Ok(true)
    }

    /// Delete a peer by canonicalized identity
    ///
    /// An absent identity is treated as already removed, not an error.
    pub async fn remove(&self, candidate: &PeerDescriptor) -> Result<bool, PeerError> {
        let key = self.create(candidate)?.key();

        match self.peers.remove(&key) {
            Some((_, record)) => {
                info!("Removed peer {}", key);
                debug!("Removed peer {:?}", record.read().await.descriptor());
                Ok(true)
            }
            None => {
                debug!("Failed to remove peer {}, already absent", key);
                Ok(false)
            }
        }
    }

    /// Snapshot of the live record handles
    ///
    /// Mutations through a returned handle are visible to every other
    /// holder and to later `get` calls on the same key.
    pub fn list_records(&self) -> Vec<SharedPeerRecord> {
        self.peers.iter().map(|entry| entry.value().clone()).collect()
    }

    /// Snapshot of all records in their plain shareable form
    pub async fn list_descriptors(&self) -> Vec<PeerDescriptor> {
        let records = self.list_records();

        let mut descriptors = Vec::with_capacity(records.len());
        for record in records {
            descriptors.push(record.read().await.descriptor());
        }
        descriptors
    }

    /// Batch admission policy
    ///
    /// Deduplicates by identity (first occurrence wins), drops candidates
    /// carrying the local session nonce, drops restricted client banners,
    /// and unless private addresses are allowed drops candidates that are
    /// not publicly routable. Survivors keep their original relative order.
    pub fn acceptable(&self, candidates: &[PeerDescriptor]) -> Vec<PeerDescriptor> {
        let local_nonce = self
            .system
            .get()
            .expect("peer admission evaluated before bind_modules")
            .nonce();

        let mut seen: HashSet<String> = HashSet::new();

        candidates
            .iter()
            .filter(|peer| {
                if !seen.insert(format!("{}:{}", peer.ip, peer.port)) {
                    return false;
                }
                if peer.nonce.as_deref() == Some(local_nonce.as_str()) {
                    return false;
                }
                if let Some(os) = peer.os.as_deref() {
                    if self.config.restricted_client_banners.iter().any(|b| b == os) {
                        return false;
                    }
                }
                if self.config.allow_private_ips {
                    return true;
                }
                peer.ip
                    .parse::<IpAddr>()
                    .map(|ip| is_routable(&ip))
                    .unwrap_or(false)
            })
            .cloned()
            .collect()
    }

    /// Recompute the aggregate counters over the whole table
    pub async fn stats(&self) -> PeerStats {
        let mut stats = PeerStats::default();

        for record in self.list_records() {
            let record = record.read().await;

            stats.total += 1;
            if record.state == PeerState::Connected {
                stats.alive += 1;
            }
            if record.height.unwrap_or(0) == 0 {
                stats.empty_height += 1;
            }
            if record.broadhash.as_deref().unwrap_or("").is_empty() {
                stats.empty_broadhash += 1;
            }
        }

        stats
    }
}

impl Default for PeerRegistry {
    fn default() -> Self {
        Self::new(PeerConfig::default())
    }
}

/// Whether an address can be reached from the public internet
fn is_routable(ip: &IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => {
            !(v4.is_private()
                || v4.is_loopback()
                || v4.is_link_local()
                || v4.is_broadcast()
                || v4.is_unspecified())
        }
        IpAddr::V6(v6) => {
            // fc00::/7 unique-local, fe80::/10 link-local
            !(v6.is_loopback()
                || v6.is_unspecified()
                || (v6.segments()[0] & 0xfe00) == 0xfc00
                || (v6.segments()[0] & 0xffc0) == 0xfe80)
        }
    }
}
