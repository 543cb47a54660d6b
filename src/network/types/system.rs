/// Accessor for the local node's own identity
///
/// The peer admission policy needs to know the local session nonce to
/// reject self-connections, and consensus estimation compares remote
/// broadhashes against the local one. The node's system module implements
/// this; tests substitute a fixed stub.
pub trait SystemInfo: Send + Sync {
    /// Session token of this node instance
    fn nonce(&self) -> String;

    /// Current local chain height
    fn height(&self) -> u64;

    /// Fingerprint of the local chain tip, `None` before the chain is ready
    fn broadhash(&self) -> Option<String>;
}

/// Fixed identity snapshot implementing `SystemInfo`
#[derive(Debug, Clone)]
pub struct NodeIdentity {
    /// Session token of this node instance
    pub nonce: String,

    /// Current local chain height
    pub height: u64,

    /// Fingerprint of the local chain tip
    pub broadhash: Option<String>,
}

impl SystemInfo for NodeIdentity {
    fn nonce(&self) -> String {
        self.nonce.clone()
    }

    fn height(&self) -> u64 {
        self.height
    }

    fn broadhash(&self) -> Option<String> {
        self.broadhash.clone()
    }
}
