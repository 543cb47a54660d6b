use serde::{Serialize, Deserialize};

/// Lifecycle event tags
///
/// The catalog is fixed: every event a subsystem can observe is listed
/// here, and each carries a specific payload shape in `Event`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// Module table registration, always dispatched first
    Bind,

    /// A forging round completed
    FinishRound,

    /// A batch of transactions reached persistent storage
    TransactionsSaved,

    /// The local chain finished loading
    BlockchainReady,

    /// A chain synchronization run started
    SyncStarted,

    /// The peer table is populated and usable
    PeersReady,

    /// A block was accepted onto the chain
    NewBlock,

    /// A multisignature share arrived
    Signature,

    /// A transaction entered the unconfirmed pool
    UnconfirmedTransaction,
}

/// A block as announced to subsystems
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignedBlock {
    /// Block identifier
    pub id: String,

    /// Chain height of the block
    pub height: u64,

    /// Identifier of the preceding block, `None` for genesis
    pub previous_id: Option<String>,

    /// Slot timestamp
    pub timestamp: i64,

    /// Public key of the forging delegate
    pub generator_public_key: String,

    /// Signature over the block header
    pub signature: String,
}

/// A transaction that reached persistent storage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfirmedTransaction {
    /// Transaction identifier
    pub id: String,

    /// Identifier of the containing block
    pub block_id: String,

    /// Chain height of the containing block
    pub height: u64,

    /// Public key of the sender
    pub sender_public_key: String,
}

/// A transaction waiting in the unconfirmed pool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingTransaction {
    /// Transaction identifier
    pub id: String,

    /// Public key of the sender
    pub sender_public_key: String,

    /// Fee offered by the sender
    pub fee: u64,
}

/// A multisignature share for a pending transaction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionSignature {
    /// Identifier of the transaction being signed
    pub transaction_id: String,

    /// The signature share
    pub signature: String,
}

/// A lifecycle event with its typed payload
///
/// Binding the module table is a bus operation of its own and therefore
/// has no variant here; it is still tagged `EventKind::Bind` in logs.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// A forging round completed
    FinishRound { round: u64 },

    /// A batch of transactions reached persistent storage
    TransactionsSaved { transactions: Vec<ConfirmedTransaction> },

    /// The local chain finished loading
    BlockchainReady,

    /// A chain synchronization run started
    SyncStarted,

    /// The peer table is populated and usable
    PeersReady,

    /// A block was accepted onto the chain; `broadcast` asks relays to
    /// forward it
    NewBlock { block: SignedBlock, broadcast: bool },

    /// A multisignature share arrived
    Signature { signature: TransactionSignature, broadcast: bool },

    /// A transaction entered the unconfirmed pool
    UnconfirmedTransaction { transaction: PendingTransaction, broadcast: bool },
}

impl Event {
    /// Get the event tag
    pub fn kind(&self) -> EventKind {
        match self {
            Event::FinishRound { .. } => EventKind::FinishRound,
            Event::TransactionsSaved { .. } => EventKind::TransactionsSaved,
            Event::BlockchainReady => EventKind::BlockchainReady,
            Event::SyncStarted => EventKind::SyncStarted,
            Event::PeersReady => EventKind::PeersReady,
            Event::NewBlock { .. } => EventKind::NewBlock,
            Event::Signature { .. } => EventKind::Signature,
            Event::UnconfirmedTransaction { .. } => EventKind::UnconfirmedTransaction,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_kind_tagging() {
        let block = SignedBlock {
            id: "b1".to_string(),
            height: 5,
            previous_id: Some("b0".to_string()),
            timestamp: 1000,
            generator_public_key: "gk".to_string(),
            signature: "sig".to_string(),
        };

        assert_eq!(
            Event::NewBlock { block, broadcast: true }.kind(),
            EventKind::NewBlock
        );
        assert_eq!(Event::FinishRound { round: 3 }.kind(), EventKind::FinishRound);
        assert_eq!(Event::PeersReady.kind(), EventKind::PeersReady);
    }
}
