use std::sync::Arc;
use log::{debug, error, trace};
use once_cell::sync::OnceCell;

use crate::network::events::event_types::{
    ConfirmedTransaction, Event, EventKind, PendingTransaction, SignedBlock, TransactionSignature,
};

/// Handler error type
#[derive(Debug, thiserror::Error)]
pub enum HandlerError {
    /// Dispatch attempted before the module table was bound
    #[error("event dispatched before modules were bound")]
    NotBound,

    /// The module table was already bound
    #[error("modules already bound")]
    AlreadyBound,

    /// Invalid payload
    #[error("invalid payload: {0}")]
    InvalidPayload(String),

    /// Storage error
    #[error("storage error: {0}")]
    Storage(String),

    /// Network error
    #[error("network error: {0}")]
    Network(String),

    /// Other error
    #[error("other error: {0}")]
    Other(String),
}

/// A subsystem module observing lifecycle events
///
/// Every handler defaults to a no-op, so a module only overrides the
/// events it cares about and is skipped for the rest without error.
#[async_trait::async_trait]
pub trait BusModule: Send + Sync {
    /// The module table was just registered
    async fn on_bind(&self) -> Result<(), HandlerError> {
        Ok(())
    }

    /// A forging round completed
    async fn on_finish_round(&self, _round: u64) -> Result<(), HandlerError> {
        Ok(())
    }

    /// A batch of transactions reached persistent storage
    async fn on_transactions_saved(
        &self,
        _transactions: &[ConfirmedTransaction],
    ) -> Result<(), HandlerError> {
        Ok(())
    }

    /// The local chain finished loading
    async fn on_blockchain_ready(&self) -> Result<(), HandlerError> {
        Ok(())
    }

    /// A chain synchronization run started
    async fn on_sync_started(&self) -> Result<(), HandlerError> {
        Ok(())
    }

    /// The peer table is populated and usable
    async fn on_peers_ready(&self) -> Result<(), HandlerError> {
        Ok(())
    }

    /// A block was accepted onto the chain
    async fn on_new_block(&self, _block: &SignedBlock, _broadcast: bool) -> Result<(), HandlerError> {
        Ok(())
    }

    /// A multisignature share arrived
    async fn on_signature(
        &self,
        _signature: &TransactionSignature,
        _broadcast: bool,
    ) -> Result<(), HandlerError> {
        Ok(())
    }

    /// A transaction entered the unconfirmed pool
    async fn on_unconfirmed_transaction(
        &self,
        _transaction: &PendingTransaction,
        _broadcast: bool,
    ) -> Result<(), HandlerError> {
        Ok(())
    }
}

/// Process-wide dispatcher fanning lifecycle events out to modules
///
/// Constructed once at startup and passed by handle to every publisher.
/// Fan-out is strictly sequential: each module's handler is awaited to
/// completion before the next module is invoked, and a failing handler
/// aborts the remaining dispatch for that event.
pub struct EventBus {
    /// Named module table in registration order, populated once by `bind`
    modules: OnceCell<Vec<(String, Arc<dyn BusModule>)>>,
}

impl EventBus {
    /// Create an unbound event bus
    pub fn new() -> Self {
        Self {
            modules: OnceCell::new(),
        }
    }

    /// Register the module table and dispatch the bind notification
    ///
    /// This is the first event of any run; later events fail with
    /// `NotBound` until it happened. Binding twice is an error.
    pub async fn bind(&self, modules: Vec<(String, Arc<dyn BusModule>)>) -> Result<(), HandlerError> {
        if self.modules.set(modules).is_err() {
            return Err(HandlerError::AlreadyBound);
        }
        let modules = self.modules.get().ok_or(HandlerError::NotBound)?;

        debug!("Dispatching {:?} to {} modules", EventKind::Bind, modules.len());
        for (name, module) in modules {
            trace!("Dispatching {:?} to module {}", EventKind::Bind, name);
            if let Err(e) = module.on_bind().await {
                error!("Module {} failed on {:?}: {}", name, EventKind::Bind, e);
                return Err(e);
            }
        }

        Ok(())
    }

    /// Number of bound modules
    pub fn module_count(&self) -> usize {
        self.modules.get().map(|m| m.len()).unwrap_or(0)
    }

    /// Fan an event out to every bound module, in bind order
    ///
    /// Completes only once every applicable handler has completed. The
    /// first handler failure aborts the remaining dispatch and surfaces
    /// to the caller.
    pub async fn message(&self, event: Event) -> Result<(), HandlerError> {
        let modules = self.modules.get().ok_or(HandlerError::NotBound)?;

        debug!("Dispatching {:?} to {} modules", event.kind(), modules.len());
        for (name, module) in modules {
            trace!("Dispatching {:?} to module {}", event.kind(), name);

            let result = match &event {
                Event::FinishRound { round } => module.on_finish_round(*round).await,
                Event::TransactionsSaved { transactions } => {
                    module.on_transactions_saved(transactions).await
                }
                Event::BlockchainReady => module.on_blockchain_ready().await,
                Event::SyncStarted => module.on_sync_started().await,
                Event::PeersReady => module.on_peers_ready().await,
                Event::NewBlock { block, broadcast } => module.on_new_block(block, *broadcast).await,
                Event::Signature { signature, broadcast } => {
                    module.on_signature(signature, *broadcast).await
                }
                Event::UnconfirmedTransaction { transaction, broadcast } => {
                    module.on_unconfirmed_transaction(transaction, *broadcast).await
                }
            };

            if let Err(e) = result {
                error!("Module {} failed on {:?}: {}", name, event.kind(), e);
                return Err(e);
            }
        }

        Ok(())
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
