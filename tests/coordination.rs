use std::sync::Arc;
use tokio::sync::Mutex;

use embercoin_net::config::PeerConfig;
use embercoin_net::network::events::event_bus::{BusModule, EventBus, HandlerError};
use embercoin_net::network::events::event_types::{Event, SignedBlock};
use embercoin_net::network::peer::registry::PeerRegistry;
use embercoin_net::network::types::descriptor::{PeerDescriptor, PeerState};
use embercoin_net::network::types::system::NodeIdentity;

fn peer(ip: &str, port: u16) -> PeerDescriptor {
    PeerDescriptor {
        ip: ip.to_string(),
        port,
        ..Default::default()
    }
}

fn block(height: u64) -> SignedBlock {
    SignedBlock {
        id: format!("b{}", height),
        height,
        previous_id: None,
        timestamp: 1000,
        generator_public_key: "gk".to_string(),
        signature: "sig".to_string(),
    }
}

fn local_identity() -> Arc<NodeIdentity> {
    Arc::new(NodeIdentity {
        nonce: "n0".to_string(),
        height: 1,
        broadhash: Some("local".to_string()),
    })
}

/// Subsystem that snapshots the peer table once it is announced ready
struct PeerWatcher {
    registry: Arc<PeerRegistry>,
    seen: Mutex<Vec<PeerDescriptor>>,
}

#[async_trait::async_trait]
impl BusModule for PeerWatcher {
    async fn on_peers_ready(&self) -> Result<(), HandlerError> {
        let peers = self.registry.list_descriptors().await;
        *self.seen.lock().await = peers;
        Ok(())
    }
}

/// Subsystem that folds block announcements back into the peer table
struct HeightTracker {
    registry: Arc<PeerRegistry>,
    source: PeerDescriptor,
}

#[async_trait::async_trait]
impl BusModule for HeightTracker {
    async fn on_new_block(&self, block: &SignedBlock, _broadcast: bool) -> Result<(), HandlerError> {
        let sighting = PeerDescriptor {
            height: Some(block.height),
            ..self.source.clone()
        };
        self.registry
            .upsert(&sighting, false)
            .await
            .map_err(|e| HandlerError::Other(e.to_string()))?;
        Ok(())
    }
}

#[tokio::test]
async fn test_discovery_cycle_reaches_subscribed_modules() {
    let registry = Arc::new(PeerRegistry::new(PeerConfig::default()));
    registry.bind_modules(local_identity());

    // A discovery round hands three candidates to the registry; one of
    // them is this node talking to itself and must not be admitted
    for candidate in [
        peer("203.0.113.1", 7000),
        peer("203.0.113.2", 7000),
        PeerDescriptor {
            nonce: Some("n0".to_string()),
            ..peer("203.0.113.3", 7000)
        },
    ] {
        assert!(registry.upsert(&candidate, false).await.unwrap());
    }

    let watcher = Arc::new(PeerWatcher {
        registry: registry.clone(),
        seen: Mutex::new(Vec::new()),
    });

    let bus = EventBus::new();
    bus.bind(vec![("peer-watcher".to_string(), watcher.clone() as Arc<dyn BusModule>)])
        .await
        .unwrap();

    bus.message(Event::PeersReady).await.unwrap();

    let seen = watcher.seen.lock().await;
    assert_eq!(seen.len(), 2);
    assert!(seen.iter().all(|p| p.nonce.as_deref() != Some("n0")));
}

#[tokio::test]
async fn test_block_announcement_updates_peer_record() {
    let registry = Arc::new(PeerRegistry::new(PeerConfig::default()));
    registry.bind_modules(local_identity());

    let source = PeerDescriptor {
        state: PeerState::Connected,
        height: Some(10),
        ..peer("203.0.113.1", 7000)
    };
    registry.upsert(&source, false).await.unwrap();

    // Hold the live handle across the event to observe the in-place merge
    let handle = registry.get("203.0.113.1:7000").unwrap();

    let bus = EventBus::new();
    bus.bind(vec![(
        "height-tracker".to_string(),
        Arc::new(HeightTracker { registry: registry.clone(), source }) as Arc<dyn BusModule>,
    )])
    .await
    .unwrap();

    bus.message(Event::NewBlock { block: block(11), broadcast: true })
        .await
        .unwrap();

    assert_eq!(handle.read().await.height, Some(11));
    assert_eq!(registry.len(), 1);
}

#[tokio::test]
async fn test_seeded_table_stats_after_rejected_upsert() {
    let registry = Arc::new(PeerRegistry::new(PeerConfig::default()));
    registry.bind_modules(local_identity());

    // Three connected peers and one disconnected
    for (ip, state) in [
        ("203.0.113.1", PeerState::Connected),
        ("203.0.113.2", PeerState::Connected),
        ("203.0.113.3", PeerState::Connected),
        ("203.0.113.4", PeerState::Disconnected),
    ] {
        registry
            .upsert(
                &PeerDescriptor {
                    state,
                    ..peer(ip, 7000)
                },
                false,
            )
            .await
            .unwrap();
    }

    // A self-connection attempt is reported successful but dropped
    let own = PeerDescriptor {
        nonce: Some("n0".to_string()),
        ..peer("203.0.113.9", 7000)
    };
    assert!(registry.upsert(&own, false).await.unwrap());

    let stats = registry.stats().await;
    assert_eq!(stats.total, 4);
    assert_eq!(stats.alive, 3);
}
