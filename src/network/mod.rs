// Embercoin Network Module
//
// This module provides the coordination layer of the Embercoin node:
// - Peer bookkeeping with an explicit admission policy
// - Lifecycle event fan-out to subsystem modules
//
// Transport, block validation and persistence live in sibling crates and
// reach this layer only through the traits exposed here.

pub mod types;
pub mod peer;
pub mod events;

pub use peer::registry::PeerRegistry;
pub use events::event_bus::EventBus;
