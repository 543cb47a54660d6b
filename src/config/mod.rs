mod peer;

pub use peer::PeerConfig;
