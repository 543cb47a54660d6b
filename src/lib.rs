// Embercoin network core - peer bookkeeping and lifecycle event dispatch
// for the Embercoin blockchain node.

pub mod config;
pub mod network;

// Initialize logging
pub fn init_logger() {
    env_logger::init();
}
