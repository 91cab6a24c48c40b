//! Integration test common infrastructure.
//!
//! Provides an in-memory network ([`MockNetwork`]), a controllable channel
//! source and a handle for running an agent until told to stop.

pub mod agent;
pub mod network;
pub mod source;

#[allow(unused_imports)]
pub use agent::{RunningAgent, at, read_log, settings};
#[allow(unused_imports)]
pub use network::{MockConnector, MockNetwork, MockSession};
#[allow(unused_imports)]
pub use source::SharedSource;

use std::time::Duration;

/// Let every spawned task run until idle. Needs a paused clock.
#[allow(dead_code)]
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(1)).await;
}
