//! slirc-logd - Straylight IRC Log Daemon
//!
//! A long-running agent that joins a dynamic set of channels and writes
//! every message, join and part to per-channel, per-day log files.
//!
//! - [`logstore`]: buffered per-channel files with UTC day rotation
//! - [`reconcile`]: desired vs joined channels, paced join drain
//! - [`supervisor`]: connection state machine and reconnect timer
//! - [`dispatch`]: the [`Agent`](dispatch::Agent) event loop
//! - [`source`]: where the desired channel set comes from
//! - [`network`]: TCP/TLS IRC sessions

pub mod clock;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod event;
pub mod logstore;
pub mod network;
pub mod reconcile;
pub mod source;
pub mod supervisor;
pub mod telemetry;

pub use dispatch::{Agent, AgentSettings};
