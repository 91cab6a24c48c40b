//! Diagnostic logging setup and span helpers.

use tracing::{Span, info_span};
use tracing_subscriber::EnvFilter;

use crate::config::LogFormat;

/// Install the global subscriber. `RUST_LOG` overrides the default `info` filter.
pub fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);

    match format {
        LogFormat::Pretty => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

/// Standardized span constructors.
pub mod spans {
    use super::*;

    /// Span for handling one loop event from a session.
    pub fn session(generation: u64) -> Span {
        info_span!("session", generation)
    }

    /// Span for work on one channel.
    pub fn channel(name: &str) -> Span {
        info_span!("channel", channel = %name)
    }
}
