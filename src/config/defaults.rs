//! Default value functions for configuration.
//!
//! Separated into its own module for clarity and reuse.

/// Returns `true` (for serde defaults).
pub fn default_true() -> bool {
    true
}

// =============================================================================
// Server Defaults
// =============================================================================

pub fn default_port() -> u16 {
    6667
}

pub fn default_connect_timeout() -> u64 {
    30
}

// =============================================================================
// Agent Defaults
// =============================================================================

pub fn default_reconnection_interval() -> u64 {
    5
}

pub fn default_channel_limit() -> usize {
    40
}

pub fn default_channel_limit_wait() -> u64 {
    20
}

pub fn default_flush_interval() -> u64 {
    5
}

// =============================================================================
// Log Defaults
// =============================================================================

pub fn default_log_directory() -> String {
    "logs".to_string()
}
