//! Desired channel set sources.
//!
//! The agent never owns the channel list; it asks a [`ChannelSource`] for
//! the currently enabled channels at connect time and on reload.
//! - [`StaticChannelSource`]: the `[channels] list` from config
//! - [`SqliteChannelSource`]: enabled rows of a SQLite `channels` table

mod sqlite;

pub use sqlite::SqliteChannelSource;

use std::collections::BTreeSet;

use async_trait::async_trait;
use thiserror::Error;

/// Channel source errors.
#[derive(Debug, Error)]
pub enum ChannelSourceError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Something that can list the channels the agent should be in.
#[async_trait]
pub trait ChannelSource: Send + Sync {
    /// Currently enabled channels, normalized.
    async fn enabled_channels(&self) -> Result<BTreeSet<String>, ChannelSourceError>;

    /// Short name for diagnostics.
    fn describe(&self) -> &'static str;
}

/// Normalize a channel name: trim, lowercase, add `#` when no channel prefix is present.
///
/// Returns `None` for names that cannot be channels (empty, or containing
/// spaces, commas or control characters).
pub fn normalize_channel(name: &str) -> Option<String> {
    let name = name.trim();
    if name.is_empty()
        || name
            .chars()
            .any(|c| c == ' ' || c == ',' || c.is_control())
    {
        return None;
    }

    let lowered = name.to_lowercase();
    let channel = if slirc_line::is_channel(&lowered) {
        lowered
    } else if matches!(lowered.chars().next(), Some('#' | '&' | '+' | '!')) {
        // A bare prefix with nothing after it
        return None;
    } else {
        format!("#{}", lowered)
    };
    Some(channel)
}

/// Normalize a list, dropping invalid names and duplicates.
pub fn normalize_all<I, S>(names: I) -> BTreeSet<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    names
        .into_iter()
        .filter_map(|name| {
            let normalized = normalize_channel(name.as_ref());
            if normalized.is_none() {
                tracing::warn!(channel = %name.as_ref(), "Ignoring invalid channel name");
            }
            normalized
        })
        .collect()
}

/// A fixed channel list.
#[derive(Debug, Clone, Default)]
pub struct StaticChannelSource {
    channels: BTreeSet<String>,
}

impl StaticChannelSource {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            channels: normalize_all(names),
        }
    }
}

#[async_trait]
impl ChannelSource for StaticChannelSource {
    async fn enabled_channels(&self) -> Result<BTreeSet<String>, ChannelSourceError> {
        Ok(self.channels.clone())
    }

    fn describe(&self) -> &'static str {
        "static"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_names() {
        assert_eq!(normalize_channel("#Pajlada"), Some("#pajlada".to_string()));
        assert_eq!(normalize_channel("forsen"), Some("#forsen".to_string()));
        assert_eq!(normalize_channel("  #test "), Some("#test".to_string()));
        assert_eq!(normalize_channel(""), None);
        assert_eq!(normalize_channel("#"), None);
        assert_eq!(normalize_channel("#a b"), None);
        assert_eq!(normalize_channel("#a,#b"), None);
    }

    #[test]
    fn normalize_all_dedupes() {
        let set = normalize_all(["#A", "a", "#b", "bad name"]);
        assert_eq!(set.into_iter().collect::<Vec<_>>(), vec!["#a", "#b"]);
    }

    #[tokio::test]
    async fn static_source_returns_list() {
        let source = StaticChannelSource::new(vec!["#one", "two"]);
        let channels = source.enabled_channels().await.unwrap();
        assert_eq!(channels.len(), 2);
        assert!(channels.contains("#two"));
        assert_eq!(source.describe(), "static");
    }
}
