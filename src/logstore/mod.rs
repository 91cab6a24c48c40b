//! Per-channel, per-day log files.
//!
//! The [`LogStore`] owns a table of [`ChannelState`] keyed by channel name.
//! Every write checks the channel's open date against the current UTC date
//! and rotates first when they differ, so a line always lands in the file
//! for the day it was written.
//!
//! Layout:
//! - messages: `{root}/{YYYY-MM-DD}-{channel}.log`
//! - joins/parts: `{root}/joins/{YYYY-MM-DD}-{channel}.log`
//!
//! Writes are buffered; a file is flushed after a write once more than the
//! flush interval has passed since its last flush.

mod channel;

pub use channel::{ChannelState, JOINS_DIR, join_part_log_path, message_log_path};

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, NaiveDate, Utc};
use tracing::{debug, info, warn};

use crate::clock::{Clock, date_str};
use crate::error::LogStoreError;

/// Which of a channel's two logs a line belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogKind {
    Message,
    JoinPart,
}

/// Owned table of open channel logs.
pub struct LogStore {
    root: PathBuf,
    flush_interval: chrono::Duration,
    clock: Arc<dyn Clock>,
    channels: HashMap<String, ChannelState>,
}

impl LogStore {
    pub fn new(root: impl Into<PathBuf>, flush_interval: Duration, clock: Arc<dyn Clock>) -> Self {
        let flush_interval =
            chrono::Duration::from_std(flush_interval).unwrap_or(chrono::Duration::seconds(5));
        Self {
            root: root.into(),
            flush_interval,
            clock,
            channels: HashMap::new(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Append `line` to the channel's `kind` log, rotating first if the day changed.
    pub fn write(&mut self, channel: &str, kind: LogKind, line: &str) -> Result<(), LogStoreError> {
        let now = self.clock.now();
        let today = now.date_naive();
        let interval = self.flush_interval;

        if let Some(state) = self.channels.get_mut(channel)
            && state.current_log_date == today
        {
            return Self::append(state, kind, line, now, interval);
        }

        let state = self.rotate_to(channel, today)?;
        Self::append(state, kind, line, now, interval)
    }

    fn append(
        state: &mut ChannelState,
        kind: LogKind,
        line: &str,
        now: DateTime<Utc>,
        interval: chrono::Duration,
    ) -> Result<(), LogStoreError> {
        let file = match kind {
            LogKind::Message => &mut state.message_log,
            LogKind::JoinPart => &mut state.join_part_log,
        };
        file.append(line)?;
        file.flush_if_due(now, interval)?;
        Ok(())
    }

    /// Close any open files for the channel and open fresh ones for today.
    pub fn rotate(&mut self, channel: &str) -> Result<(), LogStoreError> {
        let today = self.clock.now().date_naive();
        self.rotate_to(channel, today).map(|_| ())
    }

    fn rotate_to(
        &mut self,
        channel: &str,
        date: NaiveDate,
    ) -> Result<&mut ChannelState, LogStoreError> {
        if let Some(previous) = self.channels.remove(channel) {
            let previous_date = previous.current_log_date;
            if let Err(e) = previous.close() {
                warn!(
                    channel = %channel,
                    date = %date_str(previous_date),
                    error = %e,
                    "Failed to flush log files during rotation"
                );
            }
        }

        let state = ChannelState::open(&self.root, channel, date)?;
        info!(channel = %channel, date = %date_str(date), "Opened log files");
        Ok(self.channels.entry(channel.to_string()).or_insert(state))
    }

    /// Flush the channel's `kind` log now, regardless of the interval.
    ///
    /// A channel without open files has nothing to flush.
    pub fn flush(&mut self, channel: &str, kind: LogKind) -> Result<(), LogStoreError> {
        let now = self.clock.now();
        let Some(state) = self.channels.get_mut(channel) else {
            return Ok(());
        };
        match kind {
            LogKind::Message => state.message_log.flush(now),
            LogKind::JoinPart => state.join_part_log.flush(now),
        }
    }

    /// Flush and close the channel's files and forget it. No-op if nothing is open.
    pub fn close(&mut self, channel: &str) -> Result<(), LogStoreError> {
        match self.channels.remove(channel) {
            Some(state) => {
                debug!(channel = %channel, "Closing log files");
                state.close()
            }
            None => Ok(()),
        }
    }

    /// Close every open channel. Failures are logged; the rest still close.
    pub fn close_all(&mut self) -> usize {
        let mut closed = 0;
        for (channel, state) in self.channels.drain() {
            if let Err(e) = state.close() {
                warn!(channel = %channel, error = %e, "Failed to flush log files on close");
            }
            closed += 1;
        }
        if closed > 0 {
            info!(count = closed, "Closed all log files");
        }
        closed
    }

    pub fn is_open(&self, channel: &str) -> bool {
        self.channels.contains_key(channel)
    }

    /// Channels with open files, sorted.
    pub fn open_channels(&self) -> Vec<String> {
        let mut names: Vec<String> = self.channels.keys().cloned().collect();
        names.sort();
        names
    }

    /// The date the channel's files are open for.
    pub fn current_log_date(&self, channel: &str) -> Option<NaiveDate> {
        self.channels.get(channel).map(ChannelState::current_log_date)
    }

    /// Paths of the channel's currently open files (message, join/part).
    pub fn open_paths(&self, channel: &str) -> Option<(PathBuf, PathBuf)> {
        self.channels.get(channel).map(|state| {
            (
                state.message_log.path().to_path_buf(),
                state.join_part_log.path().to_path_buf(),
            )
        })
    }
}

impl Drop for LogStore {
    fn drop(&mut self) {
        if !self.channels.is_empty() {
            self.close_all();
        }
    }
}
