//! Per-channel log state: the open date and two buffered append handles.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, Utc};

use crate::clock::date_str;
use crate::error::LogStoreError;

/// Subdirectory of the log root holding join/part logs.
pub const JOINS_DIR: &str = "joins";

/// `{root}/{date}-{channel}.log`
pub fn message_log_path(root: &Path, date: NaiveDate, channel: &str) -> PathBuf {
    root.join(file_name(date, channel))
}

/// `{root}/joins/{date}-{channel}.log`
pub fn join_part_log_path(root: &Path, date: NaiveDate, channel: &str) -> PathBuf {
    root.join(JOINS_DIR).join(file_name(date, channel))
}

fn file_name(date: NaiveDate, channel: &str) -> String {
    // Path separators in a channel name must not escape the log directory
    let safe: String = channel
        .chars()
        .map(|c| if matches!(c, '/' | '\\' | '\0') { '_' } else { c })
        .collect();
    format!("{}-{}.log", date_str(date), safe)
}

/// One buffered append-mode log file.
#[derive(Debug)]
pub(super) struct LogFile {
    path: PathBuf,
    writer: BufWriter<File>,
    /// `None` until the first flush, which makes the first write flush immediately.
    last_flush: Option<DateTime<Utc>>,
}

impl LogFile {
    pub(super) fn open(path: PathBuf) -> Result<Self, LogStoreError> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|source| LogStoreError::Open {
                path: path.clone(),
                source,
            })?;
        Ok(Self {
            path,
            writer: BufWriter::new(file),
            last_flush: None,
        })
    }

    pub(super) fn append(&mut self, line: &str) -> Result<(), LogStoreError> {
        self.writer
            .write_all(line.as_bytes())
            .and_then(|_| self.writer.write_all(b"\n"))
            .map_err(|source| LogStoreError::Write {
                path: self.path.clone(),
                source,
            })
    }

    /// Flush when strictly more than `interval` has passed since the last flush.
    pub(super) fn flush_if_due(
        &mut self,
        now: DateTime<Utc>,
        interval: chrono::Duration,
    ) -> Result<bool, LogStoreError> {
        let due = self.last_flush.is_none_or(|last| now - last > interval);
        if due {
            self.flush(now)?;
        }
        Ok(due)
    }

    pub(super) fn flush(&mut self, now: DateTime<Utc>) -> Result<(), LogStoreError> {
        self.writer.flush().map_err(|source| LogStoreError::Flush {
            path: self.path.clone(),
            source,
        })?;
        self.last_flush = Some(now);
        Ok(())
    }

    pub(super) fn path(&self) -> &Path {
        &self.path
    }

    /// Flush buffered lines; the handle closes on drop.
    pub(super) fn close(mut self) -> Result<(), LogStoreError> {
        self.writer.flush().map_err(|source| LogStoreError::Flush {
            path: self.path,
            source,
        })
    }
}

/// Log state for one channel.
///
/// Both handles are always open for `current_log_date`; a date change
/// replaces the whole struct.
#[derive(Debug)]
pub struct ChannelState {
    pub(super) current_log_date: NaiveDate,
    pub(super) message_log: LogFile,
    pub(super) join_part_log: LogFile,
}

impl ChannelState {
    /// Open both files for `date`, creating directories as needed.
    pub(super) fn open(root: &Path, channel: &str, date: NaiveDate) -> Result<Self, LogStoreError> {
        let joins_dir = root.join(JOINS_DIR);
        std::fs::create_dir_all(&joins_dir).map_err(|source| LogStoreError::CreateDir {
            path: joins_dir.clone(),
            source,
        })?;

        Ok(Self {
            current_log_date: date,
            message_log: LogFile::open(message_log_path(root, date, channel))?,
            join_part_log: LogFile::open(join_part_log_path(root, date, channel))?,
        })
    }

    pub fn current_log_date(&self) -> NaiveDate {
        self.current_log_date
    }

    /// Flush and close both handles, reporting the first failure.
    pub(super) fn close(self) -> Result<(), LogStoreError> {
        let messages = self.message_log.close();
        let joins = self.join_part_log.close();
        messages.and(joins)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
    }

    #[test]
    fn paths_follow_layout() {
        let root = Path::new("logs");
        assert_eq!(
            message_log_path(root, date(), "#test"),
            PathBuf::from("logs/2024-01-01-#test.log")
        );
        assert_eq!(
            join_part_log_path(root, date(), "#test"),
            PathBuf::from("logs/joins/2024-01-01-#test.log")
        );
    }

    #[test]
    fn separators_are_replaced() {
        let path = message_log_path(Path::new("logs"), date(), "#../../etc");
        assert_eq!(path, PathBuf::from("logs/2024-01-01-#.._.._etc.log"));
    }

    #[test]
    fn first_write_flushes_then_waits_for_interval() {
        let dir = tempfile::tempdir().unwrap();
        let mut file = LogFile::open(dir.path().join("a.log")).unwrap();
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        let interval = chrono::Duration::seconds(5);

        file.append("one").unwrap();
        assert!(file.flush_if_due(start, interval).unwrap());

        file.append("two").unwrap();
        assert!(!file.flush_if_due(start + chrono::Duration::seconds(5), interval).unwrap());
        assert_eq!(file.last_flush, Some(start));

        assert!(file.flush_if_due(start + chrono::Duration::seconds(6), interval).unwrap());
    }
}
