//! A channel source the test can change while the agent runs.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use slirc_logd::source::{ChannelSource, ChannelSourceError, normalize_all};

#[derive(Default)]
pub struct SharedSource {
    channels: Mutex<BTreeSet<String>>,
    fail: AtomicBool,
}

#[allow(dead_code)]
impl SharedSource {
    pub fn new<I, S>(names: I) -> Arc<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Arc::new(Self {
            channels: Mutex::new(normalize_all(names)),
            fail: AtomicBool::new(false),
        })
    }

    pub fn set<I, S>(&self, names: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        *self.channels.lock() = normalize_all(names);
    }

    pub fn fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl ChannelSource for SharedSource {
    async fn enabled_channels(&self) -> Result<BTreeSet<String>, ChannelSourceError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(ChannelSourceError::Database(sqlx::Error::PoolClosed));
        }
        Ok(self.channels.lock().clone())
    }

    fn describe(&self) -> &'static str {
        "shared"
    }
}
