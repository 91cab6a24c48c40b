//! Running an agent inside a test.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};
use slirc_logd::clock::Clock;
use slirc_logd::reconcile::JoinPacing;
use slirc_logd::source::ChannelSource;
use slirc_logd::supervisor::Connector;
use slirc_logd::{Agent, AgentSettings};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

/// Settings writing logs under `dir`, admin `pajlada`.
pub fn settings(dir: &Path) -> AgentSettings {
    AgentSettings {
        admin: Some("pajlada".into()),
        log_directory: dir.to_path_buf(),
        flush_interval: Duration::from_secs(5),
        reconnection_interval: Duration::from_secs(5),
        pacing: JoinPacing::default(),
    }
}

pub fn at(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, h, min, s).unwrap()
}

/// Contents of a log file relative to the log root, empty when missing.
pub fn read_log(root: &Path, relative: &str) -> String {
    std::fs::read_to_string(root.join(relative)).unwrap_or_default()
}

pub struct RunningAgent {
    shutdown: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

impl RunningAgent {
    pub fn start(
        settings: AgentSettings,
        connector: Arc<dyn Connector>,
        source: Arc<dyn ChannelSource>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let agent = Agent::new(settings, connector, source, clock);
        let (tx, rx) = oneshot::channel::<()>();
        let task = tokio::spawn(agent.run(async move {
            let _ = rx.await;
        }));
        Self {
            shutdown: Some(tx),
            task,
        }
    }

    /// Ask the agent to quit and wait until it has closed its files.
    pub async fn stop(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        self.task.await.expect("agent task panicked");
    }
}
