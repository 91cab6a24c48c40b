//! Event Dispatcher and the agent event loop.
//!
//! [`Agent`] owns the Log Store, the Reconciler and the Connection
//! Supervisor, and is the only place any of them is mutated. Session I/O,
//! connect attempts, reconnect timers, the join drain and channel source
//! queries all run elsewhere and post [`LoopEvent`]s back here.

mod commands;

pub use commands::{AdminCommand, is_admin};

use std::collections::BTreeSet;
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, info, warn};

use crate::clock::{Clock, time_str};
use crate::config::Config;
use crate::event::{self, EventReceiver, EventSender, LoopEvent, ReconcileTrigger};
use crate::logstore::{LogKind, LogStore};
use crate::reconcile::{DrainEvent, JoinPacing, Reconciler};
use crate::source::{ChannelSource, ChannelSourceError};
use crate::supervisor::{ConnectionSupervisor, Connector, InboundEvent};
use crate::telemetry::spans;

/// Time the writer gets to send QUIT before the process exits.
const QUIT_GRACE: Duration = Duration::from_millis(500);

/// Tunables of an [`Agent`].
#[derive(Debug, Clone)]
pub struct AgentSettings {
    /// User allowed to issue admin commands.
    pub admin: Option<String>,
    pub log_directory: PathBuf,
    pub flush_interval: Duration,
    pub reconnection_interval: Duration,
    pub pacing: JoinPacing,
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            admin: None,
            log_directory: PathBuf::from("logs"),
            flush_interval: Duration::from_secs(5),
            reconnection_interval: Duration::from_secs(5),
            pacing: JoinPacing::default(),
        }
    }
}

impl AgentSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            admin: config.agent.admin.clone(),
            log_directory: config.logs.directory(),
            flush_interval: config.agent.flush_interval(),
            reconnection_interval: config.agent.reconnection_interval(),
            pacing: JoinPacing {
                channel_limit: config.agent.channel_limit,
                channel_limit_wait: config.agent.channel_limit_wait(),
            },
        }
    }
}

pub struct Agent {
    admin: Option<String>,
    logs: LogStore,
    reconciler: Reconciler,
    supervisor: ConnectionSupervisor,
    source: Arc<dyn ChannelSource>,
    clock: Arc<dyn Clock>,
    events_tx: EventSender,
    events_rx: EventReceiver,
}

impl Agent {
    pub fn new(
        settings: AgentSettings,
        connector: Arc<dyn Connector>,
        source: Arc<dyn ChannelSource>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let (events_tx, events_rx) = event::channel();
        Self {
            admin: settings.admin,
            logs: LogStore::new(
                settings.log_directory,
                settings.flush_interval,
                Arc::clone(&clock),
            ),
            reconciler: Reconciler::new(settings.pacing, events_tx.clone()),
            supervisor: ConnectionSupervisor::new(
                connector,
                settings.reconnection_interval,
                events_tx.clone(),
            ),
            source,
            clock,
            events_tx,
            events_rx,
        }
    }

    pub fn logs(&self) -> &LogStore {
        &self.logs
    }

    pub fn reconciler(&self) -> &Reconciler {
        &self.reconciler
    }

    pub fn supervisor(&self) -> &ConnectionSupervisor {
        &self.supervisor
    }

    /// Connect, then process events until `shutdown` resolves. Quits on the way out.
    pub async fn run<F>(mut self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        info!(source = self.source.describe(), "Agent starting");
        self.supervisor.connect();

        tokio::pin!(shutdown);
        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("Shutdown requested");
                    break;
                }
                event = self.events_rx.recv() => match event {
                    Some(event) => self.handle(event),
                    None => break,
                },
            }
        }

        if self.supervisor.quit(&mut self.logs) {
            tokio::time::sleep(QUIT_GRACE).await;
        }
        info!("Agent stopped");
    }

    /// Apply one loop event.
    pub fn handle(&mut self, event: LoopEvent) {
        match event {
            LoopEvent::Inbound { generation, event } => {
                let _span = spans::session(generation).entered();
                if !self.supervisor.is_current(generation) {
                    debug!(?event, "Dropping event from stale session");
                    return;
                }
                self.on_inbound(generation, event);
            }
            LoopEvent::SessionReady {
                generation,
                session,
            } => self.supervisor.on_session_ready(generation, session),
            LoopEvent::ConnectFailed { generation, error } => {
                self.supervisor.on_connect_failed(generation, error)
            }
            LoopEvent::ReconnectCheck => self.supervisor.on_reconnect_check(),
            LoopEvent::DesiredChannels { trigger, result } => self.on_desired(trigger, result),
            LoopEvent::Drain(DrainEvent::Join(channel)) => self.on_drain_join(&channel),
            LoopEvent::Drain(DrainEvent::Finished { issued, remaining }) => {
                info!(issued, remaining, "Join drain finished");
                // A held drain may exit while a newer session is already up
                if remaining > 0
                    && self.supervisor.state().is_connected()
                    && self.supervisor.session().is_some()
                {
                    self.reconciler.drain_join_queue(self.supervisor.subscribe());
                }
            }
        }
    }

    fn on_inbound(&mut self, generation: u64, event: InboundEvent) {
        match event {
            InboundEvent::Welcome => {
                if self.supervisor.on_welcome(generation) {
                    self.reconciler.reset_membership();
                    self.request_desired(ReconcileTrigger::Welcome);
                }
            }
            InboundEvent::Message {
                channel,
                user,
                text,
            } => self.on_message(&channel, &user, &text),
            InboundEvent::Action {
                channel,
                user,
                text,
            } => {
                let line = format!("{} * {} {}", self.now(), user, text);
                self.write(&channel, LogKind::Message, &line);
            }
            InboundEvent::Join { channel, user } => {
                let line = format!("{} JOIN {}", self.now(), user);
                self.write(&channel, LogKind::JoinPart, &line);
            }
            InboundEvent::Part { channel, user } => {
                // A part after our own leave must not reopen the files
                if self.logs.is_open(&channel) {
                    let line = format!("{} PART {}", self.now(), user);
                    self.write(&channel, LogKind::JoinPart, &line);
                }
            }
            InboundEvent::Disconnected { reason } => {
                self.supervisor.on_disconnect(generation, &reason);
            }
        }
    }

    fn on_message(&mut self, channel: &str, user: &str, text: &str) {
        let line = format!("{} <{}> {}", self.now(), user, text);
        self.write(channel, LogKind::Message, &line);

        if !is_admin(self.admin.as_deref(), user) {
            return;
        }
        match AdminCommand::parse(text) {
            Some(AdminCommand::Ping) => self.reply(channel, &format!("{}, PONG", user)),
            Some(AdminCommand::Reload) => {
                info!(channel = %channel, user = %user, "Channel reload requested");
                self.reply(channel, &format!("{}, reloading channels", user));
                self.request_desired(ReconcileTrigger::Reload);
            }
            None => {}
        }
    }

    fn reply(&self, channel: &str, text: &str) {
        match self.supervisor.session() {
            Some(session) => {
                if let Err(e) = session.privmsg(channel, text) {
                    warn!(channel = %channel, error = %e, "Failed to send reply");
                }
            }
            None => debug!(channel = %channel, "No session for reply"),
        }
    }

    /// Query the channel source off the loop; the answer comes back as
    /// [`LoopEvent::DesiredChannels`].
    fn request_desired(&self, trigger: ReconcileTrigger) {
        let source = Arc::clone(&self.source);
        let events = self.events_tx.clone();
        tokio::spawn(async move {
            let result = source.enabled_channels().await;
            let _ = events.send(LoopEvent::DesiredChannels { trigger, result });
        });
    }

    fn on_desired(
        &mut self,
        trigger: ReconcileTrigger,
        result: Result<BTreeSet<String>, ChannelSourceError>,
    ) {
        let desired = match result {
            Ok(desired) => desired,
            Err(e) => {
                error!(
                    source = self.source.describe(),
                    error = %e,
                    ?trigger,
                    "Channel source query failed, keeping current channels"
                );
                return;
            }
        };

        if !self.supervisor.state().is_connected() {
            debug!(?trigger, "Not connected, reconciliation deferred to next welcome");
            return;
        }

        if trigger == ReconcileTrigger::Welcome {
            // Files left open by the previous session for channels we no longer want
            for channel in self.logs.open_channels() {
                if !desired.contains(&channel)
                    && let Err(e) = self.logs.close(&channel)
                {
                    error!(channel = %channel, error = %e, "Failed to close log files");
                }
            }
        }

        let plan = self.reconciler.reconcile(
            &desired,
            self.supervisor.session(),
            &mut self.logs,
            self.supervisor.subscribe(),
        );
        debug!(?trigger, leave = ?plan.to_leave, join = plan.to_join.len(), "Reconciliation applied");
    }

    /// The drain task wants `channel` joined now.
    fn on_drain_join(&mut self, channel: &str) {
        let _span = spans::channel(channel).entered();

        let session = match self.supervisor.session() {
            Some(session) if self.supervisor.state().is_connected() => session,
            _ => {
                debug!("Not connected, requeueing join");
                self.reconciler.requeue(channel);
                return;
            }
        };

        if !self.reconciler.wants(channel) {
            debug!("Join no longer wanted");
            return;
        }

        if let Err(e) = session.join(channel) {
            warn!(error = %e, "Failed to send JOIN, requeueing");
            self.reconciler.requeue(channel);
            return;
        }
        self.reconciler.mark_joined(channel);

        if let Err(e) = self.logs.rotate(channel) {
            error!(error = %e, code = e.error_code(), path = %e.path().display(), "Failed to open log files");
        }
    }

    fn write(&mut self, channel: &str, kind: LogKind, line: &str) {
        if let Err(e) = self.logs.write(channel, kind, line) {
            error!(
                channel = %channel,
                ?kind,
                error = %e,
                code = e.error_code(),
                path = %e.path().display(),
                "Failed to write log line"
            );
        }
    }

    fn now(&self) -> String {
        time_str(self.clock.now())
    }
}
