//! Connection Supervisor.
//!
//! Owns the [`ConnectionState`], the current [`Session`] and the reconnect
//! timer. Connect attempts and timers run as spawned tasks that only report
//! back to the agent loop; every state change happens on the loop.
//!
//! Each connect attempt gets a fresh generation number. Results and inbound
//! events carry it, and anything from a superseded generation is dropped.

mod machine;
mod session;

pub use machine::{ConnectionState, InvalidTransition};
pub use session::{Connector, InboundEvent, InboundSink, Session};

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::error::ConnectionError;
use crate::event::{EventSender, LoopEvent};
use crate::logstore::LogStore;

pub struct ConnectionSupervisor {
    connector: Arc<dyn Connector>,
    reconnect_interval: Duration,
    state_tx: watch::Sender<ConnectionState>,
    session: Option<Session>,
    generation: u64,
    reconnect_armed: bool,
    events: EventSender,
}

impl ConnectionSupervisor {
    pub fn new(
        connector: Arc<dyn Connector>,
        reconnect_interval: Duration,
        events: EventSender,
    ) -> Self {
        let (state_tx, _) = watch::channel(ConnectionState::Disconnected);
        Self {
            connector,
            reconnect_interval,
            state_tx,
            session: None,
            generation: 0,
            reconnect_armed: false,
            events,
        }
    }

    pub fn state(&self) -> ConnectionState {
        *self.state_tx.borrow()
    }

    /// Observe state changes from other tasks.
    pub fn subscribe(&self) -> watch::Receiver<ConnectionState> {
        self.state_tx.subscribe()
    }

    /// The current session, if one exists and is still usable.
    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref().filter(|s| s.is_connected())
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Whether `generation` belongs to the current attempt.
    pub fn is_current(&self, generation: u64) -> bool {
        generation == self.generation
    }

    fn set_state(&mut self, to: ConnectionState) -> bool {
        let from = self.state();
        match from.transition(to) {
            Ok(next) => {
                self.state_tx.send_replace(next);
                debug!(from = %from, to = %next, "Connection state changed");
                true
            }
            Err(e) => {
                warn!(error = %e, "Rejected connection state change");
                false
            }
        }
    }

    /// Start a connection attempt. Does nothing unless disconnected.
    pub fn connect(&mut self) {
        if self.state() != ConnectionState::Disconnected {
            debug!(state = %self.state(), "Connect skipped");
            return;
        }
        if !self.set_state(ConnectionState::Connecting) {
            return;
        }

        self.generation += 1;
        let generation = self.generation;
        let connector = Arc::clone(&self.connector);
        let events = self.events.clone();
        info!(generation, "Connecting");

        tokio::spawn(async move {
            let sink = InboundSink::new(generation, events.clone());
            let event = match connector.connect(sink).await {
                Ok(session) => LoopEvent::SessionReady {
                    generation,
                    session,
                },
                Err(error) => LoopEvent::ConnectFailed { generation, error },
            };
            // Loop gone means shutdown
            let _ = events.send(event);
        });
    }

    pub fn on_session_ready(&mut self, generation: u64, session: Session) {
        if !self.is_current(generation) || self.state() != ConnectionState::Connecting {
            debug!(generation, "Dropping stale session");
            return;
        }
        debug!(generation, "Session established, waiting for welcome");
        self.session = Some(session);
    }

    pub fn on_connect_failed(&mut self, generation: u64, error: ConnectionError) {
        if !self.is_current(generation) {
            return;
        }
        warn!(
            generation,
            error = %error,
            code = error.error_code(),
            "Connection attempt failed"
        );
        self.session = None;
        self.set_state(ConnectionState::Disconnected);
        self.schedule_reconnect_check();
    }

    /// Server welcome. Returns true when this moved the supervisor to `Connected`.
    pub fn on_welcome(&mut self, generation: u64) -> bool {
        if !self.is_current(generation) || self.state() != ConnectionState::Connecting {
            debug!(generation, state = %self.state(), "Ignoring welcome");
            return false;
        }
        if !self.set_state(ConnectionState::Connected) {
            return false;
        }
        info!(generation, "Connected");
        true
    }

    /// The session ended. Returns false for stale or duplicate reports.
    pub fn on_disconnect(&mut self, generation: u64, reason: &str) -> bool {
        if !self.is_current(generation) || self.state() == ConnectionState::Disconnected {
            debug!(generation, "Ignoring stale disconnect");
            return false;
        }
        info!(generation, reason = %reason, "Disconnected");
        self.session = None;
        self.set_state(ConnectionState::Disconnected);
        self.schedule_reconnect_check();
        true
    }

    /// Arm the reconnect timer unless it already is.
    pub fn schedule_reconnect_check(&mut self) {
        if self.reconnect_armed {
            return;
        }
        self.reconnect_armed = true;
        let interval = self.reconnect_interval;
        let events = self.events.clone();
        tokio::spawn(async move {
            tokio::time::sleep(interval).await;
            let _ = events.send(LoopEvent::ReconnectCheck);
        });
    }

    /// Reconnect timer fired: re-arm while down, connect when idle.
    pub fn on_reconnect_check(&mut self) {
        self.reconnect_armed = false;
        match self.state() {
            ConnectionState::Connected => {}
            ConnectionState::Connecting => {
                debug!("Connection attempt still in flight");
                self.schedule_reconnect_check();
            }
            ConnectionState::Disconnected => {
                info!("Reconnecting");
                self.connect();
                self.schedule_reconnect_check();
            }
        }
    }

    /// Say goodbye if connected and close every log file.
    ///
    /// Returns whether a QUIT was queued.
    pub fn quit(&mut self, logs: &mut LogStore) -> bool {
        let mut sent = false;
        if self.state().is_connected()
            && let Some(session) = self.session()
        {
            match session.quit("bye") {
                Ok(()) => sent = true,
                Err(e) => warn!(error = %e, "Failed to send QUIT"),
            }
        }
        logs.close_all();
        sent
    }
}
