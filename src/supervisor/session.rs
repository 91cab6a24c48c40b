//! The seam between the supervisor and a live network session.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use slirc_line::{Command, Message};
use tokio::sync::mpsc;

use crate::error::ConnectionError;
use crate::event::{EventSender, LoopEvent};

/// What a session reports to the agent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundEvent {
    /// Registration finished (`001`).
    Welcome,
    Message {
        channel: String,
        user: String,
        text: String,
    },
    /// CTCP ACTION (`/me`).
    Action {
        channel: String,
        user: String,
        text: String,
    },
    Join {
        channel: String,
        user: String,
    },
    Part {
        channel: String,
        user: String,
    },
    /// The session is gone. Always the last event of a session.
    Disconnected {
        reason: String,
    },
}

/// Outbound handle of one session.
///
/// Cloning shares the same session. Dropping every clone closes the
/// outbound queue, which ends the session's writer.
#[derive(Debug, Clone)]
pub struct Session {
    outbound: mpsc::UnboundedSender<Message>,
    connected: Arc<AtomicBool>,
}

impl Session {
    pub fn new(outbound: mpsc::UnboundedSender<Message>, connected: Arc<AtomicBool>) -> Self {
        Self {
            outbound,
            connected,
        }
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire) && !self.outbound.is_closed()
    }

    pub fn send(&self, message: Message) -> Result<(), ConnectionError> {
        if !self.connected.load(Ordering::Acquire) {
            return Err(ConnectionError::Closed);
        }
        self.outbound
            .send(message)
            .map_err(|_| ConnectionError::Closed)
    }

    pub fn join(&self, channel: &str) -> Result<(), ConnectionError> {
        self.send(Message::join(channel))
    }

    pub fn part(&self, channel: &str) -> Result<(), ConnectionError> {
        self.send(Message::part(channel))
    }

    pub fn privmsg(&self, target: &str, text: &str) -> Result<(), ConnectionError> {
        self.send(Message::privmsg(target, text))
    }

    pub fn quit(&self, reason: &str) -> Result<(), ConnectionError> {
        self.send(Command::QUIT(Some(reason.to_string())).into())
    }
}

/// Where a session posts its [`InboundEvent`]s, tagged with its generation.
#[derive(Debug, Clone)]
pub struct InboundSink {
    generation: u64,
    events: EventSender,
}

impl InboundSink {
    pub fn new(generation: u64, events: EventSender) -> Self {
        Self { generation, events }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Returns false once the agent loop is gone.
    pub fn emit(&self, event: InboundEvent) -> bool {
        self.events
            .send(LoopEvent::Inbound {
                generation: self.generation,
                event,
            })
            .is_ok()
    }
}

/// Opens sessions. The real implementation is [`crate::network::IrcConnector`].
#[async_trait]
pub trait Connector: Send + Sync {
    /// Connect and register. Resolves once the session can send; the
    /// welcome arrives later through `sink`.
    async fn connect(&self, sink: InboundSink) -> Result<Session, ConnectionError>;
}
