//! In-memory stand-in for the IRC server.
//!
//! Every `connect` hands the test a [`MockSession`] through [`MockNetwork`],
//! which can then play the server side: send a welcome, chat lines, or drop
//! the link.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use slirc_line::Message;
use slirc_logd::error::ConnectionError;
use slirc_logd::supervisor::{Connector, InboundEvent, InboundSink, Session};
use tokio::sync::mpsc;

pub struct MockConnector {
    accepted: mpsc::UnboundedSender<MockSession>,
    /// Remaining attempts that should fail before one succeeds.
    refuse: AtomicUsize,
}

impl MockConnector {
    pub fn new() -> (Arc<Self>, MockNetwork) {
        let (tx, rx) = mpsc::unbounded_channel();
        let connector = Arc::new(Self {
            accepted: tx,
            refuse: AtomicUsize::new(0),
        });
        (connector, MockNetwork { accepted: rx })
    }

    #[allow(dead_code)]
    pub fn refuse_next(&self, attempts: usize) {
        self.refuse.store(attempts, Ordering::SeqCst);
    }
}

#[async_trait]
impl Connector for MockConnector {
    async fn connect(&self, sink: InboundSink) -> Result<Session, ConnectionError> {
        let refused = self
            .refuse
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if refused {
            return Err(ConnectionError::Io(std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                "refused",
            )));
        }

        let (tx, rx) = mpsc::unbounded_channel();
        let connected = Arc::new(AtomicBool::new(true));
        let _ = self.accepted.send(MockSession {
            sink,
            outbound: rx,
            connected: Arc::clone(&connected),
        });
        Ok(Session::new(tx, connected))
    }
}

/// Test side of the connector: yields each accepted session.
pub struct MockNetwork {
    accepted: mpsc::UnboundedReceiver<MockSession>,
}

impl MockNetwork {
    pub async fn accept(&mut self) -> MockSession {
        tokio::time::timeout(Duration::from_secs(300), self.accepted.recv())
            .await
            .expect("no connection attempt")
            .expect("connector dropped")
    }

    #[allow(dead_code)]
    pub fn try_accept(&mut self) -> Option<MockSession> {
        self.accepted.try_recv().ok()
    }
}

/// Server side of one session.
pub struct MockSession {
    sink: InboundSink,
    outbound: mpsc::UnboundedReceiver<Message>,
    connected: Arc<AtomicBool>,
}

#[allow(dead_code)]
impl MockSession {
    pub fn generation(&self) -> u64 {
        self.sink.generation()
    }

    pub fn emit(&self, event: InboundEvent) {
        self.sink.emit(event);
    }

    pub fn welcome(&self) {
        self.emit(InboundEvent::Welcome);
    }

    pub fn say(&self, channel: &str, user: &str, text: &str) {
        self.emit(InboundEvent::Message {
            channel: channel.into(),
            user: user.into(),
            text: text.into(),
        });
    }

    pub fn act(&self, channel: &str, user: &str, text: &str) {
        self.emit(InboundEvent::Action {
            channel: channel.into(),
            user: user.into(),
            text: text.into(),
        });
    }

    pub fn joined(&self, channel: &str, user: &str) {
        self.emit(InboundEvent::Join {
            channel: channel.into(),
            user: user.into(),
        });
    }

    pub fn parted(&self, channel: &str, user: &str) {
        self.emit(InboundEvent::Part {
            channel: channel.into(),
            user: user.into(),
        });
    }

    /// Break the link the way a real session reports it.
    pub fn drop_link(&self, reason: &str) {
        self.connected.store(false, Ordering::Release);
        self.emit(InboundEvent::Disconnected {
            reason: reason.into(),
        });
    }

    /// Next line the agent sent.
    pub async fn next_line(&mut self) -> String {
        tokio::time::timeout(Duration::from_secs(300), self.outbound.recv())
            .await
            .expect("no line from agent")
            .expect("session closed")
            .to_string()
    }

    /// Everything sent so far, without waiting.
    pub fn sent_lines(&mut self) -> Vec<String> {
        let mut lines = Vec::new();
        while let Ok(message) = self.outbound.try_recv() {
            lines.push(message.to_string());
        }
        lines
    }
}
