//! Messages delivered to the agent event loop.
//!
//! Everything that happens off the loop (session I/O, connect attempts,
//! reconnect timers, the join drain, channel source queries) reports back
//! as a [`LoopEvent`] on one unbounded channel.

use std::collections::BTreeSet;

use tokio::sync::mpsc;

use crate::error::ConnectionError;
use crate::reconcile::DrainEvent;
use crate::source::ChannelSourceError;
use crate::supervisor::{InboundEvent, Session};

pub type EventSender = mpsc::UnboundedSender<LoopEvent>;
pub type EventReceiver = mpsc::UnboundedReceiver<LoopEvent>;

/// Why a channel source query was started.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileTrigger {
    /// Server welcome after (re)connecting.
    Welcome,
    /// Admin `!logreload`.
    Reload,
}

#[derive(Debug)]
pub enum LoopEvent {
    /// Something arrived on the session with this generation.
    Inbound {
        generation: u64,
        event: InboundEvent,
    },
    /// A connect attempt produced a session.
    SessionReady { generation: u64, session: Session },
    /// A connect attempt failed.
    ConnectFailed {
        generation: u64,
        error: ConnectionError,
    },
    /// Reconnect timer fired.
    ReconnectCheck,
    /// Channel source answered.
    DesiredChannels {
        trigger: ReconcileTrigger,
        result: Result<BTreeSet<String>, ChannelSourceError>,
    },
    Drain(DrainEvent),
}

pub fn channel() -> (EventSender, EventReceiver) {
    mpsc::unbounded_channel()
}
