//! Channel Reconciler.
//!
//! Brings the joined channel set in line with the desired set: channels no
//! longer wanted are parted and their logs closed right away, new ones go
//! into the [`JoinQueue`] and are joined by the paced drain task.

mod drain;
mod queue;

pub use drain::{DrainEvent, JoinPacing};
pub use queue::JoinQueue;

use std::collections::BTreeSet;

use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::event::EventSender;
use crate::logstore::LogStore;
use crate::supervisor::{ConnectionState, Session};

/// Result of one reconciliation, both lists sorted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcilePlan {
    pub to_leave: Vec<String>,
    pub to_join: Vec<String>,
}

impl ReconcilePlan {
    pub fn is_empty(&self) -> bool {
        self.to_leave.is_empty() && self.to_join.is_empty()
    }
}

/// `to_leave = joined - desired`, `to_join = desired - joined`.
pub fn diff(desired: &BTreeSet<String>, joined: &BTreeSet<String>) -> ReconcilePlan {
    ReconcilePlan {
        to_leave: joined.difference(desired).cloned().collect(),
        to_join: desired.difference(joined).cloned().collect(),
    }
}

pub struct Reconciler {
    queue: JoinQueue,
    pacing: JoinPacing,
    joined: BTreeSet<String>,
    desired: BTreeSet<String>,
    events: EventSender,
}

impl Reconciler {
    pub fn new(pacing: JoinPacing, events: EventSender) -> Self {
        Self {
            queue: JoinQueue::new(),
            pacing,
            joined: BTreeSet::new(),
            desired: BTreeSet::new(),
            events,
        }
    }

    /// Reconcile `desired` against the channels joined on the current session.
    ///
    /// Parts are sent immediately when a session is available; joins are
    /// queued and the drain is started if it is not already running.
    pub fn reconcile(
        &mut self,
        desired: &BTreeSet<String>,
        session: Option<&Session>,
        logs: &mut LogStore,
        state: watch::Receiver<ConnectionState>,
    ) -> ReconcilePlan {
        let plan = diff(desired, &self.joined);
        self.desired = desired.clone();

        for channel in &plan.to_leave {
            if let Some(session) = session
                && let Err(e) = session.part(channel)
            {
                warn!(channel = %channel, error = %e, "Failed to send PART");
            }
            self.joined.remove(channel);
            if let Err(e) = logs.close(channel) {
                error!(channel = %channel, error = %e, code = e.error_code(), "Failed to close log files");
            }
        }

        let dropped = self.queue.retain(desired);
        let mut queued = 0;
        for channel in &plan.to_join {
            if self.queue.enqueue(channel) {
                queued += 1;
            }
        }

        info!(
            desired = desired.len(),
            leave = plan.to_leave.len(),
            join = plan.to_join.len(),
            queued,
            dropped,
            "Reconciled channels"
        );

        self.drain_join_queue(state);
        plan
    }

    /// Start the drain task unless one is running or there is nothing to join.
    /// Returns whether a task was spawned.
    pub fn drain_join_queue(&self, state: watch::Receiver<ConnectionState>) -> bool {
        if self.queue.is_empty() || !self.queue.try_begin_drain() {
            return false;
        }
        debug!(queued = self.queue.len(), "Starting join drain");
        tokio::spawn(drain::run(
            self.queue.clone(),
            self.pacing,
            state,
            self.events.clone(),
        ));
        true
    }

    /// Whether a drained channel should still be joined.
    pub fn wants(&self, channel: &str) -> bool {
        self.desired.contains(channel) && !self.joined.contains(channel)
    }

    pub fn mark_joined(&mut self, channel: &str) {
        self.joined.insert(channel.to_string());
    }

    /// Put back a drained channel whose join could not be sent.
    pub fn requeue(&self, channel: &str) {
        self.queue.requeue(channel);
    }

    pub fn is_joined(&self, channel: &str) -> bool {
        self.joined.contains(channel)
    }

    pub fn joined(&self) -> &BTreeSet<String> {
        &self.joined
    }

    pub fn desired(&self) -> &BTreeSet<String> {
        &self.desired
    }

    pub fn queue(&self) -> &JoinQueue {
        &self.queue
    }

    /// Forget membership. Nothing is assumed to survive a reconnect.
    pub fn reset_membership(&mut self) {
        if !self.joined.is_empty() {
            debug!(count = self.joined.len(), "Clearing channel membership");
        }
        self.joined.clear();
    }
}
