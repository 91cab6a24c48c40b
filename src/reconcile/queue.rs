//! Ordered, de-duplicated queue of channels waiting to be joined.
//!
//! Shared between the agent loop (which fills it) and the drain task
//! (which empties it). The `draining` flag lives under the same lock as the
//! entries, so "queue is empty" and "drain finished" flip together and a
//! concurrent enqueue either lands before the drain exits or starts a new one.

use std::collections::{BTreeSet, HashSet, VecDeque};
use std::sync::Arc;

use parking_lot::Mutex;

#[derive(Debug, Default)]
struct QueueInner {
    order: VecDeque<String>,
    members: HashSet<String>,
    draining: bool,
    /// A join bounced; the running drain stops at its next pop.
    held: bool,
    /// Entries put back at the head since the drain was held.
    requeued: usize,
}

#[derive(Debug, Clone, Default)]
pub struct JoinQueue {
    inner: Arc<Mutex<QueueInner>>,
}

impl JoinQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append unless already queued. Returns whether it was added.
    pub fn enqueue(&self, channel: &str) -> bool {
        let mut inner = self.inner.lock();
        if !inner.members.insert(channel.to_string()) {
            return false;
        }
        inner.order.push_back(channel.to_string());
        true
    }

    /// Put back a channel whose join could not be sent.
    ///
    /// Bounced channels go to the head in the order they bounced, ahead of
    /// everything still queued, and the current drain is held so it stops
    /// popping until a new drain is started.
    pub fn requeue(&self, channel: &str) -> bool {
        let mut inner = self.inner.lock();
        if !inner.members.insert(channel.to_string()) {
            return false;
        }
        let at = inner.requeued.min(inner.order.len());
        inner.order.insert(at, channel.to_string());
        inner.requeued = at + 1;
        inner.held = true;
        true
    }

    /// Drop entries that are no longer wanted. Returns how many were removed.
    pub fn retain(&self, desired: &BTreeSet<String>) -> usize {
        let mut inner = self.inner.lock();
        let before = inner.order.len();
        inner.order.retain(|c| desired.contains(c));
        let QueueInner { order, members, .. } = &mut *inner;
        members.retain(|c| order.contains(c));
        before - inner.order.len()
    }

    /// Claim the drain. False if a drain is already running.
    pub fn try_begin_drain(&self) -> bool {
        let mut inner = self.inner.lock();
        if inner.draining {
            return false;
        }
        inner.draining = true;
        inner.held = false;
        inner.requeued = 0;
        true
    }

    /// Pop the head, or release the drain claim when the queue is empty or
    /// held after a bounced join.
    pub fn pop_or_finish(&self) -> Option<String> {
        let mut inner = self.inner.lock();
        if inner.held {
            inner.draining = false;
            return None;
        }
        match inner.order.pop_front() {
            Some(channel) => {
                inner.members.remove(&channel);
                Some(channel)
            }
            None => {
                inner.draining = false;
                None
            }
        }
    }

    /// Release the drain claim, keeping the entries.
    pub fn stop_drain(&self) {
        self.inner.lock().draining = false;
    }

    pub fn is_held(&self) -> bool {
        self.inner.lock().held
    }

    pub fn is_draining(&self) -> bool {
        self.inner.lock().draining
    }

    pub fn len(&self) -> usize {
        self.inner.lock().order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().order.is_empty()
    }

    pub fn contains(&self, channel: &str) -> bool {
        self.inner.lock().members.contains(channel)
    }

    /// Entries in join order.
    pub fn snapshot(&self) -> Vec<String> {
        self.inner.lock().order.iter().cloned().collect()
    }
}
