//! Paced join drain task.
//!
//! Pops the [`JoinQueue`] and asks the agent loop to join each channel.
//! After every `channel_limit` joins it pauses for `channel_limit_wait`.
//! A full batch always ends with the pause, even when the queue ran dry,
//! so channels enqueued right after cannot start a new batch early.

use std::time::Duration;

use tokio::sync::watch;
use tracing::{debug, info};

use super::JoinQueue;
use crate::event::{EventSender, LoopEvent};
use crate::supervisor::ConnectionState;

/// Join rate limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JoinPacing {
    /// Joins per batch.
    pub channel_limit: usize,
    /// Pause after each full batch.
    pub channel_limit_wait: Duration,
}

impl Default for JoinPacing {
    fn default() -> Self {
        Self {
            channel_limit: 40,
            channel_limit_wait: Duration::from_secs(20),
        }
    }
}

/// Reports from the drain task to the agent loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DrainEvent {
    /// Join this channel now.
    Join(String),
    /// The drain exited. `remaining` entries are still queued.
    Finished { issued: usize, remaining: usize },
}

/// Run the drain until the queue is empty or the connection leaves `Connected`.
///
/// The caller must hold the drain claim ([`JoinQueue::try_begin_drain`]).
pub async fn run(
    queue: JoinQueue,
    pacing: JoinPacing,
    state: watch::Receiver<ConnectionState>,
    events: EventSender,
) {
    let limit = pacing.channel_limit.max(1);
    let mut issued = 0usize;
    let mut in_batch = 0usize;

    loop {
        if !state.borrow().is_connected() {
            queue.stop_drain();
            info!(remaining = queue.len(), "Join drain stopped, connection lost");
            break;
        }

        let Some(channel) = queue.pop_or_finish() else {
            break;
        };

        if events
            .send(LoopEvent::Drain(DrainEvent::Join(channel)))
            .is_err()
        {
            queue.stop_drain();
            return;
        }
        issued += 1;
        in_batch += 1;

        if in_batch >= limit {
            in_batch = 0;
            debug!(
                issued,
                remaining = queue.len(),
                wait_secs = pacing.channel_limit_wait.as_secs(),
                "Join batch complete, pausing"
            );
            tokio::time::sleep(pacing.channel_limit_wait).await;
        }
    }

    let remaining = queue.len();
    let _ = events.send(LoopEvent::Drain(DrainEvent::Finished { issued, remaining }));
}
