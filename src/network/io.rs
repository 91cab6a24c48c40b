//! Reader and writer tasks of a live session.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use futures_util::{Sink, SinkExt, Stream, StreamExt};
use slirc_line::command::RPL_WELCOME;
use slirc_line::{Command, Message, ProtocolError, ctcp, is_channel};
use tokio::sync::mpsc;
use tracing::{debug, trace, warn};

use crate::supervisor::{InboundEvent, InboundSink};

/// What the reader does with one server line.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Inbound {
    Event(InboundEvent),
    /// Answer directly on the session.
    Reply(Message),
    /// Server closed the link with `ERROR`.
    Closing(String),
    Ignore,
}

/// Map a server message to an agent event.
pub(crate) fn classify(message: &Message) -> Inbound {
    let user = || message.source_user().unwrap_or_default().to_string();

    match &message.command {
        Command::Response(code, _) if *code == RPL_WELCOME => Inbound::Event(InboundEvent::Welcome),
        Command::PING(server, _) => Inbound::Reply(Command::PONG(server.clone(), None).into()),
        Command::ERROR(reason) => Inbound::Closing(reason.clone()),
        Command::PRIVMSG(target, text) if is_channel(target) => {
            let channel = target.to_lowercase();
            match ctcp::parse_action(text) {
                Some(action) => Inbound::Event(InboundEvent::Action {
                    channel,
                    user: user(),
                    text: action.to_string(),
                }),
                // Other CTCP requests are not chat
                None if ctcp::is_ctcp(text) => Inbound::Ignore,
                None => Inbound::Event(InboundEvent::Message {
                    channel,
                    user: user(),
                    text: text.clone(),
                }),
            }
        }
        Command::JOIN(channel) if is_channel(channel) => Inbound::Event(InboundEvent::Join {
            channel: channel.to_lowercase(),
            user: user(),
        }),
        Command::PART(channel, _) if is_channel(channel) => Inbound::Event(InboundEvent::Part {
            channel: channel.to_lowercase(),
            user: user(),
        }),
        _ => Inbound::Ignore,
    }
}

/// Forward queued messages to the server until every sender is gone or a write fails.
pub(crate) async fn run_writer<W>(
    mut sink: W,
    mut outbound: mpsc::UnboundedReceiver<Message>,
    connected: Arc<AtomicBool>,
) where
    W: Sink<Message, Error = ProtocolError> + Unpin,
{
    while let Some(message) = outbound.recv().await {
        trace!(line = %message, "Sending");
        if let Err(e) = sink.send(message).await {
            warn!(error = %e, "Write failed");
            connected.store(false, Ordering::Release);
            break;
        }
    }
    let _ = sink.close().await;
}

/// Read server lines until EOF, then report the disconnect.
///
/// If no welcome arrives within `registration_timeout` the session is
/// given up.
pub(crate) async fn run_reader<R>(
    mut stream: R,
    sink: InboundSink,
    replies: mpsc::UnboundedSender<Message>,
    connected: Arc<AtomicBool>,
    registration_timeout: Duration,
) where
    R: Stream<Item = Result<String, ProtocolError>> + Unpin,
{
    let deadline = tokio::time::Instant::now() + registration_timeout;
    let mut registered = false;

    let reason = loop {
        let next = if registered {
            stream.next().await
        } else {
            tokio::select! {
                next = stream.next() => next,
                _ = tokio::time::sleep_until(deadline) => break "registration timed out".to_string(),
            }
        };

        let line = match next {
            Some(Ok(line)) => line,
            Some(Err(ProtocolError::Io(e))) => break format!("read error: {e}"),
            Some(Err(e)) => {
                warn!(error = %e, "Skipping malformed line");
                continue;
            }
            None => break "connection closed".to_string(),
        };

        if line.is_empty() {
            continue;
        }

        let message: Message = match line.parse() {
            Ok(message) => message,
            Err(e) => {
                warn!(error = %e, "Skipping malformed line");
                continue;
            }
        };

        match classify(&message) {
            Inbound::Event(event) => {
                if event == InboundEvent::Welcome {
                    registered = true;
                }
                if !sink.emit(event) {
                    debug!("Agent loop gone, stopping reader");
                    break "agent shut down".to_string();
                }
            }
            Inbound::Reply(reply) => {
                let _ = replies.send(reply);
            }
            Inbound::Closing(reason) => break format!("server error: {reason}"),
            Inbound::Ignore => {}
        }
    };

    connected.store(false, Ordering::Release);
    sink.emit(InboundEvent::Disconnected { reason });
}
