//! Network module.
//!
//! The real [`Connector`]: TCP (optionally TLS), line framing, registration,
//! then a reader and a writer task per session.

mod io;
mod stream;
mod tls;

pub use stream::IrcStream;
pub use tls::NoCertificateVerification;

use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use slirc_line::{Command, LineCodec, Message};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_util::codec::Framed;
use tracing::{info, instrument};

use crate::config::ServerConfig;
use crate::error::ConnectionError;
use crate::supervisor::{Connector, InboundSink, Session};

/// Connects to the configured IRC server.
pub struct IrcConnector {
    server: ServerConfig,
}

impl IrcConnector {
    pub fn new(server: ServerConfig) -> Self {
        Self { server }
    }

    async fn open_stream(&self) -> Result<IrcStream, ConnectionError> {
        let addr = (self.server.host.as_str(), self.server.port);
        let tcp = tokio::time::timeout(self.server.connect_timeout(), TcpStream::connect(addr))
            .await
            .map_err(|_| ConnectionError::Timeout)??;
        tcp.set_nodelay(true)?;

        if self.server.tls {
            let tls = tokio::time::timeout(
                self.server.connect_timeout(),
                tls::upgrade(tcp, &self.server.host, self.server.verify_cert),
            )
            .await
            .map_err(|_| ConnectionError::Timeout)??;
            Ok(IrcStream::Tls(Box::new(tls)))
        } else {
            Ok(IrcStream::Plain(tcp))
        }
    }
}

/// Lines sent right after connecting, in order.
pub fn registration(server: &ServerConfig) -> Vec<Message> {
    let mut lines = Vec::new();
    if !server.capabilities.is_empty() {
        lines.push(Command::CAP("REQ".into(), Some(server.capabilities.join(" "))).into());
    }
    if let Some(password) = &server.password {
        lines.push(Command::PASS(password.clone()).into());
    }
    lines.push(Command::NICK(server.nickname.clone()).into());
    lines.push(
        Command::USER(
            server.nickname.clone(),
            "0".into(),
            server.nickname.clone(),
        )
        .into(),
    );
    lines
}

#[async_trait]
impl Connector for IrcConnector {
    #[instrument(skip(self, sink), fields(host = %self.server.host, port = self.server.port, generation = sink.generation()))]
    async fn connect(&self, sink: InboundSink) -> Result<Session, ConnectionError> {
        let stream = self.open_stream().await?;
        let tls = stream.is_tls();
        let (mut writer, reader) = Framed::new(stream, LineCodec::new()).split();

        for line in registration(&self.server) {
            writer.send(line).await?;
        }
        info!(tls, nickname = %self.server.nickname, "Registration sent");

        let (tx, rx) = mpsc::unbounded_channel();
        let connected = Arc::new(AtomicBool::new(true));

        tokio::spawn(io::run_writer(writer, rx, Arc::clone(&connected)));
        tokio::spawn(io::run_reader(
            reader,
            sink,
            tx.clone(),
            Arc::clone(&connected),
            self.server.connect_timeout(),
        ));

        Ok(Session::new(tx, connected))
    }
}
