//! Line-based codec for tokio.
//!
//! Decodes newline-terminated lines into strings and encodes [`Message`]s
//! with a trailing CRLF. Invalid UTF-8 is replaced rather than rejected and
//! lines over the length limit are dropped, so one bad line never ends the
//! stream.

use bytes::BytesMut;
use tokio_util::codec::{Decoder, Encoder};

use crate::error::{self, ProtocolError};
use crate::message::Message;

/// Tags may add up to 8191 bytes on top of the 512-byte line.
pub const DEFAULT_MAX_LEN: usize = 8191 + 512;

/// Codec framing IRC lines for `tokio_util::codec::Framed`.
///
/// Decoding yields the raw line (CRLF stripped) so callers decide how to
/// treat lines that fail to parse.
pub struct LineCodec {
    next_index: usize,
    max_len: usize,
    /// Inside an oversized line; bytes are dropped up to the next `\n`.
    discarding: bool,
}

impl LineCodec {
    /// Codec with the default length limit.
    pub fn new() -> Self {
        Self::with_max_len(DEFAULT_MAX_LEN)
    }

    /// Codec with a custom length limit.
    pub fn with_max_len(max_len: usize) -> Self {
        Self {
            next_index: 0,
            max_len,
            discarding: false,
        }
    }
}

impl Default for LineCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for LineCodec {
    type Item = String;
    type Error = ProtocolError;

    fn decode(&mut self, src: &mut BytesMut) -> error::Result<Option<String>> {
        loop {
            let Some(offset) = src[self.next_index..].iter().position(|b| *b == b'\n') else {
                if self.discarding || src.len() > self.max_len {
                    src.clear();
                    self.next_index = 0;
                    self.discarding = true;
                } else {
                    self.next_index = src.len();
                }
                return Ok(None);
            };

            let line = src.split_to(self.next_index + offset + 1);
            self.next_index = 0;

            if std::mem::take(&mut self.discarding) || line.len() > self.max_len {
                continue;
            }

            let text = String::from_utf8_lossy(&line);
            return Ok(Some(text.trim_end_matches(['\r', '\n']).to_string()));
        }
    }
}

impl Encoder<Message> for LineCodec {
    type Error = ProtocolError;

    fn encode(&mut self, msg: Message, dst: &mut BytesMut) -> error::Result<()> {
        let line = msg.to_string();
        dst.reserve(line.len() + 2);
        dst.extend_from_slice(line.as_bytes());
        dst.extend_from_slice(b"\r\n");
        Ok(())
    }
}
