//! # slirc-line
//!
//! The small slice of the IRC protocol a logging client needs: parsing and
//! serializing single lines, framing them over a tokio stream, and picking
//! CTCP ACTION payloads out of PRIVMSG text.
//!
//! ```rust
//! use slirc_line::{Command, Message};
//!
//! let msg: Message = ":alice!alice@alice.tmi.twitch.tv PRIVMSG #test :hello"
//!     .parse()
//!     .expect("valid line");
//!
//! assert_eq!(msg.source_user(), Some("alice"));
//! assert!(matches!(msg.command, Command::PRIVMSG(ref target, _) if target == "#test"));
//! ```

#![deny(clippy::all)]
#![warn(missing_docs)]

pub mod codec;
pub mod command;
pub mod ctcp;
pub mod error;
pub mod message;
pub mod prefix;

pub use self::codec::LineCodec;
pub use self::command::Command;
pub use self::error::{MessageParseError, ProtocolError};
pub use self::message::{Message, Tag};
pub use self::prefix::Prefix;

/// Returns `true` when `name` looks like a channel name (`#`, `&`, `+` or `!` prefix).
pub fn is_channel(name: &str) -> bool {
    matches!(name.chars().next(), Some('#' | '&' | '+' | '!')) && name.len() > 1
}
