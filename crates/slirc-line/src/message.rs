//! IRC message type, nom-based parsing and serialization.
//!
//! ```text
//! [@tags] [:prefix] <command> [params...] [:trailing]
//! ```

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use nom::{
    bytes::complete::{take_until, take_while1},
    character::complete::{char, space0},
    combinator::opt,
    sequence::preceded,
    IResult,
};

use crate::command::Command;
use crate::error::{MessageParseError, ProtocolError};
use crate::prefix::Prefix;

/// A single IRCv3 message tag: key and optional value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Tag(pub String, pub Option<String>);

/// An owned IRC message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Message {
    /// IRCv3 tags, if any were present.
    pub tags: Option<Vec<Tag>>,
    /// Message origin.
    pub prefix: Option<Prefix>,
    /// The command and its parameters.
    pub command: Command,
}

impl Message {
    /// Value of the tag `key`, if present with a value.
    pub fn tag_value(&self, key: &str) -> Option<&str> {
        self.tags
            .as_ref()?
            .iter()
            .find(|tag| tag.0 == key)
            .and_then(|tag| tag.1.as_deref())
    }

    /// Nickname of the sender, if the prefix is a user mask.
    pub fn source_nick(&self) -> Option<&str> {
        self.prefix.as_ref().and_then(Prefix::nick)
    }

    /// Username of the sender, falling back to the nickname when the mask has no `!user` part.
    pub fn source_user(&self) -> Option<&str> {
        let prefix = self.prefix.as_ref()?;
        prefix.user().or_else(|| prefix.nick())
    }

    /// `JOIN channel`
    pub fn join(channel: &str) -> Self {
        Command::JOIN(channel.to_string()).into()
    }

    /// `PART channel`
    pub fn part(channel: &str) -> Self {
        Command::PART(channel.to_string(), None).into()
    }

    /// `PRIVMSG target :text`
    pub fn privmsg(target: &str, text: &str) -> Self {
        Command::PRIVMSG(target.to_string(), text.to_string()).into()
    }
}

impl From<Command> for Message {
    fn from(command: Command) -> Self {
        Message {
            tags: None,
            prefix: None,
            command,
        }
    }
}

fn parse_tags(input: &str) -> IResult<&str, &str> {
    preceded(char('@'), take_until(" "))(input)
}

fn parse_prefix(input: &str) -> IResult<&str, &str> {
    preceded(char(':'), take_while1(|c| c != ' '))(input)
}

fn parse_command(input: &str) -> IResult<&str, &str> {
    let (rest, cmd) = take_while1(|c: char| c.is_ascii_alphanumeric())(input)?;

    let is_all_letters = cmd.chars().all(|c| c.is_ascii_alphabetic());
    let is_three_digits = cmd.len() == 3 && cmd.chars().all(|c| c.is_ascii_digit());

    if is_all_letters || is_three_digits {
        Ok((rest, cmd))
    } else {
        Err(nom::Err::Error(nom::error::Error::new(
            input,
            nom::error::ErrorKind::AlphaNumeric,
        )))
    }
}

/// Parse `[@tags] [:prefix] <command>`, leaving the parameter section.
fn parse_header(input: &str) -> IResult<&str, (Option<&str>, Option<&str>, &str)> {
    let (input, tags) = opt(parse_tags)(input)?;
    let (input, _) = space0(input)?;
    let (input, prefix) = opt(parse_prefix)(input)?;
    let (input, _) = space0(input)?;
    let (input, command) = parse_command(input)?;
    Ok((input, (tags, prefix, command)))
}

/// Split the parameter section. Consecutive spaces count as one separator.
fn parse_params(input: &str) -> Vec<String> {
    let mut params = Vec::new();
    let mut rest = input;

    loop {
        rest = rest.trim_start_matches(' ');
        if rest.is_empty() {
            break;
        }
        if let Some(trailing) = rest.strip_prefix(':') {
            params.push(trailing.to_string());
            break;
        }
        let end = rest.find(' ').unwrap_or(rest.len());
        params.push(rest[..end].to_string());
        rest = &rest[end..];
    }

    params
}

fn unescape_tag_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some(':') => out.push(';'),
            Some('s') => out.push(' '),
            Some('r') => out.push('\r'),
            Some('n') => out.push('\n'),
            Some(other) => out.push(other),
            None => {}
        }
    }
    out
}

fn parse_tag_list(raw: &str) -> Vec<Tag> {
    raw.split(';')
        .filter(|s| !s.is_empty())
        .map(|tag| {
            let mut iter = tag.splitn(2, '=');
            let key = iter.next().unwrap_or_default().to_string();
            let value = iter.next().map(unescape_tag_value);
            Tag(key, value)
        })
        .collect()
}

impl FromStr for Message {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Message, Self::Err> {
        let line = s.trim_end_matches(['\r', '\n']);
        let invalid = |cause| ProtocolError::InvalidMessage {
            string: line.to_owned(),
            cause,
        };

        if line.trim().is_empty() {
            return Err(invalid(MessageParseError::EmptyMessage));
        }

        let (rest, (tags, prefix, name)) = parse_header(line).map_err(|e| {
            let position = match e {
                nom::Err::Error(e) | nom::Err::Failure(e) => line.len() - e.input.len(),
                nom::Err::Incomplete(_) => line.len(),
            };
            invalid(MessageParseError::InvalidCommand { position })
        })?;

        let command = Command::new(name, parse_params(rest)).map_err(invalid)?;

        Ok(Message {
            tags: tags.map(parse_tag_list),
            prefix: prefix.map(Prefix::new_from_str),
            command,
        })
    }
}

impl Display for Message {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if let Some(ref tags) = self.tags {
            write!(f, "@")?;
            for (i, tag) in tags.iter().enumerate() {
                if i > 0 {
                    write!(f, ";")?;
                }
                write!(f, "{}", tag.0)?;
                if let Some(ref value) = tag.1 {
                    let escaped = value
                        .replace('\\', "\\\\")
                        .replace(';', "\\:")
                        .replace(' ', "\\s")
                        .replace('\r', "\\r")
                        .replace('\n', "\\n");
                    write!(f, "={}", escaped)?;
                }
            }
            write!(f, " ")?;
        }

        if let Some(ref prefix) = self.prefix {
            write!(f, ":{} ", prefix)?;
        }

        write!(f, "{}", self.command)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::RPL_WELCOME;

    #[test]
    fn parses_twitch_privmsg_with_tags() {
        let msg: Message =
            "@badge-info=;display-name=Alice;tmi-sent-ts=1704110400000 :alice!alice@alice.tmi.twitch.tv PRIVMSG #test :hello there\r\n"
                .parse()
                .unwrap();

        assert_eq!(msg.tag_value("display-name"), Some("Alice"));
        assert_eq!(msg.tag_value("badge-info"), Some(""));
        assert_eq!(msg.source_user(), Some("alice"));
        assert_eq!(
            msg.command,
            Command::PRIVMSG("#test".into(), "hello there".into())
        );
    }

    #[test]
    fn parses_welcome_numeric() {
        let msg: Message = ":tmi.twitch.tv 001 justinfan123 :Welcome, GLHF!".parse().unwrap();
        assert!(matches!(msg.command, Command::Response(RPL_WELCOME, _)));
        assert_eq!(msg.source_nick(), None);
    }

    #[test]
    fn parses_ping_without_prefix() {
        let msg: Message = "PING :tmi.twitch.tv".parse().unwrap();
        assert_eq!(msg.command, Command::PING("tmi.twitch.tv".into(), None));
    }

    #[test]
    fn collapses_repeated_spaces() {
        let msg: Message = ":bob!bob@host PART   #test".parse().unwrap();
        assert_eq!(msg.command, Command::PART("#test".into(), None));
    }

    #[test]
    fn rejects_empty_and_malformed_lines() {
        assert!(matches!(
            "\r\n".parse::<Message>(),
            Err(ProtocolError::InvalidMessage { cause: MessageParseError::EmptyMessage, .. })
        ));
        assert!(matches!(
            ":prefix-only".parse::<Message>(),
            Err(ProtocolError::InvalidMessage { cause: MessageParseError::InvalidCommand { .. }, .. })
        ));
    }

    #[test]
    fn unescapes_tag_values() {
        let msg: Message = "@system-msg=hello\\sworld\\:ok PING :x".parse().unwrap();
        assert_eq!(msg.tag_value("system-msg"), Some("hello world;ok"));
    }

    #[test]
    fn serializes_without_line_ending() {
        let msg = Message::privmsg("#test", "pajlada, PONG");
        assert_eq!(msg.to_string(), "PRIVMSG #test :pajlada, PONG");
    }
}
