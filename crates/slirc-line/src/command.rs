//! IRC commands understood by the logging client.
//!
//! Anything outside this set is preserved as [`Command::Raw`] so callers can
//! still inspect it.

use std::fmt::{self, Display, Formatter};

use crate::error::MessageParseError;

/// An IRC command with its parameters.
#[derive(Clone, Debug, PartialEq, Eq)]
#[allow(clippy::upper_case_acronyms)]
pub enum Command {
    /// `PASS password`
    PASS(String),
    /// `NICK nickname`
    NICK(String),
    /// `USER username mode realname`
    USER(String, String, String),
    /// `CAP subcommand [:params]`
    CAP(String, Option<String>),
    /// `JOIN channel`
    JOIN(String),
    /// `PART channel [:reason]`
    PART(String, Option<String>),
    /// `PRIVMSG target :text`
    PRIVMSG(String, String),
    /// `PING server [server2]`
    PING(String, Option<String>),
    /// `PONG server [server2]`
    PONG(String, Option<String>),
    /// `QUIT [:reason]`
    QUIT(Option<String>),
    /// `ERROR :message`
    ERROR(String),
    /// Three-digit numeric reply.
    Response(u16, Vec<String>),
    /// Any other command, kept verbatim.
    Raw(String, Vec<String>),
}

/// `RPL_WELCOME`, sent once registration completes.
pub const RPL_WELCOME: u16 = 1;

impl Command {
    /// Build a command from its name and parsed parameters.
    pub fn new(name: &str, params: Vec<String>) -> Result<Command, MessageParseError> {
        if name.len() == 3 && name.bytes().all(|b| b.is_ascii_digit()) {
            let code = name.parse::<u16>().map_err(|_| MessageParseError::InvalidCommand {
                position: 0,
            })?;
            return Ok(Command::Response(code, params));
        }

        let upper = name.to_ascii_uppercase();
        let need = |expected: usize| -> Result<(), MessageParseError> {
            if params.len() < expected {
                Err(MessageParseError::NotEnoughArguments {
                    command: upper.clone(),
                    expected,
                    got: params.len(),
                })
            } else {
                Ok(())
            }
        };

        let mut args = params.clone().into_iter();
        let mut next = || args.next().unwrap_or_default();

        let cmd = match upper.as_str() {
            "PASS" => {
                need(1)?;
                Command::PASS(next())
            }
            "NICK" => {
                need(1)?;
                Command::NICK(next())
            }
            "USER" => {
                need(3)?;
                let user = next();
                let mode = next();
                // RFC 2812 places an unused parameter before the realname
                let realname = if params.len() >= 4 {
                    next();
                    next()
                } else {
                    next()
                };
                Command::USER(user, mode, realname)
            }
            "CAP" => {
                need(1)?;
                // Servers send `CAP <target> <sub> :params`; clients send `CAP <sub> :params`
                if params.len() >= 3 {
                    next();
                    let sub = next();
                    Command::CAP(sub, Some(next()))
                } else {
                    let sub = next();
                    Command::CAP(sub, params.get(1).cloned())
                }
            }
            "JOIN" => {
                need(1)?;
                Command::JOIN(next())
            }
            "PART" => {
                need(1)?;
                Command::PART(next(), params.get(1).cloned())
            }
            "PRIVMSG" => {
                need(2)?;
                Command::PRIVMSG(next(), next())
            }
            "PING" => {
                need(1)?;
                Command::PING(next(), params.get(1).cloned())
            }
            "PONG" => {
                need(1)?;
                Command::PONG(next(), params.get(1).cloned())
            }
            "QUIT" => Command::QUIT(params.first().cloned()),
            "ERROR" => Command::ERROR(params.first().cloned().unwrap_or_default()),
            _ => Command::Raw(name.to_string(), params),
        };

        Ok(cmd)
    }

    /// The command name as sent on the wire.
    pub fn name(&self) -> String {
        match self {
            Command::PASS(_) => "PASS".into(),
            Command::NICK(_) => "NICK".into(),
            Command::USER(..) => "USER".into(),
            Command::CAP(..) => "CAP".into(),
            Command::JOIN(_) => "JOIN".into(),
            Command::PART(..) => "PART".into(),
            Command::PRIVMSG(..) => "PRIVMSG".into(),
            Command::PING(..) => "PING".into(),
            Command::PONG(..) => "PONG".into(),
            Command::QUIT(_) => "QUIT".into(),
            Command::ERROR(_) => "ERROR".into(),
            Command::Response(code, _) => format!("{:03}", code),
            Command::Raw(name, _) => name.clone(),
        }
    }
}

/// Write `name` followed by `middle` params and an optional trailing param.
fn write_cmd(
    f: &mut Formatter<'_>,
    name: &str,
    middle: &[&str],
    trailing: Option<&str>,
) -> fmt::Result {
    write!(f, "{}", name)?;
    for param in middle {
        write!(f, " {}", param)?;
    }
    if let Some(trailing) = trailing {
        write!(f, " :{}", trailing)?;
    }
    Ok(())
}

/// Write a free-form parameter list, marking the last one trailing when needed.
fn write_params(f: &mut Formatter<'_>, name: &str, params: &[String]) -> fmt::Result {
    write!(f, "{}", name)?;
    if let Some((last, middle)) = params.split_last() {
        for param in middle {
            write!(f, " {}", param)?;
        }
        if last.is_empty() || last.contains(' ') || last.starts_with(':') {
            write!(f, " :{}", last)?;
        } else {
            write!(f, " {}", last)?;
        }
    }
    Ok(())
}

impl Display for Command {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Command::PASS(pass) => write_cmd(f, "PASS", &[pass], None),
            Command::NICK(nick) => write_cmd(f, "NICK", &[nick], None),
            Command::USER(user, mode, realname) => {
                write_cmd(f, "USER", &[user, mode, "*"], Some(realname))
            }
            Command::CAP(sub, params) => write_cmd(f, "CAP", &[sub], params.as_deref()),
            Command::JOIN(chan) => write_cmd(f, "JOIN", &[chan], None),
            Command::PART(chan, reason) => write_cmd(f, "PART", &[chan], reason.as_deref()),
            Command::PRIVMSG(target, text) => write_cmd(f, "PRIVMSG", &[target], Some(text)),
            Command::PING(server, server2) => match server2 {
                Some(s2) => write_cmd(f, "PING", &[server], Some(s2)),
                None => write_cmd(f, "PING", &[], Some(server)),
            },
            Command::PONG(server, server2) => match server2 {
                Some(s2) => write_cmd(f, "PONG", &[server], Some(s2)),
                None => write_cmd(f, "PONG", &[], Some(server)),
            },
            Command::QUIT(reason) => write_cmd(f, "QUIT", &[], reason.as_deref()),
            Command::ERROR(msg) => write_cmd(f, "ERROR", &[], Some(msg)),
            Command::Response(code, args) => write_params(f, &format!("{:03}", code), args),
            Command::Raw(name, args) => write_params(f, name, args),
        }
    }
}
