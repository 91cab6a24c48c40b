//! IRC message prefix types.
//!
//! A prefix identifies the origin of a message: either a server name or a
//! user's `nick!user@host` mask.

use std::fmt::{self, Display, Formatter};

/// IRC message prefix.
#[derive(Clone, Eq, PartialEq, Debug, Hash)]
pub enum Prefix {
    /// Server name (e.g., "tmi.twitch.tv").
    ServerName(String),
    /// User prefix: (nickname, username, hostname).
    Nickname(String, String, String),
}

impl Prefix {
    /// Parse a prefix string leniently, without validating the components.
    pub fn new_from_str(s: &str) -> Self {
        #[derive(Copy, Clone, Eq, PartialEq)]
        enum Part {
            Name,
            User,
            Host,
        }

        let mut name = String::new();
        let mut user = String::new();
        let mut host = String::new();
        let mut part = Part::Name;
        let mut is_server = false;

        for c in s.chars() {
            if c == '.' && part == Part::Name {
                is_server = true;
            }

            match c {
                '!' if part == Part::Name => {
                    is_server = false;
                    part = Part::User;
                }
                '@' if part != Part::Host => {
                    is_server = false;
                    part = Part::Host;
                }
                _ => match part {
                    Part::Name => name.push(c),
                    Part::User => user.push(c),
                    Part::Host => host.push(c),
                },
            }
        }

        if is_server {
            Prefix::ServerName(name)
        } else {
            Prefix::Nickname(name, user, host)
        }
    }

    /// Nickname, if this is a user prefix.
    pub fn nick(&self) -> Option<&str> {
        match self {
            Prefix::Nickname(nick, _, _) if !nick.is_empty() => Some(nick),
            _ => None,
        }
    }

    /// Username, if this is a user prefix with a `!user` part.
    pub fn user(&self) -> Option<&str> {
        match self {
            Prefix::Nickname(_, user, _) if !user.is_empty() => Some(user),
            _ => None,
        }
    }
}

impl Display for Prefix {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Prefix::ServerName(name) => write!(f, "{}", name),
            Prefix::Nickname(nick, user, host) => {
                write!(f, "{}", nick)?;
                if !user.is_empty() {
                    write!(f, "!{}", user)?;
                }
                if !host.is_empty() {
                    write!(f, "@{}", host)?;
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_user_mask() {
        let prefix = Prefix::new_from_str("alice!alice@alice.tmi.twitch.tv");
        assert_eq!(prefix.nick(), Some("alice"));
        assert_eq!(prefix.user(), Some("alice"));
        assert_eq!(prefix.to_string(), "alice!alice@alice.tmi.twitch.tv");
    }

    #[test]
    fn dotted_name_without_mask_is_server() {
        let prefix = Prefix::new_from_str("tmi.twitch.tv");
        assert_eq!(prefix, Prefix::ServerName("tmi.twitch.tv".to_string()));
        assert_eq!(prefix.nick(), None);
    }

    #[test]
    fn bare_nick_has_no_user() {
        let prefix = Prefix::new_from_str("bob");
        assert_eq!(prefix.nick(), Some("bob"));
        assert_eq!(prefix.user(), None);
    }
}
