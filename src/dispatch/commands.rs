//! Admin chat commands.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdminCommand {
    /// `!logping`: liveness check.
    Ping,
    /// `!logreload`: re-read the channel source and reconcile.
    Reload,
}

impl AdminCommand {
    /// Parse a chat line. Only exact commands match.
    pub fn parse(text: &str) -> Option<Self> {
        match text.trim_end() {
            "!logping" => Some(Self::Ping),
            "!logreload" => Some(Self::Reload),
            _ => None,
        }
    }
}

/// Whether `user` may issue admin commands.
pub fn is_admin(admin: Option<&str>, user: &str) -> bool {
    admin.is_some_and(|admin| admin.eq_ignore_ascii_case(user))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_exact_commands() {
        assert_eq!(AdminCommand::parse("!logping"), Some(AdminCommand::Ping));
        assert_eq!(AdminCommand::parse("!logreload "), Some(AdminCommand::Reload));
        assert_eq!(AdminCommand::parse("!logping please"), None);
        assert_eq!(AdminCommand::parse("hello"), None);
    }

    #[test]
    fn admin_match_ignores_case() {
        assert!(is_admin(Some("pajlada"), "Pajlada"));
        assert!(!is_admin(Some("pajlada"), "forsen"));
        assert!(!is_admin(None, "pajlada"));
    }
}
