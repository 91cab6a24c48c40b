//! CTCP ACTION (`/me`) handling.
//!
//! CTCP payloads are wrapped in `\x01` inside PRIVMSG text. The logger only
//! cares about ACTION; every other CTCP query is reported as `None`.

/// The CTCP delimiter character.
pub const CTCP_DELIM: char = '\x01';

/// Extract the text of a CTCP ACTION, e.g. `"\x01ACTION waves\x01"` -> `"waves"`.
///
/// The closing delimiter is optional, as many clients omit it.
pub fn parse_action(text: &str) -> Option<&str> {
    let inner = text.strip_prefix(CTCP_DELIM)?;
    let inner = inner.strip_suffix(CTCP_DELIM).unwrap_or(inner);
    let (kind, rest) = match inner.split_once(' ') {
        Some((kind, rest)) => (kind, rest),
        None => (inner, ""),
    };
    kind.eq_ignore_ascii_case("ACTION").then_some(rest)
}

/// Returns `true` if the text is any CTCP payload.
pub fn is_ctcp(text: &str) -> bool {
    text.starts_with(CTCP_DELIM)
}

/// Wrap `text` as a CTCP ACTION payload.
pub fn action(text: &str) -> String {
    format!("{}ACTION {}{}", CTCP_DELIM, text, CTCP_DELIM)
}
