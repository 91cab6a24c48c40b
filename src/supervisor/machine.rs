//! Connection lifecycle state machine.
//!
//! ```text
//! Disconnected ──connect()──► Connecting ──001──► Connected
//!      ▲                          │                   │
//!      └────────── failure ───────┘◄──── disconnect ──┘
//! ```

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    /// No session and no attempt in flight.
    #[default]
    Disconnected,
    /// A connection attempt is in flight, or a session exists but has not been welcomed yet.
    Connecting,
    /// Registered with the server.
    Connected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("invalid connection state transition {from} -> {to}")]
pub struct InvalidTransition {
    pub from: ConnectionState,
    pub to: ConnectionState,
}

impl ConnectionState {
    pub fn can_transition(self, to: ConnectionState) -> bool {
        use ConnectionState::*;
        matches!(
            (self, to),
            (Disconnected, Connecting)
                | (Connecting, Connected)
                | (Connecting, Disconnected)
                | (Connected, Disconnected)
        )
    }

    pub fn transition(self, to: ConnectionState) -> Result<ConnectionState, InvalidTransition> {
        if self.can_transition(to) {
            Ok(to)
        } else {
            Err(InvalidTransition { from: self, to })
        }
    }

    pub fn is_connected(self) -> bool {
        self == ConnectionState::Connected
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Connected => "connected",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::ConnectionState::*;
    use super::*;

    #[test]
    fn legal_transitions() {
        assert_eq!(Disconnected.transition(Connecting), Ok(Connecting));
        assert_eq!(Connecting.transition(Connected), Ok(Connected));
        assert_eq!(Connecting.transition(Disconnected), Ok(Disconnected));
        assert_eq!(Connected.transition(Disconnected), Ok(Disconnected));
    }

    #[test]
    fn illegal_transitions_rejected() {
        for (from, to) in [
            (Disconnected, Connected),
            (Disconnected, Disconnected),
            (Connecting, Connecting),
            (Connected, Connecting),
            (Connected, Connected),
        ] {
            let err = from.transition(to).unwrap_err();
            assert_eq!(err, InvalidTransition { from, to });
        }
    }

    #[test]
    fn display_is_lowercase() {
        assert_eq!(Connected.to_string(), "connected");
        assert_eq!(
            Disconnected.transition(Connected).unwrap_err().to_string(),
            "invalid connection state transition disconnected -> connected"
        );
    }
}
