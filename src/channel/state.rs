//! Channel lifecycle states

use serde::{Deserialize, Serialize};

/// Where the channel is in its connect/retry lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Phase {
    /// Never connected, or closed by the caller
    #[default]
    Idle,
    /// Dial in progress
    Connecting,
    /// Connection established
    Open,
    /// Unexpected close, reconnect timer armed
    ClosedPendingRetry,
    /// Retry ceiling reached (or reconnect disabled); waits for `connect()`
    ClosedTerminal,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Idle => "idle",
            Phase::Connecting => "connecting",
            Phase::Open => "open",
            Phase::ClosedPendingRetry => "closed_pending_retry",
            Phase::ClosedTerminal => "closed_terminal",
        }
    }

    /// `connect()` is ignored in these phases
    pub fn is_active(&self) -> bool {
        matches!(self, Phase::Connecting | Phase::Open)
    }
}

/// Socket-level state, numbered like the browser `WebSocket.readyState`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u16)]
pub enum ReadyState {
    Connecting = 0,
    Open = 1,
    Closing = 2,
    Closed = 3,
}

impl ReadyState {
    pub fn as_u16(self) -> u16 {
        self as u16
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ready_state_numbering() {
        assert_eq!(ReadyState::Connecting.as_u16(), 0);
        assert_eq!(ReadyState::Open.as_u16(), 1);
        assert_eq!(ReadyState::Closing.as_u16(), 2);
        assert_eq!(ReadyState::Closed.as_u16(), 3);
    }

    #[test]
    fn test_only_connecting_and_open_are_active() {
        assert!(Phase::Connecting.is_active());
        assert!(Phase::Open.is_active());
        assert!(!Phase::Idle.is_active());
        assert!(!Phase::ClosedPendingRetry.is_active());
        assert!(!Phase::ClosedTerminal.is_active());
    }
}
