//! In-memory transport that records everything the channel asks of it

use std::collections::VecDeque;

use crate::channel::{ConnectionId, Transport, TransportError};
use crate::protocol::ClientMessage;

/// A close requested by the channel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloseRequest {
    pub conn: ConnectionId,
    pub code: u16,
    pub reason: String,
}

/// Scriptable fake transport
///
/// Dials always "start" unless a failure is scripted; the driver decides
/// whether a started dial opens or closes by feeding events to the channel.
#[derive(Debug, Default)]
pub struct SimTransport {
    /// Every dial attempt, in order
    pub dials: Vec<(ConnectionId, String)>,
    /// Every transmitted frame, in order
    pub frames: Vec<(ConnectionId, String)>,
    pub closes: Vec<CloseRequest>,
    /// Outcome of upcoming dials; empty means success
    dial_script: VecDeque<Result<(), TransportError>>,
    /// Fail every send while set
    pub fail_sends: bool,
}

impl SimTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `count` dials fail before starting
    pub fn fail_next_dials(&mut self, count: usize) {
        for _ in 0..count {
            self.dial_script
                .push_back(Err(TransportError::Dial("connection refused".to_string())));
        }
    }

    /// Connection id of the most recent dial
    pub fn last_conn(&self) -> Option<ConnectionId> {
        self.dials.last().map(|(conn, _)| *conn)
    }

    /// Transmitted frames decoded back into messages (undecodable frames skipped)
    pub fn sent_messages(&self) -> Vec<ClientMessage> {
        self.frames
            .iter()
            .filter_map(|(_, frame)| serde_json::from_str(frame).ok())
            .collect()
    }
}

impl Transport for SimTransport {
    fn open(&mut self, conn: ConnectionId, url: &str) -> Result<(), TransportError> {
        self.dials.push((conn, url.to_string()));
        self.dial_script.pop_front().unwrap_or(Ok(()))
    }

    fn send(&mut self, conn: ConnectionId, frame: &str) -> Result<(), TransportError> {
        if self.fail_sends {
            return Err(TransportError::Send("socket buffer full".to_string()));
        }
        self.frames.push((conn, frame.to_string()));
        Ok(())
    }

    fn close(&mut self, conn: ConnectionId, code: u16, reason: &str) {
        self.closes.push(CloseRequest {
            conn,
            code,
            reason: reason.to_string(),
        });
    }
}
