//! Seams between the channel state machine and its host environment
//!
//! The channel never performs I/O or sleeps itself. It asks a [`Transport`] to
//! dial/send/close and a [`Scheduler`] to arm timers, and the host feeds the
//! outcomes back in as [`TransportEvent`]s and timer firings.

use std::cell::RefCell;
use std::rc::Rc;

use thiserror::Error;

/// Identity of one dial attempt; events for a replaced connection are ignored
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(pub u64);

/// Identity of one armed timer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(pub u64);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("failed to open connection: {0}")]
    Dial(String),
    #[error("failed to send frame: {0}")]
    Send(String),
    #[error("connection is not open")]
    NotOpen,
}

/// Lifecycle notifications reported by a transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    Open,
    Close { code: u16, reason: String },
    Error { message: String },
    Frame(String),
}

/// Non-blocking duplex text transport (one frame per message)
pub trait Transport {
    /// Start dialing `url`. Completion is reported later as `TransportEvent::Open`
    /// or `TransportEvent::Close`. An `Err` means the attempt never started.
    fn open(&mut self, conn: ConnectionId, url: &str) -> Result<(), TransportError>;

    /// Transmit one text frame on an open connection
    fn send(&mut self, conn: ConnectionId, frame: &str) -> Result<(), TransportError>;

    /// Request close; the transport still reports the resulting `Close` event
    fn close(&mut self, conn: ConnectionId, code: u16, reason: &str);
}

/// Cancellable timers
pub trait Scheduler {
    /// Fire `timer` once after `delay_ms`
    fn set_timeout(&mut self, timer: TimerId, delay_ms: u64);

    /// Fire `timer` every `period_ms` until cancelled
    fn set_interval(&mut self, timer: TimerId, period_ms: u64);

    /// Disarm a timer. Unknown ids are ignored.
    fn cancel(&mut self, timer: TimerId);

    /// A one-shot timer has fired and been consumed
    fn expired(&mut self, _timer: TimerId) {}
}

/// Shared handle, so the driver can inspect a transport the channel owns
impl<T: Transport + ?Sized> Transport for Rc<RefCell<T>> {
    fn open(&mut self, conn: ConnectionId, url: &str) -> Result<(), TransportError> {
        self.borrow_mut().open(conn, url)
    }

    fn send(&mut self, conn: ConnectionId, frame: &str) -> Result<(), TransportError> {
        self.borrow_mut().send(conn, frame)
    }

    fn close(&mut self, conn: ConnectionId, code: u16, reason: &str) {
        self.borrow_mut().close(conn, code, reason);
    }
}

impl<S: Scheduler + ?Sized> Scheduler for Rc<RefCell<S>> {
    fn set_timeout(&mut self, timer: TimerId, delay_ms: u64) {
        self.borrow_mut().set_timeout(timer, delay_ms);
    }

    fn set_interval(&mut self, timer: TimerId, period_ms: u64) {
        self.borrow_mut().set_interval(timer, period_ms);
    }

    fn cancel(&mut self, timer: TimerId) {
        self.borrow_mut().cancel(timer);
    }

    fn expired(&mut self, timer: TimerId) {
        self.borrow_mut().expired(timer);
    }
}
