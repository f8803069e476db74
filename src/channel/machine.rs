//! Reconnecting channel state machine
//!
//! All mutation happens through `&mut self` from one logical owner: caller
//! operations (`connect`, `disconnect`, `send`) interleaved with transport
//! events and timer firings fed in by the host. Nothing here blocks.

use std::collections::VecDeque;

use super::backoff::Backoff;
use super::events::{ChannelEvent, ChannelObserver, CloseInfo};
use super::state::{Phase, ReadyState};
use super::transport::{ConnectionId, Scheduler, TimerId, Transport, TransportEvent};
use crate::consts::{NORMAL_CLOSE_CODE, NORMAL_CLOSE_REASON};
use crate::platform;
use crate::protocol::{self, ClientMessage, ServerMessage};
use crate::settings::ChannelConfig;

/// Result of [`Channel::send`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    /// Handed to the open transport
    Sent,
    /// Not open; held until the next successful open
    Queued,
    /// Encoding or transmission failed; the message is dropped
    Failed,
}

impl SendOutcome {
    /// `true` only when the message went out immediately
    pub fn sent(self) -> bool {
        self == SendOutcome::Sent
    }
}

/// Duplex channel to one server endpoint
pub struct Channel<T: Transport, S: Scheduler> {
    config: ChannelConfig,
    transport: T,
    scheduler: S,
    backoff: Backoff,

    phase: Phase,
    /// Connection being dialed or open
    conn: Option<ConnectionId>,
    /// Connection closed by `disconnect()` whose close event is still due
    draining: Option<ConnectionId>,
    next_conn: u64,
    next_timer: u64,

    retry_count: u32,
    reconnect_timer: Option<TimerId>,
    heartbeat_timer: Option<TimerId>,
    intentionally_closed: bool,

    /// Messages submitted while not open, oldest first
    queue: VecDeque<ClientMessage>,
    events: VecDeque<ChannelEvent>,
}

impl<T: Transport, S: Scheduler> Channel<T, S> {
    pub fn new(config: ChannelConfig, transport: T, scheduler: S) -> Self {
        let seed = config.jitter_seed.unwrap_or_else(platform::clock_seed);
        let backoff = Backoff::new(
            config.base_delay_ms,
            config.max_delay_ms,
            config.jitter_ms,
            seed,
        );

        Self {
            config,
            transport,
            scheduler,
            backoff,
            phase: Phase::Idle,
            conn: None,
            draining: None,
            next_conn: 0,
            next_timer: 0,
            retry_count: 0,
            reconnect_timer: None,
            heartbeat_timer: None,
            intentionally_closed: false,
            queue: VecDeque::new(),
            events: VecDeque::new(),
        }
    }

    // === Caller operations ===

    /// Dial the endpoint. Ignored while connecting or open.
    ///
    /// From a retry or terminal state this cancels the pending attempt and
    /// starts over with a fresh retry budget.
    pub fn connect(&mut self) {
        if self.phase.is_active() {
            log::warn!("[WS] Ignoring connect() while {}", self.phase.as_str());
            return;
        }

        self.intentionally_closed = false;
        self.cancel_reconnect();
        self.retry_count = 0;
        self.dial();
    }

    /// Close the connection and stop all timers. Queued messages are discarded.
    pub fn disconnect(&mut self) {
        self.intentionally_closed = true;
        self.stop_heartbeat();
        self.cancel_reconnect();

        if !self.queue.is_empty() {
            log::info!("[WS] Discarding {} queued message(s)", self.queue.len());
            self.queue.clear();
        }

        if let Some(conn) = self.conn.take() {
            self.transport
                .close(conn, NORMAL_CLOSE_CODE, NORMAL_CLOSE_REASON);
            self.draining = Some(conn);
        }

        self.phase = Phase::Idle;
    }

    /// Send now if open, otherwise queue for the next open
    pub fn send(&mut self, message: ClientMessage) -> SendOutcome {
        match self.conn {
            Some(conn) if self.phase == Phase::Open => self.transmit(conn, &message),
            _ => {
                log::warn!("[WS] Not connected. Queueing message: {}", message.kind());
                self.queue.push_back(message);
                SendOutcome::Queued
            }
        }
    }

    pub fn start_session(&mut self, query: impl Into<String>) -> SendOutcome {
        self.send(ClientMessage::StartSession {
            query: query.into(),
        })
    }

    pub fn select_card(&mut self, card_index: u32) -> SendOutcome {
        self.send(ClientMessage::SelectCard { card_index })
    }

    pub fn request_interpretation(&mut self) -> SendOutcome {
        self.send(ClientMessage::RequestInterpretation)
    }

    pub fn shuffle(&mut self) -> SendOutcome {
        self.send(ClientMessage::Shuffle)
    }

    pub fn ping(&mut self) -> SendOutcome {
        self.send(ClientMessage::Ping)
    }

    // === Host inputs ===

    /// Feed one transport notification for `conn`
    pub fn handle_event(&mut self, conn: ConnectionId, event: TransportEvent) {
        match event {
            TransportEvent::Open => self.handle_open(conn),
            TransportEvent::Close { code, reason } => self.handle_close(conn, code, &reason),
            TransportEvent::Error { message } => self.handle_error(conn, &message),
            TransportEvent::Frame(frame) => self.handle_frame(conn, &frame),
        }
    }

    pub fn handle_open(&mut self, conn: ConnectionId) {
        if self.conn != Some(conn) || self.phase != Phase::Connecting {
            log::debug!("[WS] Ignoring open for stale connection {:?}", conn);
            return;
        }

        log::info!("[WS] Connected");
        self.phase = Phase::Open;
        self.retry_count = 0;
        self.start_heartbeat();
        self.flush_queue(conn);
        self.events.push_back(ChannelEvent::Opened);
    }

    pub fn handle_close(&mut self, conn: ConnectionId, code: u16, reason: &str) {
        if self.draining == Some(conn) {
            log::info!("[WS] Disconnected (code: {}, reason: {})", code, reason);
            self.draining = None;
            self.events.push_back(ChannelEvent::Closed(CloseInfo {
                code,
                reason: reason.to_string(),
                caller_initiated: true,
                will_retry: false,
            }));
            return;
        }

        if self.conn != Some(conn) {
            log::debug!("[WS] Ignoring close for stale connection {:?}", conn);
            return;
        }

        log::info!("[WS] Disconnected (code: {}, reason: {})", code, reason);
        self.conn = None;
        self.stop_heartbeat();
        self.cancel_reconnect();

        let will_retry = self.config.reconnect && self.retry_count < self.config.max_retries;
        self.events.push_back(ChannelEvent::Closed(CloseInfo {
            code,
            reason: reason.to_string(),
            caller_initiated: false,
            will_retry,
        }));
        self.retry_or_give_up();
    }

    /// Errors are reported only; the close that follows drives recovery
    pub fn handle_error(&mut self, conn: ConnectionId, message: &str) {
        if self.conn != Some(conn) && self.draining != Some(conn) {
            log::debug!("[WS] Ignoring error for stale connection {:?}", conn);
            return;
        }

        log::error!("[WS] Error: {}", message);
        self.events.push_back(ChannelEvent::Error {
            message: message.to_string(),
        });
    }

    /// Decode one inbound frame. Malformed frames are logged and dropped.
    pub fn handle_frame(&mut self, conn: ConnectionId, frame: &str) {
        if self.conn != Some(conn) || self.phase != Phase::Open {
            log::debug!("[WS] Ignoring frame for stale connection {:?}", conn);
            return;
        }

        match protocol::decode(frame) {
            Ok(ServerMessage::Pong) => log::debug!("[WS] pong"),
            Ok(message) => self.events.push_back(ChannelEvent::Message(message)),
            Err(e) => log::error!("[WS] Failed to parse message: {}", e),
        }
    }

    /// A timer armed through the scheduler fired. Disarmed ids are ignored.
    pub fn handle_timer(&mut self, timer: TimerId) {
        if self.reconnect_timer == Some(timer) {
            self.reconnect_timer = None;
            self.scheduler.expired(timer);
            if !self.intentionally_closed {
                self.dial();
            }
        } else if self.heartbeat_timer == Some(timer) {
            if let (Some(conn), Phase::Open) = (self.conn, self.phase) {
                if !self.transmit(conn, &ClientMessage::Ping).sent() {
                    log::warn!("[WS] Heartbeat ping failed");
                }
            }
        } else {
            log::debug!("[WS] Ignoring disarmed timer {:?}", timer);
        }
    }

    // === Notifications ===

    /// Take the next pending notification
    pub fn poll_event(&mut self) -> Option<ChannelEvent> {
        self.events.pop_front()
    }

    /// Take all pending notifications, oldest first
    pub fn drain_events(&mut self) -> Vec<ChannelEvent> {
        self.events.drain(..).collect()
    }

    /// Drain pending notifications into `observer`
    pub fn dispatch_events(&mut self, observer: &dyn ChannelObserver) {
        while let Some(event) = self.events.pop_front() {
            observer.dispatch(event);
        }
    }

    // === Status ===

    pub fn is_connected(&self) -> bool {
        self.phase == Phase::Open
    }

    pub fn ready_state(&self) -> ReadyState {
        match self.phase {
            Phase::Open => ReadyState::Open,
            Phase::Connecting => ReadyState::Connecting,
            _ if self.draining.is_some() => ReadyState::Closing,
            _ => ReadyState::Closed,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Consecutive unexpected closes since the last successful open
    pub fn retry_count(&self) -> u32 {
        self.retry_count
    }

    pub fn queued_len(&self) -> usize {
        self.queue.len()
    }

    pub fn config(&self) -> &ChannelConfig {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut S {
        &mut self.scheduler
    }

    // === Internals ===

    fn dial(&mut self) {
        self.next_conn += 1;
        let conn = ConnectionId(self.next_conn);
        self.conn = Some(conn);
        self.phase = Phase::Connecting;

        log::info!("[WS] Connecting to {}...", self.config.url);
        if let Err(e) = self.transport.open(conn, &self.config.url) {
            log::error!("[WS] Failed to create WebSocket: {}", e);
            self.conn = None;
            self.events.push_back(ChannelEvent::Error {
                message: e.to_string(),
            });
            self.retry_or_give_up();
        }
    }

    fn retry_or_give_up(&mut self) {
        if self.intentionally_closed {
            self.phase = Phase::Idle;
            return;
        }

        if !self.config.reconnect {
            self.phase = Phase::ClosedTerminal;
            return;
        }

        if self.retry_count >= self.config.max_retries {
            log::error!(
                "[WS] Max retries ({}) reached. Giving up.",
                self.config.max_retries
            );
            self.phase = Phase::ClosedTerminal;
            self.events.push_back(ChannelEvent::GaveUp {
                attempts: self.retry_count,
            });
            return;
        }

        let delay = self.backoff.next_delay(self.retry_count);
        self.retry_count += 1;
        log::info!(
            "[WS] Reconnecting in {}ms (attempt {}/{})",
            delay,
            self.retry_count,
            self.config.max_retries
        );

        let timer = self.alloc_timer();
        self.scheduler.set_timeout(timer, delay);
        self.reconnect_timer = Some(timer);
        self.phase = Phase::ClosedPendingRetry;
    }

    fn transmit(&mut self, conn: ConnectionId, message: &ClientMessage) -> SendOutcome {
        let frame = match protocol::encode(message) {
            Ok(frame) => frame,
            Err(e) => {
                log::error!("[WS] Failed to send message: {}", e);
                return SendOutcome::Failed;
            }
        };

        match self.transport.send(conn, &frame) {
            Ok(()) => SendOutcome::Sent,
            Err(e) => {
                log::error!("[WS] Failed to send message: {}", e);
                SendOutcome::Failed
            }
        }
    }

    fn flush_queue(&mut self, conn: ConnectionId) {
        while let Some(message) = self.queue.pop_front() {
            if !self.transmit(conn, &message).sent() {
                log::warn!("[WS] Dropped queued message: {}", message.kind());
            }
        }
    }

    fn start_heartbeat(&mut self) {
        self.stop_heartbeat();
        if self.config.heartbeat_interval_ms == 0 {
            return;
        }
        let timer = self.alloc_timer();
        self.scheduler
            .set_interval(timer, self.config.heartbeat_interval_ms);
        self.heartbeat_timer = Some(timer);
    }

    fn stop_heartbeat(&mut self) {
        if let Some(timer) = self.heartbeat_timer.take() {
            self.scheduler.cancel(timer);
        }
    }

    fn cancel_reconnect(&mut self) {
        if let Some(timer) = self.reconnect_timer.take() {
            self.scheduler.cancel(timer);
        }
    }

    fn alloc_timer(&mut self) -> TimerId {
        self.next_timer += 1;
        TimerId(self.next_timer)
    }
}

/// Dropping a channel releases its timers and closes a live connection
impl<T: Transport, S: Scheduler> Drop for Channel<T, S> {
    fn drop(&mut self) {
        self.stop_heartbeat();
        self.cancel_reconnect();
        if let Some(conn) = self.conn.take() {
            self.transport
                .close(conn, NORMAL_CLOSE_CODE, NORMAL_CLOSE_REASON);
        }
    }
}
