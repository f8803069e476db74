//! Deterministic simulation harness
//!
//! Drives a [`Channel`] without a network or wall clock:
//! - `SimTransport` records dials, frames and closes
//! - `VirtualScheduler` fires timers only when time is advanced
//!
//! Used by the native dry run and by the channel tests.

pub mod clock;
pub mod transport;

pub use clock::{ScheduledTimer, VirtualScheduler};
pub use transport::{CloseRequest, SimTransport};

use crate::channel::{Channel, TransportEvent};
use crate::settings::ChannelConfig;

/// Abnormal closure (no close frame received)
pub const ABNORMAL_CLOSE_CODE: u16 = 1006;

pub type SimChannel = Channel<SimTransport, VirtualScheduler>;

/// Build a channel wired to a fresh simulated transport and clock
pub fn sim_channel(config: ChannelConfig) -> SimChannel {
    Channel::new(config, SimTransport::new(), VirtualScheduler::new())
}

/// Advance virtual time by `ms`, firing due timers one at a time in order.
/// Returns how many timers fired.
pub fn advance(channel: &mut SimChannel, ms: u64) -> usize {
    let deadline = channel.scheduler().now_ms() + ms;
    let mut fired = 0;
    while let Some(timer) = channel.scheduler_mut().fire_next(deadline) {
        channel.handle_timer(timer);
        fired += 1;
    }
    channel.scheduler_mut().set_now(deadline);
    fired
}

/// Fire timers until none remain armed or `limit` have fired
pub fn run_until_idle(channel: &mut SimChannel, limit: usize) -> usize {
    let mut fired = 0;
    while fired < limit {
        match channel.scheduler_mut().fire_next(u64::MAX) {
            Some(timer) => {
                channel.handle_timer(timer);
                fired += 1;
            }
            None => break,
        }
    }
    fired
}

/// Report the latest dial as established. Returns false if nothing was dialed.
pub fn accept_latest(channel: &mut SimChannel) -> bool {
    match channel.transport().last_conn() {
        Some(conn) => {
            channel.handle_event(conn, TransportEvent::Open);
            true
        }
        None => false,
    }
}

/// Report the latest dial as dropped with an abnormal close
pub fn drop_latest(channel: &mut SimChannel) -> bool {
    match channel.transport().last_conn() {
        Some(conn) => {
            channel.handle_event(
                conn,
                TransportEvent::Close {
                    code: ABNORMAL_CLOSE_CODE,
                    reason: String::new(),
                },
            );
            true
        }
        None => false,
    }
}

/// Deliver a raw frame on the latest connection
pub fn deliver(channel: &mut SimChannel, frame: &str) -> bool {
    match channel.transport().last_conn() {
        Some(conn) => {
            channel.handle_event(conn, TransportEvent::Frame(frame.to_string()));
            true
        }
        None => false,
    }
}
