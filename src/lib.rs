//! Tarot Link - resilient real-time channel for the tarot reading client
//!
//! Core modules:
//! - `protocol`: Typed client/server messages and the JSON frame codec
//! - `channel`: Reconnecting duplex channel (pure state machine, no platform deps)
//! - `settings`: Construction-time channel configuration
//! - `endpoint`: Default server endpoint derivation
//! - `context`: Explicit owner of the application's default channel
//! - `sim`: Deterministic transport and virtual clock for dry runs and tests
//! - `platform`: Browser bindings (WebSocket, timers, JS surface)

pub mod channel;
pub mod context;
pub mod endpoint;
pub mod platform;
pub mod protocol;
pub mod settings;
pub mod sim;

pub use channel::{
    Channel, ChannelEvent, ChannelObserver, EventHandlers, Phase, ReadyState, SendOutcome,
};
pub use context::ChannelContext;
pub use protocol::{CardPosition, ClientMessage, Position, ServerMessage, ShuffleStep};
pub use settings::ChannelConfig;

/// Channel timing constants
pub mod consts {
    /// Heartbeat period while open (ms)
    pub const HEARTBEAT_INTERVAL_MS: u64 = 30_000;
    /// Upper bound (exclusive) of the uniform reconnect jitter (ms)
    pub const JITTER_MS: u64 = 1_000;

    /// Reconnect defaults
    pub const DEFAULT_MAX_RETRIES: u32 = 10;
    pub const DEFAULT_BASE_DELAY_MS: u64 = 1_000;
    pub const DEFAULT_MAX_DELAY_MS: u64 = 30_000;

    /// Close code and reason sent on caller-initiated disconnect
    pub const NORMAL_CLOSE_CODE: u16 = 1000;
    pub const NORMAL_CLOSE_REASON: &str = "Client disconnected";

    /// Longest slice of a malformed frame echoed into the log
    pub const MAX_LOGGED_FRAME: usize = 200;
}
