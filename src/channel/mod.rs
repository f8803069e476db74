//! Resilient message channel
//!
//! Platform-free state machine plus the seams it is driven through:
//! - `machine`: the `Channel` itself
//! - `transport`: `Transport`/`Scheduler` traits implemented by the host
//! - `backoff`: reconnect delay policy
//! - `events`: notifications and the observer interface
//! - `state`: lifecycle enums

pub mod backoff;
pub mod events;
pub mod machine;
pub mod state;
pub mod transport;

pub use backoff::Backoff;
pub use events::{ChannelEvent, ChannelObserver, CloseInfo, EventHandlers};
pub use machine::{Channel, SendOutcome};
pub use state::{Phase, ReadyState};
pub use transport::{ConnectionId, Scheduler, TimerId, Transport, TransportError, TransportEvent};
