//! Wire protocol
//!
//! One JSON object per frame, discriminated by its `type` field.

pub mod codec;
pub mod messages;

pub use codec::{CodecError, decode, encode};
pub use messages::{CardPosition, ClientMessage, Position, ServerMessage, ShuffleStep};
