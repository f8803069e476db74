//! Typed messages exchanged with the reading server

use serde::{Deserialize, Serialize};

/// Client-to-server messages
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Begin a reading for the querent's question
    StartSession { query: String },
    /// Pick a card from the spread by its index in the deck
    SelectCard { card_index: u32 },
    /// Ask the server to stream the interpretation of the selected cards
    RequestInterpretation,
    /// Ask the server for a new shuffle sequence
    Shuffle,
    /// Keepalive
    Ping,
}

impl ClientMessage {
    /// Wire name of the variant (the `type` field)
    pub fn kind(&self) -> &'static str {
        match self {
            ClientMessage::StartSession { .. } => "start_session",
            ClientMessage::SelectCard { .. } => "select_card",
            ClientMessage::RequestInterpretation => "request_interpretation",
            ClientMessage::Shuffle => "shuffle",
            ClientMessage::Ping => "ping",
        }
    }
}

/// Server-to-client messages
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    SessionStarted {
        session_id: String,
    },
    /// Full snapshot of the table; replaces any previous snapshot
    DeckState {
        card_positions: Vec<CardPosition>,
    },
    CardSelected {
        card_id: String,
        is_reversed: bool,
    },
    /// One streamed piece of the interpretation text
    InterpretationChunk {
        text: String,
    },
    InterpretationComplete,
    ShuffleAnimation {
        sequence: Vec<ShuffleStep>,
    },
    Error {
        message: String,
    },
    /// Heartbeat reply; consumed by the channel, never surfaced
    Pong,
}

impl ServerMessage {
    /// Wire name of the variant (the `type` field)
    pub fn kind(&self) -> &'static str {
        match self {
            ServerMessage::SessionStarted { .. } => "session_started",
            ServerMessage::DeckState { .. } => "deck_state",
            ServerMessage::CardSelected { .. } => "card_selected",
            ServerMessage::InterpretationChunk { .. } => "interpretation_chunk",
            ServerMessage::InterpretationComplete => "interpretation_complete",
            ServerMessage::ShuffleAnimation { .. } => "shuffle_animation",
            ServerMessage::Error { .. } => "error",
            ServerMessage::Pong => "pong",
        }
    }
}

/// Placement of one card on the table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardPosition {
    pub card_id: String,
    pub x: f32,
    pub y: f32,
    /// Radians
    pub rotation: f32,
    pub is_face_up: bool,
    pub z_index: u32,
}

/// One leg of a shuffle animation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShuffleStep {
    pub card_id: String,
    pub from: Position,
    pub to: Position,
    pub duration_ms: u32,
}

/// 2D placement with rotation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f32,
    pub y: f32,
    pub rotation: f32,
}
