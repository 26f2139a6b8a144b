//! WebSocket frame DTOs.
//!
//! Every frame is a UTF-8 JSON text frame. Client frames use the envelope
//! `{"Type": <kind>, "Message": {...}}`; the `Message` object is open-ended
//! and handlers only extract the fields they need.

use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::{Map, Value};

use crate::domain::{RoomId, ShapeId, UserId};

/// Message kinds carried in the `Type` field
///
/// Serialized in snake_case; the PascalCase spelling is accepted on input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    #[serde(alias = "Join")]
    Join,
    #[serde(alias = "UserLeft")]
    UserLeft,
    #[serde(alias = "Chat")]
    Chat,
    #[serde(alias = "Draw")]
    Draw,
    #[serde(alias = "PencilChunk")]
    PencilChunk,
    #[serde(alias = "Undo")]
    Undo,
    #[serde(alias = "Erase")]
    Erase,
    #[serde(alias = "CursorMove")]
    CursorMove,
    #[serde(alias = "InitialState")]
    InitialState,
    #[serde(alias = "Error")]
    Error,
    #[serde(alias = "Ping")]
    Ping,
    #[serde(alias = "Pong")]
    Pong,
    /// Any kind this server does not know about
    #[serde(other)]
    Unknown,
}

impl MessageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageKind::Join => "join",
            MessageKind::UserLeft => "user_left",
            MessageKind::Chat => "chat",
            MessageKind::Draw => "draw",
            MessageKind::PencilChunk => "pencil_chunk",
            MessageKind::Undo => "undo",
            MessageKind::Erase => "erase",
            MessageKind::CursorMove => "cursor_move",
            MessageKind::InitialState => "initial_state",
            MessageKind::Error => "error",
            MessageKind::Ping => "ping",
            MessageKind::Pong => "pong",
            MessageKind::Unknown => "unknown",
        }
    }
}

#[derive(Deserialize)]
struct RawInboundFrame {
    #[serde(rename = "Type")]
    kind: MessageKind,
    #[serde(rename = "Message", default)]
    message: Option<Map<String, Value>>,
}

/// Client → server envelope
#[derive(Debug, Clone, PartialEq)]
pub struct InboundFrame {
    pub kind: MessageKind,
    /// Always a JSON object; an absent `Message` becomes `{}`
    pub body: Value,
}

impl InboundFrame {
    /// Parse the outer envelope. Fails when `Type` is missing or `Message`
    /// is present but not an object.
    pub fn parse(text: &str) -> Result<Self, serde_json::Error> {
        let raw: RawInboundFrame = serde_json::from_str(text)?;
        Ok(Self {
            kind: raw.kind,
            body: Value::Object(raw.message.unwrap_or_default()),
        })
    }

    /// Extract a kind-specific body schema; unknown extra fields are ignored
    pub fn parse_body<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        T::deserialize(&self.body)
    }
}

/// Body of `join` and client-sent `user_left`
#[derive(Debug, Clone, Deserialize)]
pub struct RoomRefBody {
    #[serde(rename = "roomID")]
    pub room_id: RoomId,
}

/// Body of `undo` and `erase`
#[derive(Debug, Clone, Deserialize)]
pub struct ShapeRefBody {
    #[serde(rename = "shapeID")]
    pub shape_id: ShapeId,
}

/// The part of a `draw` body the server reads; the rest stays opaque
#[derive(Debug, Clone, Deserialize)]
pub struct DrawBody {
    pub id: ShapeId,
}

/// `sender` object of a broadcast frame
#[derive(Debug, Clone, Serialize)]
pub struct SenderInfo<'a> {
    pub id: UserId,
    pub name: &'a str,
}

/// Server-originated broadcast frame
#[derive(Debug, Clone, Serialize)]
pub struct BroadcastFrame<'a> {
    #[serde(rename = "Type")]
    pub kind: MessageKind,
    pub sender: SenderInfo<'a>,
    pub content: &'a Value,
    /// Wall clock seconds at fan-out
    pub timestamp: i64,
}

/// The joining principal as shipped in `initial_state`
#[derive(Debug, Clone, Serialize)]
pub struct JoiningUser<'a> {
    #[serde(rename = "userID")]
    pub user_id: UserId,
    pub name: &'a str,
}

#[derive(Debug, Clone, Serialize)]
pub struct InitialStateContent<'a> {
    pub shapes: Vec<&'a Value>,
    pub user: JoiningUser<'a>,
}

/// Full ordered canvas sent only to the joining session
#[derive(Debug, Clone, Serialize)]
pub struct InitialStateFrame<'a> {
    #[serde(rename = "Type")]
    pub kind: MessageKind,
    pub content: InitialStateContent<'a>,
}

/// `{"type":"pong"}`
#[derive(Debug, Clone, Serialize)]
pub struct PongFrame {
    #[serde(rename = "type")]
    pub kind: MessageKind,
}

impl Default for PongFrame {
    fn default() -> Self {
        Self {
            kind: MessageKind::Pong,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorContent<'a> {
    pub error: &'a str,
}

/// `{"Type":"error","content":{"error":"..."}}`
#[derive(Debug, Clone, Serialize)]
pub struct ErrorFrame<'a> {
    #[serde(rename = "Type")]
    pub kind: MessageKind,
    pub content: ErrorContent<'a>,
}

impl<'a> ErrorFrame<'a> {
    pub fn new(error: &'a str) -> Self {
        Self {
            kind: MessageKind::Error,
            content: ErrorContent { error },
        }
    }
}
