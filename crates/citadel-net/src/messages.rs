//! Wire messages between clients and the server.
//!
//! Payload layout: `[version: u8] [JSON]`. The JSON body is an adjacently
//! tagged envelope, `{"type": "...", "body": ...}`, and update records inside
//! it use the camelCase keys of [`UpdateRecord`].

use citadel_actor::{ActorId, Offset, UpdateRecord};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Current protocol version, prepended to every payload.
pub const PROTOCOL_VERSION: u8 = 1;

// ---------------------------------------------------------------------------
// Messages
// ---------------------------------------------------------------------------

/// Client → server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "body", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Join the world for a city.
    Join {
        /// Requested team.
        city: u8,
        /// Display name.
        name: String,
    },
    /// The sender's own actor state for this tick.
    Update(UpdateRecord),
    /// Respawn after death; the client has reset its sequence counter.
    EnterWorld,
    /// Leave cleanly.
    Leave,
}

/// Server → client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "body", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Join or respawn accepted.
    Welcome {
        /// Actor the connection now controls.
        actor_id: ActorId,
        /// Where it starts.
        spawn: Offset,
    },
    /// Canonical state of one actor, after validation.
    Update(UpdateRecord),
    /// An actor left the world.
    Left {
        /// Actor that left.
        actor_id: ActorId,
    },
}

// ---------------------------------------------------------------------------
// Encoding
// ---------------------------------------------------------------------------

/// Decoding failures.
#[derive(Debug, thiserror::Error)]
pub enum MessageError {
    /// Zero-length payload: no version byte.
    #[error("empty payload")]
    EmptyPayload,

    /// Version byte did not match [`PROTOCOL_VERSION`].
    #[error("unsupported protocol version: {0}")]
    UnsupportedVersion(u8),

    /// JSON body did not parse.
    #[error("malformed message body: {0}")]
    Json(#[from] serde_json::Error),
}

/// Encodes a message with its version byte.
pub fn encode<T: Serialize>(message: &T) -> Result<Vec<u8>, MessageError> {
    let mut out = vec![PROTOCOL_VERSION];
    serde_json::to_writer(&mut out, message)?;
    Ok(out)
}

/// Decodes a versioned payload.
pub fn decode<T: DeserializeOwned>(payload: &[u8]) -> Result<T, MessageError> {
    let (&version, body) = payload.split_first().ok_or(MessageError::EmptyPayload)?;
    if version != PROTOCOL_VERSION {
        return Err(MessageError::UnsupportedVersion(version));
    }
    Ok(serde_json::from_slice(body)?)
}
