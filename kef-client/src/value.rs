//! Typed value encoding used by the speaker's JSON API
//!
//! Every value the speaker returns or accepts is wrapped in an object that
//! names its own type, e.g. `{"type": "i32_", "i32_": 30}`. The helpers here
//! unwrap those objects and build them for `setData` requests.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::ClientError;

/// Pull the inner payload out of a typed value object
pub fn inner(value: &Value) -> Result<&Value, ClientError> {
    let kind = value
        .get("type")
        .and_then(Value::as_str)
        .ok_or_else(|| ClientError::Parse(format!("Missing value type in {}", value)))?;

    value
        .get(kind)
        .ok_or_else(|| ClientError::Parse(format!("Missing '{}' payload in {}", kind, value)))
}

/// Decode an integer value (`i32_` / `i64_`)
pub fn as_i64(value: &Value) -> Result<i64, ClientError> {
    inner(value)?
        .as_i64()
        .ok_or_else(|| ClientError::Parse(format!("Expected integer, got {}", value)))
}

/// Decode any string-like value (`string_`, `kefPhysicalSource`, `kefSpeakerStatus`)
pub fn as_string(value: &Value) -> Result<String, ClientError> {
    inner(value)?
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| ClientError::Parse(format!("Expected string, got {}", value)))
}

/// Decode a `bool_` value
pub fn as_bool(value: &Value) -> Result<bool, ClientError> {
    inner(value)?
        .as_bool()
        .ok_or_else(|| ClientError::Parse(format!("Expected boolean, got {}", value)))
}

pub fn i32_value(v: i32) -> Value {
    json!({ "type": "i32_", "i32_": v })
}

pub fn bool_value(v: bool) -> Value {
    json!({ "type": "bool_", "bool_": v })
}

pub fn physical_source_value(source: &str) -> Value {
    json!({ "type": "kefPhysicalSource", "kefPhysicalSource": source })
}

pub fn speaker_status_value(status: &str) -> Value {
    json!({ "type": "kefSpeakerStatus", "kefSpeakerStatus": status })
}

/// Metadata of the track the speaker is currently handling
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SongInformation {
    pub title: Option<String>,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub cover_url: Option<String>,
}

/// Decoded `player:player/data` payload
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlayerData {
    /// Raw player state ("playing", "paused", "stopped", ...)
    pub state: Option<String>,
    pub song: SongInformation,
    /// Track length in milliseconds
    pub duration_ms: Option<i64>,
}

impl PlayerData {
    /// Parse the player data object
    ///
    /// The speaker omits keys freely when nothing is playing, so every field
    /// is optional. Only a non-object payload is treated as malformed.
    pub fn from_value(value: &Value) -> Result<Self, ClientError> {
        if !value.is_object() {
            return Err(ClientError::Parse(format!(
                "Expected player data object, got {}",
                value
            )));
        }

        let text = |v: Option<&Value>| v.and_then(Value::as_str).map(str::to_string);
        let track = value.get("trackRoles");
        let meta = track
            .and_then(|t| t.get("mediaData"))
            .and_then(|m| m.get("metaData"));

        Ok(Self {
            state: text(value.get("state")),
            song: SongInformation {
                title: text(track.and_then(|t| t.get("title"))),
                artist: text(meta.and_then(|m| m.get("artist"))),
                album: text(meta.and_then(|m| m.get("album"))),
                cover_url: text(track.and_then(|t| t.get("icon"))),
            },
            duration_ms: value
                .get("status")
                .and_then(|s| s.get("duration"))
                .and_then(Value::as_i64),
        })
    }

    pub fn is_playing(&self) -> bool {
        self.state.as_deref() == Some("playing")
    }
}
