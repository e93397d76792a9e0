//! Private HTTP client for KEF speaker communication
//!
//! This crate provides a minimal client for the JSON remote-control API
//! exposed by KEF wireless speakers (LSX II, LS50 Wireless II, LS60, ...).
//! It knows the two endpoints the speaker offers, `getData` and `setData`,
//! and the typed value encoding they use. It does not own a network session:
//! every call borrows a `reqwest::Client` so that callers decide how sessions
//! are shared and recycled.

mod error;
pub mod value;

pub use error::ClientError;
pub use value::{PlayerData, SongInformation};

use serde_json::{json, Value};
use tracing::trace;

/// Setting paths understood by the speaker
pub mod paths {
    pub const VOLUME: &str = "player:volume";
    pub const PHYSICAL_SOURCE: &str = "settings:/kef/play/physicalSource";
    pub const SPEAKER_STATUS: &str = "settings:/kef/host/speakerStatus";
    pub const PLAYER_DATA: &str = "player:player/data";
    pub const PLAY_TIME: &str = "player:player/data/playTime";
    pub const MAC_ADDRESS: &str = "settings:/system/primaryMacAddress";
    pub const DEVICE_NAME: &str = "settings:/deviceName";
    pub const MUTE: &str = "settings:/mediaPlayer/mute";
    pub const PLAYER_CONTROL: &str = "player:player/control";
}

/// Track control actions accepted on the player control path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackControl {
    /// Toggles between playing and paused
    Pause,
    Next,
    Previous,
}

impl TrackControl {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrackControl::Pause => "pause",
            TrackControl::Next => "next",
            TrackControl::Previous => "previous",
        }
    }
}

/// A minimal client for one speaker's JSON API
#[derive(Debug, Clone)]
pub struct KefClient {
    host: String,
    base_url: String,
}

impl KefClient {
    /// Create a client for the speaker at `host` (IP address or hostname)
    pub fn new(host: impl Into<String>) -> Self {
        let host = host.into();
        let base_url = format!("http://{}", host);
        Self { host, base_url }
    }

    /// Create a client against an explicit base URL, e.g. a local test server
    pub fn with_base_url(host: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    /// Read the value stored at `path`
    pub async fn get_data(&self, http: &reqwest::Client, path: &str) -> Result<Value, ClientError> {
        let url = format!("{}/api/getData", self.base_url);
        trace!(host = %self.host, path, "getData");

        let response = http
            .get(&url)
            .query(&[("path", path), ("roles", "value")])
            .send()
            .await?
            .error_for_status()?;

        let body: Value = response.json().await?;
        Self::extract_value(body, path)
    }

    /// Write `value` at `path` with the given role ("value" or "activate")
    pub async fn set_data(
        &self,
        http: &reqwest::Client,
        path: &str,
        roles: &str,
        value: Value,
    ) -> Result<(), ClientError> {
        let url = format!("{}/api/setData", self.base_url);
        trace!(host = %self.host, path, roles, %value, "setData");

        http.post(&url)
            .json(&json!({ "path": path, "roles": roles, "value": value }))
            .send()
            .await?
            .error_for_status()?;

        Ok(())
    }

    /// Send a track control action
    pub async fn track_control(
        &self,
        http: &reqwest::Client,
        control: TrackControl,
    ) -> Result<(), ClientError> {
        self.set_data(
            http,
            paths::PLAYER_CONTROL,
            "activate",
            json!({ "control": control.as_str() }),
        )
        .await
    }

    /// getData answers with a one-element array holding the value
    fn extract_value(body: Value, path: &str) -> Result<Value, ClientError> {
        match body {
            Value::Array(mut items) if !items.is_empty() => Ok(items.swap_remove(0)),
            other => Err(ClientError::Parse(format!(
                "Unexpected getData response for {}: {}",
                path, other
            ))),
        }
    }
}
