//! Derived playback state

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::catalog::SourceKind;

/// UI-facing state of the media player
///
/// Always derived from a fresh poll; commands never set it directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlayerState {
    /// Speaker is in standby
    Off,
    /// Media-capable source, nothing playing and no known track
    Idle,
    /// Media-capable source, not playing, a track is known
    Paused,
    /// Media-capable source, playing
    Playing,
    /// Awake on a passthrough source
    On,
}

impl PlayerState {
    /// Derive the state from one poll's readings
    ///
    /// The device cannot tell "paused" from "stopped with no track", so a
    /// known title from the previous poll is what separates PAUSED from IDLE.
    /// `is_playing` is ignored unless the source is media-capable.
    pub fn derive(
        standby: bool,
        source_kind: SourceKind,
        is_playing: bool,
        has_known_title: bool,
    ) -> Self {
        if standby {
            return PlayerState::Off;
        }

        match source_kind {
            SourceKind::Passthrough => PlayerState::On,
            SourceKind::MediaCapable if is_playing => PlayerState::Playing,
            SourceKind::MediaCapable if has_known_title => PlayerState::Paused,
            SourceKind::MediaCapable => PlayerState::Idle,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PlayerState::Off => "off",
            PlayerState::Idle => "idle",
            PlayerState::Paused => "paused",
            PlayerState::Playing => "playing",
            PlayerState::On => "on",
        }
    }
}

impl fmt::Display for PlayerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
