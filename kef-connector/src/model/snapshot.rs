//! Immutable per-poll view of a speaker

use chrono::{DateTime, Utc};
use kef_client::SongInformation;
use serde::Serialize;

use super::PlayerState;

/// Convert a raw 0-100 volume into the 0..1 display level and mute flag
///
/// There is no separate mute telemetry: volume 0 is reported as muted.
pub fn normalize_volume(raw: u8) -> (f64, bool) {
    let level = f64::from(raw.min(100)) / 100.0;
    (level, level == 0.0)
}

/// Track progress, only present while playing
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MediaProgress {
    /// Elapsed time in whole seconds
    pub position: u64,
    /// Track length in whole seconds, when the device reports one
    pub duration: Option<u64>,
    /// Wall-clock time at which `position` was read
    pub updated_at: DateTime<Utc>,
}

/// Everything the host renders for one speaker
///
/// A snapshot is built in full by each poll and replaces the previous one as
/// a whole; nothing is patched field by field except the immediate local
/// echo of volume and mute commands.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    pub name: Option<String>,
    pub unique_id: Option<String>,
    /// None until the first successful poll
    pub state: Option<PlayerState>,
    pub volume_level: Option<f64>,
    pub is_volume_muted: Option<bool>,
    pub source: Option<String>,
    pub source_list: Vec<String>,
    pub media: SongInformation,
    pub progress: Option<MediaProgress>,
}

impl Snapshot {
    /// Snapshot shown before the first poll completes
    pub fn initial(name: Option<String>, source_list: Vec<String>) -> Self {
        Self {
            name,
            unique_id: None,
            state: None,
            volume_level: None,
            is_volume_muted: None,
            source: None,
            source_list,
            media: SongInformation::default(),
            progress: None,
        }
    }

    pub fn media_title(&self) -> Option<&str> {
        self.media.title.as_deref()
    }

    pub fn media_artist(&self) -> Option<&str> {
        self.media.artist.as_deref()
    }

    pub fn media_album_name(&self) -> Option<&str> {
        self.media.album.as_deref()
    }

    pub fn media_image_url(&self) -> Option<&str> {
        self.media.cover_url.as_deref()
    }

    pub fn media_position(&self) -> Option<u64> {
        self.progress.as_ref().map(|p| p.position)
    }

    pub fn media_duration(&self) -> Option<u64> {
        self.progress.as_ref().and_then(|p| p.duration)
    }

    pub fn media_position_updated_at(&self) -> Option<DateTime<Utc>> {
        self.progress.as_ref().map(|p| p.updated_at)
    }

    /// Copy with the volume fields replaced from a raw 0-100 value
    pub fn with_raw_volume(&self, raw: u8) -> Self {
        let (level, muted) = normalize_volume(raw);
        Self {
            volume_level: Some(level),
            is_volume_muted: Some(muted),
            ..self.clone()
        }
    }
}
