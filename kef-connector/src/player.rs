//! KEF media player entity
//!
//! [`KefMediaPlayer`] is the playback state reconciler: each [`update`]
//! reads the speaker through its [`SpeakerConnection`], derives a complete
//! [`Snapshot`] and publishes it atomically on a `watch` channel. Commands
//! are forwarded to the connection and, where the speaker needs time to
//! settle, followed by a delayed out-of-band update.
//!
//! [`update`]: KefMediaPlayer::update

use std::sync::{Arc, Weak};

use chrono::Utc;
use parking_lot::Mutex;
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::catalog::{PowerOnMethod, SourceCatalog, SourceKind, FALLBACK_SOURCE};
use crate::config::SpeakerConfig;
use crate::dispatch::{dispatch, CommandClass, PendingRefresh};
use crate::error::{ConnectorError, Result};
use crate::facade::SpeakerConnection;
use crate::model::{normalize_volume, MediaProgress, PlayerState, Snapshot, UniqueId};
use crate::transport::{Command, STANDBY};

/// Icon shown by the host for every KEF speaker
pub const ICON: &str = "mdi:speaker-wireless";

/// Capabilities advertised to the host
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Feature {
    VolumeSet,
    VolumeStep,
    VolumeMute,
    TurnOn,
    TurnOff,
    PreviousTrack,
    NextTrack,
    Pause,
    Play,
    SelectSource,
}

pub const SUPPORTED_FEATURES: &[Feature] = &[
    Feature::VolumeSet,
    Feature::VolumeStep,
    Feature::VolumeMute,
    Feature::TurnOn,
    Feature::TurnOff,
    Feature::PreviousTrack,
    Feature::NextTrack,
    Feature::Pause,
    Feature::Play,
    Feature::SelectSource,
];

/// Values that survive from one poll to the next
#[derive(Debug, Default)]
struct Memory {
    /// Last in-catalog source seen, resumed on power-on
    last_source: Option<String>,
    /// Title seen by the previous poll, separates PAUSED from IDLE
    last_title: Option<String>,
}

/// Media player entity for one speaker
pub struct KefMediaPlayer {
    connection: SpeakerConnection,
    catalog: SourceCatalog,
    max_volume: f64,
    volume_step: f64,
    memory: Mutex<Memory>,
    snapshot: watch::Sender<Arc<Snapshot>>,
}

impl KefMediaPlayer {
    pub fn new(
        connection: SpeakerConnection,
        catalog: SourceCatalog,
        config: &SpeakerConfig,
    ) -> Arc<Self> {
        let initial = Snapshot::initial(config.name.clone(), catalog.source_list());
        let (snapshot, _) = watch::channel(Arc::new(initial));

        Arc::new(Self {
            connection,
            catalog,
            max_volume: config.maximum_volume,
            volume_step: config.volume_step,
            memory: Mutex::new(Memory::default()),
            snapshot,
        })
    }

    /// Latest published snapshot
    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.snapshot.borrow().clone()
    }

    /// Receiver notified each time a new snapshot is published
    pub fn subscribe(&self) -> watch::Receiver<Arc<Snapshot>> {
        self.snapshot.subscribe()
    }

    pub fn catalog(&self) -> &SourceCatalog {
        &self.catalog
    }

    pub fn connection(&self) -> &SpeakerConnection {
        &self.connection
    }

    pub fn icon(&self) -> &'static str {
        ICON
    }

    pub fn supported_features(&self) -> &'static [Feature] {
        SUPPORTED_FEATURES
    }

    /// Source power-on will select: the last real source, else wifi
    pub fn resume_source(&self) -> String {
        self.memory
            .lock()
            .last_source
            .clone()
            .unwrap_or_else(|| FALLBACK_SOURCE.to_string())
    }

    /// Poll the speaker and publish a fresh snapshot
    ///
    /// On error nothing is published and the memory is left untouched, so
    /// the host keeps showing the previous snapshot.
    pub async fn update(&self) -> Result<Arc<Snapshot>> {
        let previous = self.snapshot();
        let conn = &self.connection;

        let name = match previous.name.clone() {
            Some(name) => name,
            None => conn.speaker_name().await?,
        };
        let unique_id = match previous.unique_id.clone() {
            Some(id) => Some(id),
            None => unique_id_for(&conn.mac_address().await?).map(UniqueId::into_string),
        };

        let raw_volume = conn.volume().await?;
        let (volume_level, muted) = normalize_volume(raw_volume);

        let status = conn.status().await?;
        let source = conn.source().await?;
        let standby = status == STANDBY;
        let kind = self.catalog.kind_of(&source);

        let is_playing = if !standby && kind == SourceKind::MediaCapable {
            conn.is_playing().await?
        } else {
            false
        };

        let has_known_title = self.memory.lock().last_title.is_some();
        let state = PlayerState::derive(standby, kind, is_playing, has_known_title);

        let media = conn.song_information().await?;

        let progress = if state == PlayerState::Playing {
            let duration = conn.song_length().await?;
            let position = conn.song_position().await?;
            Some(MediaProgress {
                position: position.unwrap_or(0) / 1000,
                duration: duration.map(|ms| ms / 1000),
                updated_at: Utc::now(),
            })
        } else {
            None
        };

        {
            let mut memory = self.memory.lock();
            if self.catalog.contains(&source) {
                memory.last_source = Some(source.clone());
            }
            memory.last_title = media.title.clone();
        }

        debug!(
            host = %conn.host(),
            %state,
            source = %source,
            volume = raw_volume,
            "Polled speaker"
        );

        let snapshot = Arc::new(Snapshot {
            name: Some(name),
            unique_id,
            state: Some(state),
            volume_level: Some(volume_level),
            is_volume_muted: Some(muted),
            source: Some(source),
            source_list: self.catalog.source_list(),
            media,
            progress,
        });

        self.snapshot.send_replace(Arc::clone(&snapshot));
        Ok(snapshot)
    }

    // Commands followed by a delayed refresh

    /// Wake the speaker
    ///
    /// Models without a power-on action are woken by selecting the last real
    /// source, since the speaker forgets it across a shutdown.
    pub async fn turn_on(self: &Arc<Self>) -> Result<PendingRefresh> {
        let command = match self.catalog.power_on() {
            PowerOnMethod::SourceSelect => Command::SetSource(self.resume_source()),
            PowerOnMethod::Explicit => Command::PowerOn,
        };
        self.run(CommandClass::Power, command).await
    }

    pub async fn turn_off(self: &Arc<Self>) -> Result<PendingRefresh> {
        self.run(CommandClass::Power, Command::Shutdown).await
    }

    pub async fn select_source(self: &Arc<Self>, source: &str) -> Result<PendingRefresh> {
        self.run(CommandClass::SourceSelect, Command::SetSource(source.to_string()))
            .await
    }

    // The speaker only offers a toggle, so play and pause both send it
    pub async fn media_play(self: &Arc<Self>) -> Result<PendingRefresh> {
        self.run(CommandClass::PlayPause, Command::TogglePlayPause).await
    }

    pub async fn media_pause(self: &Arc<Self>) -> Result<PendingRefresh> {
        self.run(CommandClass::PlayPause, Command::TogglePlayPause).await
    }

    pub async fn media_play_pause(self: &Arc<Self>) -> Result<PendingRefresh> {
        self.run(CommandClass::PlayPause, Command::TogglePlayPause).await
    }

    pub async fn media_next_track(self: &Arc<Self>) -> Result<PendingRefresh> {
        self.run(CommandClass::TrackSkip, Command::NextTrack).await
    }

    pub async fn media_previous_track(self: &Arc<Self>) -> Result<PendingRefresh> {
        self.run(CommandClass::TrackSkip, Command::PreviousTrack).await
    }

    async fn run(self: &Arc<Self>, class: CommandClass, command: Command) -> Result<PendingRefresh> {
        let player = Arc::downgrade(self);
        dispatch(
            class.settle_delay(),
            self.connection.send_command(command),
            move || refresh(player),
        )
        .await
    }

    // Volume and mute commands, without a delayed refresh

    /// Set the volume level (0..1), capped at the configured maximum
    ///
    /// A non-finite level is rejected and nothing is sent.
    pub async fn set_volume_level(&self, level: f64) -> Result<()> {
        if !level.is_finite() {
            return Err(ConnectorError::Configuration(format!(
                "volume level must be a finite number, got {}",
                level
            )));
        }

        let level = level.clamp(0.0, self.max_volume);
        let raw = (level * 100.0) as u8;
        self.connection.set_volume(raw).await?;
        self.echo(|s| s.with_raw_volume(raw));
        Ok(())
    }

    pub async fn volume_up(&self) -> Result<()> {
        self.step_volume(1.0).await
    }

    pub async fn volume_down(&self) -> Result<()> {
        self.step_volume(-1.0).await
    }

    /// Write the device mute setting
    ///
    /// The displayed mute flag stays derived from the volume, so nothing is
    /// echoed; the next poll shows whatever the speaker reports.
    pub async fn mute_volume(&self, mute: bool) -> Result<()> {
        if mute {
            self.connection.mute().await
        } else {
            self.connection.unmute().await
        }
    }

    async fn step_volume(&self, direction: f64) -> Result<()> {
        let current = f64::from(self.connection.volume().await?);
        let ceiling = (self.max_volume * 100.0).round();
        let target = (current + direction * self.volume_step * 100.0)
            .round()
            .clamp(0.0, ceiling) as u8;

        self.connection.set_volume(target).await?;
        self.echo(|s| s.with_raw_volume(target));
        Ok(())
    }

    fn echo(&self, apply: impl FnOnce(&Snapshot) -> Snapshot) {
        self.snapshot.send_modify(|current| {
            let next = apply(current.as_ref());
            *current = Arc::new(next);
        });
    }
}

impl std::fmt::Debug for KefMediaPlayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KefMediaPlayer")
            .field("connection", &self.connection)
            .field("model", &self.catalog.model())
            .finish()
    }
}

/// Unique id for a device-reported MAC
///
/// An address that is not 48 bits long still yields an id from its raw
/// characters, so identity never blocks state updates. `None` leaves the id
/// unset and it is read again on the next poll.
fn unique_id_for(mac: &str) -> Option<UniqueId> {
    if let Some(id) = UniqueId::from_mac(mac) {
        return Some(id);
    }

    let fallback = UniqueId::from_raw_mac(mac);
    warn!(
        "Speaker reported malformed MAC address {:?}; using unique id {:?}",
        mac,
        fallback.as_ref().map(UniqueId::as_str)
    );
    fallback
}

/// Out-of-band update after a settle delay
///
/// Holds only a weak reference: if the entity was removed in the meantime
/// the refresh is dropped.
async fn refresh(player: Weak<KefMediaPlayer>) {
    let Some(player) = player.upgrade() else {
        debug!("Player removed before delayed refresh; skipping");
        return;
    };

    if let Err(err) = player.update().await {
        warn!(host = %player.connection.host(), "Delayed refresh failed: {}", err);
    }
}
