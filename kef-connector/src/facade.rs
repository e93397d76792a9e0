//! Device facade
//!
//! [`SpeakerConnection`] owns the session bookkeeping for one speaker and
//! exposes its attributes and commands as typed async calls. It never retries
//! and never caches attribute values; every read goes to the device.

use std::sync::Arc;

use kef_client::{KefClient, SongInformation};
use parking_lot::Mutex;
use tracing::debug;

use crate::error::{ConnectorError, Result};
use crate::session::{Session, SessionProvider};
use crate::transport::{Attribute, AttributeValue, Command, SpeakerTransport};

/// Connection to a single speaker
pub struct SpeakerConnection {
    host: String,
    transport: Arc<dyn SpeakerTransport>,
    sessions: Arc<dyn SessionProvider>,
    session: Mutex<Option<Session>>,
}

impl SpeakerConnection {
    /// Create a connection over an arbitrary transport
    ///
    /// `session` may be a session already shared with the host; when absent
    /// (or once it is closed) one is acquired from `sessions` on first use.
    pub fn new(
        host: impl Into<String>,
        transport: Arc<dyn SpeakerTransport>,
        sessions: Arc<dyn SessionProvider>,
        session: Option<Session>,
    ) -> Self {
        Self {
            host: host.into(),
            transport,
            sessions,
            session: Mutex::new(session),
        }
    }

    /// Create a connection speaking the speaker's HTTP API
    pub fn http(host: impl Into<String>, sessions: Arc<dyn SessionProvider>) -> Self {
        let host = host.into();
        let transport = Arc::new(KefClient::new(host.clone()));
        Self::new(host, transport, sessions, None)
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    /// Return the cached session, acquiring a new one if missing or closed
    pub fn session(&self) -> Result<Session> {
        let mut slot = self.session.lock();
        if let Some(session) = slot.as_ref().filter(|s| !s.is_closed()) {
            return Ok(session.clone());
        }

        debug!(host = %self.host, "Acquiring speaker session");
        let session = self.sessions.acquire()?;
        *slot = Some(session.clone());
        Ok(session)
    }

    pub async fn get_attribute(&self, attribute: Attribute) -> Result<AttributeValue> {
        let session = self.session()?;
        Ok(self.transport.get_attribute(&session, attribute).await?)
    }

    pub async fn send_command(&self, command: Command) -> Result<()> {
        let session = self.session()?;
        debug!(host = %self.host, ?command, "Sending command");
        Ok(self.transport.send_command(&session, command).await?)
    }

    // Typed attribute accessors

    /// Raw volume, 0-100
    pub async fn volume(&self) -> Result<u8> {
        let raw = self.integer(Attribute::Volume).await?;
        u8::try_from(raw)
            .ok()
            .filter(|v| *v <= 100)
            .ok_or_else(|| ConnectorError::malformed(format!("volume out of range: {}", raw)))
    }

    pub async fn source(&self) -> Result<String> {
        self.text(Attribute::Source).await
    }

    pub async fn status(&self) -> Result<String> {
        self.text(Attribute::Status).await
    }

    pub async fn is_playing(&self) -> Result<bool> {
        match self.get_attribute(Attribute::IsPlaying).await? {
            AttributeValue::Flag(playing) => Ok(playing),
            other => Err(unexpected(Attribute::IsPlaying, &other)),
        }
    }

    pub async fn song_information(&self) -> Result<SongInformation> {
        match self.get_attribute(Attribute::SongInformation).await? {
            AttributeValue::Song(song) => Ok(song),
            AttributeValue::Unset => Ok(SongInformation::default()),
            other => Err(unexpected(Attribute::SongInformation, &other)),
        }
    }

    /// Track length in milliseconds, if the device knows it
    pub async fn song_length(&self) -> Result<Option<u64>> {
        self.milliseconds(Attribute::SongLength).await
    }

    /// Elapsed track time in milliseconds
    pub async fn song_position(&self) -> Result<Option<u64>> {
        self.milliseconds(Attribute::SongPosition).await
    }

    pub async fn mac_address(&self) -> Result<String> {
        self.text(Attribute::MacAddress).await
    }

    pub async fn speaker_name(&self) -> Result<String> {
        self.text(Attribute::SpeakerName).await
    }

    // Commands

    pub async fn set_volume(&self, volume: u8) -> Result<()> {
        self.send_command(Command::SetVolume(volume.min(100))).await
    }

    pub async fn set_source(&self, source: &str) -> Result<()> {
        self.send_command(Command::SetSource(source.to_string())).await
    }

    pub async fn mute(&self) -> Result<()> {
        self.send_command(Command::Mute).await
    }

    pub async fn unmute(&self) -> Result<()> {
        self.send_command(Command::Unmute).await
    }

    pub async fn power_on(&self) -> Result<()> {
        self.send_command(Command::PowerOn).await
    }

    pub async fn shutdown(&self) -> Result<()> {
        self.send_command(Command::Shutdown).await
    }

    pub async fn toggle_play_pause(&self) -> Result<()> {
        self.send_command(Command::TogglePlayPause).await
    }

    pub async fn next_track(&self) -> Result<()> {
        self.send_command(Command::NextTrack).await
    }

    pub async fn previous_track(&self) -> Result<()> {
        self.send_command(Command::PreviousTrack).await
    }

    async fn integer(&self, attribute: Attribute) -> Result<i64> {
        match self.get_attribute(attribute).await? {
            AttributeValue::Integer(v) => Ok(v),
            other => Err(unexpected(attribute, &other)),
        }
    }

    async fn text(&self, attribute: Attribute) -> Result<String> {
        match self.get_attribute(attribute).await? {
            AttributeValue::Text(v) => Ok(v),
            other => Err(unexpected(attribute, &other)),
        }
    }

    async fn milliseconds(&self, attribute: Attribute) -> Result<Option<u64>> {
        match self.get_attribute(attribute).await? {
            AttributeValue::Integer(ms) => Ok(Some(u64::try_from(ms).unwrap_or(0))),
            AttributeValue::Unset => Ok(None),
            other => Err(unexpected(attribute, &other)),
        }
    }
}

impl std::fmt::Debug for SpeakerConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpeakerConnection")
            .field("host", &self.host)
            .field("has_session", &self.session.lock().is_some())
            .finish()
    }
}

fn unexpected(attribute: Attribute, value: &AttributeValue) -> ConnectorError {
    ConnectorError::malformed(format!("unexpected {} value: {:?}", attribute, value))
}
