//! Scripted fake speaker for integration tests
//!
//! `FakeSpeaker` keeps a small device state, applies commands to it the way
//! the real speaker does, and records every read and command it receives.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use kef_connector::{
    Attribute, AttributeValue, ClientError, Command, InMemoryRegistry, KefMediaPlayer, Session,
    SessionProvider, SongInformation, SpeakerConfig, SpeakerTransport,
};
use parking_lot::Mutex;

#[derive(Debug, Clone)]
pub struct DeviceState {
    pub volume: i64,
    pub status: String,
    pub source: String,
    pub playing: bool,
    pub song: SongInformation,
    pub length_ms: Option<i64>,
    pub position_ms: i64,
    pub mac: String,
    pub name: String,
}

impl Default for DeviceState {
    fn default() -> Self {
        Self {
            volume: 30,
            status: "powerOn".to_string(),
            source: "wifi".to_string(),
            playing: false,
            song: SongInformation::default(),
            length_ms: None,
            position_ms: 0,
            mac: "AA:BB:CC:DD:EE:FF".to_string(),
            name: "Living Room KEF".to_string(),
        }
    }
}

#[derive(Debug, Default)]
pub struct FakeSpeaker {
    pub state: Mutex<DeviceState>,
    reads: Mutex<Vec<Attribute>>,
    commands: Mutex<Vec<Command>>,
    offline: AtomicBool,
}

impl FakeSpeaker {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set(&self, apply: impl FnOnce(&mut DeviceState)) {
        apply(&mut self.state.lock());
    }

    pub fn play(&self, title: &str) {
        self.set(|s| {
            s.playing = true;
            s.song = song(title);
            s.length_ms = Some(215_000);
            s.position_ms = 42_500;
        });
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub fn reads(&self) -> usize {
        self.reads.lock().len()
    }

    pub fn read_log(&self) -> Vec<Attribute> {
        self.reads.lock().clone()
    }

    pub fn commands(&self) -> Vec<Command> {
        self.commands.lock().clone()
    }

    fn check_online(&self) -> Result<(), ClientError> {
        if self.offline.load(Ordering::SeqCst) {
            Err(ClientError::Network("connection refused".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl SpeakerTransport for FakeSpeaker {
    async fn get_attribute(
        &self,
        _session: &Session,
        attribute: Attribute,
    ) -> Result<AttributeValue, ClientError> {
        self.check_online()?;
        self.reads.lock().push(attribute);

        let state = self.state.lock();
        let value = match attribute {
            Attribute::Volume => AttributeValue::Integer(state.volume),
            Attribute::Source => AttributeValue::Text(state.source.clone()),
            Attribute::Status => AttributeValue::Text(state.status.clone()),
            Attribute::IsPlaying => AttributeValue::Flag(state.playing),
            Attribute::SongInformation => AttributeValue::Song(state.song.clone()),
            Attribute::SongLength => state
                .length_ms
                .map(AttributeValue::Integer)
                .unwrap_or(AttributeValue::Unset),
            Attribute::SongPosition => AttributeValue::Integer(state.position_ms),
            Attribute::MacAddress => AttributeValue::Text(state.mac.clone()),
            Attribute::SpeakerName => AttributeValue::Text(state.name.clone()),
        };
        Ok(value)
    }

    async fn send_command(&self, _session: &Session, command: Command) -> Result<(), ClientError> {
        self.check_online()?;
        self.commands.lock().push(command.clone());

        let mut state = self.state.lock();
        match command {
            Command::SetVolume(v) => state.volume = i64::from(v),
            Command::SetSource(source) => {
                state.status = if source == "standby" { "standby" } else { "powerOn" }.to_string();
                state.source = source;
            }
            Command::Shutdown => {
                state.status = "standby".to_string();
                state.source = "standby".to_string();
                state.playing = false;
            }
            Command::PowerOn => state.status = "powerOn".to_string(),
            Command::TogglePlayPause => state.playing = !state.playing,
            Command::Mute | Command::Unmute | Command::NextTrack | Command::PreviousTrack => {}
        }
        Ok(())
    }
}

pub struct TestSessions;

impl SessionProvider for TestSessions {
    fn acquire(&self) -> Result<Session, ClientError> {
        Ok(Session::new(reqwest::Client::new()))
    }
}

pub fn song(title: &str) -> SongInformation {
    SongInformation {
        title: Some(title.to_string()),
        artist: Some("Artist".to_string()),
        album: Some("Album".to_string()),
        cover_url: Some("http://covers/a.jpg".to_string()),
    }
}

/// Build a player over `speaker` without running the first update
pub fn player_with(speaker: &Arc<FakeSpeaker>, config: &SpeakerConfig) -> Arc<KefMediaPlayer> {
    use kef_connector::{SourceCatalog, SpeakerConnection};

    let connection = SpeakerConnection::new(
        config.host.clone(),
        speaker.clone(),
        Arc::new(TestSessions),
        None,
    );
    KefMediaPlayer::new(connection, SourceCatalog::resolve(&config.speaker_model), config)
}

pub fn player(speaker: &Arc<FakeSpeaker>) -> Arc<KefMediaPlayer> {
    player_with(speaker, &SpeakerConfig::new("192.168.1.20"))
}

pub fn empty_registry() -> InMemoryRegistry {
    InMemoryRegistry::new()
}
