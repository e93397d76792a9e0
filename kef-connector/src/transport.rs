//! Device transport capability
//!
//! The speaker's wire protocol is hidden behind [`SpeakerTransport`]: the
//! facade only asks for named attributes and sends named commands. The HTTP
//! implementation backed by [`KefClient`] lives here too.

use std::fmt;

use async_trait::async_trait;
use kef_client::{paths, value, ClientError, KefClient, PlayerData, SongInformation, TrackControl};

use crate::session::Session;

/// Device attributes readable through the transport
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Attribute {
    Volume,
    Source,
    Status,
    IsPlaying,
    SongInformation,
    SongLength,
    SongPosition,
    MacAddress,
    SpeakerName,
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Attribute::Volume => "volume",
            Attribute::Source => "source",
            Attribute::Status => "status",
            Attribute::IsPlaying => "is_playing",
            Attribute::SongInformation => "song_information",
            Attribute::SongLength => "song_length",
            Attribute::SongPosition => "song_position",
            Attribute::MacAddress => "mac_address",
            Attribute::SpeakerName => "speaker_name",
        };
        f.write_str(name)
    }
}

/// Raw attribute value as reported by the device
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttributeValue {
    Integer(i64),
    Text(String),
    Flag(bool),
    Song(SongInformation),
    /// The device did not report this attribute
    Unset,
}

/// Control actions understood by the device
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Raw volume, 0-100
    SetVolume(u8),
    SetSource(String),
    Mute,
    Unmute,
    PowerOn,
    Shutdown,
    TogglePlayPause,
    NextTrack,
    PreviousTrack,
}

/// Source the speaker reports (and accepts) while in standby
pub const STANDBY: &str = "standby";

/// Speaker status written to wake models with an explicit power-on action
pub const POWER_ON_STATUS: &str = "powerOn";

/// Black-box access to one speaker
#[async_trait]
pub trait SpeakerTransport: Send + Sync {
    async fn get_attribute(
        &self,
        session: &Session,
        attribute: Attribute,
    ) -> Result<AttributeValue, ClientError>;

    async fn send_command(&self, session: &Session, command: Command) -> Result<(), ClientError>;
}

#[async_trait]
impl SpeakerTransport for KefClient {
    async fn get_attribute(
        &self,
        session: &Session,
        attribute: Attribute,
    ) -> Result<AttributeValue, ClientError> {
        let http = session.http();

        let value = match attribute {
            Attribute::Volume => {
                AttributeValue::Integer(value::as_i64(&self.get_data(http, paths::VOLUME).await?)?)
            }
            Attribute::Source => {
                AttributeValue::Text(value::as_string(&self.get_data(http, paths::PHYSICAL_SOURCE).await?)?)
            }
            Attribute::Status => {
                AttributeValue::Text(value::as_string(&self.get_data(http, paths::SPEAKER_STATUS).await?)?)
            }
            Attribute::IsPlaying => {
                let data = PlayerData::from_value(&self.get_data(http, paths::PLAYER_DATA).await?)?;
                AttributeValue::Flag(data.is_playing())
            }
            Attribute::SongInformation => {
                let data = PlayerData::from_value(&self.get_data(http, paths::PLAYER_DATA).await?)?;
                AttributeValue::Song(data.song)
            }
            Attribute::SongLength => {
                let data = PlayerData::from_value(&self.get_data(http, paths::PLAYER_DATA).await?)?;
                data.duration_ms
                    .map(AttributeValue::Integer)
                    .unwrap_or(AttributeValue::Unset)
            }
            Attribute::SongPosition => {
                AttributeValue::Integer(value::as_i64(&self.get_data(http, paths::PLAY_TIME).await?)?)
            }
            Attribute::MacAddress => {
                AttributeValue::Text(value::as_string(&self.get_data(http, paths::MAC_ADDRESS).await?)?)
            }
            Attribute::SpeakerName => {
                AttributeValue::Text(value::as_string(&self.get_data(http, paths::DEVICE_NAME).await?)?)
            }
        };

        Ok(value)
    }

    async fn send_command(&self, session: &Session, command: Command) -> Result<(), ClientError> {
        let http = session.http();

        match command {
            Command::SetVolume(volume) => {
                self.set_data(http, paths::VOLUME, "value", value::i32_value(i32::from(volume)))
                    .await
            }
            Command::SetSource(source) => {
                self.set_data(
                    http,
                    paths::PHYSICAL_SOURCE,
                    "value",
                    value::physical_source_value(&source),
                )
                .await
            }
            Command::Mute => self.set_data(http, paths::MUTE, "value", value::bool_value(true)).await,
            Command::Unmute => {
                self.set_data(http, paths::MUTE, "value", value::bool_value(false))
                    .await
            }
            Command::PowerOn => {
                self.set_data(
                    http,
                    paths::SPEAKER_STATUS,
                    "value",
                    value::speaker_status_value(POWER_ON_STATUS),
                )
                .await
            }
            Command::Shutdown => {
                self.set_data(
                    http,
                    paths::PHYSICAL_SOURCE,
                    "value",
                    value::physical_source_value(STANDBY),
                )
                .await
            }
            Command::TogglePlayPause => self.track_control(http, TrackControl::Pause).await,
            Command::NextTrack => self.track_control(http, TrackControl::Next).await,
            Command::PreviousTrack => self.track_control(http, TrackControl::Previous).await,
        }
    }
}
