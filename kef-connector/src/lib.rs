//! KEF Connector
//!
//! Exposes a KEF wireless speaker as a polled media-player entity.
//!
//! # Architecture
//!
//! ```text
//! host poll ─→ KefMediaPlayer::update ─→ SpeakerConnection ─→ SpeakerTransport ─→ speaker
//!                     │
//!                     └─→ Snapshot (watch channel) ─→ host renders
//!
//! host command ─→ KefMediaPlayer ─→ SpeakerConnection ─→ settle delay ─→ update
//! ```
//!
//! Each poll reads a handful of raw attributes (status, source, playback
//! flag, volume, track metadata) and derives one [`PlayerState`] plus the
//! metadata fields, published as an immutable [`Snapshot`].
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use kef_connector::{setup_platform, InMemoryRegistry, PollerConfig, PollingTask,
//!     SharedSessionPool, SpeakerConfig};
//!
//! let config = SpeakerConfig::new("192.168.1.20").with_model("LS50W2");
//! let mut registry = InMemoryRegistry::new();
//! let player = setup_platform(&config, Arc::new(SharedSessionPool::new()), &mut registry).await?;
//!
//! let _poller = PollingTask::start(&player, &PollerConfig::default());
//! player.select_source("optical").await?.settled().await;
//! println!("{:?}", player.snapshot().state);
//! ```

pub mod catalog;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod facade;
pub mod logging;
pub mod migration;
pub mod model;
pub mod platform;
pub mod player;
pub mod poller;
pub mod session;
pub mod transport;

pub use catalog::{PowerOnMethod, SourceCatalog, SourceKind};
pub use config::{PollerConfig, SpeakerConfig};
pub use dispatch::{dispatch, CommandClass, PendingRefresh};
pub use error::{CatalogError, ConnectorError, Result};
pub use facade::SpeakerConnection;
pub use migration::{migrate_legacy_unique_ids, EntityRegistry, InMemoryRegistry, RegistryEntry};
pub use model::{MediaProgress, PlayerState, Snapshot, UniqueId};
pub use platform::{setup_platform, setup_platform_with};
pub use player::{Feature, KefMediaPlayer};
pub use poller::PollingTask;
pub use session::{Session, SessionProvider, SharedSessionPool};
pub use transport::{Attribute, AttributeValue, Command, SpeakerTransport};

// Re-export the client types surfaced through the public API
pub use kef_client::{ClientError, SongInformation};
