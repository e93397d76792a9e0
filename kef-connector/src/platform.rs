//! Platform setup
//!
//! Turns a [`SpeakerConfig`] into a ready [`KefMediaPlayer`]: validates the
//! config, resolves the source catalog, migrates legacy entity ids and runs
//! the first update before the entity is handed to the host.

use std::sync::Arc;

use kef_client::KefClient;
use tracing::{debug, info, warn};

use crate::catalog::SourceCatalog;
use crate::config::SpeakerConfig;
use crate::error::Result;
use crate::facade::SpeakerConnection;
use crate::migration::{migrate_legacy_unique_ids, EntityRegistry, DOMAIN};
use crate::player::KefMediaPlayer;
use crate::session::{Session, SessionProvider};
use crate::transport::SpeakerTransport;

/// Set up a speaker reached over its HTTP API
pub async fn setup_platform(
    config: &SpeakerConfig,
    sessions: Arc<dyn SessionProvider>,
    registry: &mut dyn EntityRegistry,
) -> Result<Arc<KefMediaPlayer>> {
    let transport = Arc::new(KefClient::new(config.host.clone()));
    setup_platform_with(config, transport, sessions, None, registry).await
}

/// Set up a speaker over an arbitrary transport
///
/// Fails only on invalid configuration or a registry error. A failed first
/// update is logged; the entity is still returned and will catch up on the
/// next poll.
pub async fn setup_platform_with(
    config: &SpeakerConfig,
    transport: Arc<dyn SpeakerTransport>,
    sessions: Arc<dyn SessionProvider>,
    session: Option<Session>,
    registry: &mut dyn EntityRegistry,
) -> Result<Arc<KefMediaPlayer>> {
    config.validate()?;

    let catalog = SourceCatalog::resolve(&config.speaker_model);
    debug!(
        "Setting up {} with host: {}, name: {:?}, sources: {:?}",
        DOMAIN,
        config.host,
        config.name,
        catalog.sources()
    );

    let migrated = migrate_legacy_unique_ids(registry)?;
    if migrated > 0 {
        info!("Migrated {} legacy unique id(s)", migrated);
    }

    let connection = SpeakerConnection::new(config.host.clone(), transport, sessions, session);
    let player = KefMediaPlayer::new(connection, catalog, config);

    if let Err(err) = player.update().await {
        warn!(host = %config.host, "Initial update failed: {}", err);
    }

    Ok(player)
}
