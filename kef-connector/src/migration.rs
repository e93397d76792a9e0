//! One-time unique id migration
//!
//! Early releases keyed entities as `KEFLS50W2_<mac>`. Those entries are
//! re-keyed to `KEF_SPEAKER_<formatted mac>` at setup. Entries that already
//! use the new scheme are left alone, so running the migration again is a
//! no-op.

use tracing::warn;

use crate::error::{ConnectorError, Result};
use crate::model::UniqueId;

/// Platform name entities are registered under
pub const DOMAIN: &str = "kef_connector";

/// Prefix of unique ids written by early releases
pub const LEGACY_UNIQUE_ID_PREFIX: &str = "KEFLS50W2_";

/// One entity as seen in the host's registry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryEntry {
    pub entity_id: String,
    pub platform: String,
    pub unique_id: String,
}

/// The host's entity registry
pub trait EntityRegistry {
    fn entries(&self) -> Vec<RegistryEntry>;

    fn update_unique_id(&mut self, entity_id: &str, unique_id: String) -> Result<()>;
}

/// Registry kept in memory, for hosts without their own store
#[derive(Debug, Default, Clone)]
pub struct InMemoryRegistry {
    entries: Vec<RegistryEntry>,
}

impl InMemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        &mut self,
        entity_id: impl Into<String>,
        platform: impl Into<String>,
        unique_id: impl Into<String>,
    ) {
        self.entries.push(RegistryEntry {
            entity_id: entity_id.into(),
            platform: platform.into(),
            unique_id: unique_id.into(),
        });
    }

    pub fn get(&self, entity_id: &str) -> Option<&RegistryEntry> {
        self.entries.iter().find(|e| e.entity_id == entity_id)
    }
}

impl EntityRegistry for InMemoryRegistry {
    fn entries(&self) -> Vec<RegistryEntry> {
        self.entries.clone()
    }

    fn update_unique_id(&mut self, entity_id: &str, unique_id: String) -> Result<()> {
        if self.entries.iter().any(|e| e.unique_id == unique_id && e.entity_id != entity_id) {
            return Err(ConnectorError::Registry(format!(
                "unique id {} already in use",
                unique_id
            )));
        }

        let entry = self
            .entries
            .iter_mut()
            .find(|e| e.entity_id == entity_id)
            .ok_or_else(|| ConnectorError::Registry(format!("unknown entity {}", entity_id)))?;
        entry.unique_id = unique_id;
        Ok(())
    }
}

/// New unique id for a legacy one, or `None` if `unique_id` is not legacy
pub fn migrated_unique_id(unique_id: &str) -> Option<UniqueId> {
    let mac = unique_id.strip_prefix(LEGACY_UNIQUE_ID_PREFIX)?;
    if mac.contains('_') {
        return None;
    }
    UniqueId::from_mac(mac)
}

/// Re-key every legacy entity of this platform, returning how many changed
pub fn migrate_legacy_unique_ids(registry: &mut dyn EntityRegistry) -> Result<usize> {
    let mut migrated = 0;

    for entry in registry.entries() {
        if entry.platform != DOMAIN {
            continue;
        }
        let Some(new_id) = migrated_unique_id(&entry.unique_id) else {
            continue;
        };

        warn!(
            entity_id = %entry.entity_id,
            "Migrating legacy unique_id {} to {}",
            entry.unique_id,
            new_id
        );
        registry.update_unique_id(&entry.entity_id, new_id.into_string())?;
        migrated += 1;
    }

    Ok(migrated)
}
