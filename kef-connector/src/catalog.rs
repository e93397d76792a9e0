//! Per-model source catalogs
//!
//! Each supported speaker model exposes a fixed set of physical and network
//! inputs. The catalog decides which of those are media-capable (playback
//! state applies) and how the model is woken from standby.

use tracing::warn;

use crate::error::CatalogError;

/// Model identifier used when none is configured
pub const DEFAULT_MODEL: &str = "default";

/// Source resumed on power-on when no real source has been observed yet
pub const FALLBACK_SOURCE: &str = "wifi";

/// Inputs where playing/paused/idle is meaningful
pub const MEDIA_CAPABLE_SOURCES: [&str; 2] = ["wifi", "bluetooth"];

/// How a model leaves standby
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerOnMethod {
    /// Selecting an input wakes the speaker
    SourceSelect,
    /// The speaker has a dedicated power-on action
    Explicit,
}

/// Whether playback concepts apply to an input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    MediaCapable,
    Passthrough,
}

/// Static description of one speaker model's inputs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceCatalog {
    model: &'static str,
    sources: &'static [&'static str],
    power_on: PowerOnMethod,
}

const CATALOGS: &[SourceCatalog] = &[
    SourceCatalog {
        model: "LSX2",
        sources: &["wifi", "bluetooth", "tv", "optical", "analog", "usb"],
        power_on: PowerOnMethod::SourceSelect,
    },
    SourceCatalog {
        model: "LSX2LT",
        sources: &["wifi", "bluetooth", "tv", "optical", "usb"],
        power_on: PowerOnMethod::SourceSelect,
    },
    SourceCatalog {
        model: "LS50W2",
        sources: &["wifi", "bluetooth", "tv", "optical", "coaxial", "analog"],
        power_on: PowerOnMethod::SourceSelect,
    },
    SourceCatalog {
        model: "LS60",
        sources: &["wifi", "bluetooth", "tv", "optical", "coaxial", "analog"],
        power_on: PowerOnMethod::SourceSelect,
    },
    SourceCatalog {
        model: "XIO",
        sources: &["wifi", "bluetooth", "tv", "optical"],
        power_on: PowerOnMethod::Explicit,
    },
    SourceCatalog {
        model: DEFAULT_MODEL,
        sources: &["wifi", "bluetooth", "tv", "optical", "coaxial", "analog", "usb"],
        power_on: PowerOnMethod::SourceSelect,
    },
];

impl SourceCatalog {
    /// Find the catalog for a model identifier (case-insensitive)
    pub fn lookup(model: &str) -> Result<Self, CatalogError> {
        let wanted = model.trim().to_uppercase();
        CATALOGS
            .iter()
            .find(|c| c.model.to_uppercase() == wanted)
            .copied()
            .ok_or_else(|| CatalogError::UnknownModel(wanted))
    }

    /// Like [`lookup`](Self::lookup) but falls back to the superset catalog,
    /// logging a warning for unknown models.
    pub fn resolve(model: &str) -> Self {
        match Self::lookup(model) {
            Ok(catalog) => catalog,
            Err(err) => {
                warn!(
                    "{}; using default sources. Known models: {}",
                    err,
                    Self::known_models().join(", ")
                );
                Self::superset()
            }
        }
    }

    /// The catalog used for unknown or unconfigured models
    pub fn superset() -> Self {
        CATALOGS[CATALOGS.len() - 1]
    }

    pub fn known_models() -> Vec<&'static str> {
        CATALOGS
            .iter()
            .map(|c| c.model)
            .filter(|m| *m != DEFAULT_MODEL)
            .collect()
    }

    pub fn model(&self) -> &'static str {
        self.model
    }

    pub fn sources(&self) -> &'static [&'static str] {
        self.sources
    }

    pub fn source_list(&self) -> Vec<String> {
        self.sources.iter().map(|s| s.to_string()).collect()
    }

    pub fn power_on(&self) -> PowerOnMethod {
        self.power_on
    }

    /// Whether `source` is one of this model's real inputs
    pub fn contains(&self, source: &str) -> bool {
        self.sources.contains(&source)
    }

    /// Anything outside wifi/bluetooth only has ON/OFF semantics
    pub fn kind_of(&self, source: &str) -> SourceKind {
        if MEDIA_CAPABLE_SOURCES.contains(&source) {
            SourceKind::MediaCapable
        } else {
            SourceKind::Passthrough
        }
    }
}

impl Default for SourceCatalog {
    fn default() -> Self {
        Self::superset()
    }
}
