//! Stable entity identity derived from the speaker's hardware address

use serde::{Deserialize, Serialize};
use std::fmt;

/// Prefix shared by every speaker model
pub const UNIQUE_ID_PREFIX: &str = "KEF_SPEAKER";

/// Normalize a MAC address to twelve lowercase hex digits
///
/// Accepts colon, dash or dot separated forms as well as bare digits.
/// Returns `None` if the input is not a 48-bit address.
pub fn format_mac(mac: &str) -> Option<String> {
    let digits: String = mac
        .trim()
        .chars()
        .filter(|c| !matches!(c, ':' | '-' | '.'))
        .collect();

    if digits.len() == 12 && digits.chars().all(|c| c.is_ascii_hexdigit()) {
        Some(digits.to_ascii_lowercase())
    } else {
        None
    }
}

/// Unique identifier of a speaker entity, `KEF_SPEAKER_<mac>`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UniqueId(String);

impl UniqueId {
    /// Build the identifier from a device-reported MAC address
    pub fn from_mac(mac: &str) -> Option<Self> {
        format_mac(mac).map(|mac| Self(format!("{}_{}", UNIQUE_ID_PREFIX, mac)))
    }

    /// Build the identifier from a MAC address `format_mac` rejects
    ///
    /// Keeps the lowercased alphanumeric characters of the input. Returns
    /// `None` only when nothing usable is left.
    pub fn from_raw_mac(mac: &str) -> Option<Self> {
        let raw: String = mac
            .chars()
            .filter(char::is_ascii_alphanumeric)
            .collect::<String>()
            .to_ascii_lowercase();

        if raw.is_empty() {
            None
        } else {
            Some(Self(format!("{}_{}", UNIQUE_ID_PREFIX, raw)))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for UniqueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
