//! Model types for kef-connector

mod player_state;
mod snapshot;
mod unique_id;

pub use player_state::PlayerState;
pub use snapshot::{normalize_volume, MediaProgress, Snapshot};
pub use unique_id::{format_mac, UniqueId, UNIQUE_ID_PREFIX};
