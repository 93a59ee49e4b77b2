pub mod json_backend;
pub mod memory;

use chrono::Utc;

use crate::core::errors::Result;

pub use json_backend::{is_canonical_key, JsonStorage};
pub use memory::MemoryStorage;

const QUARANTINE_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Key/value persistence for opaque ledger snapshots.
///
/// A backend stores one payload per key and replaces it wholesale on every
/// write. Implementations must leave the previous payload intact when a write
/// fails.
pub trait StorageBackend: Send + Sync {
    /// Returns the payload stored under `key`, or `None` if nothing was ever written.
    fn read(&self, key: &str) -> Result<Option<String>>;

    /// Replaces the payload stored under `key`.
    fn write(&self, key: &str, payload: &str) -> Result<()>;

    /// Copies the payload under `key` to a timestamped sibling key so that it
    /// survives a later overwrite. Returns the sibling key, or `None` when
    /// there was nothing to copy.
    fn quarantine(&self, key: &str) -> Result<Option<String>> {
        let Some(payload) = self.read(key)? else {
            return Ok(None);
        };
        let target = quarantine_key(key);
        self.write(&target, &payload)?;
        Ok(Some(target))
    }
}

pub(crate) fn quarantine_key(key: &str) -> String {
    format!(
        "{}.corrupt-{}",
        key,
        Utc::now().format(QUARANTINE_TIMESTAMP_FORMAT)
    )
}
