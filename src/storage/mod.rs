pub mod memory;
pub mod migrations;
pub mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use crate::errors::AppError;

/// Slot holding the bearer token written by the login flow.
pub const ACCESS_TOKEN_KEY: &str = "access_token";
/// Slot holding the last mobile number used to log in.
pub const MOBILE_NUMBER_KEY: &str = "mobile_number";

/// Device-local key-value storage. Reads are best-effort for callers:
/// a missing key means "not logged in" or "no prefill".
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, AppError>;
    fn set(&self, key: &str, value: &str) -> Result<(), AppError>;
    fn remove(&self, key: &str) -> Result<(), AppError>;
}

/// Reads a slot, treating storage failures as absence.
pub fn read_or_none(store: &dyn KeyValueStore, key: &str) -> Option<String> {
    match store.get(key) {
        Ok(value) => value.filter(|v| !v.is_empty()),
        Err(e) => {
            tracing::warn!(error = %e, key, "failed to read storage slot");
            None
        }
    }
}
