use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use snafu::ensure;

use super::KeyValueStore;
use super::error::{EmptyKeySnafu, LockPoisonedSnafu, StorageResult};

/// Process-local store used by tests and as a fallback when the sqlite file cannot be opened.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a store pre-seeded with raw values, e.g. to simulate corrupt records.
    pub fn with_entries<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            entries: Mutex::new(
                entries
                    .into_iter()
                    .map(|(key, value)| (key.into(), value.into()))
                    .collect(),
            ),
        }
    }

    fn lock(&self, stage: &'static str) -> StorageResult<MutexGuard<'_, BTreeMap<String, String>>> {
        self.entries
            .lock()
            .map_err(|_| LockPoisonedSnafu { stage }.build())
    }
}

impl KeyValueStore for MemoryStorage {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        ensure!(!key.is_empty(), EmptyKeySnafu { stage: "memory-get" });
        Ok(self.lock("memory-get")?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        ensure!(!key.is_empty(), EmptyKeySnafu { stage: "memory-set" });
        self.lock("memory-set")?
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> StorageResult<()> {
        ensure!(!key.is_empty(), EmptyKeySnafu { stage: "memory-remove" });
        self.lock("memory-remove")?.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::StorageError;

    #[test]
    fn set_overwrites_and_remove_is_idempotent() {
        let store = MemoryStorage::new();
        store.set("currentUser", "{}").unwrap();
        store.set("currentUser", "{\"phoneNumber\":\"+1\"}").unwrap();

        assert_eq!(
            store.get("currentUser").unwrap().as_deref(),
            Some("{\"phoneNumber\":\"+1\"}")
        );

        store.remove("currentUser").unwrap();
        store.remove("currentUser").unwrap();
        assert_eq!(store.get("currentUser").unwrap(), None);
    }

    #[test]
    fn empty_keys_are_rejected() {
        let store = MemoryStorage::new();
        assert!(matches!(
            store.set("", "value"),
            Err(StorageError::EmptyKey { .. })
        ));
    }
}
