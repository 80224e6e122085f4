//! Durable local store
//!
//! Device-scoped key/value persistence for the ledger. The four ledger keys
//! are always read together and written together so they cannot drift
//! relative to each other.

mod file;
mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use crate::error::StoreError;
use crate::snapshot::LedgerSnapshot;
use async_trait::async_trait;
use std::collections::BTreeSet;

/// Consumed-count key
pub const KEY_CONSUMED_COUNT: &str = "contact_views_count";
/// Unlocked contact ids, JSON array
pub const KEY_UNLOCKED_IDS: &str = "viewed_contacts";
/// Unlimited flag, "true" / "false"
pub const KEY_UNLIMITED: &str = "has_unlimited_contacts";
/// Credit limit key
pub const KEY_CREDIT_LIMIT: &str = "contact_credits";

/// All ledger keys, in write order
pub const LEDGER_KEYS: [&str; 4] = [
    KEY_CONSUMED_COUNT,
    KEY_UNLOCKED_IDS,
    KEY_UNLIMITED,
    KEY_CREDIT_LIMIT,
];

/// Key/value persistence surviving restarts.
///
/// Implementations must apply `set_many` as a single unit: either every
/// entry lands or none does.
#[async_trait]
pub trait LocalStore: Send + Sync {
    /// Read one key
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Write several keys as one unit
    async fn set_many(&self, entries: Vec<(String, String)>) -> Result<(), StoreError>;
}

/// Read the ledger from the store.
///
/// Returns `None` when none of the ledger keys exist. A key whose value does
/// not parse is treated as absent.
pub async fn read_snapshot(store: &dyn LocalStore) -> Result<Option<LedgerSnapshot>, StoreError> {
    let count = store.get(KEY_CONSUMED_COUNT).await?;
    let ids = store.get(KEY_UNLOCKED_IDS).await?;
    let unlimited = store.get(KEY_UNLIMITED).await?;
    let limit = store.get(KEY_CREDIT_LIMIT).await?;

    if count.is_none() && ids.is_none() && unlimited.is_none() && limit.is_none() {
        return Ok(None);
    }

    let mut snapshot = LedgerSnapshot::new(0);

    if let Some(raw) = count {
        match raw.trim().parse::<u32>() {
            Ok(n) => snapshot.consumed_count = n,
            Err(e) => tracing::warn!(key = KEY_CONSUMED_COUNT, "Ignoring corrupt value {:?}: {}", raw, e),
        }
    }

    if let Some(raw) = ids {
        match serde_json::from_str::<BTreeSet<String>>(&raw) {
            Ok(set) => snapshot.unlocked_contact_ids = set,
            Err(e) => tracing::warn!(key = KEY_UNLOCKED_IDS, "Ignoring corrupt value: {}", e),
        }
    }

    if let Some(raw) = unlimited {
        match raw.trim() {
            "true" => snapshot.has_unlimited_access = true,
            "false" => snapshot.has_unlimited_access = false,
            other => tracing::warn!(key = KEY_UNLIMITED, "Ignoring corrupt value {:?}", other),
        }
    }

    if let Some(raw) = limit {
        match raw.trim().parse::<u32>() {
            Ok(n) => snapshot.credit_limit = n,
            Err(e) => tracing::warn!(key = KEY_CREDIT_LIMIT, "Ignoring corrupt value {:?}: {}", raw, e),
        }
    }

    Ok(Some(snapshot))
}

/// Write the whole ledger to the store in one unit
pub async fn write_snapshot(store: &dyn LocalStore, snapshot: &LedgerSnapshot) -> Result<(), StoreError> {
    let ids = serde_json::to_string(&snapshot.unlocked_contact_ids)?;

    store
        .set_many(vec![
            (KEY_CONSUMED_COUNT.to_string(), snapshot.consumed_count.to_string()),
            (KEY_UNLOCKED_IDS.to_string(), ids),
            (KEY_UNLIMITED.to_string(), snapshot.has_unlimited_access.to_string()),
            (KEY_CREDIT_LIMIT.to_string(), snapshot.credit_limit.to_string()),
        ])
        .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_empty_store_reads_none() {
        let store = MemoryStore::new();
        assert!(read_snapshot(&store).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_write_then_read() {
        let store = MemoryStore::new();
        let snapshot = LedgerSnapshot::new(14)
            .with_unlocked(["seller-1", "seller-2"])
            .with_unlimited_access(true);

        write_snapshot(&store, &snapshot).await.unwrap();

        let read = read_snapshot(&store).await.unwrap().unwrap();
        assert_eq!(read.consumed_count, 2);
        assert_eq!(read.unlocked_contact_ids, snapshot.unlocked_contact_ids);
        assert_eq!(read.credit_limit, 14);
        assert!(read.has_unlimited_access);
        assert_eq!(read.user_id, None);
    }

    #[tokio::test]
    async fn test_corrupt_keys_are_treated_as_absent() {
        let store = MemoryStore::with_entries([
            (KEY_CONSUMED_COUNT, "3"),
            (KEY_UNLOCKED_IDS, "[\"a\", \"b\""),
            (KEY_UNLIMITED, "yes please"),
            (KEY_CREDIT_LIMIT, "-4"),
        ]);

        let read = read_snapshot(&store).await.unwrap().unwrap();
        assert_eq!(read.consumed_count, 3);
        assert!(read.unlocked_contact_ids.is_empty());
        assert!(!read.has_unlimited_access);
        assert_eq!(read.credit_limit, 0);
    }
}
