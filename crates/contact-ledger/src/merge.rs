//! Local/remote snapshot merger
//!
//! Combines the device copy and the backend copy of the ledger without ever
//! dropping recorded usage. Pure and total: any pair of present/absent inputs
//! yields a snapshot.

use crate::snapshot::{LedgerSnapshot, DEFAULT_CREDIT_LIMIT};

/// Merge with the built-in default credit limit
pub fn merge(local: Option<&LedgerSnapshot>, remote: Option<&LedgerSnapshot>) -> LedgerSnapshot {
    merge_with_limit(local, remote, DEFAULT_CREDIT_LIMIT)
}

/// Merge two snapshots, falling back to `default_limit` when neither side
/// carries a positive credit limit.
///
/// - unlocked ids: union
/// - consumed count: max(local, remote, |union|)
/// - credit limit: remote if positive, else local if positive, else default
/// - unlimited access: OR
pub fn merge_with_limit(
    local: Option<&LedgerSnapshot>,
    remote: Option<&LedgerSnapshot>,
    default_limit: u32,
) -> LedgerSnapshot {
    let mut merged = LedgerSnapshot::new(default_limit.max(1));

    for side in [local, remote].into_iter().flatten() {
        merged
            .unlocked_contact_ids
            .extend(side.unlocked_contact_ids.iter().cloned());
        merged.consumed_count = merged.consumed_count.max(side.consumed_count);
        merged.has_unlimited_access |= side.has_unlimited_access;
    }
    merged.consumed_count = merged.consumed_count.max(merged.unlocked_len());

    merged.credit_limit = remote
        .map(|r| r.credit_limit)
        .filter(|limit| *limit > 0)
        .or_else(|| local.map(|l| l.credit_limit).filter(|limit| *limit > 0))
        .unwrap_or(merged.credit_limit);

    merged.user_id = remote
        .and_then(|r| r.user_id.clone())
        .or_else(|| local.and_then(|l| l.user_id.clone()));

    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_both_absent_yields_defaults() {
        let merged = merge(None, None);
        assert_eq!(merged, LedgerSnapshot::default());
    }

    #[test]
    fn test_remote_never_overwrites_forward_progress() {
        let local = LedgerSnapshot::default().with_unlocked(["a", "b", "c"]);
        let remote = LedgerSnapshot::default();

        let merged = merge(Some(&local), Some(&remote));
        assert_eq!(merged.consumed_count, 3);
        assert_eq!(merged.unlocked_contact_ids, local.unlocked_contact_ids);
    }

    #[test]
    fn test_union_of_offline_and_remote_unlocks() {
        let local = LedgerSnapshot::default().with_unlocked(["a", "b"]);
        let remote = LedgerSnapshot::default().with_unlocked(["b", "c"]);

        let merged = merge(Some(&local), Some(&remote));
        assert_eq!(merged.unlocked_len(), 3);
        assert_eq!(merged.consumed_count, 3);
    }

    #[test]
    fn test_lagging_local_count_is_repaired() {
        // Set was written, count was not
        let mut local = LedgerSnapshot::default().with_unlocked(["a", "b"]);
        local.consumed_count = 1;

        let merged = merge(Some(&local), None);
        assert_eq!(merged.consumed_count, 2);
        assert!(merged.is_consistent());
    }

    #[test]
    fn test_remote_credit_limit_is_authoritative() {
        let local = LedgerSnapshot::new(7);
        let remote = LedgerSnapshot::new(14);
        assert_eq!(merge(Some(&local), Some(&remote)).credit_limit, 14);

        let remote_unset = LedgerSnapshot::new(0);
        let local_bought = LedgerSnapshot::new(21);
        assert_eq!(merge(Some(&local_bought), Some(&remote_unset)).credit_limit, 21);

        let local_unset = LedgerSnapshot::new(0);
        assert_eq!(merge_with_limit(Some(&local_unset), None, 5).credit_limit, 5);
    }

    #[test]
    fn test_unlimited_access_is_monotonic() {
        let granted = LedgerSnapshot::default().with_unlimited_access(true);
        let plain = LedgerSnapshot::default();

        assert!(merge(Some(&granted), Some(&plain)).has_unlimited_access);
        assert!(merge(Some(&plain), Some(&granted)).has_unlimited_access);
        assert!(merge(None, Some(&granted)).has_unlimited_access);
    }

    #[test]
    fn test_user_id_prefers_remote() {
        let local = LedgerSnapshot::default().with_user("device-guess");
        let remote = LedgerSnapshot::default().with_user("user-1");
        assert_eq!(
            merge(Some(&local), Some(&remote)).user_id.as_deref(),
            Some("user-1")
        );
        assert_eq!(merge(Some(&local), None).user_id.as_deref(), Some("device-guess"));
    }
}
