//! Ledger snapshot - the single entity under reconciliation

use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;

/// Reveals granted to a user who has never bought anything
pub const DEFAULT_CREDIT_LIMIT: u32 = 7;

/// Point-in-time view of a user's contact-reveal ledger.
///
/// `credit_limit == 0` means "not set, use the default"; the merger always
/// resolves it to a positive value before the engine exposes a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LedgerSnapshot {
    /// Authenticated user; `None` in local-only mode
    pub user_id: Option<String>,
    /// Distinct contacts unlocked so far
    pub consumed_count: u32,
    /// Contacts that are free to view again
    pub unlocked_contact_ids: BTreeSet<String>,
    /// Total reveals allowed before purchase or unlimited access is needed
    pub credit_limit: u32,
    /// Unlimited-access entitlement
    pub has_unlimited_access: bool,
}

impl LedgerSnapshot {
    /// Fresh ledger with nothing consumed
    pub fn new(credit_limit: u32) -> Self {
        Self {
            user_id: None,
            consumed_count: 0,
            unlocked_contact_ids: BTreeSet::new(),
            credit_limit,
            has_unlimited_access: false,
        }
    }

    pub fn with_user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    /// Seed with already-unlocked contacts; the count follows the set
    pub fn with_unlocked<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.unlocked_contact_ids
            .extend(ids.into_iter().map(Into::into));
        self.consumed_count = self.unlocked_len();
        self
    }

    pub fn with_unlimited_access(mut self, unlimited: bool) -> Self {
        self.has_unlimited_access = unlimited;
        self
    }

    pub fn is_contact_unlocked(&self, contact_id: &str) -> bool {
        self.unlocked_contact_ids.contains(contact_id)
    }

    /// Whether a new, not yet unlocked contact may be revealed
    pub fn can_view_contact(&self) -> bool {
        self.has_unlimited_access || self.consumed_count < self.credit_limit
    }

    pub fn remaining_credits(&self) -> RemainingCredits {
        if self.has_unlimited_access {
            RemainingCredits::Unlimited
        } else {
            RemainingCredits::Limited(self.credit_limit.saturating_sub(self.consumed_count))
        }
    }

    /// Cardinality of the unlocked set, saturated to `u32`
    pub fn unlocked_len(&self) -> u32 {
        u32::try_from(self.unlocked_contact_ids.len()).unwrap_or(u32::MAX)
    }

    /// `consumed_count` agrees with the unlocked set
    pub fn is_consistent(&self) -> bool {
        self.consumed_count == self.unlocked_len()
    }
}

impl Default for LedgerSnapshot {
    fn default() -> Self {
        Self::new(DEFAULT_CREDIT_LIMIT)
    }
}

/// Reveals left before the user hits the paywall
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RemainingCredits {
    Unlimited,
    Limited(u32),
}

impl RemainingCredits {
    pub fn is_unlimited(&self) -> bool {
        matches!(self, RemainingCredits::Unlimited)
    }

    /// Finite count, `None` when unlimited
    pub fn count(&self) -> Option<u32> {
        match self {
            RemainingCredits::Unlimited => None,
            RemainingCredits::Limited(n) => Some(*n),
        }
    }
}

impl fmt::Display for RemainingCredits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RemainingCredits::Unlimited => write!(f, "Unlimited"),
            RemainingCredits::Limited(n) => write!(f, "{}", n),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_snapshot() {
        let snapshot = LedgerSnapshot::default();
        assert_eq!(snapshot.credit_limit, 7);
        assert_eq!(snapshot.consumed_count, 0);
        assert!(snapshot.can_view_contact());
        assert_eq!(snapshot.remaining_credits(), RemainingCredits::Limited(7));
    }

    #[test]
    fn test_remaining_never_negative() {
        let mut snapshot = LedgerSnapshot::new(2).with_unlocked(["a", "b", "c"]);
        assert_eq!(snapshot.remaining_credits(), RemainingCredits::Limited(0));
        assert!(!snapshot.can_view_contact());

        snapshot.has_unlimited_access = true;
        assert!(snapshot.can_view_contact());
        assert_eq!(snapshot.remaining_credits().to_string(), "Unlimited");
    }
}
