//! Remote ledger adapter
//!
//! The engine talks to the backend only through [`RemoteLedger`], so every
//! response reaches it either as a typed value or as a [`RemoteError`].
//! Implementations:
//! - [`HttpRemoteLedger`]: REST backend via `ledger-client`
//! - [`MockRemoteLedger`]: configurable in-process backend for tests

#[cfg(feature = "http")]
mod http;
mod mock;

#[cfg(feature = "http")]
pub use http::HttpRemoteLedger;
pub use mock::{MockRemoteLedger, RecordedPush};

use crate::error::RemoteError;
use crate::snapshot::LedgerSnapshot;
use async_trait::async_trait;
use std::collections::BTreeSet;

/// A credit purchase to submit to the backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreditOrder {
    pub user_id: String,
    pub credits: u32,
    /// Price in minor currency units
    pub amount: u64,
    pub currency: String,
}

/// Balance the backend reports after a purchase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CreditBalance {
    pub consumed_count: u32,
    pub credit_limit: u32,
}

/// An unlimited-access subscription to activate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Activation {
    pub user_id: String,
    pub plan: String,
    pub duration: String,
}

/// Authoritative ledger service.
#[async_trait]
pub trait RemoteLedger: Send + Sync {
    /// Fetch the backend's snapshot; `Ok(None)` when the user has no record
    async fn fetch(&self, user_id: &str) -> Result<Option<LedgerSnapshot>, RemoteError>;

    /// Replace the backend's usage record with the given count and set
    async fn push_usage(
        &self,
        user_id: &str,
        consumed_count: u32,
        unlocked_contact_ids: &BTreeSet<String>,
    ) -> Result<(), RemoteError>;

    /// Complete a credit purchase
    async fn purchase_credits(&self, order: &CreditOrder) -> Result<CreditBalance, RemoteError>;

    /// Activate unlimited access
    async fn activate_unlimited(&self, activation: &Activation) -> Result<(), RemoteError>;
}
