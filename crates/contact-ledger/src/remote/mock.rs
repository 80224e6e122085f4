//! Mock remote ledger for testing.

use super::{Activation, CreditBalance, CreditOrder, RemoteLedger};
use crate::error::RemoteError;
use crate::snapshot::{LedgerSnapshot, DEFAULT_CREDIT_LIMIT};
use async_trait::async_trait;
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// A usage push the mock received
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedPush {
    pub user_id: String,
    pub consumed_count: u32,
    pub unlocked_contact_ids: BTreeSet<String>,
}

/// In-process backend with switchable failure modes.
///
/// Behaves like a well-formed server by default: pushes overwrite the stored
/// usage, purchases raise the credit limit, activation grants unlimited access.
pub struct MockRemoteLedger {
    record: Mutex<Option<LedgerSnapshot>>,
    available: AtomicBool,
    malformed: AtomicBool,
    reject_pushes: AtomicBool,
    reject_payments: AtomicBool,
    purchase_response: Mutex<Option<CreditBalance>>,
    push_delay: Mutex<Option<Duration>>,
    fetch_delay: Mutex<Option<Duration>>,
    fetch_calls: AtomicU32,
    pushes: Mutex<Vec<RecordedPush>>,
    orders: Mutex<Vec<CreditOrder>>,
    activations: Mutex<Vec<Activation>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl MockRemoteLedger {
    /// Backend with no record for anyone yet
    pub fn new() -> Self {
        Self {
            record: Mutex::new(None),
            available: AtomicBool::new(true),
            malformed: AtomicBool::new(false),
            reject_pushes: AtomicBool::new(false),
            reject_payments: AtomicBool::new(false),
            purchase_response: Mutex::new(None),
            push_delay: Mutex::new(None),
            fetch_delay: Mutex::new(None),
            fetch_calls: AtomicU32::new(0),
            pushes: Mutex::new(Vec::new()),
            orders: Mutex::new(Vec::new()),
            activations: Mutex::new(Vec::new()),
        }
    }

    /// Seed the backend's record
    pub fn with_record(self, snapshot: LedgerSnapshot) -> Self {
        *lock(&self.record) = Some(snapshot);
        self
    }

    /// Fixed response for every purchase
    pub fn with_purchase_response(self, balance: CreditBalance) -> Self {
        *lock(&self.purchase_response) = Some(balance);
        self
    }

    /// Delay every usage push
    pub fn with_push_delay(self, delay: Duration) -> Self {
        *lock(&self.push_delay) = Some(delay);
        self
    }

    /// Delay every fetch
    pub fn with_fetch_delay(self, delay: Duration) -> Self {
        *lock(&self.fetch_delay) = Some(delay);
        self
    }

    /// Simulate the device going offline (every call fails with a network error)
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Make `fetch` return an unparsable payload
    pub fn set_malformed(&self, malformed: bool) {
        self.malformed.store(malformed, Ordering::SeqCst);
    }

    pub fn set_reject_pushes(&self, reject: bool) {
        self.reject_pushes.store(reject, Ordering::SeqCst);
    }

    /// Decline purchases and activations
    pub fn set_reject_payments(&self, reject: bool) {
        self.reject_payments.store(reject, Ordering::SeqCst);
    }

    pub fn record(&self) -> Option<LedgerSnapshot> {
        lock(&self.record).clone()
    }

    pub fn fetch_calls(&self) -> u32 {
        self.fetch_calls.load(Ordering::SeqCst)
    }

    pub fn pushes(&self) -> Vec<RecordedPush> {
        lock(&self.pushes).clone()
    }

    pub fn orders(&self) -> Vec<CreditOrder> {
        lock(&self.orders).clone()
    }

    pub fn activations(&self) -> Vec<Activation> {
        lock(&self.activations).clone()
    }

    fn check_available(&self) -> Result<(), RemoteError> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(RemoteError::Network("mock backend offline".to_string()))
        }
    }

    fn check_payment(&self) -> Result<(), RemoteError> {
        if self.reject_payments.load(Ordering::SeqCst) {
            Err(RemoteError::Rejected {
                status: Some(402),
                message: "payment declined".to_string(),
            })
        } else {
            Ok(())
        }
    }
}

impl Default for MockRemoteLedger {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RemoteLedger for MockRemoteLedger {
    async fn fetch(&self, user_id: &str) -> Result<Option<LedgerSnapshot>, RemoteError> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        let delay = *lock(&self.fetch_delay);
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.check_available()?;

        if self.malformed.load(Ordering::SeqCst) {
            return Err(RemoteError::Malformed("expected object, got string".to_string()));
        }

        Ok(lock(&self.record).clone().map(|mut snapshot| {
            snapshot.user_id = Some(user_id.to_string());
            snapshot
        }))
    }

    async fn push_usage(
        &self,
        user_id: &str,
        consumed_count: u32,
        unlocked_contact_ids: &BTreeSet<String>,
    ) -> Result<(), RemoteError> {
        let delay = *lock(&self.push_delay);
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        self.check_available()?;
        if self.reject_pushes.load(Ordering::SeqCst) {
            return Err(RemoteError::Rejected {
                status: Some(500),
                message: "internal error".to_string(),
            });
        }

        lock(&self.pushes).push(RecordedPush {
            user_id: user_id.to_string(),
            consumed_count,
            unlocked_contact_ids: unlocked_contact_ids.clone(),
        });

        let mut record = lock(&self.record);
        let entry = record.get_or_insert_with(|| LedgerSnapshot::new(0));
        entry.consumed_count = consumed_count;
        entry.unlocked_contact_ids = unlocked_contact_ids.clone();
        Ok(())
    }

    async fn purchase_credits(&self, order: &CreditOrder) -> Result<CreditBalance, RemoteError> {
        self.check_available()?;
        self.check_payment()?;
        lock(&self.orders).push(order.clone());

        let fixed = *lock(&self.purchase_response);
        let mut record = lock(&self.record);
        let entry = record.get_or_insert_with(|| LedgerSnapshot::new(0));

        let balance = match fixed {
            Some(balance) => balance,
            None => {
                let base = if entry.credit_limit > 0 {
                    entry.credit_limit
                } else {
                    DEFAULT_CREDIT_LIMIT
                };
                CreditBalance {
                    consumed_count: entry.consumed_count,
                    credit_limit: base.saturating_add(order.credits),
                }
            }
        };

        entry.consumed_count = balance.consumed_count;
        entry.credit_limit = balance.credit_limit;
        Ok(balance)
    }

    async fn activate_unlimited(&self, activation: &Activation) -> Result<(), RemoteError> {
        self.check_available()?;
        self.check_payment()?;
        lock(&self.activations).push(activation.clone());

        lock(&self.record)
            .get_or_insert_with(|| LedgerSnapshot::new(0))
            .has_unlimited_access = true;
        Ok(())
    }
}
