//! Credit engine
//!
//! The only mutator of ledger state. Reads are served from memory; mutations
//! update memory and the local store first, then reach the backend.
//!
//! Two failure regimes:
//! - passive consumption ([`CreditEngine::unlock_contact`]) is optimistic:
//!   the remote push runs detached and its failure is only logged
//! - paid operations ([`CreditEngine::grant_unlimited_access`],
//!   [`CreditEngine::add_credits`]) go to the backend first and leave state
//!   untouched when it fails

use crate::config::PurchaseConfig;
use crate::error::{LedgerError, LedgerResult, RemoteError};
use crate::merge::merge_with_limit;
use crate::remote::{Activation, CreditBalance, CreditOrder, RemoteLedger};
use crate::snapshot::{LedgerSnapshot, RemainingCredits, DEFAULT_CREDIT_LIMIT};
use crate::stats::{SyncReport, SyncStats};
use crate::store::{self, LocalStore};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Contact-credit ledger for one device.
///
/// Construct once per session and share it by `Arc`.
///
/// # Example
///
/// ```rust,ignore
/// use contact_ledger::{CreditEngine, MemoryStore};
/// use std::sync::Arc;
///
/// let engine = CreditEngine::new(Arc::new(MemoryStore::new()));
/// engine.load(None).await;
///
/// if engine.can_view_contact() {
///     engine.unlock_contact("seller-17").await?;
/// }
/// println!("{} left", engine.remaining_credits());
/// ```
pub struct CreditEngine {
    store: Arc<dyn LocalStore>,
    remote: Option<Arc<dyn RemoteLedger>>,
    default_limit: u32,
    purchase: PurchaseConfig,
    state: RwLock<LedgerSnapshot>,
    /// Serializes mutations, held across the local write
    writer: tokio::sync::Mutex<()>,
    stats: Arc<SyncStats>,
    next_push_seq: AtomicU64,
    /// Highest push sequence already sent; held for the duration of a push
    push_gate: Arc<tokio::sync::Mutex<u64>>,
    pending: Mutex<Vec<JoinHandle<()>>>,
}

impl CreditEngine {
    /// Local-only engine over the given store
    pub fn new(store: Arc<dyn LocalStore>) -> Self {
        Self {
            store,
            remote: None,
            default_limit: DEFAULT_CREDIT_LIMIT,
            purchase: PurchaseConfig::default(),
            state: RwLock::new(LedgerSnapshot::new(DEFAULT_CREDIT_LIMIT)),
            writer: tokio::sync::Mutex::new(()),
            stats: Arc::new(SyncStats::default()),
            next_push_seq: AtomicU64::new(0),
            push_gate: Arc::new(tokio::sync::Mutex::new(0)),
            pending: Mutex::new(Vec::new()),
        }
    }

    /// Attach the authoritative backend
    pub fn with_remote(mut self, remote: Arc<dyn RemoteLedger>) -> Self {
        self.remote = Some(remote);
        self
    }

    /// Credit limit used when neither source carries one
    pub fn with_default_limit(mut self, limit: u32) -> Self {
        self.default_limit = limit.max(1);
        self.state = RwLock::new(LedgerSnapshot::new(self.default_limit));
        self
    }

    /// Pricing and plan for paid operations
    pub fn with_purchase(mut self, purchase: PurchaseConfig) -> Self {
        self.purchase = purchase;
        self
    }

    /// Engine with a file store and, when a base URL is set, the HTTP backend
    #[cfg(feature = "http")]
    pub fn from_config(config: &crate::config::LedgerConfig) -> LedgerResult<Self> {
        config.validate()?;

        let store = Arc::new(store::FileStore::new(&config.store.path));
        let mut engine = Self::new(store)
            .with_default_limit(config.credits.default_limit)
            .with_purchase(config.purchase.clone());

        if let Some(client_config) = config.client_config() {
            let remote = crate::remote::HttpRemoteLedger::from_config(client_config)?;
            engine = engine.with_remote(Arc::new(remote));
        } else {
            info!("No remote ledger configured, running local-only");
        }

        Ok(engine)
    }

    // ==================== Initialization ====================

    /// Load and reconcile the ledger.
    ///
    /// Never fails: an unreadable store or an unreachable backend degrades to
    /// whatever data is available, down to the defaults.
    pub async fn load(&self, user_id: Option<&str>) -> LedgerSnapshot {
        let local = match store::read_snapshot(self.store.as_ref()).await {
            Ok(local) => local,
            Err(e) => {
                warn!("Local ledger unreadable, using defaults: {}", e);
                None
            }
        };
        let local_count = local.as_ref().map_or(0, |s| s.consumed_count);

        let remote = match (user_id, self.remote.as_ref()) {
            (Some(user), Some(remote)) => match remote.fetch(user).await {
                Ok(snapshot) => snapshot,
                Err(e) => {
                    warn!(user_id = user, "Remote ledger unavailable, continuing local-only: {}", e);
                    None
                }
            },
            (None, _) => {
                debug!("No user id, loading local ledger only");
                None
            }
            (Some(_), None) => None,
        };

        let fresh = merge_with_limit(local.as_ref(), remote.as_ref(), self.default_limit);

        let _writer = self.writer.lock().await;

        // Fold in anything unlocked while the reads above were in flight
        let current = self.read_state().clone();
        let mut merged = merge_with_limit(Some(&current), Some(&fresh), self.default_limit);
        merged.user_id = user_id.map(str::to_string);

        if merged.consumed_count > local_count {
            debug!(
                local = local_count,
                merged = merged.consumed_count,
                "Local store behind reconciled ledger, repairing"
            );
            if let Err(e) = store::write_snapshot(self.store.as_ref(), &merged).await {
                warn!("Failed to persist reconciled ledger: {}", e);
            }
        }

        *self.write_state() = merged.clone();

        info!(
            consumed = merged.consumed_count,
            limit = merged.credit_limit,
            unlimited = merged.has_unlimited_access,
            "Contact ledger loaded"
        );
        merged
    }

    // ==================== Queries ====================

    pub fn is_contact_unlocked(&self, contact_id: &str) -> bool {
        self.read_state().is_contact_unlocked(contact_id)
    }

    pub fn remaining_credits(&self) -> RemainingCredits {
        self.read_state().remaining_credits()
    }

    /// Whether a contact that is not yet unlocked may be revealed
    pub fn can_view_contact(&self) -> bool {
        self.read_state().can_view_contact()
    }

    /// Copy of the current ledger
    pub fn snapshot(&self) -> LedgerSnapshot {
        self.read_state().clone()
    }

    pub fn user_id(&self) -> Option<String> {
        self.read_state().user_id.clone()
    }

    pub fn purchase_config(&self) -> &PurchaseConfig {
        &self.purchase
    }

    pub fn default_limit(&self) -> u32 {
        self.default_limit
    }

    pub fn sync_report(&self) -> SyncReport {
        self.stats.report()
    }

    // ==================== Mutations ====================

    /// Spend a credit on a contact.
    ///
    /// Free when the contact is already unlocked or access is unlimited.
    /// Otherwise the spend is recorded in memory and in the local store, then
    /// pushed to the backend in the background. Only a failed local write is
    /// reported; the in-memory spend stands either way.
    pub async fn unlock_contact(&self, contact_id: &str) -> LedgerResult<()> {
        let _writer = self.writer.lock().await;

        let next = {
            let mut state = self.write_state();
            if state.has_unlimited_access {
                debug!(contact_id, "Unlimited access, unlock is free");
                return Ok(());
            }
            if state.is_contact_unlocked(contact_id) {
                debug!(contact_id, "Contact already unlocked");
                return Ok(());
            }
            state.unlocked_contact_ids.insert(contact_id.to_string());
            state.consumed_count = state.consumed_count.saturating_add(1);
            state.clone()
        };

        let persisted = store::write_snapshot(self.store.as_ref(), &next).await;
        info!(
            contact_id,
            consumed = next.consumed_count,
            limit = next.credit_limit,
            "Contact unlocked"
        );

        self.schedule_push(&next);

        persisted.map_err(|e| {
            error!(contact_id, "Failed to persist unlocked contact: {}", e);
            LedgerError::Store(e)
        })
    }

    /// Activate unlimited access on the backend, then record it locally
    pub async fn grant_unlimited_access(&self) -> LedgerResult<()> {
        let (remote, user_id) = self.paid_context()?;

        let activation = Activation {
            user_id,
            plan: self.purchase.plan.clone(),
            duration: self.purchase.duration.clone(),
        };

        if let Err(e) = remote.activate_unlimited(&activation).await {
            error!(user_id = %activation.user_id, "Unlimited access activation failed: {}", e);
            return Err(e.into());
        }

        let _writer = self.writer.lock().await;
        let next = {
            let mut state = self.write_state();
            state.has_unlimited_access = true;
            state.clone()
        };
        self.persist_confirmed(&next).await;

        info!(user_id = %activation.user_id, plan = %activation.plan, "Unlimited access granted");
        Ok(())
    }

    /// Buy `credits` more reveals.
    ///
    /// On success the backend's count and limit replace the local ones as-is,
    /// except that an unset (zero) limit falls back to the default.
    pub async fn add_credits(&self, credits: u32) -> LedgerResult<CreditBalance> {
        if credits == 0 {
            return Err(LedgerError::InvalidAmount(credits));
        }
        let (remote, user_id) = self.paid_context()?;

        let order = CreditOrder {
            user_id,
            credits,
            amount: self.purchase.price_for(credits),
            currency: self.purchase.currency.clone(),
        };

        let mut balance = match remote.purchase_credits(&order).await {
            Ok(balance) => balance,
            Err(e) => {
                error!(user_id = %order.user_id, credits, "Credit purchase failed: {}", e);
                return Err(e.into());
            }
        };
        // 0 is the backend's "unset"; resolve it like the merger does
        if balance.credit_limit == 0 {
            warn!(user_id = %order.user_id, "Purchase returned no credit limit, using default");
            balance.credit_limit = self.default_limit;
        }

        let _writer = self.writer.lock().await;
        let next = {
            let mut state = self.write_state();
            state.consumed_count = balance.consumed_count;
            state.credit_limit = balance.credit_limit;
            state.clone()
        };
        self.persist_confirmed(&next).await;

        info!(
            user_id = %order.user_id,
            credits,
            consumed = balance.consumed_count,
            limit = balance.credit_limit,
            "Credits added"
        );
        Ok(balance)
    }

    /// Wait for every background push scheduled so far
    pub async fn settle(&self) {
        loop {
            let handles = std::mem::take(&mut *self.lock_pending());
            if handles.is_empty() {
                break;
            }
            for handle in handles {
                if let Err(e) = handle.await {
                    warn!("Background push task ended abnormally: {}", e);
                }
            }
        }
    }

    // === Private Implementation ===

    fn read_state(&self) -> RwLockReadGuard<'_, LedgerSnapshot> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_state(&self) -> RwLockWriteGuard<'_, LedgerSnapshot> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_pending(&self) -> std::sync::MutexGuard<'_, Vec<JoinHandle<()>>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn paid_context(&self) -> LedgerResult<(Arc<dyn RemoteLedger>, String)> {
        let user_id = self.user_id().ok_or(LedgerError::NotAuthenticated)?;
        let remote = self
            .remote
            .as_ref()
            .ok_or(LedgerError::Remote(RemoteError::Unavailable))?;
        Ok((Arc::clone(remote), user_id))
    }

    /// Persist state the backend has already confirmed. The backend keeps
    /// the entitlement, so a local failure is logged rather than returned.
    async fn persist_confirmed(&self, snapshot: &LedgerSnapshot) {
        if let Err(e) = store::write_snapshot(self.store.as_ref(), snapshot).await {
            error!("Failed to persist confirmed ledger change: {}", e);
        }
    }

    fn schedule_push(&self, snapshot: &LedgerSnapshot) {
        let (Some(remote), Some(user_id)) = (self.remote.as_ref(), snapshot.user_id.clone()) else {
            debug!("Local-only mode, skipping remote usage push");
            return;
        };

        let remote = Arc::clone(remote);
        let stats = Arc::clone(&self.stats);
        let gate = Arc::clone(&self.push_gate);
        let seq = self.next_push_seq.fetch_add(1, Ordering::SeqCst) + 1;
        let consumed = snapshot.consumed_count;
        let ids = snapshot.unlocked_contact_ids.clone();

        let handle = tokio::spawn(async move {
            let mut last_sent = gate.lock().await;
            if seq <= *last_sent {
                stats.record_superseded();
                debug!(seq, "Usage push superseded by a newer one");
                return;
            }
            *last_sent = seq;

            match remote.push_usage(&user_id, consumed, &ids).await {
                Ok(()) => {
                    stats.record_success();
                    debug!(user_id = %user_id, consumed, "Usage pushed to remote ledger");
                }
                Err(e) => {
                    stats.record_failure(&e);
                    warn!(
                        user_id = %user_id,
                        "Remote usage push failed, will reconcile on next load: {}",
                        e
                    );
                }
            }
        });

        let mut pending = self.lock_pending();
        pending.retain(|h| !h.is_finished());
        pending.push(handle);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::MockRemoteLedger;
    use crate::store::MemoryStore;

    fn engine_with(store: Arc<MemoryStore>, remote: Arc<MockRemoteLedger>) -> CreditEngine {
        CreditEngine::new(store).with_remote(remote)
    }

    #[tokio::test]
    async fn test_load_with_both_sources_absent_uses_defaults() {
        let store = Arc::new(MemoryStore::new());
        let engine = CreditEngine::new(store.clone());

        let snapshot = engine.load(None).await;
        assert_eq!(snapshot, LedgerSnapshot::default());
        assert_eq!(store.write_count(), 0);
    }

    #[tokio::test]
    async fn test_unlock_is_idempotent() {
        let store = Arc::new(MemoryStore::new());
        let engine = CreditEngine::new(store.clone());
        engine.load(None).await;

        engine.unlock_contact("seller-1").await.unwrap();
        let after_first = engine.remaining_credits();
        engine.unlock_contact("seller-1").await.unwrap();

        assert_eq!(engine.remaining_credits(), after_first);
        assert_eq!(after_first, RemainingCredits::Limited(6));
        assert_eq!(store.write_count(), 1);
    }

    #[tokio::test]
    async fn test_unlock_skips_remote_without_user() {
        let store = Arc::new(MemoryStore::new());
        let remote = Arc::new(MockRemoteLedger::new());
        let engine = engine_with(store, remote.clone());
        engine.load(None).await;

        engine.unlock_contact("seller-1").await.unwrap();
        engine.settle().await;

        assert_eq!(remote.fetch_calls(), 0);
        assert!(remote.pushes().is_empty());
    }

    #[tokio::test]
    async fn test_unlimited_unlock_is_free() {
        let store = Arc::new(MemoryStore::new());
        let remote = Arc::new(
            MockRemoteLedger::new()
                .with_record(LedgerSnapshot::new(7).with_unlimited_access(true)),
        );
        let engine = engine_with(store.clone(), remote.clone());
        engine.load(Some("user-1")).await;

        engine.unlock_contact("seller-1").await.unwrap();
        engine.settle().await;

        assert!(!engine.is_contact_unlocked("seller-1"));
        assert_eq!(engine.remaining_credits(), RemainingCredits::Unlimited);
        assert!(remote.pushes().is_empty());
    }

    #[tokio::test]
    async fn test_local_write_failure_is_reported_but_kept_in_memory() {
        let store = Arc::new(MemoryStore::new());
        let engine = CreditEngine::new(store.clone());
        engine.load(None).await;
        store.set_fail_writes(true);

        let result = engine.unlock_contact("seller-1").await;
        assert!(matches!(result, Err(LedgerError::Store(_))));
        assert!(engine.is_contact_unlocked("seller-1"));
    }

    #[tokio::test]
    async fn test_paid_operations_need_user() {
        let engine = CreditEngine::new(Arc::new(MemoryStore::new()))
            .with_remote(Arc::new(MockRemoteLedger::new()));
        engine.load(None).await;

        assert!(matches!(
            engine.add_credits(7).await,
            Err(LedgerError::NotAuthenticated)
        ));
        assert!(matches!(
            engine.grant_unlimited_access().await,
            Err(LedgerError::NotAuthenticated)
        ));
    }

    #[tokio::test]
    async fn test_paid_operations_need_remote() {
        let engine = CreditEngine::new(Arc::new(MemoryStore::new()));
        engine.load(Some("user-1")).await;

        assert!(matches!(
            engine.add_credits(7).await,
            Err(LedgerError::Remote(RemoteError::Unavailable))
        ));
    }

    #[tokio::test]
    async fn test_zero_credit_purchase_rejected() {
        let remote = Arc::new(MockRemoteLedger::new());
        let engine = engine_with(Arc::new(MemoryStore::new()), remote.clone());
        engine.load(Some("user-1")).await;

        assert!(matches!(
            engine.add_credits(0).await,
            Err(LedgerError::InvalidAmount(0))
        ));
        assert!(remote.orders().is_empty());
    }

    #[tokio::test]
    async fn test_purchase_uses_configured_pricing() {
        let remote = Arc::new(MockRemoteLedger::new());
        let engine = engine_with(Arc::new(MemoryStore::new()), remote.clone()).with_purchase(
            PurchaseConfig {
                unit_price: 250,
                currency: "EUR".to_string(),
                ..Default::default()
            },
        );
        engine.load(Some("user-1")).await;

        engine.add_credits(4).await.unwrap();

        let orders = remote.orders();
        assert_eq!(orders.len(), 1);
        assert_eq!(orders[0].amount, 1000);
        assert_eq!(orders[0].currency, "EUR");
        assert_eq!(orders[0].user_id, "user-1");
    }
}
