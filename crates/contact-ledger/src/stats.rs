//! Background sync bookkeeping

use crate::error::RemoteError;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};

/// Outcome counters for detached remote usage pushes
#[derive(Debug, Default)]
pub struct SyncStats {
    succeeded: AtomicU64,
    failed: AtomicU64,
    superseded: AtomicU64,
    last_error: Mutex<Option<String>>,
    last_success_at: Mutex<Option<DateTime<Utc>>>,
}

/// Point-in-time copy of [`SyncStats`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    pub pushes_succeeded: u64,
    pub pushes_failed: u64,
    /// Pushes skipped because a newer one had already been sent
    pub pushes_superseded: u64,
    pub last_error: Option<String>,
    pub last_success_at: Option<DateTime<Utc>>,
}

impl SyncStats {
    pub fn record_success(&self) {
        self.succeeded.fetch_add(1, Ordering::Relaxed);
        *self
            .last_success_at
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(Utc::now());
    }

    pub fn record_failure(&self, error: &RemoteError) {
        self.failed.fetch_add(1, Ordering::Relaxed);
        *self.last_error.lock().unwrap_or_else(PoisonError::into_inner) = Some(error.to_string());
    }

    pub fn record_superseded(&self) {
        self.superseded.fetch_add(1, Ordering::Relaxed);
    }

    pub fn report(&self) -> SyncReport {
        SyncReport {
            pushes_succeeded: self.succeeded.load(Ordering::Relaxed),
            pushes_failed: self.failed.load(Ordering::Relaxed),
            pushes_superseded: self.superseded.load(Ordering::Relaxed),
            last_error: self
                .last_error
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .clone(),
            last_success_at: *self
                .last_success_at
                .lock()
                .unwrap_or_else(PoisonError::into_inner),
        }
    }
}
