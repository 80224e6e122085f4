//! Contact Ledger - local-first contact-credit accounting
//!
//! Tracks how many seller contacts a user has revealed, which ones are free
//! to view again, and whether the user holds unlimited access, across a
//! durable device store and an authoritative backend.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────┐
//! │   EntitlementGate    │  labels, paywall, view decisions
//! └──────────┬───────────┘
//!            ▼
//! ┌──────────────────────┐
//! │     CreditEngine     │  only mutator; optimistic local writes
//! └─────┬──────────┬─────┘
//!       ▼          ▼
//! ┌──────────┐ ┌──────────────┐
//! │LocalStore│ │ RemoteLedger │  merged on load by `merge`
//! └──────────┘ └──────────────┘
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use contact_ledger::{CreditEngine, EntitlementGate, LedgerConfig};
//!
//! let config = LedgerConfig::load_or_default("contact-ledger.toml")?;
//! let engine = CreditEngine::from_config(&config)?;
//! engine.load(Some("user-42")).await;
//!
//! let gate = EntitlementGate::new(&engine);
//! match gate.view_contact("seller-9").await? {
//!     ContactAccess::Blocked => { /* show paywall */ }
//!     _ => println!("{}", gate.usage_label()),
//! }
//! ```

// Snapshot model and reconciliation
pub mod merge;
pub mod snapshot;

// Persistence and backend seams
pub mod remote;
pub mod store;

// Stateful core
pub mod engine;
pub mod stats;

// UI-facing helpers
pub mod gate;

pub mod config;
pub mod error;

pub use config::{LedgerConfig, PurchaseConfig};
pub use engine::CreditEngine;
pub use error::{LedgerError, LedgerResult, RemoteError, StoreError};
pub use gate::{
    ContactAccess, EntitlementGate, FixedChoice, PromptOutcome, UpgradeChoice, UpgradePresenter,
    UpgradePrompt,
};
pub use merge::{merge, merge_with_limit};
pub use remote::{
    Activation, CreditBalance, CreditOrder, MockRemoteLedger, RecordedPush, RemoteLedger,
};
pub use snapshot::{LedgerSnapshot, RemainingCredits, DEFAULT_CREDIT_LIMIT};
pub use stats::SyncReport;
pub use store::{FileStore, LocalStore, MemoryStore};

#[cfg(feature = "http")]
pub use remote::HttpRemoteLedger;
