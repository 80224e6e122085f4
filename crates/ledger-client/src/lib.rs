//! Rust client for the contact ledger REST API
//!
//! Thin typed wrapper over the four endpoints the backend exposes for
//! contact-reveal accounting. Higher-level reconciliation lives in the
//! `contact-ledger` crate; this crate only speaks the wire contract.
//!
//! # Example
//!
//! ```rust,no_run
//! use ledger_client::{ClientConfig, LedgerClient, UpdateContactViews};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = LedgerClient::new(ClientConfig {
//!     base_url: "https://api.example.com".into(),
//!     ..Default::default()
//! })?;
//!
//! // Fetch the authoritative ledger for a user
//! if let Some(views) = client.get_contact_views("user-42").await? {
//!     println!("{} contacts revealed", views.contact_views);
//! }
//!
//! // Push local usage back
//! client
//!     .put_contact_views(
//!         "user-42",
//!         &UpdateContactViews {
//!             contact_views: 1,
//!             viewed_contacts: vec!["seller-9".into()],
//!         },
//!     )
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod error;
pub mod types;

// Re-export main types
pub use client::LedgerClient;
pub use error::{ClientError, Result};
pub use types::*;
