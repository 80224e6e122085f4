//! Ledger configuration

use crate::error::{LedgerError, LedgerResult};
use crate::snapshot::DEFAULT_CREDIT_LIMIT;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LedgerConfig {
    #[serde(default)]
    pub remote: RemoteConfig,
    #[serde(default)]
    pub credits: CreditsConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub purchase: PurchaseConfig,
}

/// Backend connection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteConfig {
    /// Base URL of the ledger backend; unset means local-only
    #[serde(default)]
    pub base_url: Option<String>,

    /// Bearer token for the backend
    #[serde(default)]
    pub api_key: Option<String>,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            api_key: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreditsConfig {
    /// Free reveals before purchase is required
    #[serde(default = "default_limit")]
    pub default_limit: u32,
}

impl Default for CreditsConfig {
    fn default() -> Self {
        Self {
            default_limit: default_limit(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Path of the JSON store file
    #[serde(default = "default_store_path")]
    pub path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_store_path(),
        }
    }
}

/// Pricing and plan sent with paid operations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseConfig {
    /// Price of one credit in minor currency units
    #[serde(default = "default_unit_price")]
    pub unit_price: u64,

    #[serde(default = "default_currency")]
    pub currency: String,

    /// Subscription plan for unlimited access
    #[serde(default = "default_plan")]
    pub plan: String,

    #[serde(default = "default_duration")]
    pub duration: String,
}

impl Default for PurchaseConfig {
    fn default() -> Self {
        Self {
            unit_price: default_unit_price(),
            currency: default_currency(),
            plan: default_plan(),
            duration: default_duration(),
        }
    }
}

impl PurchaseConfig {
    /// Price of `credits` credits in minor units
    pub fn price_for(&self, credits: u32) -> u64 {
        self.unit_price.saturating_mul(u64::from(credits))
    }
}

fn default_timeout_secs() -> u64 { 30 }
fn default_limit() -> u32 { DEFAULT_CREDIT_LIMIT }
fn default_store_path() -> PathBuf { PathBuf::from("contact-ledger.json") }
fn default_unit_price() -> u64 { 100 }
fn default_currency() -> String { "USD".to_string() }
fn default_plan() -> String { "unlimited-contacts".to_string() }
fn default_duration() -> String { "monthly".to_string() }

impl LedgerConfig {
    /// Parse a TOML document
    pub fn from_toml(content: &str) -> LedgerResult<Self> {
        let config: LedgerConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a file
    pub fn load(path: impl AsRef<Path>) -> LedgerResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| LedgerError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_toml(&content)
    }

    /// Load from a file, or fall back to defaults when it does not exist
    pub fn load_or_default(path: impl AsRef<Path>) -> LedgerResult<Self> {
        let path = path.as_ref();
        if path.exists() {
            Self::load(path)
        } else {
            tracing::info!("Config file {} not found, using defaults", path.display());
            Ok(Self::default())
        }
    }

    pub fn validate(&self) -> LedgerResult<()> {
        if self.credits.default_limit == 0 {
            return Err(LedgerError::Config(
                "credits.default_limit must be positive".to_string(),
            ));
        }
        if let Some(ref url) = self.remote.base_url {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(LedgerError::Config(format!(
                    "remote.base_url must be an http(s) URL, got {}",
                    url
                )));
            }
        }
        Ok(())
    }

    /// Client settings for the HTTP backend, `None` in local-only mode
    #[cfg(feature = "http")]
    pub fn client_config(&self) -> Option<ledger_client::ClientConfig> {
        self.remote.base_url.as_ref().map(|base_url| ledger_client::ClientConfig {
            base_url: base_url.clone(),
            api_key: self.remote.api_key.clone(),
            timeout_secs: self.remote.timeout_secs,
        })
    }
}
