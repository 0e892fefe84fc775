//! Marketplace configuration loaded from `gigledger.toml`.
//!
//! [`MarketConfig`] holds the genesis parameters: the administrator identity
//! and the global minimum bid amount. Values missing from the file fall back
//! to defaults; the `GIGLEDGER_ADMIN` environment variable takes precedence
//! over the file for the administrator.

use std::path::Path;

use serde::Deserialize;
use uuid::Uuid;

use crate::error::AppError;
use crate::market::AccountId;

/// Default global minimum for budgets and bid amounts.
pub const DEFAULT_MIN_BID: u64 = 1;

/// Top-level configuration loaded from `gigledger.toml`.
#[derive(Debug, Clone, Deserialize)]
pub struct MarketConfig {
    /// Administrator account, as a UUID string.
    #[serde(default)]
    pub admin: String,

    /// Minimum value-unit amount for any budget or bid.
    #[serde(default = "default_min_bid")]
    pub min_bid_amount: u64,
}

fn default_min_bid() -> u64 {
    DEFAULT_MIN_BID
}

impl Default for MarketConfig {
    fn default() -> Self {
        Self {
            admin: String::new(),
            min_bid_amount: DEFAULT_MIN_BID,
        }
    }
}

impl MarketConfig {
    /// Load configuration from `gigledger.toml` in the current directory,
    /// falling back to defaults when the file does not exist.
    pub fn load() -> Result<Self, AppError> {
        Self::load_from(Path::new("gigledger.toml"))
    }

    pub fn load_from(path: &Path) -> Result<Self, AppError> {
        let mut config = if path.exists() {
            let contents = std::fs::read_to_string(path)?;
            toml::from_str::<MarketConfig>(&contents)?
        } else {
            Self::default()
        };

        // Environment takes precedence over the file for the admin identity.
        if let Ok(admin) = std::env::var("GIGLEDGER_ADMIN")
            && !admin.is_empty()
        {
            config.admin = admin;
        }

        Ok(config)
    }

    /// Parse the configured administrator identity.
    pub fn admin_id(&self) -> Result<AccountId, AppError> {
        if self.admin.is_empty() {
            return Err(AppError::Config(
                "no administrator configured; set `admin` in gigledger.toml or GIGLEDGER_ADMIN"
                    .to_string(),
            ));
        }
        let uuid = Uuid::parse_str(&self.admin)
            .map_err(|e| AppError::Config(format!("invalid admin identity: {e}")))?;
        let id = AccountId(uuid);
        if id.is_nil() {
            return Err(AppError::Config("admin identity must not be nil".to_string()));
        }
        Ok(id)
    }
}
