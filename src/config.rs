//! Configuration module
//!
//! All runtime knobs live in one explicit `Config` loaded from a TOML file
//! with `.env` overrides; nothing reads endpoints or keys from globals.

use anyhow::bail;
use serde::{Deserialize, Serialize};

use crate::types::PriorityLevel;

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// RPC node configuration
    #[serde(default)]
    pub rpc: RpcConfig,

    /// Wallet configuration
    #[serde(default)]
    pub wallet: WalletConfig,

    /// Routing service endpoints
    #[serde(default)]
    pub jupiter: JupiterConfig,

    /// Trading defaults
    #[serde(default)]
    pub trading: TradingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcConfig {
    /// RPC endpoint URL
    #[serde(default = "default_rpc_endpoint")]
    pub endpoint: String,

    /// Request timeout in seconds
    #[serde(default = "default_rpc_timeout")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletConfig {
    /// Path to a keypair file; when unset the key comes from the environment
    #[serde(default)]
    pub keypair_path: Option<String>,

    /// Environment variable holding a base64-encoded keypair
    #[serde(default = "default_private_key_env")]
    pub private_key_env: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JupiterConfig {
    /// Quote endpoint
    #[serde(default = "default_quote_api_url")]
    pub quote_api_url: String,

    /// Swap-build endpoint
    #[serde(default = "default_swap_api_url")]
    pub swap_api_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradingConfig {
    /// Maximum submit/confirm attempts per swap
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Fixed wait before the confirmation poll, in seconds
    #[serde(default = "default_confirmation_delay")]
    pub confirmation_delay_secs: u64,

    /// Maximum slippage tolerance (basis points)
    #[serde(default = "default_max_slippage")]
    pub max_slippage_bps: u16,

    /// Cap on the priority fee, in SOL
    #[serde(default = "default_max_priority_fee")]
    pub max_priority_fee_sol: f64,

    /// Priority level requested from the router
    #[serde(default)]
    pub priority_level: PriorityLevel,
}

// Default value functions
fn default_rpc_endpoint() -> String {
    "https://api.mainnet-beta.solana.com".to_string()
}
fn default_rpc_timeout() -> u64 {
    30
}
fn default_private_key_env() -> String {
    "SOL_PRIVATE_KEY".to_string()
}
fn default_quote_api_url() -> String {
    "https://quote-api.jup.ag/v6/quote".to_string()
}
fn default_swap_api_url() -> String {
    "https://quote-api.jup.ag/v6/swap".to_string()
}
fn default_max_attempts() -> u32 {
    5
}
fn default_confirmation_delay() -> u64 {
    10
}
fn default_max_slippage() -> u16 {
    500
}
fn default_max_priority_fee() -> f64 {
    0.002
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            endpoint: default_rpc_endpoint(),
            timeout_secs: default_rpc_timeout(),
        }
    }
}

impl Default for WalletConfig {
    fn default() -> Self {
        Self {
            keypair_path: None,
            private_key_env: default_private_key_env(),
        }
    }
}

impl Default for JupiterConfig {
    fn default() -> Self {
        Self {
            quote_api_url: default_quote_api_url(),
            swap_api_url: default_swap_api_url(),
        }
    }
}

impl Default for TradingConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            confirmation_delay_secs: default_confirmation_delay(),
            max_slippage_bps: default_max_slippage(),
            max_priority_fee_sol: default_max_priority_fee(),
            priority_level: PriorityLevel::default(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load `.env`, then the TOML file if it exists, defaults otherwise
    pub fn load(path: &str) -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        if std::path::Path::new(path).exists() {
            Self::from_file(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.rpc.endpoint.is_empty() {
            bail!("rpc.endpoint must not be empty");
        }
        if self.trading.max_attempts == 0 {
            bail!("trading.max_attempts must be at least 1");
        }
        if self.trading.max_slippage_bps > 10_000 {
            bail!(
                "trading.max_slippage_bps {} exceeds maximum 10000",
                self.trading.max_slippage_bps
            );
        }
        if self.trading.max_priority_fee_sol < 0.0 {
            bail!("trading.max_priority_fee_sol must not be negative");
        }
        Ok(())
    }
}
