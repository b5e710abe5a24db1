//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::blockchain::WeiAmount;
use crate::keystore::UnlockSettings;

/// Root configuration for the signing service.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct SignatoryConfig {
    /// HTTP listener settings.
    pub listener: ListenerConfig,

    /// Key, source, and transfer policy.
    pub signer: SignerConfig,

    /// Passphrase prompt behaviour.
    pub unlock: UnlockConfig,

    /// Explorer used for nonce lookups.
    pub nonce: NonceConfig,

    /// Request limits.
    pub security: SecurityConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "127.0.0.1:4567").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:4567".to_string(),
        }
    }
}

/// Signing key and transfer policy.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SignerConfig {
    /// Path to the encrypted key file.
    pub keyfile: String,

    /// Address of the key, used for nonce lookups.
    pub source: String,

    /// Allowed destination addresses.
    pub destinations: Vec<String>,

    /// Maximum value of a single transfer, in wei.
    pub transfer_limit_wei: Option<WeiAmount>,

    /// Fixed gas price in wei.
    pub gas_price: u64,

    /// Network identifier (main, sepolia, holesky, hoodi).
    pub network: String,
}

impl Default for SignerConfig {
    fn default() -> Self {
        Self {
            keyfile: String::new(),
            source: String::new(),
            destinations: Vec::new(),
            transfer_limit_wei: None,
            gas_price: 41_000_000_000,
            network: "main".to_string(),
        }
    }
}

/// Passphrase prompt configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UnlockConfig {
    /// Prompts before giving up; unset means keep asking.
    pub max_attempts: Option<u32>,

    /// Minimum time between prompt and answer, in milliseconds.
    pub min_human_delay_ms: u64,
}

impl Default for UnlockConfig {
    fn default() -> Self {
        Self {
            max_attempts: None,
            min_human_delay_ms: 1000,
        }
    }
}

impl UnlockConfig {
    pub fn settings(&self) -> UnlockSettings {
        UnlockSettings {
            max_attempts: self.max_attempts,
            min_human_delay: Duration::from_millis(self.min_human_delay_ms),
        }
    }
}

/// Nonce lookup configuration.
#[derive(Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct NonceConfig {
    /// Explorer API token.
    pub api_token: String,

    /// Lookup timeout in seconds.
    pub timeout_secs: u64,

    /// Overrides the network's explorer base URL.
    pub base_url: Option<String>,
}

impl Default for NonceConfig {
    fn default() -> Self {
        Self {
            api_token: String::new(),
            timeout_secs: 5,
            base_url: None,
        }
    }
}

impl std::fmt::Debug for NonceConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NonceConfig")
            .field("api_token", &"<redacted>")
            .field("timeout_secs", &self.timeout_secs)
            .field("base_url", &self.base_url)
            .finish()
    }
}

/// Request limits.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Maximum request body size in bytes.
    pub max_body_size: usize,

    /// Whole-request timeout in seconds.
    pub request_timeout_secs: u64,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            max_body_size: 16 * 1024,
            request_timeout_secs: 15,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable the Prometheus endpoint.
    pub metrics_enabled: bool,

    /// Prometheus endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}
