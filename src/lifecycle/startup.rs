//! Startup orchestration.
//!
//! # Responsibilities
//! - Turn a loaded configuration into a transfer policy and key file
//! - Run the interactive unlock and check the key against the configured
//!   source address
//! - Assemble the authorizer the HTTP layer serves
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Unlock is blocking; callers run it off the async runtime
//! - A key that does not match `source` is dropped (and zeroed) before the
//!   error is returned

use alloy::primitives::Address;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use url::Url;

use crate::authorizer::TransactionAuthorizer;
use crate::blockchain::{NonceError, NonceResolver};
use crate::config::{build_policy, ConfigError, NonceConfig, SignatoryConfig, ValidationError};
use crate::keystore::{
    EncryptedKeyFile, KeyDecryptor, KeyFileError, KeyStore, UnlockError, UnlockSettings,
};
use crate::policy::TransferPolicy;
use crate::secret::{Clock, PassphrasePrompt, SecretChannel};

/// Errors that abort startup.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("key file error: {0}")]
    KeyFile(#[from] KeyFileError),

    #[error("unlock failed: {0}")]
    Unlock(#[from] UnlockError),

    #[error("unlocked key {unlocked} does not match configured source {configured}")]
    SourceMismatch {
        configured: Address,
        unlocked: Address,
    },

    #[error("nonce resolver: {0}")]
    Nonce(#[from] NonceError),

    #[error("metrics exporter: {0}")]
    Metrics(#[from] metrics_exporter_prometheus::BuildError),

    #[error("unlock task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Everything derived from configuration before the key is touched.
#[derive(Debug)]
pub struct Prepared {
    pub config: SignatoryConfig,
    pub policy: TransferPolicy,
    pub key_file: EncryptedKeyFile,
}

/// Build the policy and read the key file.
pub fn prepare(config: SignatoryConfig) -> Result<Prepared, StartupError> {
    let policy = build_policy(&config.signer).map_err(ConfigError::Validation)?;
    let key_file = EncryptedKeyFile::load(&config.signer.keyfile)?;

    tracing::info!(
        source = %policy.source(),
        network = %policy.network(),
        destinations = policy.allowed_destinations().len(),
        max_value_wei = %policy.max_value_wei(),
        keyfile = %key_file.path().display(),
        "Configuration loaded"
    );

    Ok(Prepared {
        config,
        policy,
        key_file,
    })
}

/// Unlock the key and require that it controls `source`.
pub fn unlock_key<C, K, D>(
    key_file: &EncryptedKeyFile,
    source: Address,
    prompt: &mut PassphrasePrompt<C, K>,
    decryptor: &D,
    settings: &UnlockSettings,
) -> Result<KeyStore, StartupError>
where
    C: SecretChannel,
    K: Clock,
    D: KeyDecryptor + ?Sized,
{
    let mut store = KeyStore::new();
    let unlocked = store.unlock(key_file, prompt, decryptor, settings)?;

    if unlocked != source {
        tracing::error!(
            configured = %source,
            unlocked = %unlocked,
            "Key does not control the source address"
        );
        return Err(StartupError::SourceMismatch {
            configured: source,
            unlocked,
        });
    }

    if let Err(e) = prompt.notify("[signatory] Key unlocked") {
        tracing::debug!(error = %e, "Could not confirm unlock on the secret channel");
    }
    Ok(store)
}

/// Assemble the authorizer from an unlocked key store.
pub fn build_authorizer(
    store: KeyStore,
    policy: TransferPolicy,
    nonce: &NonceConfig,
) -> Result<TransactionAuthorizer, StartupError> {
    let base_url = match &nonce.base_url {
        Some(raw) => Some(Url::parse(raw).map_err(|e| {
            ConfigError::Validation(vec![ValidationError::new("nonce.base_url", e.to_string())])
        })?),
        None => None,
    };

    let resolver = NonceResolver::new(
        nonce.api_token.clone(),
        Duration::from_secs(nonce.timeout_secs),
        base_url,
    )?;

    Ok(TransactionAuthorizer::new(
        Arc::new(store),
        Arc::new(policy),
        resolver,
    ))
}
