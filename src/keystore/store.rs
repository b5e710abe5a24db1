//! The single signing key and its unlock state machine.
//!
//! ```text
//! Locked ──unlock──▶ Unlocking ──▶ Unlocked   (terminal)
//!    │                   │
//!    └───────────────────┴────────▶ Failed     (terminal)
//! ```

use alloy::primitives::Address;
use alloy::signers::local::PrivateKeySigner;
use std::time::Duration;
use thiserror::Error;

use crate::blockchain::transaction::{SignedTransaction, TransactionDraft};
use crate::keystore::decrypt::{DecryptError, KeyDecryptor};
use crate::keystore::file::EncryptedKeyFile;
use crate::observability::metrics;
use crate::secret::{ChannelError, Clock, PassphrasePrompt, SecretBuffer, SecretChannel};

const TOO_FAST_NOTICE: &str = "[signatory] Passphrase entered too quickly, \
please wait at least a second after the prompt is shown";

/// Lifecycle of the key store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyState {
    Locked,
    Unlocking,
    Unlocked,
    Failed,
}

/// Startup-fatal unlock failures.
#[derive(Debug, Error)]
pub enum UnlockError {
    /// The key file opened with an empty passphrase.
    #[error(
        "Key is stored unencrypted and may have been compromised. \
         To avoid security risks you must always use an encrypted key"
    )]
    UnencryptedKey,

    #[error("passphrase channel failed: {0}")]
    Channel(#[from] ChannelError),

    #[error("key not unlocked after {0} attempts")]
    AttemptsExhausted(u32),

    #[error("unlock already ran (key store is {0:?})")]
    AlreadyAttempted(KeyState),
}

/// Errors producing a signature.
#[derive(Debug, Error)]
pub enum SignError {
    #[error("Key is locked, something went really wrong")]
    NotUnlocked,

    #[error("signer error: {0}")]
    Signer(#[from] alloy::signers::Error),
}

/// Parameters of the unlock loop.
#[derive(Debug, Clone)]
pub struct UnlockSettings {
    /// Give up after this many prompts; `None` keeps asking.
    pub max_attempts: Option<u32>,
    /// Answers faster than this are treated as scripted and refused.
    pub min_human_delay: Duration,
}

impl Default for UnlockSettings {
    fn default() -> Self {
        Self {
            max_attempts: None,
            min_human_delay: Duration::from_millis(1000),
        }
    }
}

/// The decrypted private key.
///
/// The inner k256 signing key zeroes itself on drop.
pub struct UnlockedKey {
    signer: PrivateKeySigner,
}

impl UnlockedKey {
    fn new(signer: PrivateKeySigner) -> Self {
        Self { signer }
    }

    pub fn address(&self) -> Address {
        self.signer.address()
    }

    fn sign(&self, draft: &TransactionDraft) -> Result<SignedTransaction, SignError> {
        Ok(draft.sign(&self.signer)?)
    }
}

impl std::fmt::Debug for UnlockedKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UnlockedKey")
            .field("address", &self.address())
            .finish_non_exhaustive()
    }
}

/// Outcome of a single prompt.
enum Attempt {
    Unlocked(UnlockedKey),
    TooFast(Duration),
    Rejected(DecryptError),
}

enum Slot {
    Locked,
    Unlocking,
    Unlocked(UnlockedKey),
    Failed,
}

/// Owner of the process signing key.
pub struct KeyStore {
    slot: Slot,
}

impl KeyStore {
    pub fn new() -> Self {
        Self { slot: Slot::Locked }
    }

    pub fn state(&self) -> KeyState {
        match self.slot {
            Slot::Locked => KeyState::Locked,
            Slot::Unlocking => KeyState::Unlocking,
            Slot::Unlocked(_) => KeyState::Unlocked,
            Slot::Failed => KeyState::Failed,
        }
    }

    pub fn is_unlocked(&self) -> bool {
        matches!(self.slot, Slot::Unlocked(_))
    }

    /// Address of the unlocked key.
    pub fn address(&self) -> Option<Address> {
        match &self.slot {
            Slot::Unlocked(key) => Some(key.address()),
            _ => None,
        }
    }

    /// Run the blocking unlock loop against `file`.
    ///
    /// Refuses a file that opens with an empty passphrase before any prompt is
    /// shown. Answers quicker than `settings.min_human_delay` are refused
    /// without attempting decryption. Wrong passphrases are reported and
    /// retried; a failing channel aborts.
    pub fn unlock<C, K, D>(
        &mut self,
        file: &EncryptedKeyFile,
        prompt: &mut PassphrasePrompt<C, K>,
        decryptor: &D,
        settings: &UnlockSettings,
    ) -> Result<Address, UnlockError>
    where
        C: SecretChannel,
        K: Clock,
        D: KeyDecryptor + ?Sized,
    {
        let state = self.state();
        if state != KeyState::Locked {
            return Err(UnlockError::AlreadyAttempted(state));
        }

        if decryptor.decrypt(file, b"").is_ok() {
            tracing::error!(
                keyfile = %file.path().display(),
                "Key file is not encrypted, refusing to start"
            );
            self.slot = Slot::Failed;
            return Err(UnlockError::UnencryptedKey);
        }

        self.slot = Slot::Unlocking;
        let prompt_text = format!(
            "[signatory] Enter passphrase to unlock key '{}': ",
            file.path().display()
        );

        let mut attempts = 0u32;
        loop {
            if let Some(max) = settings.max_attempts {
                if attempts >= max {
                    tracing::error!(attempts = attempts, "Giving up on key unlock");
                    self.slot = Slot::Failed;
                    return Err(UnlockError::AttemptsExhausted(max));
                }
            }
            attempts += 1;

            let outcome = Self::attempt(file, prompt, decryptor, settings, &prompt_text)
                .and_then(|attempt| Self::report(prompt, attempt));

            match outcome {
                Ok(Some(key)) => {
                    let address = key.address();
                    tracing::info!(address = %address, attempts = attempts, "Key unlocked");
                    metrics::set_key_unlocked(true);
                    self.slot = Slot::Unlocked(key);
                    return Ok(address);
                }
                Ok(None) => continue,
                Err(e) => {
                    tracing::error!(error = %e, "Passphrase channel failed");
                    self.slot = Slot::Failed;
                    return Err(e.into());
                }
            }
        }
    }

    fn attempt<C, K, D>(
        file: &EncryptedKeyFile,
        prompt: &mut PassphrasePrompt<C, K>,
        decryptor: &D,
        settings: &UnlockSettings,
        prompt_text: &str,
    ) -> Result<Attempt, ChannelError>
    where
        C: SecretChannel,
        K: Clock,
        D: KeyDecryptor + ?Sized,
    {
        let (mut secret, elapsed) = prompt.acquire(prompt_text)?;
        Ok(Self::evaluate(file, decryptor, settings, &mut secret, elapsed))
    }

    /// Judge one answer. `secret` is wiped before returning, whatever the outcome.
    fn evaluate<D>(
        file: &EncryptedKeyFile,
        decryptor: &D,
        settings: &UnlockSettings,
        secret: &mut SecretBuffer,
        elapsed: Duration,
    ) -> Attempt
    where
        D: KeyDecryptor + ?Sized,
    {
        let outcome = if elapsed < settings.min_human_delay {
            Attempt::TooFast(elapsed)
        } else {
            match decryptor.decrypt(file, secret.expose()) {
                Ok(signer) => Attempt::Unlocked(UnlockedKey::new(signer)),
                Err(e) => Attempt::Rejected(e),
            }
        };

        secret.wipe();
        outcome
    }

    fn report<C, K>(
        prompt: &mut PassphrasePrompt<C, K>,
        attempt: Attempt,
    ) -> Result<Option<UnlockedKey>, ChannelError>
    where
        C: SecretChannel,
        K: Clock,
    {
        match attempt {
            Attempt::Unlocked(key) => {
                metrics::record_unlock_attempt("unlocked");
                Ok(Some(key))
            }
            Attempt::TooFast(elapsed) => {
                metrics::record_unlock_attempt("too_fast");
                tracing::warn!(
                    elapsed_ms = elapsed.as_millis() as u64,
                    "Passphrase entered too quickly"
                );
                prompt.notify(TOO_FAST_NOTICE)?;
                Ok(None)
            }
            Attempt::Rejected(err) => {
                metrics::record_unlock_attempt("rejected");
                tracing::warn!(error = %err, "Key unlock attempt failed");
                prompt.notify(&format!("[signatory] Error unlocking key: {}", err))?;
                Ok(None)
            }
        }
    }

    /// Sign `draft` with the unlocked key.
    pub fn sign(&self, draft: &TransactionDraft) -> Result<SignedTransaction, SignError> {
        match &self.slot {
            Slot::Unlocked(key) => key.sign(draft),
            _ => Err(SignError::NotUnlocked),
        }
    }
}

impl Default for KeyStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for KeyStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyStore")
            .field("state", &self.state())
            .field("address", &self.address())
            .finish()
    }
}
