//! The authorization pipeline.

use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;

use crate::authorizer::request::SigningRequest;
use crate::blockchain::{NonceError, NonceResolver, SignedTransaction, TransactionDraft};
use crate::keystore::{KeyStore, SignError};
use crate::observability::metrics;
use crate::policy::{PolicyViolation, TransferPolicy};

/// Why a signing request was not fulfilled.
#[derive(Debug, Error)]
pub enum AuthorizeError {
    /// Malformed body or missing field.
    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Policy(#[from] PolicyViolation),

    #[error(transparent)]
    Nonce(#[from] NonceError),

    /// The key store is not unlocked; startup gating should make this unreachable.
    #[error("Key is locked, something went really wrong")]
    NotUnlocked,

    #[error("Signing failed: {0}")]
    Signing(String),
}

impl AuthorizeError {
    /// True for failures caused by the request itself (422),
    /// false for internal or dependency failures (500).
    pub fn is_client_error(&self) -> bool {
        matches!(self, AuthorizeError::Validation(_) | AuthorizeError::Policy(_))
    }

    /// Metric label.
    pub fn outcome(&self) -> &'static str {
        match self {
            AuthorizeError::Validation(_) => "validation",
            AuthorizeError::Policy(_) => "policy",
            AuthorizeError::Nonce(_) => "nonce",
            AuthorizeError::NotUnlocked => "not_unlocked",
            AuthorizeError::Signing(_) => "signing",
        }
    }
}

impl From<SignError> for AuthorizeError {
    fn from(err: SignError) -> Self {
        match err {
            SignError::NotUnlocked => AuthorizeError::NotUnlocked,
            SignError::Signer(e) => AuthorizeError::Signing(e.to_string()),
        }
    }
}

/// Checks signing requests against the policy and signs the ones that pass.
pub struct TransactionAuthorizer {
    keystore: Arc<KeyStore>,
    policy: Arc<TransferPolicy>,
    nonces: NonceResolver,
}

impl TransactionAuthorizer {
    pub fn new(
        keystore: Arc<KeyStore>,
        policy: Arc<TransferPolicy>,
        nonces: NonceResolver,
    ) -> Self {
        Self {
            keystore,
            policy,
            nonces,
        }
    }

    pub fn keystore(&self) -> &KeyStore {
        &self.keystore
    }

    pub fn policy(&self) -> &TransferPolicy {
        &self.policy
    }

    pub fn nonces(&self) -> &NonceResolver {
        &self.nonces
    }

    /// Authorize and sign a parsed request.
    pub async fn authorize(
        &self,
        request: SigningRequest,
    ) -> Result<SignedTransaction, AuthorizeError> {
        let started = Instant::now();
        let result = self.run(request).await;
        self.observe(&result, started);
        result
    }

    /// Authorize a raw JSON body. The key check runs before the body is parsed.
    pub async fn authorize_json(&self, body: &[u8]) -> Result<SignedTransaction, AuthorizeError> {
        let started = Instant::now();
        let result = match self.require_unlocked().and_then(|_| SigningRequest::from_json(body)) {
            Ok(request) => self.run(request).await,
            Err(e) => Err(e),
        };
        self.observe(&result, started);
        result
    }

    fn require_unlocked(&self) -> Result<(), AuthorizeError> {
        if self.keystore.is_unlocked() {
            Ok(())
        } else {
            Err(AuthorizeError::NotUnlocked)
        }
    }

    async fn run(&self, request: SigningRequest) -> Result<SignedTransaction, AuthorizeError> {
        self.require_unlocked()?;
        let transfer = request.validate()?;

        let destination = match transfer.destination {
            Some(address) if self.policy.allows_destination(&address) => address,
            _ => {
                return Err(
                    PolicyViolation::DestinationNotAllowed(transfer.destination_text).into(),
                )
            }
        };

        let cap = self.policy.max_value_wei();
        if transfer.value > cap {
            return Err(PolicyViolation::ValueAboveCap(cap).into());
        }

        let nonce = self
            .nonces
            .resolve(self.policy.source(), self.policy.network(), transfer.nonce)
            .await?;

        let draft = TransactionDraft::transfer(
            destination,
            transfer.value,
            nonce,
            self.policy.gas_price(),
            self.policy.network().chain_id(),
        );
        let signed = self.keystore.sign(&draft)?;

        tracing::info!(
            destination = %destination,
            wei = %transfer.value,
            nonce = nonce,
            hash = %signed.hash,
            "Transaction signed"
        );
        Ok(signed)
    }

    fn observe(&self, result: &Result<SignedTransaction, AuthorizeError>, started: Instant) {
        let outcome = match result {
            Ok(_) => "signed",
            Err(e) => {
                if e.is_client_error() {
                    tracing::warn!(reason = %e, "Signing request rejected");
                } else {
                    tracing::error!(reason = %e, "Signing request failed");
                }
                e.outcome()
            }
        };
        metrics::record_sign_outcome(outcome, started);
    }
}

impl std::fmt::Debug for TransactionAuthorizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransactionAuthorizer")
            .field("keystore", &self.keystore)
            .field("policy", &self.policy)
            .field("nonces", &self.nonces)
            .finish()
    }
}
