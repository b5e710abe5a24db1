//! Blockchain integration subsystem.
//!
//! # Data Flow
//! ```text
//! authorized transfer
//!     → explorer.rs (next nonce: caller-supplied or block explorer lookup)
//!     → transaction.rs (legacy EIP-155 draft, sign, RLP encode)
//!     → SignedTransaction (raw bytes + hash, returned to the caller)
//! ```
//!
//! # Security Constraints
//! - Nothing is broadcast; the caller submits the raw transaction
//! - Explorer lookups have a bounded timeout and are never retried silently
//! - The explorer API token never appears in logs or error messages

pub mod explorer;
pub mod transaction;
pub mod types;

pub use explorer::NonceResolver;
pub use transaction::{SignedTransaction, TransactionDraft};
pub use types::{NonceError, WeiAmount, TRANSFER_GAS_LIMIT};
