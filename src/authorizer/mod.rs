//! Signing-request authorization.
//!
//! # Data Flow
//! ```text
//! POST /sign body
//!     → request.rs (parse JSON, require fields, typed transfer)
//!     → pipeline.rs
//!         1. key unlocked?
//!         2. request well-formed?
//!         3. destination allowed?
//!         4. value within cap?
//!         5. nonce (supplied or explorer)
//!         6. draft (21000 gas, empty data)
//!         7. sign
//!     → SignedTransaction | AuthorizeError
//! ```
//!
//! # Design Decisions
//! - First failure short-circuits; nothing is signed unless every check passed
//! - No shared mutable state: requests run in parallel without locks

pub mod pipeline;
pub mod request;

pub use pipeline::{AuthorizeError, TransactionAuthorizer};
pub use request::{SigningRequest, Transfer};
