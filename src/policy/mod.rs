//! Transfer authorization policy.
//!
//! # Responsibilities
//! - Hold the destination allow-list, value cap, gas price and network
//! - Refuse to exist in a partially configured state
//!
//! # Design Decisions
//! - Built once from validated config and shared read-only via Arc
//! - Addresses are compared as bytes, so checksum casing never matters

pub mod network;
pub mod transfer;

pub use network::{Network, UnknownNetwork};
pub use transfer::{PolicyError, PolicyViolation, TransferPolicy};
