//! Key custody subsystem.
//!
//! # Data Flow
//! ```text
//! keyfile path (config)
//!     → file.rs (read once, check container format)
//!     → store.rs unlock loop (reject unencrypted, prompt, timing guard)
//!     → decrypt.rs (Web3 Secret Storage decryption)
//!     → UnlockedKey (held by KeyStore until shutdown)
//! ```
//!
//! # Security Constraints
//! - Exactly one key per process, unlocked once at startup
//! - The decrypted key never leaves the store; callers get a signing capability
//! - Passphrase buffers are wiped after every attempt

pub mod decrypt;
pub mod file;
pub mod store;

pub use decrypt::{DecryptError, KeyDecryptor, Web3KeystoreDecryptor};
pub use file::{EncryptedKeyFile, KeyFileError};
pub use store::{KeyState, KeyStore, SignError, UnlockError, UnlockSettings, UnlockedKey};
