//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks, all problems reported at once)
//!     → SignatoryConfig (validated, immutable)
//!     → TransferPolicy + unlock/nonce settings
//! ```
//!
//! # Design Decisions
//! - Config is read once before unlock; there is no reload
//! - Operational sections have defaults; the signer section does not
//! - Any validation failure is fatal: no partial-policy operating mode

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{
    ListenerConfig, NonceConfig, ObservabilityConfig, SecurityConfig, SignatoryConfig,
    SignerConfig, UnlockConfig,
};
pub use validation::{build_policy, validate_config, ValidationError};
