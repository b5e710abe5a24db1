//! Hot-wallet signing service library.

pub mod authorizer;
pub mod blockchain;
pub mod config;
pub mod http;
pub mod keystore;
pub mod lifecycle;
pub mod observability;
pub mod policy;
pub mod secret;

pub use authorizer::{AuthorizeError, SigningRequest, TransactionAuthorizer};
pub use config::schema::SignatoryConfig;
pub use http::HttpServer;
pub use keystore::KeyStore;
pub use lifecycle::Shutdown;
pub use policy::TransferPolicy;
