//! HTTP API subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, limits, timeout, tracing)
//!     → handlers.rs (GET /status, POST /sign)
//!     → authorizer (validate, policy, nonce, sign)
//!     → response.rs (uniform JSON envelope)
//!     → middleware.rs (envelope for router/layer rejections)
//!     → Send to client
//! ```
//!
//! # Design Decisions
//! - The listener is bound only after the key is unlocked, so every request
//!   sees a ready signer
//! - Error bodies never carry more than the failure reason

pub mod handlers;
pub mod middleware;
pub mod response;
pub mod server;

pub use response::{ApiError, ApiResponse};
pub use server::{AppState, HttpServer};
