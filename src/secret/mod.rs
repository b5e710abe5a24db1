//! Transient secret handling.
//!
//! # Data Flow
//! ```text
//! operator terminal (echo off)
//!     → prompt.rs (display prompt, timestamp, read)
//!     → buffer.rs (fixed-capacity storage, zeroed on every exit path)
//!     → keystore (decrypt attempt, then wipe)
//! ```
//!
//! # Design Decisions
//! - Input channel and clock are traits so unlock can run against scripted doubles
//! - Elapsed time is measured here but judged by the caller
//! - Secrets never implement Clone, Display or Serialize

pub mod buffer;
pub mod clock;
pub mod prompt;

pub use buffer::{SecretBuffer, MAX_SECRET_LEN};
pub use clock::{Clock, SystemClock};
pub use prompt::{ChannelError, PassphrasePrompt, SecretChannel, TerminalChannel};
