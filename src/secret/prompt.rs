//! Interactive passphrase acquisition.
//!
//! # Responsibilities
//! - Show the unlock prompt to the operator
//! - Read one line with terminal echo disabled
//! - Report how long the operator took to answer
//!
//! # Design Decisions
//! - Non-interactive input is refused rather than read with echo on
//! - The elapsed time is a heuristic input for the key store, not enforced here

use std::io::{self, IsTerminal, Write};
use std::time::Duration;
use thiserror::Error;
use zeroize::Zeroize;

use crate::secret::buffer::SecretBuffer;
use crate::secret::clock::{Clock, SystemClock};

/// Failure of the operator input channel itself (not a wrong passphrase).
#[derive(Debug, Error)]
pub enum ChannelError {
    /// The channel cannot suppress echo, e.g. stdin is a pipe.
    #[error("input channel does not support echo suppression: {0}")]
    NotInteractive(String),

    /// Reading from or writing to the channel failed.
    #[error("input channel failed: {0}")]
    Io(#[from] io::Error),
}

/// A line-oriented channel able to read input without echoing it.
pub trait SecretChannel {
    /// Write `text` to the operator as-is.
    fn display(&mut self, text: &str) -> io::Result<()>;

    /// Read one line with echo suppressed.
    fn read_hidden(&mut self) -> Result<SecretBuffer, ChannelError>;
}

/// The controlling terminal, via `rpassword`.
///
/// Prompts go to stderr so they never mix with structured logs on stdout.
#[derive(Debug, Default)]
pub struct TerminalChannel;

impl SecretChannel for TerminalChannel {
    fn display(&mut self, text: &str) -> io::Result<()> {
        let mut stderr = io::stderr().lock();
        stderr.write_all(text.as_bytes())?;
        stderr.flush()
    }

    fn read_hidden(&mut self) -> Result<SecretBuffer, ChannelError> {
        if !io::stdin().is_terminal() {
            return Err(ChannelError::NotInteractive(
                "stdin is not a terminal".to_string(),
            ));
        }

        let mut line = rpassword::read_password()?;
        let captured = SecretBuffer::capture(&mut line.as_bytes());
        line.zeroize();
        Ok(captured?)
    }
}

/// Prompts for a passphrase and times the answer.
pub struct PassphrasePrompt<C, K = SystemClock> {
    channel: C,
    clock: K,
}

impl<C: SecretChannel> PassphrasePrompt<C, SystemClock> {
    pub fn new(channel: C) -> Self {
        Self::with_clock(channel, SystemClock)
    }
}

impl<C: SecretChannel, K: Clock> PassphrasePrompt<C, K> {
    pub fn with_clock(channel: C, clock: K) -> Self {
        Self { channel, clock }
    }

    /// Display `prompt_text`, read the secret, and return it with the time
    /// elapsed between the prompt being shown and input completing.
    pub fn acquire(&mut self, prompt_text: &str) -> Result<(SecretBuffer, Duration), ChannelError> {
        self.channel.display(prompt_text)?;
        let shown_at = self.clock.now();

        let secret = self.channel.read_hidden()?;
        let entered_at = self.clock.now();

        Ok((secret, entered_at.saturating_duration_since(shown_at)))
    }

    /// Print a one-line notice to the operator.
    pub fn notify(&mut self, message: &str) -> Result<(), ChannelError> {
        self.channel.display(&format!("{}\n", message))?;
        Ok(())
    }

    pub fn channel(&self) -> &C {
        &self.channel
    }
}
