//! Shared chain types and error definitions.

use alloy::primitives::U256;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Gas limit of a plain value transfer with no calldata.
pub const TRANSFER_GAS_LIMIT: u64 = 21_000;

/// An amount of wei as written by humans: a JSON/TOML integer or a
/// decimal (or `0x` hex) string for values beyond 64 bits.
///
/// A JSON number literal wider than `u64` is kept verbatim as `Text`; see
/// [`WeiAmount::from_json_literal`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WeiAmount {
    Number(u64),
    Text(String),
}

impl WeiAmount {
    /// The amount as a 256-bit integer.
    ///
    /// Text must be `[0-9]+` or `0x[0-9a-fA-F]+`; anything else (signs,
    /// `0b`/`0o` prefixes, separators, a bare `0x`) is `None`.
    pub fn to_u256(&self) -> Option<U256> {
        match self {
            WeiAmount::Number(n) => Some(U256::from(*n)),
            WeiAmount::Text(s) => parse_wei_text(s.trim()),
        }
    }

    /// Build from the raw text of a JSON value.
    ///
    /// serde_json reads integers beyond `u64` as lossy floats, so number
    /// literals are taken from the source text instead.
    pub fn from_json_literal(raw: &str) -> Result<Self, String> {
        let raw = raw.trim();
        match raw.as_bytes().first() {
            Some(b'"') => serde_json::from_str::<String>(raw)
                .map(WeiAmount::Text)
                .map_err(|e| e.to_string()),
            Some(b'-' | b'0'..=b'9') => Ok(match raw.parse::<u64>() {
                Ok(n) => WeiAmount::Number(n),
                Err(_) => WeiAmount::Text(raw.to_string()),
            }),
            _ => Err("wei must be an integer or a string".to_string()),
        }
    }
}

fn parse_wei_text(s: &str) -> Option<U256> {
    let (digits, radix) = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => (hex, 16),
        None => (s, 10),
    };
    let valid = !digits.is_empty()
        && digits.bytes().all(|b| match radix {
            16 => b.is_ascii_hexdigit(),
            _ => b.is_ascii_digit(),
        });
    if !valid {
        return None;
    }
    U256::from_str_radix(digits, radix).ok()
}

impl From<u64> for WeiAmount {
    fn from(n: u64) -> Self {
        WeiAmount::Number(n)
    }
}

/// Errors resolving the next nonce of the source address.
#[derive(Debug, Error)]
pub enum NonceError {
    /// The explorer did not answer in time.
    #[error("nonce lookup timed out after {0} seconds")]
    Timeout(u64),

    /// Connection or protocol failure talking to the explorer.
    #[error("nonce lookup failed: {0}")]
    Transport(String),

    /// The explorer answered with a non-success HTTP status.
    #[error("nonce service returned HTTP {0}")]
    Status(u16),

    /// The body was not a JSON-RPC 2.0 envelope with a string result.
    #[error("unexpected nonce service response: {0}")]
    Envelope(String),

    /// The result was not a hex quantity.
    #[error("invalid transaction count {0:?}")]
    InvalidCount(String),
}

/// Parse a JSON-RPC hex quantity such as `0x1a`.
pub fn parse_hex_quantity(value: &str) -> Option<u64> {
    let digits = value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))?;
    if digits.is_empty() {
        return None;
    }
    u64::from_str_radix(digits, 16).ok()
}
