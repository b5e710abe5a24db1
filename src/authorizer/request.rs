//! Signing request body.

use alloy::primitives::{Address, U256};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::value::RawValue;

use crate::authorizer::pipeline::AuthorizeError;
use crate::blockchain::WeiAmount;

/// A signing request as received from a client.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SigningRequest {
    #[serde(default)]
    pub destination: Option<String>,
    #[serde(default, deserialize_with = "wei_from_json")]
    pub wei: Option<WeiAmount>,
    #[serde(default)]
    pub nonce: Option<u64>,
}

/// A well-formed request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transfer {
    /// `None` when the text is not an address; such a destination can never
    /// be on the allow-list.
    pub destination: Option<Address>,
    /// Destination exactly as the client wrote it, for error messages.
    pub destination_text: String,
    pub value: U256,
    pub nonce: Option<u64>,
}

impl SigningRequest {
    pub fn new(destination: impl Into<String>, wei: impl Into<WeiAmount>) -> Self {
        Self {
            destination: Some(destination.into()),
            wei: Some(wei.into()),
            nonce: None,
        }
    }

    pub fn with_nonce(mut self, nonce: u64) -> Self {
        self.nonce = Some(nonce);
        self
    }

    /// Parse a JSON body.
    pub fn from_json(body: &[u8]) -> Result<Self, AuthorizeError> {
        serde_json::from_slice(body)
            .map_err(|e| AuthorizeError::Validation(format!("Malformed JSON request: {}", e)))
    }

    /// Check required fields and parse them.
    pub fn validate(&self) -> Result<Transfer, AuthorizeError> {
        let destination_text = self.destination.as_deref().ok_or_else(|| {
            AuthorizeError::Validation("Invalid request, missing destination".into())
        })?;
        let wei = self
            .wei
            .as_ref()
            .ok_or_else(|| AuthorizeError::Validation("Invalid request, missing wei".into()))?;

        let destination = destination_text.trim().parse::<Address>().ok();
        let value = wei.to_u256().ok_or_else(|| {
            AuthorizeError::Validation("Invalid request, wei must be a non-negative integer".into())
        })?;

        Ok(Transfer {
            destination,
            destination_text: destination_text.to_string(),
            value,
            nonce: self.nonce,
        })
    }
}

fn wei_from_json<'de, D>(deserializer: D) -> Result<Option<WeiAmount>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<Box<RawValue>> = Option::deserialize(deserializer)?;
    raw.map(|raw| WeiAmount::from_json_literal(raw.get()).map_err(serde::de::Error::custom))
        .transpose()
}
