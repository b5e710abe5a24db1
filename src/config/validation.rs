//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Parse addresses, amounts, and the network identifier
//! - Validate value ranges (timeouts > 0, request timeout above lookup timeout)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Policy construction shares the same checks, so a validated config
//!   always yields a usable policy

use alloy::primitives::{Address, U256};
use std::net::SocketAddr;
use url::Url;

use crate::config::schema::{SignatoryConfig, SignerConfig};
use crate::policy::{Network, TransferPolicy};

/// A single configuration problem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path of the offending key.
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate the whole configuration.
pub fn validate_config(config: &SignatoryConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = match build_policy(&config.signer) {
        Ok(_) => Vec::new(),
        Err(errors) => errors,
    };

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("'{}' is not a socket address", config.listener.bind_address),
        ));
    }

    if config.unlock.max_attempts == Some(0) {
        errors.push(ValidationError::new("unlock.max_attempts", "must be at least 1"));
    }

    if config.nonce.timeout_secs == 0 {
        errors.push(ValidationError::new("nonce.timeout_secs", "must be greater than 0"));
    }
    if let Some(base_url) = &config.nonce.base_url {
        if Url::parse(base_url).is_err() {
            errors.push(ValidationError::new(
                "nonce.base_url",
                format!("'{}' is not a URL", base_url),
            ));
        }
    }

    if config.security.max_body_size == 0 {
        errors.push(ValidationError::new("security.max_body_size", "must be greater than 0"));
    }
    if config.security.request_timeout_secs <= config.nonce.timeout_secs {
        errors.push(ValidationError::new(
            "security.request_timeout_secs",
            "must be greater than nonce.timeout_secs",
        ));
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("'{}' is not a socket address", config.observability.metrics_address),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Build the transfer policy from the signer section.
pub fn build_policy(signer: &SignerConfig) -> Result<TransferPolicy, Vec<ValidationError>> {
    let mut errors = Vec::new();

    if signer.keyfile.trim().is_empty() {
        errors.push(ValidationError::new("signer.keyfile", "You must specify a keyfile"));
    }

    let source = if signer.source.trim().is_empty() {
        errors.push(ValidationError::new(
            "signer.source",
            "You must specify a source ETH address",
        ));
        None
    } else {
        match signer.source.trim().parse::<Address>() {
            Ok(address) => Some(address),
            Err(_) => {
                errors.push(ValidationError::new(
                    "signer.source",
                    format!("'{}' is not an address", signer.source),
                ));
                None
            }
        }
    };

    let mut destinations = Vec::with_capacity(signer.destinations.len());
    if signer.destinations.is_empty() {
        errors.push(ValidationError::new(
            "signer.destinations",
            "You must specify a list of allowed destinations",
        ));
    }
    for destination in &signer.destinations {
        match destination.trim().parse::<Address>() {
            Ok(address) => destinations.push(address),
            Err(_) => errors.push(ValidationError::new(
                "signer.destinations",
                format!("'{}' is not an address", destination),
            )),
        }
    }

    let limit = match signer.transfer_limit_wei.as_ref().map(|w| w.to_u256()) {
        Some(Some(limit)) if limit > U256::ZERO => Some(limit),
        Some(Some(_)) | None => {
            errors.push(ValidationError::new(
                "signer.transfer_limit_wei",
                "You must specify a maximum wei transfer limit",
            ));
            None
        }
        Some(None) => {
            errors.push(ValidationError::new(
                "signer.transfer_limit_wei",
                "must be a non-negative integer",
            ));
            None
        }
    };

    let network = match signer.network.parse::<Network>() {
        Ok(network) => Some(network),
        Err(e) => {
            errors.push(ValidationError::new("signer.network", e.to_string()));
            None
        }
    };

    match (source, limit, network) {
        (Some(source), Some(limit), Some(network)) if errors.is_empty() => TransferPolicy::new(
            source,
            destinations,
            limit,
            u128::from(signer.gas_price),
            network,
        )
        .map_err(|e| vec![ValidationError::new("signer", e.to_string())]),
        _ => Err(errors),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::WeiAmount;

    fn valid() -> SignatoryConfig {
        let mut config = SignatoryConfig::default();
        config.signer.keyfile = "keys/hot.json".into();
        config.signer.source = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266".into();
        config.signer.destinations = vec!["0x70997970C51812dc3A010C7d01b50e0d17dc79C8".into()];
        config.signer.transfer_limit_wei = Some(WeiAmount::Number(1000));
        config
    }

    fn fields(config: &SignatoryConfig) -> Vec<&'static str> {
        validate_config(config)
            .unwrap_err()
            .into_iter()
            .map(|e| e.field)
            .collect()
    }

    #[test]
    fn test_valid_config() {
        assert!(validate_config(&valid()).is_ok());
        let policy = build_policy(&valid().signer).unwrap();
        assert_eq!(policy.network(), Network::Main);
        assert_eq!(policy.max_value_wei(), U256::from(1000u64));
        assert_eq!(policy.gas_price(), 41_000_000_000);
    }

    #[test]
    fn test_zero_limit() {
        let mut config = valid();
        config.signer.transfer_limit_wei = Some(WeiAmount::Text("0".into()));
        assert_eq!(fields(&config), vec!["signer.transfer_limit_wei"]);
    }

    #[test]
    fn test_limit_with_unsupported_notation() {
        for text in ["0x", "0b11", "0o7", "1_000"] {
            let mut config = valid();
            config.signer.transfer_limit_wei = Some(WeiAmount::Text(text.into()));
            let errors = validate_config(&config).unwrap_err();
            assert_eq!(errors.len(), 1, "{}", text);
            assert_eq!(errors[0].field, "signer.transfer_limit_wei");
            assert_eq!(errors[0].message, "must be a non-negative integer");
        }

        let mut config = valid();
        config.signer.transfer_limit_wei = Some(WeiAmount::Text("0x3e8".into()));
        assert_eq!(build_policy(&config.signer).unwrap().max_value_wei(), U256::from(1000u64));
    }

    #[test]
    fn test_unknown_network() {
        let mut config = valid();
        config.signer.network = "ropsten".into();
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.contains("ropsten"));
    }

    #[test]
    fn test_bad_destination_entry() {
        let mut config = valid();
        config.signer.destinations.push("not-an-address".into());
        assert_eq!(fields(&config), vec!["signer.destinations"]);
    }

    #[test]
    fn test_timeouts() {
        let mut config = valid();
        config.nonce.timeout_secs = 0;
        assert!(fields(&config).contains(&"nonce.timeout_secs"));

        let mut config = valid();
        config.nonce.timeout_secs = 30;
        config.security.request_timeout_secs = 30;
        assert_eq!(fields(&config), vec!["security.request_timeout_secs"]);
    }

    #[test]
    fn test_listener_address() {
        let mut config = valid();
        config.listener.bind_address = "localhost".into();
        assert_eq!(fields(&config), vec!["listener.bind_address"]);
    }

    #[test]
    fn test_zero_attempts() {
        let mut config = valid();
        config.unlock.max_attempts = Some(0);
        assert_eq!(fields(&config), vec!["unlock.max_attempts"]);
    }
}
