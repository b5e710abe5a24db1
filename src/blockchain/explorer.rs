//! Nonce resolution against a block explorer's JSON-RPC proxy.
//!
//! # Responsibilities
//! - Honour a caller-supplied nonce without touching the network
//! - Otherwise ask the network's explorer for `eth_getTransactionCount`
//! - Bound the lookup with a timeout and classify every failure
//!
//! # Design Decisions
//! - No caching and no retries: a failed lookup fails the signing request
//! - Supplied nonces are not cross-checked against chain state

use alloy::primitives::Address;
use serde::Deserialize;
use std::time::Duration;
use url::Url;

use crate::blockchain::types::{parse_hex_quantity, NonceError};
use crate::observability::metrics;
use crate::policy::Network;

/// JSON-RPC envelope returned by the explorer proxy module.
#[derive(Debug, Deserialize)]
struct ProxyEnvelope {
    jsonrpc: Option<String>,
    result: Option<serde_json::Value>,
}

/// Resolves the next nonce for the source address.
pub struct NonceResolver {
    client: reqwest::Client,
    api_token: String,
    base_url: Option<Url>,
    timeout: Duration,
}

impl NonceResolver {
    /// Create a resolver.
    ///
    /// # Arguments
    /// * `api_token` - Explorer API key sent as `apikey`
    /// * `timeout` - Upper bound for a single lookup
    /// * `base_url` - Replaces the network's fixed explorer endpoint when set
    pub fn new(
        api_token: String,
        timeout: Duration,
        base_url: Option<Url>,
    ) -> Result<Self, NonceError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| NonceError::Transport(e.without_url().to_string()))?;

        Ok(Self {
            client,
            api_token,
            base_url,
            timeout,
        })
    }

    /// The nonce for the next transaction from `source`.
    pub async fn resolve(
        &self,
        source: Address,
        network: Network,
        supplied: Option<u64>,
    ) -> Result<u64, NonceError> {
        if let Some(nonce) = supplied {
            tracing::warn!(
                nonce = nonce,
                "Using caller-supplied nonce without checking chain state"
            );
            return Ok(nonce);
        }

        let result = self.fetch_transaction_count(source, network).await;
        metrics::record_nonce_lookup(network, result.is_ok());

        match &result {
            Ok(nonce) => tracing::debug!(
                address = %source,
                network = %network,
                nonce = nonce,
                "Resolved nonce"
            ),
            Err(e) => tracing::warn!(
                address = %source,
                network = %network,
                error = %e,
                "Nonce lookup failed"
            ),
        }
        result
    }

    /// URL of the `/api` endpoint for `network`.
    pub fn endpoint(&self, network: Network) -> Result<Url, NonceError> {
        let base = match &self.base_url {
            Some(url) => url.as_str().to_string(),
            None => network.explorer_base_url().to_string(),
        };
        let endpoint = format!("{}/api", base.trim_end_matches('/'));
        Url::parse(&endpoint)
            .map_err(|e| NonceError::Transport(format!("invalid explorer URL: {}", e)))
    }

    async fn fetch_transaction_count(
        &self,
        source: Address,
        network: Network,
    ) -> Result<u64, NonceError> {
        let endpoint = self.endpoint(network)?;
        let address = source.to_string();

        let response = self
            .client
            .get(endpoint)
            .query(&[
                ("module", "proxy"),
                ("action", "eth_getTransactionCount"),
                ("address", address.as_str()),
                ("tag", "latest"),
                ("apikey", self.api_token.as_str()),
            ])
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(NonceError::Status(status.as_u16()));
        }

        let body = response.bytes().await.map_err(|e| self.classify(e))?;
        parse_transaction_count(&body)
    }

    // reqwest errors carry the request URL, which includes the API key
    fn classify(&self, err: reqwest::Error) -> NonceError {
        if err.is_timeout() {
            NonceError::Timeout(self.timeout.as_secs())
        } else {
            NonceError::Transport(err.without_url().to_string())
        }
    }
}

impl std::fmt::Debug for NonceResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NonceResolver")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .field("api_token", &"<redacted>")
            .finish()
    }
}

/// Extract the transaction count from an explorer response body.
fn parse_transaction_count(body: &[u8]) -> Result<u64, NonceError> {
    let envelope: ProxyEnvelope = serde_json::from_slice(body)
        .map_err(|e| NonceError::Envelope(format!("not JSON: {}", e)))?;

    if envelope.jsonrpc.as_deref() != Some("2.0") {
        return Err(NonceError::Envelope(format!(
            "expected jsonrpc \"2.0\", got {:?}",
            envelope.jsonrpc
        )));
    }

    match envelope.result {
        Some(serde_json::Value::String(count)) => {
            parse_hex_quantity(&count).ok_or(NonceError::InvalidCount(count))
        }
        other => Err(NonceError::Envelope(format!(
            "result is not a string: {:?}",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolver(base: &str) -> NonceResolver {
        NonceResolver::new(
            "secret-token".into(),
            Duration::from_secs(2),
            Some(base.parse().unwrap()),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_supplied_nonce_skips_network() {
        // nothing listens on port 9; a lookup would fail
        let resolver = resolver("http://127.0.0.1:9");
        let nonce = resolver
            .resolve(Address::ZERO, Network::Main, Some(7))
            .await
            .unwrap();
        assert_eq!(nonce, 7);
    }

    #[tokio::test]
    async fn test_unreachable_explorer_is_an_error() {
        let resolver = resolver("http://127.0.0.1:9");
        let err = resolver
            .resolve(Address::ZERO, Network::Main, None)
            .await
            .unwrap_err();
        assert!(matches!(err, NonceError::Transport(_) | NonceError::Timeout(_)));
        assert!(!err.to_string().contains("secret-token"));
    }

    #[test]
    fn test_endpoint_per_network() {
        let resolver = NonceResolver::new(String::new(), Duration::from_secs(1), None).unwrap();
        assert_eq!(
            resolver.endpoint(Network::Main).unwrap().as_str(),
            "https://api.etherscan.io/api"
        );
        assert_eq!(
            resolver.endpoint(Network::Sepolia).unwrap().as_str(),
            "https://api-sepolia.etherscan.io/api"
        );
    }

    #[test]
    fn test_endpoint_override() {
        let resolver = resolver("http://127.0.0.1:8080/");
        assert_eq!(
            resolver.endpoint(Network::Hoodi).unwrap().as_str(),
            "http://127.0.0.1:8080/api"
        );
    }

    #[test]
    fn test_parse_count() {
        let body = br#"{"jsonrpc":"2.0","id":1,"result":"0x1a"}"#;
        assert_eq!(parse_transaction_count(body).unwrap(), 26);
    }

    #[test]
    fn test_parse_rejects_wrong_version() {
        let body = br#"{"jsonrpc":"1.0","id":1,"result":"0x1a"}"#;
        assert!(matches!(parse_transaction_count(body), Err(NonceError::Envelope(_))));
    }

    #[test]
    fn test_parse_rejects_explorer_error_body() {
        let body = br#"{"status":"0","message":"NOTOK","result":"Invalid API Key"}"#;
        assert!(matches!(parse_transaction_count(body), Err(NonceError::Envelope(_))));
    }

    #[test]
    fn test_parse_rejects_non_hex_result() {
        let body = br#"{"jsonrpc":"2.0","id":1,"result":"twenty"}"#;
        assert!(matches!(
            parse_transaction_count(body),
            Err(NonceError::InvalidCount(ref s)) if s == "twenty"
        ));
    }

    #[test]
    fn test_debug_hides_token() {
        let rendered = format!("{:?}", resolver("http://127.0.0.1:9"));
        assert!(!rendered.contains("secret-token"));
    }
}
