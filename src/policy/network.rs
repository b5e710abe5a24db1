//! Supported networks and their fixed parameters.

use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Network the signed transactions are meant for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    Main,
    Sepolia,
    Holesky,
    Hoodi,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown network '{0}' (expected one of: main, sepolia, holesky, hoodi)")]
pub struct UnknownNetwork(pub String);

impl Network {
    pub const ALL: [Network; 4] = [
        Network::Main,
        Network::Sepolia,
        Network::Holesky,
        Network::Hoodi,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Network::Main => "main",
            Network::Sepolia => "sepolia",
            Network::Holesky => "holesky",
            Network::Hoodi => "hoodi",
        }
    }

    /// EIP-155 chain id.
    pub fn chain_id(&self) -> u64 {
        match self {
            Network::Main => 1,
            Network::Sepolia => 11_155_111,
            Network::Holesky => 17_000,
            Network::Hoodi => 560_048,
        }
    }

    /// Block explorer API used for transaction counts.
    pub fn explorer_base_url(&self) -> &'static str {
        match self {
            Network::Main => "https://api.etherscan.io",
            Network::Sepolia => "https://api-sepolia.etherscan.io",
            Network::Holesky => "https://api-holesky.etherscan.io",
            Network::Hoodi => "https://api-hoodi.etherscan.io",
        }
    }
}

impl FromStr for Network {
    type Err = UnknownNetwork;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "main" | "mainnet" => Ok(Network::Main),
            "sepolia" => Ok(Network::Sepolia),
            "holesky" => Ok(Network::Holesky),
            "hoodi" => Ok(Network::Hoodi),
            _ => Err(UnknownNetwork(s.to_string())),
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
