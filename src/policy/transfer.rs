//! The transfer policy enforced on every signing request.

use alloy::primitives::{Address, U256};
use std::collections::HashSet;
use thiserror::Error;

use crate::policy::network::Network;

/// A policy that cannot be used.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PolicyError {
    #[error("You must specify a list of allowed destinations")]
    NoDestinations,

    #[error("You must specify a maximum wei transfer limit")]
    ZeroValueCap,
}

/// A request the policy refuses.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PolicyViolation {
    #[error("Transfers to {0} are not allowed")]
    DestinationNotAllowed(String),

    #[error("Amount cannot exceed {0} wei")]
    ValueAboveCap(U256),
}

/// Immutable transfer policy for the lifetime of the process.
#[derive(Debug, Clone)]
pub struct TransferPolicy {
    source: Address,
    allowed_destinations: HashSet<Address>,
    max_value_wei: U256,
    gas_price: u128,
    network: Network,
}

impl TransferPolicy {
    pub fn new(
        source: Address,
        allowed_destinations: impl IntoIterator<Item = Address>,
        max_value_wei: U256,
        gas_price: u128,
        network: Network,
    ) -> Result<Self, PolicyError> {
        let policy = Self {
            source,
            allowed_destinations: allowed_destinations.into_iter().collect(),
            max_value_wei,
            gas_price,
            network,
        };
        policy.validate()?;
        Ok(policy)
    }

    pub fn validate(&self) -> Result<(), PolicyError> {
        if self.allowed_destinations.is_empty() {
            return Err(PolicyError::NoDestinations);
        }
        if self.max_value_wei.is_zero() {
            return Err(PolicyError::ZeroValueCap);
        }
        Ok(())
    }

    pub fn allows_destination(&self, destination: &Address) -> bool {
        self.allowed_destinations.contains(destination)
    }

    pub fn source(&self) -> Address {
        self.source
    }

    pub fn allowed_destinations(&self) -> &HashSet<Address> {
        &self.allowed_destinations
    }

    pub fn max_value_wei(&self) -> U256 {
        self.max_value_wei
    }

    pub fn gas_price(&self) -> u128 {
        self.gas_price
    }

    pub fn network(&self) -> Network {
        self.network
    }
}
