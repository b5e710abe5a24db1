//! Transaction construction and signing.
//!
//! # Responsibilities
//! - Build plain value-transfer drafts (fixed gas limit, empty data)
//! - Sign with EIP-155 replay protection for the policy's network
//! - Produce the raw RLP encoding and transaction hash

use alloy::consensus::{SignableTransaction, TxEnvelope, TxLegacy};
use alloy::eips::eip2718::Encodable2718;
use alloy::primitives::{Address, Bytes, TxKind, B256, U256};
use alloy::signers::SignerSync;
use serde::Serialize;

use crate::blockchain::types::TRANSFER_GAS_LIMIT;

/// An unsigned value transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionDraft {
    pub to: Address,
    pub value: U256,
    pub nonce: u64,
    pub gas_price: u128,
    pub gas_limit: u64,
    pub chain_id: u64,
}

impl TransactionDraft {
    /// Draft a plain transfer; no payload, so the gas limit is fixed.
    pub fn transfer(to: Address, value: U256, nonce: u64, gas_price: u128, chain_id: u64) -> Self {
        Self {
            to,
            value,
            nonce,
            gas_price,
            gas_limit: TRANSFER_GAS_LIMIT,
            chain_id,
        }
    }

    pub fn to_legacy(&self) -> TxLegacy {
        TxLegacy {
            chain_id: Some(self.chain_id),
            nonce: self.nonce,
            gas_price: self.gas_price,
            gas_limit: self.gas_limit,
            to: TxKind::Call(self.to),
            value: self.value,
            input: Bytes::new(),
        }
    }

    /// Sign the draft. RFC 6979 nonces make this deterministic per key.
    pub fn sign<S: SignerSync>(
        &self,
        signer: &S,
    ) -> Result<SignedTransaction, alloy::signers::Error> {
        let tx = self.to_legacy();
        let signature = signer.sign_hash_sync(&tx.signature_hash())?;
        let signed = tx.into_signed(signature);
        let hash = *signed.hash();
        let raw = TxEnvelope::from(signed).encoded_2718();

        Ok(SignedTransaction {
            raw: raw.into(),
            hash,
        })
    }
}

/// A signed transaction ready for broadcast.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SignedTransaction {
    /// Raw RLP encoding, hex encoded with `0x` in JSON.
    #[serde(rename = "transaction")]
    pub raw: Bytes,
    /// Keccak-256 of the raw encoding.
    pub hash: B256,
}
