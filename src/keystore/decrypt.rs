//! Keystore decryption.

use alloy::signers::local::PrivateKeySigner;
use thiserror::Error;

use crate::keystore::file::EncryptedKeyFile;

/// A passphrase did not open the key file.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct DecryptError(pub String);

/// Turns an encrypted key file plus passphrase into a signer.
pub trait KeyDecryptor {
    fn decrypt(
        &self,
        file: &EncryptedKeyFile,
        passphrase: &[u8],
    ) -> Result<PrivateKeySigner, DecryptError>;
}

/// Web3 Secret Storage (scrypt/pbkdf2 + aes-128-ctr), as written by geth and clef.
#[derive(Debug, Clone, Copy, Default)]
pub struct Web3KeystoreDecryptor;

impl KeyDecryptor for Web3KeystoreDecryptor {
    fn decrypt(
        &self,
        file: &EncryptedKeyFile,
        passphrase: &[u8],
    ) -> Result<PrivateKeySigner, DecryptError> {
        PrivateKeySigner::decrypt_keystore(file.path(), passphrase)
            .map_err(|e| DecryptError(e.to_string()))
    }
}
