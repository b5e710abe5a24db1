//! Encrypted key container on disk.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors loading the key file.
#[derive(Debug, Error)]
pub enum KeyFileError {
    #[error("cannot read key file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("key file {0} is not a version 3 Web3 Secret Storage container")]
    Format(String),
}

/// A key file whose container format was checked at startup.
///
/// Only the path is kept. Decryption reads the file again from disk, so
/// a file replaced after [`EncryptedKeyFile::load`] is decrypted as it is
/// then, and a replacement that is not a valid container fails to decrypt.
#[derive(Debug, Clone)]
pub struct EncryptedKeyFile {
    path: PathBuf,
}

impl EncryptedKeyFile {
    /// Read and check the container at `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, KeyFileError> {
        let path = path.as_ref();
        let contents = fs::read(path).map_err(|source| KeyFileError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_bytes(path, &contents)
    }

    /// Check bytes already read from `path`.
    pub fn from_bytes(path: impl Into<PathBuf>, contents: &[u8]) -> Result<Self, KeyFileError> {
        let path = path.into();
        if !is_web3_container(contents) {
            return Err(KeyFileError::Format(path.display().to_string()));
        }
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn is_web3_container(contents: &[u8]) -> bool {
    let Ok(value) = serde_json::from_slice::<serde_json::Value>(contents) else {
        return false;
    };

    let version_ok = value.get("version").and_then(|v| v.as_u64()) == Some(3);
    // geth writes "crypto", some older tools "Crypto"
    let crypto_ok = value
        .get("crypto")
        .or_else(|| value.get("Crypto"))
        .is_some_and(|c| c.is_object());

    version_ok && crypto_ok
}
