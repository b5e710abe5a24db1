//! Fixed-capacity secret storage with guaranteed zeroing.

use std::io::{self, Read};
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Maximum number of passphrase bytes retained from one line of input.
pub const MAX_SECRET_LEN: usize = 256;

/// A transient secret such as an unlock passphrase.
///
/// Storage lives inline and is overwritten with zeroes by [`wipe`](Self::wipe)
/// and again on drop, so early returns and unwinding never leave the
/// passphrase behind.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct SecretBuffer {
    bytes: [u8; MAX_SECRET_LEN],
    len: usize,
}

impl SecretBuffer {
    /// Read one line from `source` into a new buffer.
    ///
    /// Reading stops at `\n` or end of input; a trailing `\r` is dropped.
    /// Bytes beyond [`MAX_SECRET_LEN`] are consumed and discarded so the
    /// source stays aligned on the next line.
    pub fn capture<R: Read + ?Sized>(source: &mut R) -> io::Result<Self> {
        let mut buffer = Self {
            bytes: [0u8; MAX_SECRET_LEN],
            len: 0,
        };
        let mut byte = [0u8; 1];

        let result = loop {
            match source.read(&mut byte) {
                Ok(0) => break Ok(()),
                Ok(_) if byte[0] == b'\n' => break Ok(()),
                Ok(_) => {
                    if buffer.len < MAX_SECRET_LEN {
                        buffer.bytes[buffer.len] = byte[0];
                        buffer.len += 1;
                    }
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => break Err(e),
            }
        };
        byte.zeroize();
        result?;

        if buffer.len > 0 && buffer.bytes[buffer.len - 1] == b'\r' {
            buffer.len -= 1;
            buffer.bytes[buffer.len] = 0;
        }

        Ok(buffer)
    }

    /// Borrow the captured bytes.
    pub fn expose(&self) -> &[u8] {
        &self.bytes[..self.len]
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Overwrite every byte of storage with zero. Safe to call repeatedly.
    pub fn wipe(&mut self) {
        self.zeroize();
    }

    /// True when the whole backing storage is zero.
    pub fn is_wiped(&self) -> bool {
        self.len == 0 && self.bytes.iter().all(|b| *b == 0)
    }
}

impl std::fmt::Debug for SecretBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretBuffer")
            .field("len", &self.len)
            .field("bytes", &"<redacted>")
            .finish()
    }
}
