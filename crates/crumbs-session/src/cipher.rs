//! Repeating-keystream XOR cipher.
//!
//! The keystream is the SHA-1 digest of the secret, cycled over the input.
//! Encryption and decryption are the same operation. There is no
//! authentication tag: a wrong key or a flipped byte just produces
//! different bytes.

use sha1::{Digest, Sha1};

/// Length of the keystream block (SHA-1 digest size).
pub const KEYSTREAM_LEN: usize = 20;

/// XOR cipher keyed by the SHA-1 digest of a secret.
#[derive(Clone)]
pub struct KeystreamCipher {
    keystream: [u8; KEYSTREAM_LEN],
}

impl KeystreamCipher {
    /// Derive the keystream from `secret`.
    pub fn new(secret: impl AsRef<[u8]>) -> Self {
        let digest = Sha1::digest(secret.as_ref());
        let mut keystream = [0u8; KEYSTREAM_LEN];
        keystream.copy_from_slice(&digest);
        Self { keystream }
    }

    /// Transform `data` into a new buffer of the same length.
    pub fn transform(&self, data: &[u8]) -> Vec<u8> {
        data.iter()
            .zip(self.keystream.iter().cycle())
            .map(|(byte, key)| byte ^ key)
            .collect()
    }

    /// Transform `data` in place.
    pub fn transform_in_place(&self, data: &mut [u8]) {
        for (byte, key) in data.iter_mut().zip(self.keystream.iter().cycle()) {
            *byte ^= key;
        }
    }
}

impl std::fmt::Debug for KeystreamCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeystreamCipher").finish_non_exhaustive()
    }
}

/// One-shot transform of `data` under `secret`.
pub fn transform(data: &[u8], secret: impl AsRef<[u8]>) -> Vec<u8> {
    KeystreamCipher::new(secret).transform(data)
}
