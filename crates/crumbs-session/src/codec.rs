//! Session payload codec.
//!
//! Wire format: `base64(zlib(xor(json(data))))`, standard alphabet with padding.
//! Decoding is fail-soft: any broken stage yields an empty [`SessionData`].

use std::io::{Read, Write};

use base64::{Engine, engine::general_purpose::STANDARD};
use flate2::Compression;
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use tracing::error;

use crate::cipher::KeystreamCipher;
use crate::data::SessionData;
use crate::error::{Error, Result};

/// Upper bound on the decompressed payload size.
///
/// A 4 KiB cookie can inflate far past anything a session legitimately holds.
pub const MAX_PAYLOAD_LEN: usize = 1 << 20;

/// Encodes and decodes session payloads under one secret.
#[derive(Debug, Clone)]
pub struct SessionCodec {
    cipher: KeystreamCipher,
}

impl SessionCodec {
    /// Create a codec keyed by `secret`.
    pub fn new(secret: impl AsRef<[u8]>) -> Self {
        Self {
            cipher: KeystreamCipher::new(secret),
        }
    }

    /// Encode `data` into cookie-safe text.
    pub fn encode(&self, data: &SessionData) -> Result<String> {
        let mut payload = serde_json::to_vec(data).map_err(Error::Serialize)?;
        self.cipher.transform_in_place(&mut payload);

        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::best());
        encoder.write_all(&payload).map_err(Error::Compress)?;
        let compressed = encoder.finish().map_err(Error::Compress)?;

        Ok(STANDARD.encode(compressed))
    }

    /// Decode cookie text, reporting which stage failed.
    pub fn try_decode(&self, text: &str) -> Result<SessionData> {
        let compressed = STANDARD.decode(text.trim())?;

        let mut payload = Vec::new();
        ZlibDecoder::new(compressed.as_slice())
            .take(MAX_PAYLOAD_LEN as u64 + 1)
            .read_to_end(&mut payload)
            .map_err(Error::Decompress)?;
        if payload.len() > MAX_PAYLOAD_LEN {
            return Err(Error::Decompress(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("payload exceeds {MAX_PAYLOAD_LEN} bytes"),
            )));
        }

        self.cipher.transform_in_place(&mut payload);
        serde_json::from_slice(&payload).map_err(Error::Deserialize)
    }

    /// Decode cookie text; any failure logs at error level and yields empty data.
    pub fn decode(&self, text: &str) -> SessionData {
        self.try_decode(text).unwrap_or_else(|e| {
            error!(error = %e, "Bad session data");
            SessionData::new()
        })
    }
}

/// One-shot encode under `secret`.
pub fn encode(data: &SessionData, secret: impl AsRef<[u8]>) -> Result<String> {
    SessionCodec::new(secret).encode(data)
}

/// One-shot fail-soft decode under `secret`.
pub fn decode(text: &str, secret: impl AsRef<[u8]>) -> SessionData {
    SessionCodec::new(secret).decode(text)
}
