//! Error types for cookie session operations.

/// Error type for cookie session operations.
///
/// The fail-soft entry points ([`SessionCodec::decode`](crate::SessionCodec::decode),
/// [`Session::load`](crate::Session::load), [`Session::write`](crate::Session::write))
/// never return these; they log them and fall back to an empty session.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Cookie value is not valid base64.
    #[error("invalid base64 in session cookie: {0}")]
    Base64(#[from] base64::DecodeError),

    /// Payload could not be decompressed.
    #[error("failed to decompress session payload: {0}")]
    Decompress(#[source] std::io::Error),

    /// Payload could not be compressed.
    #[error("failed to compress session payload: {0}")]
    Compress(#[source] std::io::Error),

    /// Session data could not be serialized.
    #[error("failed to serialize session data: {0}")]
    Serialize(#[source] serde_json::Error),

    /// Decoded payload is not a well-formed session mapping.
    #[error("malformed session data: {0}")]
    Deserialize(#[source] serde_json::Error),

    /// A write to a reserved key carried the wrong type.
    #[error("reserved key '{key}' expects {expected}")]
    ReservedKey { key: String, expected: &'static str },

    /// Failed to read a config file.
    #[error("failed to read config file '{path}': {source}")]
    ReadConfig {
        path: String,
        source: std::io::Error,
    },

    /// Failed to parse TOML config.
    #[error("failed to parse config: {0}")]
    ParseConfig(#[from] toml::de::Error),

    /// Config parsed but holds an unusable value.
    #[error("invalid config: {0}")]
    InvalidConfig(String),
}

/// Result type for cookie session operations.
pub type Result<T> = std::result::Result<T, Error>;
