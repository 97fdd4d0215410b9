//! CLI command handlers.

use std::io::Read;

use anyhow::{Context as _, Result, bail};
use crumbs_session::{SessionConfig, SessionData};

pub mod decode;
pub mod encode;
pub mod header;

/// Shared context for all commands.
#[derive(Debug, Clone)]
pub struct Context {
    /// Resolved session settings.
    pub config: SessionConfig,
    /// Keystream secret.
    pub secret: String,
    /// Verbose output enabled.
    pub verbose: bool,
}

/// Read an argument, or stdin when it is missing or `-`.
pub fn read_input(arg: Option<String>) -> Result<String> {
    match arg.as_deref() {
        Some("-") | None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("failed to read stdin")?;
            Ok(buf.trim().to_string())
        }
        Some(value) => Ok(value.to_string()),
    }
}

/// Parse a JSON object into session data.
pub fn parse_data(json: &str) -> Result<SessionData> {
    let value: serde_json::Value = serde_json::from_str(json).context("input is not valid JSON")?;
    if !value.is_object() {
        bail!("session data must be a JSON object");
    }
    Ok(SessionData::from_value(value)?)
}
