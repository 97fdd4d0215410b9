//! Encode command - turns a JSON object into a cookie value.

use anyhow::Result;
use clap::Args;
use crumbs_session::SessionCodec;

use super::{Context, parse_data, read_input};

/// Arguments for the encode command.
#[derive(Args, Debug)]
pub struct EncodeArgs {
    /// JSON object to encode (`-` or omitted reads stdin)
    pub data: Option<String>,
}

/// Run the encode command.
pub fn run(args: EncodeArgs, ctx: &Context) -> Result<()> {
    let data = parse_data(&read_input(args.data)?)?;
    let raw = SessionCodec::new(&ctx.secret).encode(&data)?;

    tracing::debug!(keys = data.len(), bytes = raw.len(), "Encoded session");
    println!("{raw}");
    Ok(())
}
