//! Decode command - shows what a session cookie holds.

use anyhow::{Result, bail};
use clap::Args;
use console::style;
use crumbs_session::{SessionCodec, cookie};

use super::{Context, read_input};

/// Arguments for the decode command.
#[derive(Args, Debug)]
pub struct DecodeArgs {
    /// Raw cookie value (`-` or omitted reads stdin)
    pub value: Option<String>,

    /// Treat the input as a full `Cookie` header and pick the session cookie out of it
    #[arg(long)]
    pub cookie_header: bool,

    /// Fail with the broken stage instead of falling back to an empty session
    #[arg(long)]
    pub strict: bool,
}

/// Run the decode command.
pub fn run(args: DecodeArgs, ctx: &Context) -> Result<()> {
    let input = read_input(args.value)?;

    let raw = if args.cookie_header {
        match cookie::find_cookie(&input, &ctx.config.cookie_name) {
            Some(raw) => raw,
            None => bail!("no '{}' cookie in header", ctx.config.cookie_name),
        }
    } else {
        input
    };

    let codec = SessionCodec::new(&ctx.secret);
    let data = if args.strict {
        codec.try_decode(&raw)?
    } else {
        codec.decode(&raw)
    };

    if ctx.verbose
        && let Some(at) = data.expires()
    {
        eprintln!("{} {}", style("expires:").dim(), at);
    }
    println!("{}", serde_json::to_string_pretty(&data.to_value())?);
    Ok(())
}
