//! Header command - prints the Set-Cookie line a session would send.

use anyhow::Result;
use clap::Args;
use crumbs_session::{Session, StaticContext};

use super::{Context, parse_data, read_input};

/// Arguments for the header command.
#[derive(Args, Debug)]
pub struct HeaderArgs {
    /// JSON object to store (`-` reads stdin); omitted means an empty session
    pub data: Option<String>,

    /// Emit the header that deletes the session on the client
    #[arg(long)]
    pub destroy: bool,
}

/// Run the header command.
pub fn run(args: HeaderArgs, ctx: &Context) -> Result<()> {
    let request = StaticContext::new(ctx.secret.as_bytes());
    let mut session = Session::load(&request, ctx.config.clone());

    if let Some(input) = args.data {
        *session.data_mut() = parse_data(&read_input(Some(input))?)?;
    }
    if args.destroy {
        session.destroy();
    }

    for (name, value) in session.header(&request, None) {
        println!("{name}: {value}");
    }
    Ok(())
}
