use anyhow::{Context, Result, bail};
use clap::Args;
use sandbox_client::{Provisioner, ResetOutcome};

use crate::opts::ClientOpts;
use crate::ui::TerminalUi;

#[derive(Args, Debug)]
pub struct ResetArgs {
    #[command(flatten)]
    pub client: ClientOpts,

    /// Skip the confirmation prompt
    #[arg(long, short = 'y')]
    pub yes: bool,
}

pub async fn cmd_reset(args: &ResetArgs) -> Result<()> {
    let config = args.client.client_config()?;
    let mut client = Provisioner::new(config, TerminalUi::new(args.yes)).context("build client")?;
    match client.reset().await {
        ResetOutcome::Declined => println!("kept sandbox"),
        ResetOutcome::Reset => println!("sandbox deleted"),
        ResetOutcome::Failed => bail!("sandbox reset failed"),
    }
    Ok(())
}
