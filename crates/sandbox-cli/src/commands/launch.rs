use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::Args;
use sandbox_client::Provisioner;

use crate::opts::ClientOpts;
use crate::output::print_status;
use crate::ui::TerminalUi;

#[derive(Args, Debug)]
pub struct LaunchArgs {
    #[command(flatten)]
    pub client: ClientOpts,

    /// Delay between status polls in milliseconds
    #[arg(long, default_value_t = 2000)]
    pub poll_interval_ms: u64,

    /// Give up after this many seconds; polls until done when omitted
    #[arg(long)]
    pub max_wait_secs: Option<u64>,
}

pub async fn cmd_launch(args: &LaunchArgs) -> Result<()> {
    let config = args
        .client
        .client_config()?
        .with_poll_interval(Duration::from_millis(args.poll_interval_ms))
        .with_max_wait(args.max_wait_secs.map(Duration::from_secs));
    let mut client = Provisioner::new(config, TerminalUi::new(false)).context("build client")?;

    let info = client
        .proxy()
        .launch_info()
        .await
        .context("request launch token")?;
    if let Err(err) = client.launch(&info.provisioning_url, &info.token).await {
        bail!("sandbox {}: {err}", client.session().state);
    }

    if client.ui().reloaded() {
        let status = client.proxy().status().await.context("read sandbox status")?;
        print_status(&status, args.client.json)?;
    }
    Ok(())
}
