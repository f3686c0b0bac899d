use anyhow::{Context, Result};
use sandbox_client::ProxyClient;

use crate::opts::ClientOpts;
use crate::output::print_status;

pub async fn cmd_status(opts: &ClientOpts) -> Result<()> {
    let config = opts.client_config()?;
    let http = reqwest::Client::builder()
        .timeout(config.request_timeout)
        .build()
        .context("build http client")?;
    let client = ProxyClient::new(http, config.ajax_url, config.cookie);
    let status = client.status().await.context("read sandbox status")?;
    print_status(&status, opts.json)
}
