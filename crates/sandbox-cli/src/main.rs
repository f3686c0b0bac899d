mod commands;
mod opts;
mod output;
mod ui;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::launch::LaunchArgs;
use commands::reset::ResetArgs;
use commands::serve::ServeArgs;
use opts::ClientOpts;

#[derive(Parser, Debug)]
#[command(name = "sandbox", version, about = "Sandbox provisioning proxy and client")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the provisioning proxy
    Serve(ServeArgs),

    /// Provision a sandbox and wait until it is ready
    Launch(LaunchArgs),

    /// Delete the sandbox (asks for confirmation)
    Reset(ResetArgs),

    /// Show the current sandbox, if any
    Status(ClientOpts),
}

#[tokio::main]
async fn main() -> Result<()> {
    load_env()?;
    setup_logging();
    let cli = Cli::parse();

    match cli.command {
        Command::Serve(args) => commands::serve::cmd_serve(args).await,
        Command::Launch(args) => commands::launch::cmd_launch(&args).await,
        Command::Reset(args) => commands::reset::cmd_reset(&args).await,
        Command::Status(opts) => commands::status::cmd_status(&opts).await,
    }
}

/// Load `.env` from the working directory without overriding the environment.
fn load_env() -> Result<()> {
    match dotenvy::dotenv() {
        Ok(_) => Ok(()),
        Err(err) if err.not_found() => Ok(()),
        Err(err) => Err(err).context("load .env"),
    }
}

fn setup_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
