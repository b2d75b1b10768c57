use std::process::ExitCode;

use anyhow::Result;
use clap::{CommandFactory, Parser};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use webdiff::app;
use webdiff::cli::{Cli, Command};
use webdiff::config;

fn init_tracing(verbose: bool) {
    let default_filter = if verbose { "webdiff=debug" } else { "webdiff=warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .init();
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    color_eyre::install().ok();

    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = config::load_config();
    tracing::debug!(?config, "loaded config");

    match cli.command {
        None => {
            Cli::command().print_help()?;
            println!();
            Ok(ExitCode::SUCCESS)
        }
        Some(Command::Install) => app::install(&config).await,
        Some(Command::Uninstall) => app::uninstall(&config).await,
        Some(Command::Run(args)) => app::run_session(args, &config).await,
    }
}
