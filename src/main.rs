#[macro_use]
extern crate tracing;

use std::env;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use displayctl::cli::{resolve_destination, Cli, Sub, DEST_ENV};
use displayctl::client::run;
use displayctl::dbus::DisplayConfigManager;
use displayctl::error::ApplyError;
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "displayctl=info,warn";

fn main() -> ExitCode {
    let directives = env::var("RUST_LOG").unwrap_or_else(|_| DEFAULT_LOG_FILTER.to_owned());
    let env_filter = EnvFilter::builder().parse_lossy(directives);
    tracing_subscriber::fmt()
        .compact()
        .with_writer(std::io::stderr)
        .with_env_filter(env_filter)
        .init();

    let cli = Cli::parse();

    let dest = resolve_destination(cli.dest, env::var(DEST_ENV).ok());
    debug!("using service {dest}");

    let what = match cli.subcommand {
        Sub::List { .. } => "list current configuration",
        Sub::Set(_) => "set configuration",
    };

    let res = run(&cli.subcommand, || {
        DisplayConfigManager::connect(&dest)
            .context("error connecting to the display configuration service")
    });

    let Err(err) = res else {
        return ExitCode::SUCCESS;
    };

    eprintln!("Failed to {what}: {err:#}");
    if let Some(ApplyError::StaleSerial { .. }) = err.downcast_ref::<ApplyError>() {
        eprintln!("The display configuration changed in the meantime, run the command again.");
    }

    ExitCode::FAILURE
}
