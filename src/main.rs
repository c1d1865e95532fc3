//! drive-upload CLI
//!
//! Upload các file local chưa có trên Google Drive vào một folder.

use anyhow::{Context, Result};
use clap::Parser;
use drive_upload::cli::Cli;
use drive_upload::config::{default_config_path, Config};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

fn init_logging(verbose: bool) -> Result<()> {
    let log_level = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive(format!("drive_upload={}", log_level).parse()?),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
    Ok(())
}

fn load_config(cli: &Cli) -> Result<Config> {
    let path = cli.config.clone().unwrap_or_else(default_config_path);
    let config = if cli.config.is_some() {
        // File chỉ định tường minh thì phải tồn tại
        Config::load(&path)
    } else {
        Config::load_or_default(&path)
    };
    config.with_context(|| format!("Cannot load configuration from {}", path.display()))
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_logging(cli.verbose)?;

    let config = load_config(&cli)?;
    let settings = cli.apply_to(config);

    Ok(drive_upload::run(&settings))
}
