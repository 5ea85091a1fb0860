// ABOUTME: Entry point for the skiff CLI application.
// ABOUTME: Gathers and validates input, opens the run log, then deploys or cleans up.

mod cli;

use clap::Parser;
use cli::Cli;
use skiff::commands;
use skiff::config::{DeployContext, FileConfig, RequestInput};
use skiff::deploy::HyperProbe;
use skiff::error::{Error, Result};
use skiff::local::SystemRunner;
use skiff::output::Output;
use skiff::remote::SshConnector;
use skiff::runlog::RunLog;
use std::path::Path;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let mut output = Output::new(cli.output_mode());

    if let Err(e) = run(cli, &mut output).await {
        output.error(&e.to_string());
        if let Some(log) = output.log() {
            eprintln!("Run log: {}", log.path().display());
        }
        std::process::exit(1);
    }
}

async fn run(cli: Cli, output: &mut Output) -> Result<()> {
    let cwd = std::env::current_dir()?;
    attach_log(output, &cwd);

    let input = gather_input(&cli, &cwd)?;

    // Nothing touches the network until input is valid.
    if cli.cleanup {
        let target = input.into_target()?;
        commands::cleanup(&target, &SshConnector, output).await?;
        return Ok(());
    }

    let request = input.into_request()?;
    let ctx = DeployContext::new(request, &cwd);
    commands::deploy(
        &ctx,
        &SshConnector,
        &SystemRunner,
        &HyperProbe::default(),
        output,
    )
    .await?;
    Ok(())
}

/// Flags and env vars first, then the config file.
fn gather_input(cli: &Cli, cwd: &Path) -> Result<RequestInput> {
    let overrides = cli.overrides().map_err(Error::InputValidation)?;

    let file = match &cli.config {
        Some(path) => Some(FileConfig::load(path)?),
        None => FileConfig::discover(cwd)?,
    };

    let file = if cli.cleanup {
        file.map(FileConfig::without_token)
    } else {
        file
    };

    match file {
        Some(file) => file.merge(overrides),
        None => Ok(overrides),
    }
}

fn attach_log(output: &mut Output, cwd: &Path) {
    match RunLog::create(cwd) {
        Ok(log) => {
            let path = log.path().display().to_string();
            output.set_log(log);
            output.progress(&format!("Logging to {path}"));
        }
        Err(e) => output.warning(&format!("could not create run log in {}: {e}", cwd.display())),
    }
}
