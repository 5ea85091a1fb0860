// ABOUTME: Command-line interface definition using clap derive macros.
// ABOUTME: One optional --cleanup switch plus flags/env vars for every request field.

use clap::Parser;
use skiff::config::RequestInput;
use skiff::output::OutputMode;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "skiff")]
#[command(about = "Deploy a git repository as a container behind nginx on one host")]
#[command(version)]
pub struct Cli {
    /// Tear down the deployed container and proxy site instead of deploying
    #[arg(long)]
    pub cleanup: bool,

    /// Config file (default: skiff.yml in the current directory)
    #[arg(short, long, env = "SKIFF_CONFIG")]
    pub config: Option<PathBuf>,

    /// Repository URL (http or https)
    #[arg(long, env = "SKIFF_REPO")]
    pub repo: Option<String>,

    /// Access token used to clone the repository
    #[arg(long, env = "SKIFF_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Branch to deploy [default: main]
    #[arg(short, long, env = "SKIFF_BRANCH")]
    pub branch: Option<String>,

    /// Target as [user@]host[:ssh-port]
    #[arg(short, long, env = "SKIFF_SERVER")]
    pub server: Option<String>,

    /// Remote SSH user
    #[arg(long, env = "SKIFF_USER")]
    pub user: Option<String>,

    /// Remote host name or address
    #[arg(long, env = "SKIFF_HOST")]
    pub host: Option<String>,

    /// SSH port
    #[arg(long, env = "SKIFF_SSH_PORT")]
    pub ssh_port: Option<u16>,

    /// Private key for SSH
    #[arg(short, long, env = "SKIFF_KEY")]
    pub key: Option<PathBuf>,

    /// Port the application listens on inside the container
    #[arg(short, long, env = "SKIFF_PORT")]
    pub port: Option<String>,

    /// Bound on the initial SSH connection, e.g. 15s
    #[arg(long, env = "SKIFF_CONNECT_TIMEOUT", value_parser = humantime_serde::re::humantime::parse_duration)]
    pub connect_timeout: Option<Duration>,

    /// Refuse hosts missing from known_hosts
    #[arg(long)]
    pub strict_host_keys: bool,

    /// Verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Only print the final result
    #[arg(short, long, conflicts_with = "json")]
    pub quiet: bool,

    /// Emit JSON lines
    #[arg(long)]
    pub json: bool,
}

impl Cli {
    pub fn output_mode(&self) -> OutputMode {
        if self.json {
            OutputMode::Json
        } else if self.quiet {
            OutputMode::Quiet
        } else {
            OutputMode::Normal
        }
    }

    /// Flag values as overrides for the config file. `--server` fills
    /// user/host/port only where the explicit flags are absent.
    pub fn overrides(&self) -> Result<RequestInput, String> {
        let shorthand = match &self.server {
            Some(s) => Some(skiff::config::ServerAddress::parse(s)?),
            None => None,
        };

        Ok(RequestInput {
            repository: self.repo.clone(),
            token: self.token.clone(),
            branch: self.branch.clone(),
            user: self
                .user
                .clone()
                .or_else(|| shorthand.as_ref().and_then(|s| s.user.clone())),
            host: self
                .host
                .clone()
                .or_else(|| shorthand.as_ref().map(|s| s.host.clone())),
            ssh_port: self
                .ssh_port
                .or_else(|| shorthand.as_ref().and_then(|s| s.port)),
            key: self.key.clone(),
            port: self.port.clone(),
            connect_timeout: self.connect_timeout,
            trust_first_connection: self.strict_host_keys.then_some(false),
        })
    }
}
