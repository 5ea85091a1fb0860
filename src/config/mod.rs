// ABOUTME: Configuration types and parsing for skiff.yml.
// ABOUTME: Merges file values with command-line overrides into raw request input.

mod deserialize;
mod env_value;
mod request;
mod server;

pub use env_value::EnvValue;
pub use request::{
    APP_NAME, DEFAULT_BRANCH, DeployContext, DeploymentRequest, REMOTE_APP_DIR, RemoteTarget,
    RequestInput, WellKnownNames,
};
pub use server::ServerAddress;

use crate::error::{Error, Result};
use deserialize::deserialize_port;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const CONFIG_FILENAME: &str = "skiff.yml";
pub const CONFIG_FILENAME_ALT: &str = "skiff.yaml";
pub const CONFIG_FILENAME_DIR: &str = ".skiff/config.yml";

/// Contents of `skiff.yml`. Every field is optional; flags fill the gaps.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    #[serde(default)]
    pub repository: Option<String>,

    #[serde(default)]
    pub token: Option<EnvValue>,

    #[serde(default)]
    pub branch: Option<String>,

    /// `[user@]host[:port]` shorthand.
    #[serde(default)]
    pub server: Option<String>,

    #[serde(default)]
    pub host: Option<String>,

    #[serde(default)]
    pub user: Option<String>,

    #[serde(default)]
    pub ssh_port: Option<u16>,

    #[serde(default)]
    pub key: Option<PathBuf>,

    /// Port the application listens on inside its container.
    #[serde(default, deserialize_with = "deserialize_port")]
    pub port: Option<String>,

    #[serde(default, with = "humantime_serde")]
    pub connect_timeout: Option<Duration>,

    #[serde(default)]
    pub trust_first_connection: Option<bool>,
}

impl FileConfig {
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).map_err(Error::from)
    }

    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::ConfigNotFound(path.to_path_buf()));
        }
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Look for a config file in `dir`. Absence is not an error.
    pub fn discover(dir: &Path) -> Result<Option<Self>> {
        let candidates = [
            dir.join(CONFIG_FILENAME),
            dir.join(CONFIG_FILENAME_ALT),
            dir.join(CONFIG_FILENAME_DIR),
        ];

        for path in &candidates {
            if path.exists() {
                tracing::debug!("using config file {}", path.display());
                return Self::load(path).map(Some);
            }
        }

        Ok(None)
    }

    /// Drop the token so teardown never needs its variable set.
    pub fn without_token(mut self) -> Self {
        self.token = None;
        self
    }

    /// Layer `overrides` on top of this file and produce raw request input.
    ///
    /// Precedence for every field: explicit flag, then the file's explicit
    /// field, then the `server` shorthand.
    pub fn merge(self, overrides: RequestInput) -> Result<RequestInput> {
        let shorthand = match &self.server {
            Some(s) => Some(ServerAddress::parse(s).map_err(Error::InputValidation)?),
            None => None,
        };
        let token = match &self.token {
            Some(value) => Some(value.resolve()?),
            None => None,
        };

        Ok(RequestInput {
            repository: overrides.repository.or(self.repository),
            token: overrides.token.or(token),
            branch: overrides.branch.or(self.branch),
            user: overrides
                .user
                .or(self.user)
                .or_else(|| shorthand.as_ref().and_then(|s| s.user.clone())),
            host: overrides
                .host
                .or(self.host)
                .or_else(|| shorthand.as_ref().map(|s| s.host.clone())),
            ssh_port: overrides
                .ssh_port
                .or(self.ssh_port)
                .or_else(|| shorthand.as_ref().and_then(|s| s.port)),
            key: overrides.key.or(self.key),
            port: overrides.port.or(self.port),
            connect_timeout: overrides.connect_timeout.or(self.connect_timeout),
            trust_first_connection: overrides
                .trust_first_connection
                .or(self.trust_first_connection),
        })
    }
}

/// Expand a leading `~/` against `$HOME`.
pub fn expand_home(path: &Path) -> PathBuf {
    if let Ok(rest) = path.strip_prefix("~")
        && let Some(home) = std::env::var_os("HOME")
    {
        return PathBuf::from(home).join(rest);
    }
    path.to_path_buf()
}
