// ABOUTME: Validated deployment request and the values derived from it.
// ABOUTME: Validation runs before any network action; derived paths are computed once.

use std::path::{Path, PathBuf};
use std::time::Duration;

use super::expand_home;
use crate::error::{Error, Result};
use crate::ssh::{DEFAULT_CONNECT_TIMEOUT, SessionConfig};
use crate::types::{AccessToken, RepoUrl};

pub const DEFAULT_BRANCH: &str = "main";

/// Fixed name shared by the image, container, compose project and proxy site.
pub const APP_NAME: &str = "skiff-app";

/// Remote mirror directory, relative to the remote user's home.
pub const REMOTE_APP_DIR: &str = "~/app";

/// Raw, unvalidated parameters gathered from flags, env and skiff.yml.
#[derive(Debug, Clone, Default)]
pub struct RequestInput {
    pub repository: Option<String>,
    pub token: Option<String>,
    pub branch: Option<String>,
    pub user: Option<String>,
    pub host: Option<String>,
    pub ssh_port: Option<u16>,
    pub key: Option<PathBuf>,
    pub port: Option<String>,
    pub connect_timeout: Option<Duration>,
    pub trust_first_connection: Option<bool>,
}

/// The SSH destination for the whole run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteTarget {
    pub host: String,
    pub user: String,
    pub key_path: PathBuf,
    pub ssh_port: u16,
    pub connect_timeout: Duration,
    pub trust_first_connection: bool,
}

impl RemoteTarget {
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig::new(&self.host, &self.user, &self.key_path)
            .port(self.ssh_port)
            .connect_timeout(self.connect_timeout)
            .trust_on_first_use(self.trust_first_connection)
    }

    /// `user@host` as used by rsync and in messages.
    pub fn destination(&self) -> String {
        format!("{}@{}", self.user, self.host)
    }
}

/// A complete, validated deploy request. Immutable once built.
#[derive(Debug, Clone)]
pub struct DeploymentRequest {
    pub repository: RepoUrl,
    pub token: AccessToken,
    pub branch: String,
    pub target: RemoteTarget,
    pub application_port: u16,
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

impl RequestInput {
    /// Validate every field a deploy needs, reporting all problems at once.
    pub fn into_request(self) -> Result<DeploymentRequest> {
        let mut problems = Vec::new();

        let repository = match present(&self.repository) {
            None => {
                problems.push("repository URL is required".to_string());
                None
            }
            Some(url) => match RepoUrl::parse(url) {
                Ok(url) => Some(url),
                Err(e) => {
                    problems.push(e.to_string());
                    None
                }
            },
        };

        let token = match present(&self.token) {
            Some(t) => Some(AccessToken::new(t)),
            None => {
                problems.push("access token is required".to_string());
                None
            }
        };

        let application_port = match present(&self.port) {
            None => {
                problems.push("application port is required".to_string());
                None
            }
            Some(p) => match p.parse::<u16>() {
                Ok(0) | Err(_) => {
                    problems.push(format!("application port must be 1-65535, got '{p}'"));
                    None
                }
                Ok(port) => Some(port),
            },
        };

        let branch = present(&self.branch)
            .unwrap_or(DEFAULT_BRANCH)
            .to_string();

        let target = self.target_fields(&mut problems);

        match (repository, token, application_port, target) {
            (Some(repository), Some(token), Some(application_port), Some(target))
                if problems.is_empty() =>
            {
                Ok(DeploymentRequest {
                    repository,
                    token,
                    branch,
                    target,
                    application_port,
                })
            }
            _ => Err(Error::InputValidation(problems.join("; "))),
        }
    }

    /// Validate only what teardown needs: the SSH destination.
    pub fn into_target(self) -> Result<RemoteTarget> {
        let mut problems = Vec::new();
        match self.target_fields(&mut problems) {
            Some(target) if problems.is_empty() => Ok(target),
            _ => Err(Error::InputValidation(problems.join("; "))),
        }
    }

    fn target_fields(&self, problems: &mut Vec<String>) -> Option<RemoteTarget> {
        let user = present(&self.user);
        if user.is_none() {
            problems.push("remote user is required".to_string());
        }

        let host = present(&self.host);
        if host.is_none() {
            problems.push("remote host is required".to_string());
        }

        let key_path = match self.key.as_deref().filter(|k| !k.as_os_str().is_empty()) {
            None => {
                problems.push("private key path is required".to_string());
                None
            }
            Some(key) => {
                let key = expand_home(key);
                match check_readable(&key) {
                    Ok(()) => Some(key),
                    Err(reason) => {
                        problems.push(format!(
                            "private key {} is not readable: {reason}",
                            key.display()
                        ));
                        None
                    }
                }
            }
        };

        if self.ssh_port == Some(0) {
            problems.push("SSH port must be 1-65535".to_string());
        }

        Some(RemoteTarget {
            host: host?.to_string(),
            user: user?.to_string(),
            key_path: key_path?,
            ssh_port: self.ssh_port.unwrap_or(22),
            connect_timeout: self.connect_timeout.unwrap_or(DEFAULT_CONNECT_TIMEOUT),
            trust_first_connection: self.trust_first_connection.unwrap_or(true),
        })
    }
}

fn check_readable(path: &Path) -> std::result::Result<(), String> {
    if !path.is_file() {
        return Err("no such file".to_string());
    }
    std::fs::File::open(path).map(|_| ()).map_err(|e| e.to_string())
}

/// Fixed remote identifiers. Not unique per deployment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WellKnownNames {
    pub image: String,
    pub container: String,
    pub compose_project: String,
    pub site_available: String,
    pub site_enabled: String,
}

impl Default for WellKnownNames {
    fn default() -> Self {
        Self {
            image: format!("{APP_NAME}:latest"),
            container: APP_NAME.to_string(),
            compose_project: APP_NAME.to_string(),
            site_available: format!("/etc/nginx/sites-available/{APP_NAME}"),
            site_enabled: format!("/etc/nginx/sites-enabled/{APP_NAME}"),
        }
    }
}

/// The request plus every value derived from it, threaded through all stages.
#[derive(Debug, Clone)]
pub struct DeployContext {
    pub request: DeploymentRequest,
    /// Local checkout, named from the repository base name.
    pub working_copy: PathBuf,
    /// Remote mirror directory, relative to the remote user's home.
    pub remote_app_dir: String,
    pub names: WellKnownNames,
}

impl DeployContext {
    /// Derive paths for a request, placing the working copy under `workdir`.
    pub fn new(request: DeploymentRequest, workdir: &Path) -> Self {
        let working_copy = workdir.join(request.repository.base_name());
        Self {
            request,
            working_copy,
            remote_app_dir: REMOTE_APP_DIR.to_string(),
            names: WellKnownNames::default(),
        }
    }

    pub fn target(&self) -> &RemoteTarget {
        &self.request.target
    }
}
