// ABOUTME: Application-wide error types for skiff.
// ABOUTME: One variant per pipeline failure class, plus config loading errors.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid input: {0}")]
    InputValidation(String),

    #[error("source sync failed: {0}")]
    Sync(String),

    #[error("no Dockerfile or compose definition found in {0}")]
    MissingBuildDescriptor(String),

    #[error("cannot reach remote host: {0}")]
    Connectivity(String),

    #[error("provisioning failed: {0}")]
    Provision(String),

    #[error("artifact transfer failed: {0}")]
    Transfer(String),

    #[error("container not running after start: {0}")]
    DeployVerification(String),

    #[error("proxy configuration rejected: {0}")]
    ProxyConfig(String),

    #[error("post-deploy validation failed: {0}")]
    Validation(String),

    #[error("configuration file not found: {0}")]
    ConfigNotFound(PathBuf),

    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Error kind for programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InputValidation,
    Sync,
    MissingBuildDescriptor,
    Connectivity,
    Provision,
    Transfer,
    DeployVerification,
    ProxyConfig,
    Validation,
    Config,
}

impl Error {
    /// Returns the error kind for programmatic handling.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::InputValidation(_) => ErrorKind::InputValidation,
            Error::Sync(_) => ErrorKind::Sync,
            Error::MissingBuildDescriptor(_) => ErrorKind::MissingBuildDescriptor,
            Error::Connectivity(_) => ErrorKind::Connectivity,
            Error::Provision(_) => ErrorKind::Provision,
            Error::Transfer(_) => ErrorKind::Transfer,
            Error::DeployVerification(_) => ErrorKind::DeployVerification,
            Error::ProxyConfig(_) => ErrorKind::ProxyConfig,
            Error::Validation(_) => ErrorKind::Validation,
            Error::ConfigNotFound(_) | Error::MissingEnvVar(_) | Error::Io(_) | Error::Yaml(_) => {
                ErrorKind::Config
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_maps_config_errors_together() {
        let err = Error::MissingEnvVar("SKIFF_TOKEN".to_string());
        assert_eq!(err.kind(), ErrorKind::Config);

        let err = Error::ConfigNotFound(PathBuf::from("/tmp"));
        assert_eq!(err.kind(), ErrorKind::Config);
    }

    #[test]
    fn display_names_the_stage() {
        let err = Error::ProxyConfig("nginx: [emerg] unexpected \"}\"".to_string());
        assert!(err.to_string().starts_with("proxy configuration rejected"));
    }
}
