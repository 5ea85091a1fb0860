// ABOUTME: Remote command seam used by every pipeline stage.
// ABOUTME: Runs one shell command on the target host and returns its exit status and output.

use crate::ssh::{self, CommandOutput, Session, SessionConfig};
use async_trait::async_trait;

/// Run a command on the remote host, capture output, return exit status.
///
/// Implemented by [`Session`]; tests substitute a scripted fake.
#[async_trait]
pub trait RemoteExec: Send + Sync {
    async fn exec(&self, command: &str) -> ssh::Result<CommandOutput>;
}

#[async_trait]
impl RemoteExec for Session {
    async fn exec(&self, command: &str) -> ssh::Result<CommandOutput> {
        Session::exec(self, command).await
    }
}

/// Opens the remote side of a run.
#[async_trait]
pub trait Connector: Send + Sync {
    type Remote: RemoteExec;

    async fn connect(&self, config: &SessionConfig) -> ssh::Result<Self::Remote>;

    /// Release the connection. Errors are reported, never fatal.
    async fn disconnect(&self, remote: Self::Remote) -> ssh::Result<()>;
}

/// Connector backed by russh.
#[derive(Debug, Clone, Copy, Default)]
pub struct SshConnector;

#[async_trait]
impl Connector for SshConnector {
    type Remote = Session;

    async fn connect(&self, config: &SessionConfig) -> ssh::Result<Session> {
        Session::connect(config.clone()).await
    }

    async fn disconnect(&self, remote: Session) -> ssh::Result<()> {
        remote.disconnect().await
    }
}

/// Quote a value for a POSIX shell using single quotes.
pub fn shell_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', "'\\''"))
}
