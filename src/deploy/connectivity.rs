// ABOUTME: Remote connectivity check run before any remote mutation.
// ABOUTME: Connects non-interactively and runs a no-op, all within the connect timeout.

use crate::config::RemoteTarget;
use crate::error::{Error, Result};
use crate::output::Output;
use crate::remote::{Connector, RemoteExec};

/// Open the run's remote connection and prove it can execute commands.
///
/// Nothing on the host changes here. The whole check (TCP, handshake,
/// authentication, `true`) is bounded by `target.connect_timeout`.
pub async fn check<C: Connector + ?Sized>(
    connector: &C,
    target: &RemoteTarget,
    output: &Output,
) -> Result<C::Remote> {
    output.progress(&format!(
        "  → Checking SSH access to {} (port {})...",
        target.destination(),
        target.ssh_port
    ));

    let timeout = target.connect_timeout;
    let attempt = async {
        let remote = connector.connect(&target.session_config()).await?;
        let probe = remote.exec("true").await?;
        Ok::<_, crate::ssh::Error>((remote, probe))
    };

    let (remote, probe) = match tokio::time::timeout(timeout, attempt).await {
        Ok(Ok(pair)) => pair,
        Ok(Err(e)) => {
            return Err(Error::Connectivity(format!(
                "{}: {e}",
                target.destination()
            )));
        }
        Err(_) => {
            return Err(Error::Connectivity(format!(
                "{}: no response within {:?}",
                target.destination(),
                timeout
            )));
        }
    };

    if !probe.success() {
        return Err(Error::Connectivity(format!(
            "{}: remote shell exited with {}",
            target.destination(),
            probe.exit_code
        )));
    }

    output.progress("  ✓ SSH connection OK");
    Ok(remote)
}
