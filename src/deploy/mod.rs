// ABOUTME: Deployment pipeline using the type state pattern.
// ABOUTME: One module per stage; Deployment<S> chains them in the only valid order.

pub mod cleanup;
pub mod connectivity;
pub mod container;
mod deployment;
pub mod health;
pub mod provision;
pub mod proxy;
pub mod source;
mod state;
pub mod transfer;

pub use cleanup::cleanup;
pub use container::Strategy;
pub use deployment::{DeployedRelease, Deployment};
pub use health::{HealthReport, HttpProbe, HyperProbe, ProbeResult};
pub use provision::ToolVersions;
pub use source::BuildDescriptor;
pub use state::{
    Connected, ContainerRunning, Initialized, Provisioned, ProxyActive, Synced, Transferred,
    Verified,
};

use crate::output::Output;
use crate::remote::RemoteExec;
use crate::ssh::{self, CommandOutput};

/// Run one remote command and record it in the run log.
pub(crate) async fn run_remote<R: RemoteExec + ?Sized>(
    remote: &R,
    output: &Output,
    command: &str,
) -> ssh::Result<CommandOutput> {
    let result = remote.exec(command).await;
    match &result {
        Ok(out) => output.command(command, out),
        Err(e) => {
            tracing::debug!(command, error = %e, "remote command did not complete");
            if let Some(log) = output.log() {
                log.line(&format!("$ {command} (transport error: {e})"));
            }
        }
    }
    result
}
