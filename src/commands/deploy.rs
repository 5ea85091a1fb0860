// ABOUTME: Deploy command implementation.
// ABOUTME: Drives the deployment state machine and reports warnings at the end.

use crate::config::DeployContext;
use crate::deploy::{DeployedRelease, Deployment, HttpProbe};
use crate::diagnostics::{Diagnostics, Warning};
use crate::error::{Error, Result};
use crate::local::LocalRunner;
use crate::output::Output;
use crate::remote::Connector;

/// Run the whole pipeline against one host. Stops at the first error.
pub async fn deploy<C, L, P>(
    ctx: &DeployContext,
    connector: &C,
    runner: &L,
    probe: &P,
    output: &mut Output,
) -> Result<DeployedRelease>
where
    C: Connector + ?Sized,
    L: LocalRunner + ?Sized,
    P: HttpProbe + ?Sized,
{
    output.start_timer();
    let mut diag = Diagnostics::default();
    let request = &ctx.request;

    output.progress(&format!(
        "Deploying {} ({}) to {}",
        request.repository,
        request.branch,
        ctx.target().destination()
    ));

    let deployment = Deployment::new(ctx).sync_source(runner, output).await?;
    let (deployment, remote) = deployment.check_connectivity(connector, output).await?;

    let result = async {
        let deployment = deployment.provision(&remote, output, &mut diag).await?;
        let deployment = deployment.transfer(&remote, runner, output).await?;
        let deployment = deployment.start_container(&remote, output).await?;
        let deployment = deployment.configure_proxy(&remote, output).await?;
        let deployment = deployment
            .verify(&remote, probe, output, &mut diag)
            .await?;
        Ok::<_, Error>(deployment.finish())
    }
    .await;

    // Disconnect SSH session (non-fatal if it fails)
    if let Err(e) = connector.disconnect(remote).await {
        diag.warn(Warning::ssh_disconnect(format!(
            "SSH disconnect failed for {}: {}",
            ctx.target().host,
            e
        )));
    }

    for warning in diag.warnings() {
        output.warning(&warning.message);
    }

    if result.is_ok() {
        output.success(&format!(
            "Deployment complete! http://{}/ → 127.0.0.1:{}",
            ctx.target().host,
            request.application_port
        ));
    }
    result
}
