// ABOUTME: Cleanup command implementation.
// ABOUTME: Connects, removes the release, and succeeds even when nothing was deployed.

use crate::config::{REMOTE_APP_DIR, RemoteTarget, WellKnownNames};
use crate::deploy::{self, connectivity};
use crate::diagnostics::{Diagnostics, Warning};
use crate::error::Result;
use crate::output::Output;
use crate::remote::Connector;

/// Tear down the release on `target`.
pub async fn cleanup<C: Connector + ?Sized>(
    target: &RemoteTarget,
    connector: &C,
    output: &mut Output,
) -> Result<Diagnostics> {
    output.start_timer();
    let mut diag = Diagnostics::default();
    output.progress(&format!("Cleaning up {}", target.destination()));

    let remote = connectivity::check(connector, target, output).await?;
    deploy::cleanup(
        &remote,
        &WellKnownNames::default(),
        REMOTE_APP_DIR,
        output,
        &mut diag,
    )
    .await;

    if let Err(e) = connector.disconnect(remote).await {
        diag.warn(Warning::ssh_disconnect(format!(
            "SSH disconnect failed for {}: {}",
            target.host, e
        )));
    }

    for warning in diag.warnings() {
        output.warning(&warning.message);
    }
    output.success("Cleanup complete!");
    Ok(diag)
}
