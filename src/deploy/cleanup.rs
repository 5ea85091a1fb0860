// ABOUTME: Teardown of the deployed release: containers, proxy site, unused resources.
// ABOUTME: Every step tolerates an empty host; failures become warnings.

use crate::config::WellKnownNames;
use crate::diagnostics::{Diagnostics, Warning};
use crate::output::Output;
use crate::remote::{RemoteExec, shell_quote};
use crate::ssh::CommandOutput;

use super::container::remote_descriptor;
use super::run_remote;
use super::source::BuildDescriptor;

/// Remove everything a deploy created on the host. Never fails.
pub async fn cleanup<R: RemoteExec + ?Sized>(
    remote: &R,
    names: &WellKnownNames,
    app_dir: &str,
    output: &Output,
    diag: &mut Diagnostics,
) {
    if let Ok(Some(BuildDescriptor::Compose(file))) =
        remote_descriptor(remote, app_dir, output).await
    {
        output.progress("  → Stopping compose services...");
        let down = format!(
            "cd {app_dir} && sudo docker compose -p {} -f {} down --remove-orphans",
            names.compose_project,
            shell_quote(&file)
        );
        tolerate(remote, output, diag, &down, |_| false).await;
    }

    output.progress(&format!("  → Removing container {}...", names.container));
    let remove = format!("sudo docker rm -f {}", names.container);
    tolerate(remote, output, diag, &remove, |out| {
        out.stderr.contains("No such container")
    })
    .await;

    output.progress("  → Pruning unused container resources...");
    tolerate(remote, output, diag, "sudo docker system prune -f", |_| false).await;

    output.progress("  → Removing proxy site...");
    let rm_site = format!(
        "sudo rm -f {} {}",
        names.site_enabled, names.site_available
    );
    tolerate(remote, output, diag, &rm_site, |_| false).await;

    output.progress("  → Reloading nginx...");
    tolerate(
        remote,
        output,
        diag,
        "sudo systemctl reload nginx",
        |_| false,
    )
    .await;
}

/// Run a step; `expected` marks failures that just mean "already gone".
async fn tolerate<R, F>(
    remote: &R,
    output: &Output,
    diag: &mut Diagnostics,
    command: &str,
    expected: F,
) where
    R: RemoteExec + ?Sized,
    F: Fn(&CommandOutput) -> bool,
{
    match run_remote(remote, output, command).await {
        Ok(out) if out.success() => {}
        Ok(out) if expected(&out) => {
            tracing::debug!(command, "nothing to remove");
        }
        Ok(out) => diag.warn(Warning::cleanup(format!(
            "`{command}` exited with {}: {}",
            out.exit_code,
            out.diagnostic()
        ))),
        Err(e) => diag.warn(Warning::cleanup(format!("`{command}`: {e}"))),
    }
}
