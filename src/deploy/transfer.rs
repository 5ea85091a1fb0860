// ABOUTME: Mirrors the working copy to the remote app directory with rsync.
// ABOUTME: Deletes remote files missing locally, preserves modes, compresses in transit.

use crate::config::{DeployContext, RemoteTarget};
use crate::error::{Error, Result};
use crate::local::{Invocation, LocalRunner};
use crate::output::Output;
use crate::remote::{RemoteExec, shell_quote};

use super::run_remote;

/// The ssh command rsync uses as its transport.
pub fn ssh_transport(target: &RemoteTarget) -> String {
    let host_keys = if target.trust_first_connection {
        "accept-new"
    } else {
        "yes"
    };
    format!(
        "ssh -i {} -p {} -o BatchMode=yes -o StrictHostKeyChecking={}",
        shell_quote(&target.key_path.to_string_lossy()),
        target.ssh_port,
        host_keys
    )
}

/// Full rsync invocation for a context.
pub fn rsync_invocation(ctx: &DeployContext) -> Invocation {
    let target = ctx.target();
    // Trailing slash: copy the directory's contents, not the directory.
    let source = format!("{}/", ctx.working_copy.to_string_lossy());
    let destination = format!("{}:{}/", target.destination(), ctx.remote_app_dir);

    Invocation::new("rsync").args([
        "-az".to_string(),
        "--delete".to_string(),
        "--exclude".to_string(),
        ".git/".to_string(),
        "-e".to_string(),
        ssh_transport(target),
        source,
        destination,
    ])
}

/// Mirror the working copy into `~/app` on the host.
pub async fn mirror<R, L>(
    remote: &R,
    runner: &L,
    ctx: &DeployContext,
    output: &Output,
) -> Result<()>
where
    R: RemoteExec + ?Sized,
    L: LocalRunner + ?Sized,
{
    output.progress(&format!(
        "  → Syncing {} to {}:{}...",
        ctx.working_copy.display(),
        ctx.target().host,
        ctx.remote_app_dir
    ));

    let mkdir = format!("mkdir -p {}", ctx.remote_app_dir);
    let out = run_remote(remote, output, &mkdir)
        .await
        .map_err(|e| Error::Transfer(e.to_string()))?;
    if !out.success() {
        return Err(Error::Transfer(format!(
            "cannot create {}: {}",
            ctx.remote_app_dir,
            out.diagnostic()
        )));
    }

    let invocation = rsync_invocation(ctx);
    let shown = invocation.display_redacted(None);
    let out = runner
        .run(&invocation)
        .await
        .map_err(|e| Error::Transfer(format!("failed to run rsync: {e}")))?;
    output.command(&shown, &out);

    if !out.success() {
        return Err(Error::Transfer(format!(
            "rsync exited with {}: {}",
            out.exit_code,
            out.diagnostic()
        )));
    }

    output.progress("  ✓ Files synced");
    Ok(())
}
