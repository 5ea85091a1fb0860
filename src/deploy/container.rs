// ABOUTME: Container deployer: compose up, or docker build and run under a fixed name.
// ABOUTME: Confirms a container with the well-known name is running afterwards.

use crate::config::DeployContext;
use crate::error::{Error, Result};
use crate::output::Output;
use crate::remote::{RemoteExec, shell_quote};

use super::run_remote;
use super::source::BuildDescriptor;

/// How the release was started.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Strategy {
    /// `docker compose up -d --build` with the given file.
    Compose(String),
    /// `docker build` then `docker run` of the single image.
    Dockerfile,
}

/// Look at what actually landed in the remote app directory.
pub async fn remote_descriptor<R: RemoteExec + ?Sized>(
    remote: &R,
    app_dir: &str,
    output: &Output,
) -> crate::ssh::Result<Option<BuildDescriptor>> {
    let out = run_remote(remote, output, &format!("ls -1A {app_dir}")).await?;
    if !out.success() {
        return Ok(None);
    }
    Ok(BuildDescriptor::from_names(out.stdout.lines()))
}

/// `docker ps` filtered on the well-known name, names only.
pub fn ps_command(name: &str) -> String {
    format!(
        "sudo docker ps --filter {} --format '{{{{.Names}}}}'",
        shell_quote(&format!("name={name}"))
    )
}

/// Build and start the release, then confirm it is running.
pub async fn deploy<R: RemoteExec + ?Sized>(
    remote: &R,
    ctx: &DeployContext,
    output: &Output,
) -> Result<Strategy> {
    let names = &ctx.names;
    let app_dir = &ctx.remote_app_dir;

    let descriptor = remote_descriptor(remote, app_dir, output)
        .await
        .map_err(|e| Error::DeployVerification(e.to_string()))?
        .ok_or_else(|| {
            Error::MissingBuildDescriptor(format!("{}:{}", ctx.target().host, app_dir))
        })?;

    let strategy = match descriptor {
        BuildDescriptor::Compose(file) => {
            output.progress(&format!("  → Starting services with {file}..."));
            let up = format!(
                "cd {app_dir} && sudo docker compose -p {} -f {} up -d --build",
                names.compose_project,
                shell_quote(&file)
            );
            step(remote, output, &up, "docker compose up").await?;
            Strategy::Compose(file)
        }
        BuildDescriptor::Dockerfile => {
            output.progress(&format!("  → Building image {}...", names.image));
            let build = format!("sudo docker build -t {} {app_dir}", names.image);
            step(remote, output, &build, "docker build").await?;

            // A fixed name means the previous release must go first.
            output.progress(&format!("  → Replacing container {}...", names.container));
            let remove = format!("sudo docker rm -f {}", names.container);
            let removed = run_remote(remote, output, &remove)
                .await
                .map_err(|e| Error::DeployVerification(e.to_string()))?;
            if !removed.success() && !removed.stderr.contains("No such container") {
                return Err(Error::DeployVerification(format!(
                    "cannot remove previous {}: {}",
                    names.container,
                    removed.diagnostic()
                )));
            }

            let port = ctx.request.application_port;
            let run = format!(
                "sudo docker run -d --name {} --restart unless-stopped -p 127.0.0.1:{port}:{port} {}",
                names.container, names.image
            );
            step(remote, output, &run, "docker run").await?;
            Strategy::Dockerfile
        }
    };

    let ps = run_remote(remote, output, &ps_command(&names.container))
        .await
        .map_err(|e| Error::DeployVerification(e.to_string()))?;
    let running: Vec<&str> = ps.stdout.lines().filter(|l| !l.trim().is_empty()).collect();
    if !ps.success() || running.is_empty() {
        return Err(Error::DeployVerification(format!(
            "no running container matches {}",
            names.container
        )));
    }

    output.progress(&format!("  ✓ Running: {}", running.join(", ")));
    Ok(strategy)
}

async fn step<R: RemoteExec + ?Sized>(
    remote: &R,
    output: &Output,
    command: &str,
    what: &str,
) -> Result<()> {
    let out = run_remote(remote, output, command)
        .await
        .map_err(|e| Error::DeployVerification(format!("{what}: {e}")))?;
    if !out.success() {
        return Err(Error::DeployVerification(format!(
            "{what} exited with {}: {}",
            out.exit_code,
            out.diagnostic()
        )));
    }
    Ok(())
}
