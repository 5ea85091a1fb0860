// ABOUTME: Idempotent remote provisioning: Docker, the compose plugin and nginx.
// ABOUTME: Only package index and baseline installs are fatal; the rest warns.

use crate::diagnostics::{Diagnostics, Warning};
use crate::error::{Error, Result};
use crate::output::Output;
use crate::remote::{RemoteExec, shell_quote};
use crate::ssh::CommandOutput;

use super::run_remote;

const APT_UPDATE: &str = "sudo env DEBIAN_FRONTEND=noninteractive apt-get update -y";
const BASELINE_PACKAGES: &str = "ca-certificates curl rsync";
const DOCKER_INSTALL: &str = "curl -fsSL https://get.docker.com | sudo sh";
const SERVICES: [&str; 2] = ["docker", "nginx"];
// nginx lives in /usr/sbin, which is not on a non-root SSH user's PATH on Debian.
const NGINX_PRESENT: &str = "sudo sh -c 'command -v nginx'";

/// Versions reported after provisioning. Diagnostic only.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolVersions {
    pub docker: Option<String>,
    pub compose: Option<String>,
    pub nginx: Option<String>,
}

fn apt_install(packages: &str) -> String {
    format!("sudo env DEBIAN_FRONTEND=noninteractive apt-get install -y {packages}")
}

/// Make the host ready to run containers behind nginx.
///
/// Safe to repeat: each install is guarded by a presence probe, so an
/// already-provisioned host only sees the index refresh and read-only checks.
pub async fn provision<R: RemoteExec + ?Sized>(
    remote: &R,
    user: &str,
    output: &Output,
    diag: &mut Diagnostics,
) -> Result<ToolVersions> {
    output.progress("  → Refreshing package index...");
    require(remote, output, APT_UPDATE, "package index refresh").await?;

    output.progress("  → Installing baseline utilities...");
    require(
        remote,
        output,
        &apt_install(BASELINE_PACKAGES),
        "baseline utilities",
    )
    .await?;

    if probe(remote, output, "command -v docker").await? {
        output.progress("  → Docker already installed");
    } else {
        output.progress("  → Installing Docker...");
        require(remote, output, DOCKER_INSTALL, "docker install").await?;
    }

    if probe(remote, output, "sudo docker compose version").await? {
        output.progress("  → Compose plugin already installed");
    } else {
        output.progress("  → Installing compose plugin...");
        require(
            remote,
            output,
            &apt_install("docker-compose-plugin"),
            "compose plugin install",
        )
        .await?;
    }

    if probe(remote, output, NGINX_PRESENT).await? {
        output.progress("  → nginx already installed");
    } else {
        output.progress("  → Installing nginx...");
        require(remote, output, &apt_install("nginx"), "nginx install").await?;
    }

    ensure_docker_group(remote, user, output, diag).await;

    for service in SERVICES {
        let command = format!("sudo systemctl enable --now {service}");
        match run_remote(remote, output, &command).await {
            Ok(out) if out.success() => {}
            Ok(out) => diag.warn(Warning::service_enable(format!(
                "could not enable {service}: {}",
                out.diagnostic()
            ))),
            Err(e) => diag.warn(Warning::service_enable(format!(
                "could not enable {service}: {e}"
            ))),
        }
    }

    let versions = ToolVersions {
        docker: version(remote, output, "docker --version").await,
        compose: version(remote, output, "sudo docker compose version").await,
        nginx: version(remote, output, "sudo nginx -v").await,
    };
    for (tool, v) in [
        ("docker", &versions.docker),
        ("compose", &versions.compose),
        ("nginx", &versions.nginx),
    ] {
        output.progress(&format!(
            "    {tool}: {}",
            v.as_deref().unwrap_or("unknown")
        ));
    }

    Ok(versions)
}

async fn ensure_docker_group<R: RemoteExec + ?Sized>(
    remote: &R,
    user: &str,
    output: &Output,
    diag: &mut Diagnostics,
) {
    let user = shell_quote(user);
    let member = match run_remote(remote, output, &format!("id -nG {user}")).await {
        Ok(out) if out.success() => out.stdout.split_whitespace().any(|g| g == "docker"),
        _ => false,
    };
    if member {
        return;
    }

    output.progress("  → Adding user to docker group...");
    match run_remote(remote, output, &format!("sudo usermod -aG docker {user}")).await {
        Ok(out) if out.success() => {}
        Ok(out) => diag.warn(Warning::group_membership(format!(
            "could not add {user} to docker group: {}",
            out.diagnostic()
        ))),
        Err(e) => diag.warn(Warning::group_membership(format!(
            "could not add {user} to docker group: {e}"
        ))),
    }
}

async fn require<R: RemoteExec + ?Sized>(
    remote: &R,
    output: &Output,
    command: &str,
    what: &str,
) -> Result<CommandOutput> {
    let out = run_remote(remote, output, command)
        .await
        .map_err(|e| Error::Provision(format!("{what}: {e}")))?;
    if !out.success() {
        return Err(Error::Provision(format!(
            "{what} exited with {}: {}",
            out.exit_code,
            out.diagnostic()
        )));
    }
    Ok(out)
}

/// Read-only presence check. Transport failures still abort.
async fn probe<R: RemoteExec + ?Sized>(remote: &R, output: &Output, command: &str) -> Result<bool> {
    run_remote(remote, output, command)
        .await
        .map(|out| out.success())
        .map_err(|e| Error::Provision(format!("`{command}`: {e}")))
}

async fn version<R: RemoteExec + ?Sized>(
    remote: &R,
    output: &Output,
    command: &str,
) -> Option<String> {
    let out = run_remote(remote, output, command).await.ok()?;
    // nginx -v prints to stderr.
    out.success()
        .then(|| out.diagnostic().lines().next().unwrap_or("").to_string())
        .filter(|v| !v.is_empty())
}
