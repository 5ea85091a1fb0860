// ABOUTME: nginx site generation and activation.
// ABOUTME: Writes, symlinks and validates with nginx -t; reloads on success, restores the old files otherwise.

use crate::config::DeployContext;
use crate::error::{Error, Result};
use crate::output::Output;
use crate::remote::{RemoteExec, shell_quote};

use super::run_remote;

/// Stock site shipped by Debian/Ubuntu nginx; it also claims port 80.
pub const DEFAULT_SITE: &str = "/etc/nginx/sites-enabled/default";

/// Render the site definition forwarding port 80 to the application port.
pub fn render_site(application_port: u16) -> String {
    format!(
        r#"server {{
    listen 80;
    server_name _;

    location / {{
        proxy_pass http://127.0.0.1:{application_port};
        proxy_set_header Host $host;
        proxy_set_header X-Real-IP $remote_addr;
        proxy_set_header X-Forwarded-For $proxy_add_x_forwarded_for;
        proxy_set_header X-Forwarded-Proto $scheme;
        proxy_read_timeout 90;
    }}
}}
"#
    )
}

/// Where the stock site is parked while ours is validated; outside `sites-enabled`.
pub const PARKED_DEFAULT_SITE: &str = "/etc/nginx/sites-available/default.skiff-disabled";

/// Which pieces of the proxy setup existed before this run touched them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Snapshot {
    site: bool,
    link: bool,
    default_site: bool,
}

fn backup_path(site_available: &str) -> String {
    format!("{site_available}.prev")
}

/// Install and activate the site. A rejected config never reaches the daemon,
/// and the files on disk are put back the way they were.
pub async fn configure<R: RemoteExec + ?Sized>(
    remote: &R,
    ctx: &DeployContext,
    output: &Output,
) -> Result<()> {
    let names = &ctx.names;
    let site = render_site(ctx.request.application_port);

    let snapshot = take_snapshot(remote, ctx, output).await?;

    if let Err(e) = install(remote, ctx, output, &site, snapshot).await {
        output.progress("  → Restoring previous nginx configuration...");
        let problems = restore(remote, ctx, output, snapshot).await;
        if problems.is_empty() {
            return Err(e);
        }
        return Err(Error::ProxyConfig(format!(
            "{}; restore incomplete: {}",
            proxy_message(e),
            problems.join("; ")
        )));
    }

    step(remote, output, "sudo systemctl reload nginx", "reload nginx").await?;

    let discard = format!(
        "sudo rm -f {} {PARKED_DEFAULT_SITE}",
        backup_path(&names.site_available)
    );
    if let Err(e) = step(remote, output, &discard, "discard backups").await {
        tracing::warn!("{}", e);
    }

    output.progress(&format!(
        "  ✓ nginx forwarding :80 → 127.0.0.1:{}",
        ctx.request.application_port
    ));
    Ok(())
}

async fn take_snapshot<R: RemoteExec + ?Sized>(
    remote: &R,
    ctx: &DeployContext,
    output: &Output,
) -> Result<Snapshot> {
    let names = &ctx.names;
    let snapshot = Snapshot {
        site: exists(remote, output, &names.site_available).await?,
        link: exists(remote, output, &names.site_enabled).await?,
        default_site: exists(remote, output, DEFAULT_SITE).await?,
    };

    if snapshot.site {
        let backup = format!(
            "sudo cp -a {} {}",
            names.site_available,
            backup_path(&names.site_available)
        );
        step(remote, output, &backup, "back up site definition").await?;
    }
    Ok(snapshot)
}

async fn install<R: RemoteExec + ?Sized>(
    remote: &R,
    ctx: &DeployContext,
    output: &Output,
    site: &str,
    snapshot: Snapshot,
) -> Result<()> {
    let names = &ctx.names;

    output.progress(&format!("  → Writing {}...", names.site_available));
    let write = format!(
        "printf '%s' {} | sudo tee {} > /dev/null",
        shell_quote(site),
        names.site_available
    );
    step(remote, output, &write, "write site definition").await?;

    // -sfn replaces an existing link so reruns never duplicate the site.
    let link = format!(
        "sudo ln -sfn {} {}",
        names.site_available, names.site_enabled
    );
    step(remote, output, &link, "enable site").await?;

    if snapshot.default_site {
        let park = format!("sudo mv -f {DEFAULT_SITE} {PARKED_DEFAULT_SITE}");
        step(remote, output, &park, "disable default site").await?;
    }

    output.progress("  → Validating nginx configuration...");
    let test = run_remote(remote, output, "sudo nginx -t")
        .await
        .map_err(|e| Error::ProxyConfig(format!("nginx -t: {e}")))?;
    if !test.success() {
        return Err(Error::ProxyConfig(test.diagnostic().to_string()));
    }
    Ok(())
}

/// Undo `install`. Returns what could not be put back.
async fn restore<R: RemoteExec + ?Sized>(
    remote: &R,
    ctx: &DeployContext,
    output: &Output,
    snapshot: Snapshot,
) -> Vec<String> {
    let names = &ctx.names;
    let mut commands = Vec::new();

    if snapshot.default_site {
        commands.push(format!(
            "if sudo test -e {PARKED_DEFAULT_SITE} -o -L {PARKED_DEFAULT_SITE}; then sudo mv -f {PARKED_DEFAULT_SITE} {DEFAULT_SITE}; fi"
        ));
    }
    if !snapshot.link {
        commands.push(format!("sudo rm -f {}", names.site_enabled));
    }
    if snapshot.site {
        commands.push(format!(
            "sudo mv -f {} {}",
            backup_path(&names.site_available),
            names.site_available
        ));
    } else {
        commands.push(format!("sudo rm -f {}", names.site_available));
    }

    let mut problems = Vec::new();
    for command in commands {
        if let Err(e) = step(remote, output, &command, "restore").await {
            tracing::warn!("{}", e);
            problems.push(proxy_message(e));
        }
    }
    problems
}

/// `sudo test` so paths under root-only directories are visible too.
async fn exists<R: RemoteExec + ?Sized>(remote: &R, output: &Output, path: &str) -> Result<bool> {
    run_remote(remote, output, &format!("sudo test -e {path} -o -L {path}"))
        .await
        .map(|out| out.success())
        .map_err(|e| Error::ProxyConfig(format!("inspect {path}: {e}")))
}

fn proxy_message(error: Error) -> String {
    match error {
        Error::ProxyConfig(message) => message,
        other => other.to_string(),
    }
}

async fn step<R: RemoteExec + ?Sized>(
    remote: &R,
    output: &Output,
    command: &str,
    what: &str,
) -> Result<()> {
    let out = run_remote(remote, output, command)
        .await
        .map_err(|e| Error::ProxyConfig(format!("{what}: {e}")))?;
    if !out.success() {
        return Err(Error::ProxyConfig(format!(
            "{what} exited with {}: {}",
            out.exit_code,
            out.diagnostic()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn site_matches_expected_layout() {
        let expected = "server {
    listen 80;
    server_name _;

    location / {
        proxy_pass http://127.0.0.1:3000;
        proxy_set_header Host $host;
        proxy_set_header X-Real-IP $remote_addr;
        proxy_set_header X-Forwarded-For $proxy_add_x_forwarded_for;
        proxy_set_header X-Forwarded-Proto $scheme;
        proxy_read_timeout 90;
    }
}
";
        assert_eq!(render_site(3000), expected);
    }

    #[test]
    fn site_uses_application_port() {
        assert!(render_site(8080).contains("proxy_pass http://127.0.0.1:8080;"));
    }
}
