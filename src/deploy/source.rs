// ABOUTME: Source synchronizer: clone or refresh the local working copy.
// ABOUTME: Also detects which container build descriptor the checkout provides.

use std::path::Path;

use crate::config::DeployContext;
use crate::error::{Error, Result};
use crate::local::{Invocation, LocalRunner, redact};
use crate::output::Output;
use crate::ssh::CommandOutput;

/// Compose file names, in lookup order.
pub const COMPOSE_FILES: [&str; 4] = [
    "docker-compose.yml",
    "docker-compose.yaml",
    "compose.yml",
    "compose.yaml",
];

pub const DOCKERFILE: &str = "Dockerfile";

/// What the checkout knows how to build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildDescriptor {
    /// A compose definition; preferred when present.
    Compose(String),
    /// A single Dockerfile.
    Dockerfile,
}

impl BuildDescriptor {
    /// Pick a descriptor from a directory listing. Compose wins over Dockerfile.
    pub fn from_names<'a>(names: impl IntoIterator<Item = &'a str>) -> Option<Self> {
        let names: Vec<&str> = names.into_iter().map(str::trim).collect();
        if let Some(file) = COMPOSE_FILES.iter().find(|f| names.contains(f)) {
            return Some(BuildDescriptor::Compose((*file).to_string()));
        }
        names
            .contains(&DOCKERFILE)
            .then_some(BuildDescriptor::Dockerfile)
    }

    /// Inspect a local directory.
    pub fn detect(dir: &Path) -> Option<Self> {
        let entries = std::fs::read_dir(dir).ok()?;
        let names: Vec<String> = entries
            .filter_map(|e| e.ok())
            .filter(|e| e.path().is_file())
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .collect();
        Self::from_names(names.iter().map(String::as_str))
    }
}

impl std::fmt::Display for BuildDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BuildDescriptor::Compose(file) => write!(f, "compose ({file})"),
            BuildDescriptor::Dockerfile => write!(f, "{DOCKERFILE}"),
        }
    }
}

/// Bring the working copy to the branch tip and confirm it is buildable.
///
/// Existing copies are refreshed (fetch with prune, checkout, pull); missing
/// ones are cloned single-branch with the token as URL user-info. The token
/// never reaches the run log.
pub async fn synchronize<L: LocalRunner + ?Sized>(
    runner: &L,
    ctx: &DeployContext,
    output: &Output,
) -> Result<BuildDescriptor> {
    let request = &ctx.request;
    let dir = &ctx.working_copy;
    let auth_url = request.repository.authenticated(&request.token);
    let branch = request.branch.as_str();

    if dir.exists() {
        output.progress(&format!(
            "  → Updating {} ({})...",
            dir.display(),
            branch
        ));
        let steps = [
            Invocation::new("git")
                .args(["remote", "set-url", "origin", auth_url.as_str()])
                .current_dir(dir),
            Invocation::new("git")
                .args(["fetch", "--all", "--prune"])
                .current_dir(dir),
            Invocation::new("git")
                .args(["checkout", branch])
                .current_dir(dir),
            Invocation::new("git")
                .args(["pull", "origin", branch])
                .current_dir(dir),
        ];
        for step in &steps {
            run_git(runner, ctx, output, step).await?;
        }
    } else {
        output.progress(&format!(
            "  → Cloning {} ({}) into {}...",
            request.repository,
            branch,
            dir.display()
        ));
        let clone = Invocation::new("git").args([
            "clone".to_string(),
            "--branch".to_string(),
            branch.to_string(),
            "--single-branch".to_string(),
            auth_url.clone(),
            dir.to_string_lossy().into_owned(),
        ]);
        run_git(runner, ctx, output, &clone).await?;
    }

    let descriptor = BuildDescriptor::detect(dir)
        .ok_or_else(|| Error::MissingBuildDescriptor(dir.display().to_string()))?;
    output.progress(&format!("  → Found build descriptor: {descriptor}"));
    Ok(descriptor)
}

async fn run_git<L: LocalRunner + ?Sized>(
    runner: &L,
    ctx: &DeployContext,
    output: &Output,
    invocation: &Invocation,
) -> Result<()> {
    let secret = ctx.request.token.expose();
    let shown = invocation.display_redacted(Some(secret));

    let result = runner
        .run(invocation)
        .await
        .map_err(|e| Error::Sync(format!("failed to run `{shown}`: {e}")))?;
    let result = redact_output(result, secret);
    output.command(&shown, &result);

    if !result.success() {
        return Err(Error::Sync(format!(
            "`{shown}` exited with {}: {}",
            result.exit_code,
            result.diagnostic()
        )));
    }
    Ok(())
}

fn redact_output(mut output: CommandOutput, secret: &str) -> CommandOutput {
    output.stdout = redact(&output.stdout, secret);
    output.stderr = redact(&output.stderr, secret);
    output
}
