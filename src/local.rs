// ABOUTME: Local process seam for git and rsync invocations.
// ABOUTME: Captures stdout/stderr so every tool's output can be appended to the run log.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;

use crate::ssh::CommandOutput;

/// A local program invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: Option<PathBuf>,
}

impl Invocation {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: None,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn current_dir(mut self, dir: &Path) -> Self {
        self.cwd = Some(dir.to_path_buf());
        self
    }

    /// Render for logs, replacing `secret` wherever it appears.
    pub fn display_redacted(&self, secret: Option<&str>) -> String {
        let line = std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ");
        match secret {
            Some(s) => redact(&line, s),
            None => line,
        }
    }
}

/// Replace `secret` and its percent-encoded form with `***`.
pub fn redact(text: &str, secret: &str) -> String {
    if secret.is_empty() {
        return text.to_string();
    }
    let encoded = urlencoding::encode(secret);
    text.replace(encoded.as_ref(), "***").replace(secret, "***")
}

/// Runs programs on the operator machine.
#[async_trait]
pub trait LocalRunner: Send + Sync {
    async fn run(&self, invocation: &Invocation) -> std::io::Result<CommandOutput>;
}

/// Runner backed by `tokio::process`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

#[async_trait]
impl LocalRunner for SystemRunner {
    async fn run(&self, invocation: &Invocation) -> std::io::Result<CommandOutput> {
        let mut command = Command::new(&invocation.program);
        command
            .args(&invocation.args)
            .env("GIT_TERMINAL_PROMPT", "0")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(dir) = &invocation.cwd {
            command.current_dir(dir);
        }

        let output = command.output().await?;

        Ok(CommandOutput {
            // Killed by signal has no code; report it as a generic failure.
            exit_code: output.status.code().map(|c| c as u32).unwrap_or(1),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_redacts_secret() {
        let inv = Invocation::new("git")
            .arg("clone")
            .arg("https://s3cr3t@example.com/demo.git");
        assert_eq!(
            inv.display_redacted(Some("s3cr3t")),
            "git clone https://***@example.com/demo.git"
        );
    }

    #[test]
    fn display_redacts_encoded_secret() {
        let inv = Invocation::new("git")
            .args(["remote", "set-url", "origin"])
            .arg("https://p%40ss%2Fword@example.com/demo.git");
        assert_eq!(
            inv.display_redacted(Some("p@ss/word")),
            "git remote set-url origin https://***@example.com/demo.git"
        );
    }

    #[test]
    fn display_without_secret_is_verbatim() {
        let inv = Invocation::new("rsync").args(["-az", "--delete"]);
        assert_eq!(inv.display_redacted(None), "rsync -az --delete");
    }

    #[tokio::test]
    async fn system_runner_captures_output_and_status() {
        let inv = Invocation::new("sh").args(["-c", "echo out; echo err >&2; exit 3"]);
        let output = SystemRunner.run(&inv).await.unwrap();
        assert_eq!(output.exit_code, 3);
        assert_eq!(output.stdout.trim(), "out");
        assert_eq!(output.stderr.trim(), "err");
    }
}
