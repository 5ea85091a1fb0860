// ABOUTME: Append-only run log, one file per invocation.
// ABOUTME: Records progress lines and the full output of every local and remote command.

use chrono::{DateTime, Local};
use parking_lot::Mutex;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::ssh::CommandOutput;

/// One log file per run, named from the process start time.
#[derive(Debug)]
pub struct RunLog {
    path: PathBuf,
    file: Mutex<File>,
}

impl RunLog {
    /// File name for a run started at `started`.
    pub fn file_name(started: DateTime<Local>) -> String {
        format!("skiff-{}.log", started.format("%Y%m%d-%H%M%S"))
    }

    /// Create the log for a run starting now in `dir`.
    pub fn create(dir: &Path) -> std::io::Result<Self> {
        let started = Local::now();
        let log = Self::open(&dir.join(Self::file_name(started)))?;
        log.line(&format!(
            "skiff {} run started {} on {}",
            env!("CARGO_PKG_VERSION"),
            started.to_rfc3339(),
            gethostname::gethostname().to_string_lossy()
        ));
        Ok(log)
    }

    /// Open (or append to) a log at an explicit path.
    pub fn open(path: &Path) -> std::io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            file: Mutex::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append a single line.
    pub fn line(&self, message: &str) {
        let stamp = Local::now().format("%H:%M:%S");
        let mut file = self.file.lock();
        if let Err(e) = writeln!(file, "[{stamp}] {message}") {
            tracing::warn!("failed to write run log {}: {}", self.path.display(), e);
        }
    }

    /// Append a command and everything it printed.
    pub fn command(&self, command: &str, output: &CommandOutput) {
        let mut block = format!("$ {command}\n");
        for line in output.stdout.lines() {
            block.push_str(line);
            block.push('\n');
        }
        for line in output.stderr.lines() {
            block.push_str("! ");
            block.push_str(line);
            block.push('\n');
        }
        block.push_str(&format!("(exit {})", output.exit_code));

        let mut file = self.file.lock();
        if let Err(e) = writeln!(file, "{block}") {
            tracing::warn!("failed to write run log {}: {}", self.path.display(), e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn file_name_uses_start_timestamp() {
        let started = Local.with_ymd_and_hms(2026, 3, 4, 5, 6, 7).unwrap();
        assert_eq!(RunLog::file_name(started), "skiff-20260304-050607.log");
    }

    #[test]
    fn command_output_is_appended() {
        let dir = tempfile::tempdir().unwrap();
        let log = RunLog::open(&dir.path().join("run.log")).unwrap();

        log.line("syncing");
        log.command(
            "git pull origin main",
            &CommandOutput {
                exit_code: 0,
                stdout: "Already up to date.\n".to_string(),
                stderr: "From example.com\n".to_string(),
            },
        );

        let content = std::fs::read_to_string(log.path()).unwrap();
        assert!(content.contains("syncing"));
        assert!(content.contains("$ git pull origin main"));
        assert!(content.contains("Already up to date."));
        assert!(content.contains("! From example.com"));
        assert!(content.contains("(exit 0)"));
    }

    #[test]
    fn create_writes_header() {
        let dir = tempfile::tempdir().unwrap();
        let log = RunLog::create(dir.path()).unwrap();
        let content = std::fs::read_to_string(log.path()).unwrap();
        assert!(content.contains("run started"));
        assert!(
            log.path()
                .file_name()
                .unwrap()
                .to_string_lossy()
                .starts_with("skiff-")
        );
    }
}
