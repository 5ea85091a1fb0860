// ABOUTME: Test support utilities.
// ABOUTME: Scripted fakes for the remote, connector, local runner and HTTP probe seams.

// Each test binary only uses some of these helpers.
#![allow(dead_code)]

use async_trait::async_trait;
use parking_lot::Mutex;
use skiff::config::{DeployContext, RequestInput};
use skiff::deploy::{HttpProbe, ProbeResult};
use skiff::local::{Invocation, LocalRunner};
use skiff::output::{Output, OutputMode};
use skiff::remote::{Connector, RemoteExec};
use skiff::ssh::{self, CommandOutput, SessionConfig};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Once};
use std::time::Duration;

static TRACING_INIT: Once = Once::new();

/// Initialize tracing for tests. Safe to call multiple times.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::EnvFilter;
        let filter = EnvFilter::from_default_env().add_directive("skiff=debug".parse().unwrap());
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init()
            .ok();
    });
}

pub fn ok(stdout: &str) -> CommandOutput {
    CommandOutput {
        exit_code: 0,
        stdout: stdout.to_string(),
        stderr: String::new(),
    }
}

pub fn failed(exit_code: u32, stderr: &str) -> CommandOutput {
    CommandOutput {
        exit_code,
        stdout: String::new(),
        stderr: stderr.to_string(),
    }
}

/// Remote host that answers commands from a script.
///
/// The most recently added rule whose pattern is a substring of the command
/// wins; anything unmatched succeeds with empty output. Every command is
/// recorded.
#[derive(Clone, Default)]
pub struct FakeRemote {
    rules: Arc<Mutex<Vec<(String, CommandOutput)>>>,
    log: Arc<Mutex<Vec<String>>>,
}

impl FakeRemote {
    /// A host where Docker, compose and nginx are present and the uploaded
    /// tree holds a Dockerfile.
    pub fn healthy() -> Self {
        let remote = Self::default();
        remote.respond("ls -1A", ok("Dockerfile\nsrc\n"));
        remote.respond("id -nG", ok("deploy sudo docker\n"));
        remote.respond("systemctl is-active docker", ok("active\n"));
        remote.respond("docker ps --filter", ok("skiff-app\n"));
        remote.respond(
            "docker --version",
            ok("Docker version 27.3.1, build ce12230\n"),
        );
        remote
    }

    /// A host with nothing deployed on it.
    pub fn empty() -> Self {
        let remote = Self::default();
        remote.respond("ls -1A", failed(2, "ls: cannot access '/home/deploy/app'"));
        remote.respond(
            "docker rm -f",
            failed(1, "Error response from daemon: No such container: skiff-app"),
        );
        remote
    }

    /// Add a rule that takes priority over existing ones.
    pub fn respond(&self, pattern: &str, output: CommandOutput) {
        self.rules.lock().insert(0, (pattern.to_string(), output));
    }

    pub fn commands(&self) -> Vec<String> {
        self.log.lock().clone()
    }

    /// Index of the first recorded command containing `pattern`.
    pub fn position(&self, pattern: &str) -> Option<usize> {
        self.log.lock().iter().position(|c| c.contains(pattern))
    }

    pub fn ran(&self, pattern: &str) -> bool {
        self.position(pattern).is_some()
    }

    pub fn count(&self, pattern: &str) -> usize {
        self.log.lock().iter().filter(|c| c.contains(pattern)).count()
    }
}

#[async_trait]
impl RemoteExec for FakeRemote {
    async fn exec(&self, command: &str) -> ssh::Result<CommandOutput> {
        self.log.lock().push(command.to_string());
        let rules = self.rules.lock();
        let output = rules
            .iter()
            .find(|(pattern, _)| command.contains(pattern.as_str()))
            .map(|(_, out)| out.clone())
            .unwrap_or_default();
        Ok(output)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConnectBehavior {
    Succeed,
    Refuse,
    Hang,
}

/// Hands out clones of one shared [`FakeRemote`].
pub struct FakeConnector {
    pub remote: FakeRemote,
    behavior: ConnectBehavior,
    connects: AtomicUsize,
    disconnects: AtomicUsize,
}

impl FakeConnector {
    pub fn new(remote: FakeRemote) -> Self {
        Self::with_behavior(remote, ConnectBehavior::Succeed)
    }

    pub fn with_behavior(remote: FakeRemote, behavior: ConnectBehavior) -> Self {
        Self {
            remote,
            behavior,
            connects: AtomicUsize::new(0),
            disconnects: AtomicUsize::new(0),
        }
    }

    pub fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    pub fn disconnects(&self) -> usize {
        self.disconnects.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Connector for FakeConnector {
    type Remote = FakeRemote;

    async fn connect(&self, config: &SessionConfig) -> ssh::Result<FakeRemote> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        match self.behavior {
            ConnectBehavior::Succeed => Ok(self.remote.clone()),
            ConnectBehavior::Refuse => Err(ssh::Error::Connection(format!(
                "{}: connection refused",
                config.host
            ))),
            ConnectBehavior::Hang => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Err(ssh::Error::Connection("unreachable".to_string()))
            }
        }
    }

    async fn disconnect(&self, _remote: FakeRemote) -> ssh::Result<()> {
        self.disconnects.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Local runner that records invocations. A `git clone` materializes the
/// target directory holding the configured files.
#[derive(Default)]
pub struct FakeRunner {
    files: Vec<&'static str>,
    fail_program: Option<&'static str>,
    log: Mutex<Vec<Invocation>>,
}

impl FakeRunner {
    pub fn with_files(files: &[&'static str]) -> Self {
        Self {
            files: files.to_vec(),
            ..Default::default()
        }
    }

    /// Make every invocation of `program` exit non-zero.
    pub fn failing(mut self, program: &'static str) -> Self {
        self.fail_program = Some(program);
        self
    }

    pub fn invocations(&self) -> Vec<Invocation> {
        self.log.lock().clone()
    }

    pub fn lines(&self) -> Vec<String> {
        self.invocations()
            .iter()
            .map(|i| i.display_redacted(None))
            .collect()
    }
}

#[async_trait]
impl LocalRunner for FakeRunner {
    async fn run(&self, invocation: &Invocation) -> std::io::Result<CommandOutput> {
        self.log.lock().push(invocation.clone());

        if self.fail_program == Some(invocation.program.as_str()) {
            return Ok(failed(128, "fatal: simulated failure"));
        }

        if invocation.program == "git"
            && invocation.args.first().map(String::as_str) == Some("clone")
            && let Some(dir) = invocation.args.last()
        {
            let dir = PathBuf::from(dir);
            std::fs::create_dir_all(&dir)?;
            for file in &self.files {
                std::fs::write(dir.join(file), "FROM scratch\n")?;
            }
        }
        Ok(ok(""))
    }
}

/// Probe returning a fixed result and recording each target.
pub struct FakeProbe {
    result: ProbeResult,
    pub calls: Mutex<Vec<(String, u16)>>,
}

impl FakeProbe {
    pub fn new(result: ProbeResult) -> Self {
        Self {
            result,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn responding(status: u16) -> Self {
        Self::new(ProbeResult::Responded(status))
    }
}

#[async_trait]
impl HttpProbe for FakeProbe {
    async fn get(&self, host: &str, port: u16) -> ProbeResult {
        self.calls.lock().push((host.to_string(), port));
        self.result.clone()
    }
}

/// A complete, valid request whose key file lives in `dir`.
pub fn valid_input(dir: &Path) -> RequestInput {
    let key = dir.join("id_ed25519");
    std::fs::write(&key, "not a real key").unwrap();
    RequestInput {
        repository: Some("https://git.example.com/acme/shop.git".to_string()),
        token: Some("s3cr3t-t0ken".to_string()),
        branch: Some("main".to_string()),
        user: Some("deploy".to_string()),
        host: Some("203.0.113.10".to_string()),
        ssh_port: None,
        key: Some(key),
        port: Some("3000".to_string()),
        connect_timeout: Some(Duration::from_millis(200)),
        trust_first_connection: None,
    }
}

/// Context whose working copy lands in `dir/shop`.
pub fn context(dir: &Path) -> DeployContext {
    let request = valid_input(dir).into_request().unwrap();
    DeployContext::new(request, dir)
}

pub fn quiet() -> Output {
    Output::new(OutputMode::Quiet)
}
