// ABOUTME: Post-deploy checks: a public HTTP probe and remote service checks.
// ABOUTME: The probe only warns; the remote checks fail the run.

use async_trait::async_trait;
use http_body_util::Empty;
use hyper_util::rt::TokioIo;
use std::time::Duration;
use tokio::net::TcpStream;

use crate::config::DeployContext;
use crate::diagnostics::{Diagnostics, Warning};
use crate::error::{Error, Result};
use crate::output::Output;
use crate::remote::RemoteExec;

use super::container::ps_command;
use super::run_remote;

/// Port nginx listens on; the probe targets it, not the application port.
pub const PUBLIC_PORT: u16 = 80;

/// Outcome of the public HTTP probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeResult {
    /// Got an HTTP response with this status.
    Responded(u16),
    /// No usable response.
    Failed(String),
}

impl ProbeResult {
    /// Any response below 500 counts; 502/504 mean nginx is up but the app is not.
    pub fn is_healthy(&self) -> bool {
        matches!(self, ProbeResult::Responded(status) if *status < 500)
    }
}

/// What the verifier observed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HealthReport {
    pub probe: ProbeResult,
    pub docker_active: bool,
    pub container_present: bool,
}

/// Issues a single GET against a host and port.
#[async_trait]
pub trait HttpProbe: Send + Sync {
    async fn get(&self, host: &str, port: u16) -> ProbeResult;
}

/// HTTP/1.1 probe on hyper's low-level client.
#[derive(Debug, Clone, Copy)]
pub struct HyperProbe {
    pub timeout: Duration,
}

impl Default for HyperProbe {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
        }
    }
}

impl HyperProbe {
    async fn request(host: &str, port: u16) -> std::result::Result<u16, String> {
        let stream = TcpStream::connect((host, port))
            .await
            .map_err(|e| format!("connect failed: {e}"))?;
        let io = TokioIo::new(stream);

        let (mut sender, conn) = hyper::client::conn::http1::handshake(io)
            .await
            .map_err(|e| format!("HTTP handshake failed: {e}"))?;

        tokio::spawn(async move {
            if let Err(e) = conn.await {
                tracing::debug!("probe connection error: {}", e);
            }
        });

        let req = hyper::Request::builder()
            .method("GET")
            .uri("/")
            .header("Host", host)
            .header("User-Agent", concat!("skiff/", env!("CARGO_PKG_VERSION")))
            .body(Empty::<bytes::Bytes>::new())
            .map_err(|e| format!("failed to build request: {e}"))?;

        let resp = sender
            .send_request(req)
            .await
            .map_err(|e| format!("request failed: {e}"))?;

        Ok(resp.status().as_u16())
    }
}

#[async_trait]
impl HttpProbe for HyperProbe {
    async fn get(&self, host: &str, port: u16) -> ProbeResult {
        match tokio::time::timeout(self.timeout, Self::request(host, port)).await {
            Ok(Ok(status)) => ProbeResult::Responded(status),
            Ok(Err(reason)) => ProbeResult::Failed(reason),
            Err(_) => ProbeResult::Failed(format!("no response within {:?}", self.timeout)),
        }
    }
}

/// Probe the public port, then confirm Docker and the container on the host.
pub async fn verify<R, P>(
    remote: &R,
    probe: &P,
    ctx: &DeployContext,
    output: &Output,
    diag: &mut Diagnostics,
) -> Result<HealthReport>
where
    R: RemoteExec + ?Sized,
    P: HttpProbe + ?Sized,
{
    let host = &ctx.target().host;

    output.progress(&format!("  → Probing http://{host}:{PUBLIC_PORT}/..."));
    let probe_result = probe.get(host, PUBLIC_PORT).await;
    match &probe_result {
        ProbeResult::Responded(status) if probe_result.is_healthy() => {
            output.progress(&format!("  ✓ Port {PUBLIC_PORT} answered with HTTP {status}"));
        }
        ProbeResult::Responded(status) => diag.warn(Warning::health_probe(format!(
            "port {PUBLIC_PORT} on {host} answered with HTTP {status}"
        ))),
        ProbeResult::Failed(reason) => diag.warn(Warning::health_probe(format!(
            "port {PUBLIC_PORT} on {host} not reachable: {reason}"
        ))),
    }

    output.progress("  → Checking Docker service and container...");
    let active = run_remote(remote, output, "systemctl is-active docker")
        .await
        .map_err(|e| Error::Validation(format!("docker service check: {e}")))?;
    let docker_active = active.success() && active.stdout.trim() == "active";
    if !docker_active {
        return Err(Error::Validation(format!(
            "docker service is {}",
            non_empty_or(active.stdout.trim(), "not active")
        )));
    }

    let ps = run_remote(remote, output, &ps_command(&ctx.names.container))
        .await
        .map_err(|e| Error::Validation(format!("container check: {e}")))?;
    let container_present = ps.success() && ps.stdout.lines().any(|l| !l.trim().is_empty());
    if !container_present {
        return Err(Error::Validation(format!(
            "container {} is not running",
            ctx.names.container
        )));
    }

    output.progress("  ✓ Docker active, container present");
    Ok(HealthReport {
        probe: probe_result,
        docker_active,
        container_present,
    })
}

fn non_empty_or<'a>(value: &'a str, fallback: &'a str) -> &'a str {
    if value.is_empty() { fallback } else { value }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gateway_errors_are_unhealthy() {
        assert!(ProbeResult::Responded(200).is_healthy());
        assert!(ProbeResult::Responded(404).is_healthy());
        assert!(!ProbeResult::Responded(502).is_healthy());
        assert!(!ProbeResult::Failed("refused".to_string()).is_healthy());
    }

    #[tokio::test]
    async fn hyper_probe_reads_status() {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 1024];
            let _ = socket.read(&mut buf).await;
            socket
                .write_all(b"HTTP/1.1 204 No Content\r\ncontent-length: 0\r\n\r\n")
                .await
                .unwrap();
        });

        let result = HyperProbe::default().get("127.0.0.1", port).await;
        assert_eq!(result, ProbeResult::Responded(204));
    }

    #[tokio::test]
    async fn hyper_probe_reports_refused_connection() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let result = HyperProbe::default().get("127.0.0.1", port).await;
        assert!(matches!(result, ProbeResult::Failed(_)));
    }
}
