// ABOUTME: Deployment state marker types for the type state pattern.
// ABOUTME: Each state carries what its stage produced; transitions only exist in order.

use super::container::Strategy;
use super::health::HealthReport;
use super::provision::ToolVersions;
use super::source::BuildDescriptor;

/// Request validated, nothing touched yet.
/// Available actions: `sync_source()`
#[derive(Debug, Clone, Copy, Default)]
pub struct Initialized;

/// Working copy at the branch tip with a build descriptor present.
/// Available actions: `check_connectivity()`
#[derive(Debug, Clone)]
pub struct Synced {
    pub descriptor: BuildDescriptor,
}

/// SSH reachability confirmed.
/// Available actions: `provision()`
#[derive(Debug, Clone)]
pub struct Connected {
    pub descriptor: BuildDescriptor,
}

/// Container runtime, compose and nginx installed and enabled.
/// Available actions: `transfer()`
#[derive(Debug, Clone)]
pub struct Provisioned {
    pub versions: ToolVersions,
}

/// Remote app directory mirrors the working copy.
/// Available actions: `start_container()`
#[derive(Debug, Clone)]
pub struct Transferred {
    pub versions: ToolVersions,
}

/// Container observed running.
/// Available actions: `configure_proxy()`
#[derive(Debug, Clone)]
pub struct ContainerRunning {
    pub versions: ToolVersions,
    pub strategy: Strategy,
}

/// Proxy site validated and nginx reloaded.
/// Available actions: `verify()`
#[derive(Debug, Clone)]
pub struct ProxyActive {
    pub versions: ToolVersions,
    pub strategy: Strategy,
}

/// Remote checks passed.
/// Available actions: `finish()`
#[derive(Debug, Clone)]
pub struct Verified {
    pub versions: ToolVersions,
    pub strategy: Strategy,
    pub health: HealthReport,
}
