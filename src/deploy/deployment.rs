// ABOUTME: Generic deployment struct parameterized by state marker.
// ABOUTME: Each transition consumes self and returns the next state, or the first error.

use crate::config::DeployContext;
use crate::diagnostics::Diagnostics;
use crate::error::Result;
use crate::local::LocalRunner;
use crate::output::Output;
use crate::remote::{Connector, RemoteExec};

use super::container::Strategy;
use super::health::{HealthReport, HttpProbe};
use super::provision::ToolVersions;
use super::state::{
    Connected, ContainerRunning, Initialized, Provisioned, ProxyActive, Synced, Transferred,
    Verified,
};
use super::{connectivity, container, health, provision, proxy, source, transfer};

/// A deployment in progress, parameterized by its current state.
///
/// The context is borrowed for the whole run; stage outputs travel in `S`.
/// There is no way back: a failed transition drops the deployment and the
/// error propagates to the caller.
#[derive(Debug)]
pub struct Deployment<'a, S> {
    ctx: &'a DeployContext,
    state: S,
}

/// What a finished run leaves on the host.
#[derive(Debug, Clone)]
pub struct DeployedRelease {
    pub container: String,
    pub site: String,
    pub strategy: Strategy,
    pub versions: ToolVersions,
    pub health: HealthReport,
}

impl<'a, S> Deployment<'a, S> {
    pub fn state(&self) -> &S {
        &self.state
    }

    fn advance<T>(self, state: T) -> Deployment<'a, T> {
        Deployment {
            ctx: self.ctx,
            state,
        }
    }
}

impl<'a> Deployment<'a, Initialized> {
    pub fn new(ctx: &'a DeployContext) -> Self {
        Deployment {
            ctx,
            state: Initialized,
        }
    }

    /// Clone or refresh the working copy and find its build descriptor.
    pub async fn sync_source<L: LocalRunner + ?Sized>(
        self,
        runner: &L,
        output: &Output,
    ) -> Result<Deployment<'a, Synced>> {
        let descriptor = source::synchronize(runner, self.ctx, output).await?;
        Ok(self.advance(Synced { descriptor }))
    }
}

impl<'a> Deployment<'a, Synced> {
    /// Open the remote connection. The caller owns it for the remaining stages.
    pub async fn check_connectivity<C: Connector + ?Sized>(
        self,
        connector: &C,
        output: &Output,
    ) -> Result<(Deployment<'a, Connected>, C::Remote)> {
        let remote = connectivity::check(connector, self.ctx.target(), output).await?;
        let descriptor = self.state.descriptor.clone();
        Ok((self.advance(Connected { descriptor }), remote))
    }
}

impl<'a> Deployment<'a, Connected> {
    pub async fn provision<R: RemoteExec + ?Sized>(
        self,
        remote: &R,
        output: &Output,
        diag: &mut Diagnostics,
    ) -> Result<Deployment<'a, Provisioned>> {
        let user = &self.ctx.target().user;
        let versions = provision::provision(remote, user, output, diag).await?;
        Ok(self.advance(Provisioned { versions }))
    }
}

impl<'a> Deployment<'a, Provisioned> {
    pub async fn transfer<R, L>(
        self,
        remote: &R,
        runner: &L,
        output: &Output,
    ) -> Result<Deployment<'a, Transferred>>
    where
        R: RemoteExec + ?Sized,
        L: LocalRunner + ?Sized,
    {
        transfer::mirror(remote, runner, self.ctx, output).await?;
        let versions = self.state.versions.clone();
        Ok(self.advance(Transferred { versions }))
    }
}

impl<'a> Deployment<'a, Transferred> {
    pub async fn start_container<R: RemoteExec + ?Sized>(
        self,
        remote: &R,
        output: &Output,
    ) -> Result<Deployment<'a, ContainerRunning>> {
        let strategy = container::deploy(remote, self.ctx, output).await?;
        let versions = self.state.versions.clone();
        Ok(self.advance(ContainerRunning { versions, strategy }))
    }
}

impl<'a> Deployment<'a, ContainerRunning> {
    pub async fn configure_proxy<R: RemoteExec + ?Sized>(
        self,
        remote: &R,
        output: &Output,
    ) -> Result<Deployment<'a, ProxyActive>> {
        proxy::configure(remote, self.ctx, output).await?;
        let ContainerRunning { versions, strategy } = self.state.clone();
        Ok(self.advance(ProxyActive { versions, strategy }))
    }
}

impl<'a> Deployment<'a, ProxyActive> {
    pub async fn verify<R, P>(
        self,
        remote: &R,
        probe: &P,
        output: &Output,
        diag: &mut Diagnostics,
    ) -> Result<Deployment<'a, Verified>>
    where
        R: RemoteExec + ?Sized,
        P: HttpProbe + ?Sized,
    {
        let health = health::verify(remote, probe, self.ctx, output, diag).await?;
        let ProxyActive { versions, strategy } = self.state.clone();
        Ok(self.advance(Verified {
            versions,
            strategy,
            health,
        }))
    }
}

impl Deployment<'_, Verified> {
    pub fn finish(self) -> DeployedRelease {
        let Verified {
            versions,
            strategy,
            health,
        } = self.state;
        DeployedRelease {
            container: self.ctx.names.container.clone(),
            site: self.ctx.names.site_enabled.clone(),
            strategy,
            versions,
            health,
        }
    }
}
