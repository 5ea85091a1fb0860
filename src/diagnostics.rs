// ABOUTME: Diagnostics accumulator for non-fatal warnings during a run.
// ABOUTME: Collects warnings that shouldn't fail a deployment but should be shown to users.

/// Collects non-fatal warnings during deployment operations.
#[derive(Debug, Default)]
pub struct Diagnostics {
    warnings: Vec<Warning>,
}

impl Diagnostics {
    /// Record a warning, auto-logging it via tracing.
    pub fn warn(&mut self, warning: Warning) {
        tracing::warn!("{}", warning.message);
        self.warnings.push(warning);
    }

    /// Get all collected warnings.
    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    /// Check if any warnings were collected.
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    /// Warnings of one kind.
    pub fn of_kind(&self, kind: WarningKind) -> impl Iterator<Item = &Warning> {
        self.warnings.iter().filter(move |w| w.kind == kind)
    }
}

/// A non-fatal warning collected during a run.
#[derive(Debug, Clone)]
pub struct Warning {
    pub kind: WarningKind,
    pub message: String,
}

impl Warning {
    pub fn new(kind: WarningKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Adding the remote user to the docker group failed.
    pub fn group_membership(message: impl Into<String>) -> Self {
        Self::new(WarningKind::GroupMembership, message)
    }

    /// Enabling or starting a system service failed.
    pub fn service_enable(message: impl Into<String>) -> Self {
        Self::new(WarningKind::ServiceEnable, message)
    }

    /// The public HTTP probe did not get a response.
    pub fn health_probe(message: impl Into<String>) -> Self {
        Self::new(WarningKind::HealthProbe, message)
    }

    /// A teardown step had nothing to do or failed.
    pub fn cleanup(message: impl Into<String>) -> Self {
        Self::new(WarningKind::Cleanup, message)
    }

    /// Create an SSH disconnect warning.
    pub fn ssh_disconnect(message: impl Into<String>) -> Self {
        Self::new(WarningKind::SshDisconnect, message)
    }
}

/// Categories of warnings that can occur during a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarningKind {
    GroupMembership,
    ServiceEnable,
    HealthProbe,
    Cleanup,
    /// Failed to cleanly disconnect SSH session.
    SshDisconnect,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diagnostics_starts_empty() {
        let diag = Diagnostics::default();
        assert!(!diag.has_warnings());
        assert!(diag.warnings().is_empty());
    }

    #[test]
    fn diagnostics_collects_warnings() {
        let mut diag = Diagnostics::default();

        diag.warn(Warning::group_membership("usermod failed"));
        diag.warn(Warning::ssh_disconnect("connection reset"));

        assert!(diag.has_warnings());
        assert_eq!(diag.warnings().len(), 2);
        assert_eq!(diag.of_kind(WarningKind::GroupMembership).count(), 1);
        assert_eq!(diag.of_kind(WarningKind::HealthProbe).count(), 0);
    }

    #[test]
    fn warning_constructors_set_correct_kind() {
        assert_eq!(
            Warning::service_enable("x").kind,
            WarningKind::ServiceEnable
        );
        assert_eq!(Warning::health_probe("x").kind, WarningKind::HealthProbe);
        assert_eq!(Warning::cleanup("x").kind, WarningKind::Cleanup);
    }
}
