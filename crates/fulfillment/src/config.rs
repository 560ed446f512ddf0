//! Workflow configuration.

/// Behaviour switches shared by both workflows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkflowConfig {
    /// Coalesce concurrent requests with the same fingerprint onto one
    /// execution. When off, concurrent duplicates each run the full
    /// pipeline and the last idempotency write wins.
    pub single_flight: bool,
}

impl WorkflowConfig {
    /// Configuration that lets concurrent duplicates race.
    pub fn without_single_flight() -> Self {
        Self {
            single_flight: false,
        }
    }
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            single_flight: true,
        }
    }
}
