//! Per-invocation workflows.
//!
//! The orchestrator owns the resolved settings and its collaborators, runs
//! exactly one operation, and reports progress on stdout. Control-plane
//! failures abort the run; secret-store problems only add advisories to the
//! returned [`RunReport`].

mod create;
mod manage;
mod polling;
mod resolve;

#[cfg(test)]
mod tests;

use crate::config::{Operation, Settings, SettingsError};
use crate::control_plane::{ControlPlane, ControlPlaneError};
use crate::fs::{FileSystemOperations, StandardFileSystem};
use crate::shutdown::ShutdownSignal;
use crate::vault::{Outcome, SecretStore};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};

pub use polling::wait_until_initialized;
pub use resolve::Target;

#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error(transparent)]
    Settings(#[from] SettingsError),
    #[error("Project ID is required for {}", .0.purpose())]
    MissingProjectId(Operation),
    #[error(transparent)]
    ControlPlane(#[from] ControlPlaneError),
    #[error("failed to write results to {}: {error:#}", .path.display())]
    Results { path: PathBuf, error: anyhow::Error },
    #[error("failed to encode output: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("Interrupted during {0} operation")]
    Interrupted(Operation),
    #[error("Project {project_id} was not initialized after {}s", .waited.as_secs())]
    WaitTimedOut { project_id: String, waited: Duration },
}

impl WorkflowError {
    pub fn hints(&self) -> Vec<&'static str> {
        match self {
            WorkflowError::ControlPlane(err) => err.hints(),
            WorkflowError::MissingProjectId(_) => vec![
                "Pass --project-id, or configure Vault so the id can be looked up by project name",
            ],
            WorkflowError::WaitTimedOut { .. } => vec![
                "The project may still finish initializing; check it with --operation get",
                "Raise --wait-timeout-secs or leave it unset to wait without a deadline",
            ],
            WorkflowError::Interrupted(Operation::Create) => vec![
                "Projects created before the interrupt still exist; check them with --operation list",
            ],
            _ => Vec::new(),
        }
    }
}

/// What happened besides the primary operation
#[derive(Debug, Default)]
pub struct RunReport {
    /// Non-fatal problems, in the order they were printed
    pub advisories: Vec<String>,
    /// One entry per secret-store write attempt
    pub secret_writes: Vec<Outcome>,
}

impl RunReport {
    fn advise(&mut self, message: impl Into<String>) {
        let message = message.into();
        println!("{message}");
        warn!(advisory = %message);
        self.advisories.push(message);
    }
}

pub struct Orchestrator {
    settings: Settings,
    control_plane: Arc<dyn ControlPlane>,
    secret_store: Option<Arc<dyn SecretStore>>,
    fs: Arc<dyn FileSystemOperations>,
    shutdown: ShutdownSignal,
}

impl Orchestrator {
    pub fn new(settings: Settings, control_plane: Arc<dyn ControlPlane>) -> Self {
        Self {
            settings,
            control_plane,
            secret_store: None,
            fs: Arc::new(StandardFileSystem),
            shutdown: ShutdownSignal::never(),
        }
    }

    pub fn with_secret_store(mut self, store: Option<Arc<dyn SecretStore>>) -> Self {
        self.secret_store = store;
        self
    }

    pub fn with_file_system(mut self, fs: Arc<dyn FileSystemOperations>) -> Self {
        self.fs = fs;
        self
    }

    pub fn with_shutdown(mut self, shutdown: ShutdownSignal) -> Self {
        self.shutdown = shutdown;
        self
    }

    /// Run the configured operation once. A shutdown request abandons the
    /// operation wherever it is, including mid-request.
    pub async fn run(&self) -> Result<RunReport, WorkflowError> {
        let mut report = RunReport::default();
        for warning in &self.settings.warnings {
            report.advise(format!("Warning: {warning}"));
        }

        let operation = self.settings.operation;
        info!(operation = %operation, "dispatching operation");
        let mut shutdown = self.shutdown.clone();
        let outcome = tokio::select! {
            biased;
            _ = shutdown.triggered() => {
                warn!(operation = %operation, "operation interrupted");
                Err(WorkflowError::Interrupted(operation))
            }
            result = self.dispatch(&mut report) => result,
        };
        outcome.map(|()| report)
    }

    async fn dispatch(&self, report: &mut RunReport) -> Result<(), WorkflowError> {
        match self.settings.operation {
            Operation::Create => self.create(report).await,
            Operation::Delete => self.delete(report).await,
            Operation::Update => self.update(report).await,
            Operation::ResetCredentials => self.reset_credentials(report).await,
            Operation::List => self.list().await,
            Operation::Get => self.get(report).await,
        }
    }

    fn vault_prefix(&self) -> &str {
        &self.settings.vault_path_prefix
    }
}
