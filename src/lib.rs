// Serverless Project Manager Library
// Exposes the configuration, clients and workflows for the binary and for tests

pub mod cli;
pub mod config;
pub mod control_plane;
pub mod fs;
pub mod shutdown;
pub mod telemetry;
pub mod vault;
pub mod workflows;

// Re-export key types for easy access
pub use config::{Capabilities, ConfigSources, Operation, ProjectType, Settings, SettingsError};
pub use control_plane::{ControlPlane, ControlPlaneClient, ControlPlaneError};
pub use shutdown::{ShutdownCoordinator, ShutdownSignal};
pub use telemetry::{create_invocation_span, generate_correlation_id, init_telemetry};
pub use vault::{Outcome, SecretDocument, SecretStore, VaultClient};
pub use workflows::{Orchestrator, RunReport, WorkflowError};
