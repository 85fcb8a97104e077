pub mod client;
pub mod errors;
pub mod types;

pub use client::{ControlPlane, ControlPlaneClient};
pub use errors::ControlPlaneError;
pub use types::{Credentials, ProjectRecord, ProjectResponse, ProjectSpec, ProjectStatus, ProjectUpdate};
