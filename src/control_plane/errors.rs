use thiserror::Error;

/// Failure of a control-plane call. Always fatal for the invocation; nothing is retried.
#[derive(Debug, Error)]
pub enum ControlPlaneError {
    #[error("Failed to {operation}: HTTP {status}: {body}")]
    ApiFailure {
        operation: &'static str,
        status: u16,
        body: String,
    },
    #[error("Failed to {operation}: {source}")]
    Transport {
        operation: &'static str,
        #[source]
        source: reqwest::Error,
    },
    #[error("Failed to {operation}: unexpected response body: {source}")]
    Decode {
        operation: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error("API key contains characters not allowed in an HTTP header")]
    InvalidApiKey,
    #[error("Failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
}

impl ControlPlaneError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ControlPlaneError::ApiFailure { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Short troubleshooting hints shown under the error message
    pub fn hints(&self) -> Vec<&'static str> {
        match self {
            ControlPlaneError::ApiFailure { status, .. } => match status {
                401 => vec![
                    "API key is invalid or expired",
                    "Create a new key in the Elastic Cloud console and set ELASTIC_API_KEY",
                ],
                403 => vec![
                    "API key lacks permission for this project type",
                    "Check the key's role assignments in the Elastic Cloud console",
                ],
                404 => vec![
                    "Project not found: check the project ID and project type",
                    "The ID stored in Vault may belong to a deleted project",
                ],
                409 | 412 => vec![
                    "The project changed since it was last read",
                    "Fetch it again and retry with the current ETag (--if-match)",
                ],
                400 | 422 => vec![
                    "Request was rejected: check region ID, name and alias values",
                ],
                500..=599 => vec![
                    "Control plane error: check https://status.elastic.co and try again later",
                ],
                _ => vec![],
            },
            ControlPlaneError::Transport { .. } => vec![
                "Could not reach the control plane: check network access and --api-base-url",
            ],
            ControlPlaneError::Decode { .. } => vec![
                "The control plane answered with an unexpected payload; check --api-base-url",
            ],
            ControlPlaneError::InvalidApiKey => vec![
                "Check ELASTIC_API_KEY for stray whitespace or newlines",
            ],
            ControlPlaneError::Client(_) => vec![],
        }
    }
}
