pub mod client;
pub mod document;

use async_trait::async_trait;

pub use client::{VaultClient, VaultError};
pub use document::SecretDocument;

/// Result of a best-effort secret-store write
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub ok: bool,
    /// Path written on success, error description on failure
    pub detail: String,
}

impl Outcome {
    pub fn success(detail: impl Into<String>) -> Self {
        Self {
            ok: true,
            detail: detail.into(),
        }
    }

    pub fn failure(detail: impl Into<String>) -> Self {
        Self {
            ok: false,
            detail: detail.into(),
        }
    }
}

/// Secret-store access. Methods never fail: errors are logged by the
/// implementation and surface only as `Outcome { ok: false }` or `None`.
#[async_trait]
pub trait SecretStore: Send + Sync {
    async fn write(&self, prefix: &str, project_name: &str, document: &SecretDocument) -> Outcome;

    /// A missing document and a failed read both come back as `None`
    async fn read(&self, prefix: &str, project_name: &str) -> Option<SecretDocument>;
}

/// Path of a project's document. The region is not part of it, so every
/// region of a multi-region create shares one document.
pub fn secret_path(prefix: &str, project_name: &str) -> String {
    format!("{prefix}/{project_name}/info")
}
