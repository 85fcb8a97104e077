use super::document::SecretDocument;
use super::{secret_path, Outcome, SecretStore};
use crate::config::VaultSettings;
use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

/// Errors from the Vault HTTP API. They stay inside this module: the
/// `SecretStore` implementation turns them into advisory outcomes.
#[derive(Debug, Error)]
pub enum VaultError {
    #[error("failed to build Vault HTTP client: {0}")]
    Client(#[source] reqwest::Error),
    #[error("vault request failed: {0}")]
    Transport(#[source] reqwest::Error),
    #[error("vault rejected the token: {status} {body}")]
    Unauthenticated { status: u16, body: String },
    #[error("{operation} failed: {status} {body}")]
    Rejected {
        operation: &'static str,
        status: u16,
        body: String,
    },
    #[error("failed to decode vault response: {source}; body={body}")]
    Decode {
        #[source]
        source: serde_json::Error,
        body: String,
    },
}

#[derive(Deserialize)]
struct KvReadResponse {
    #[serde(default)]
    data: Option<Map<String, Value>>,
}

/// Client for a Vault KV version 1 secrets engine
#[derive(Debug, Clone)]
pub struct VaultClient {
    http: reqwest::Client,
    addr: String,
    token: String,
    namespace: Option<String>,
}

impl VaultClient {
    pub fn new(settings: &VaultSettings, timeout: Duration) -> Result<Self, VaultError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(VaultError::Client)?;
        Ok(Self {
            http,
            addr: settings.addr.trim_end_matches('/').to_string(),
            token: settings.token.clone(),
            namespace: settings.namespace.clone(),
        })
    }

    /// Build the client and check that the token is accepted
    pub async fn connect(settings: &VaultSettings, timeout: Duration) -> Result<Self, VaultError> {
        let client = Self::new(settings, timeout)?;
        client.verify_token().await?;
        Ok(client)
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}/v1/{}", self.addr, path.trim_start_matches('/'));
        debug!(%method, %url, "vault request");
        let mut builder = self
            .http
            .request(method, url)
            .header("X-Vault-Token", &self.token);
        if let Some(namespace) = &self.namespace {
            builder = builder.header("X-Vault-Namespace", namespace);
        }
        builder
    }

    pub async fn verify_token(&self) -> Result<(), VaultError> {
        let response = self
            .request(Method::GET, "auth/token/lookup-self")
            .send()
            .await
            .map_err(VaultError::Transport)?;
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let body = response.text().await.unwrap_or_default();
        Err(VaultError::Unauthenticated {
            status: status.as_u16(),
            body,
        })
    }

    pub async fn write_secret(&self, path: &str, document: &SecretDocument) -> Result<(), VaultError> {
        let response = self
            .request(Method::POST, path)
            .json(document)
            .send()
            .await
            .map_err(VaultError::Transport)?;
        let status = response.status();
        if status.is_success() {
            debug!(path, "vault kv stored secret");
            return Ok(());
        }
        let body = response.text().await.unwrap_or_default();
        Err(VaultError::Rejected {
            operation: "write secret",
            status: status.as_u16(),
            body,
        })
    }

    pub async fn read_secret(&self, path: &str) -> Result<Option<SecretDocument>, VaultError> {
        let response = self
            .request(Method::GET, path)
            .send()
            .await
            .map_err(VaultError::Transport)?;
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        match status {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => {
                let parsed: KvReadResponse = serde_json::from_str(&body)
                    .map_err(|source| VaultError::Decode { source, body })?;
                Ok(parsed.data.map(SecretDocument::from_json_map))
            }
            status => Err(VaultError::Rejected {
                operation: "read secret",
                status: status.as_u16(),
                body,
            }),
        }
    }
}

#[async_trait]
impl SecretStore for VaultClient {
    async fn write(&self, prefix: &str, project_name: &str, document: &SecretDocument) -> Outcome {
        let path = secret_path(prefix, project_name);
        match self.write_secret(&path, document).await {
            Ok(()) => Outcome::success(path),
            Err(err) => {
                warn!(%path, error = %err, "error storing project info in Vault");
                Outcome::failure(format!("Error storing project info in Vault: {err}"))
            }
        }
    }

    async fn read(&self, prefix: &str, project_name: &str) -> Option<SecretDocument> {
        let path = secret_path(prefix, project_name);
        match self.read_secret(&path).await {
            Ok(Some(document)) => Some(document),
            Ok(None) => {
                debug!(%path, "no project info stored in Vault");
                None
            }
            Err(err) => {
                warn!(%path, error = %err, "error retrieving project info from Vault");
                None
            }
        }
    }
}
