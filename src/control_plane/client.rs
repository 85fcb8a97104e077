use super::errors::ControlPlaneError;
use super::types::{
    CreateProjectRequest, Credentials, ProjectResponse, ProjectSpec, ProjectStatus, ProjectUpdate,
};
use crate::config::ProjectType;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE, IF_MATCH};
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, error};

/// Control-plane operations, abstracted so the workflows can run against fakes
#[async_trait]
pub trait ControlPlane: Send + Sync {
    async fn create_project(
        &self,
        spec: &ProjectSpec,
    ) -> Result<ProjectResponse, ControlPlaneError>;

    async fn project_status(
        &self,
        project_type: ProjectType,
        project_id: &str,
    ) -> Result<ProjectStatus, ControlPlaneError>;

    async fn update_project(
        &self,
        project_type: ProjectType,
        project_id: &str,
        update: &ProjectUpdate,
    ) -> Result<ProjectResponse, ControlPlaneError>;

    async fn delete_project(
        &self,
        project_type: ProjectType,
        project_id: &str,
    ) -> Result<bool, ControlPlaneError>;

    async fn reset_credentials(
        &self,
        project_type: ProjectType,
        project_id: &str,
    ) -> Result<Credentials, ControlPlaneError>;

    async fn get_project(
        &self,
        project_type: ProjectType,
        project_id: &str,
    ) -> Result<ProjectResponse, ControlPlaneError>;

    /// The listing exactly as returned, paging envelope included
    async fn list_projects(&self, project_type: ProjectType) -> Result<Value, ControlPlaneError>;
}

/// HTTP client for the serverless projects API
#[derive(Debug, Clone)]
pub struct ControlPlaneClient {
    http: reqwest::Client,
    base_url: String,
}

impl ControlPlaneClient {
    pub fn new(
        base_url: &str,
        api_key: &str,
        timeout: Duration,
    ) -> Result<Self, ControlPlaneError> {
        let mut headers = HeaderMap::new();
        let mut auth = HeaderValue::from_str(&format!("ApiKey {api_key}"))
            .map_err(|_| ControlPlaneError::InvalidApiKey)?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(ControlPlaneError::Client)?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn projects_url(&self, project_type: ProjectType) -> String {
        format!("{}/projects/{}", self.base_url, project_type.as_str())
    }

    fn project_url(&self, project_type: ProjectType, project_id: &str) -> String {
        format!("{}/{}", self.projects_url(project_type), project_id)
    }

    /// Send a request and return the body when the status is one of `accepted`
    async fn send(
        &self,
        operation: &'static str,
        request: RequestBuilder,
        accepted: &[StatusCode],
    ) -> Result<String, ControlPlaneError> {
        let response = request
            .send()
            .await
            .map_err(|source| ControlPlaneError::Transport { operation, source })?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        debug!(operation, status = status.as_u16(), "control plane responded");

        if accepted.contains(&status) {
            Ok(body)
        } else {
            error!(operation, status = status.as_u16(), %body, "control plane request failed");
            Err(ControlPlaneError::ApiFailure {
                operation,
                status: status.as_u16(),
                body,
            })
        }
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        request: RequestBuilder,
        accepted: &[StatusCode],
    ) -> Result<T, ControlPlaneError> {
        let body = self.send(operation, request, accepted).await?;
        serde_json::from_str(&body).map_err(|source| ControlPlaneError::Decode { operation, source })
    }

    async fn send_project(
        &self,
        operation: &'static str,
        request: RequestBuilder,
        accepted: &[StatusCode],
    ) -> Result<ProjectResponse, ControlPlaneError> {
        let raw: Value = self.send_json(operation, request, accepted).await?;
        ProjectResponse::from_raw(raw)
            .map_err(|source| ControlPlaneError::Decode { operation, source })
    }

    fn request(&self, method: Method, url: String) -> RequestBuilder {
        debug!(%method, %url, "control plane request");
        self.http.request(method, url)
    }
}

#[async_trait]
impl ControlPlane for ControlPlaneClient {
    async fn create_project(
        &self,
        spec: &ProjectSpec,
    ) -> Result<ProjectResponse, ControlPlaneError> {
        let request = self
            .request(Method::POST, self.projects_url(spec.project_type))
            .json(&CreateProjectRequest::from(spec));
        self.send_project("create project", request, &[StatusCode::OK, StatusCode::CREATED])
            .await
    }

    async fn project_status(
        &self,
        project_type: ProjectType,
        project_id: &str,
    ) -> Result<ProjectStatus, ControlPlaneError> {
        let url = format!("{}/status", self.project_url(project_type, project_id));
        self.send_json("get project status", self.request(Method::GET, url), &[StatusCode::OK])
            .await
    }

    async fn update_project(
        &self,
        project_type: ProjectType,
        project_id: &str,
        update: &ProjectUpdate,
    ) -> Result<ProjectResponse, ControlPlaneError> {
        let mut request = self
            .request(Method::PATCH, self.project_url(project_type, project_id))
            .json(update);
        if let Some(etag) = &update.if_match {
            request = request.header(IF_MATCH, etag.as_str());
        }
        self.send_project("update project", request, &[StatusCode::OK]).await
    }

    async fn delete_project(
        &self,
        project_type: ProjectType,
        project_id: &str,
    ) -> Result<bool, ControlPlaneError> {
        let request = self.request(Method::DELETE, self.project_url(project_type, project_id));
        self.send(
            "delete project",
            request,
            &[StatusCode::OK, StatusCode::NO_CONTENT],
        )
        .await?;
        Ok(true)
    }

    async fn reset_credentials(
        &self,
        project_type: ProjectType,
        project_id: &str,
    ) -> Result<Credentials, ControlPlaneError> {
        let url = format!(
            "{}/_reset-credentials",
            self.project_url(project_type, project_id)
        );
        self.send_json("reset credentials", self.request(Method::POST, url), &[StatusCode::OK])
            .await
    }

    async fn get_project(
        &self,
        project_type: ProjectType,
        project_id: &str,
    ) -> Result<ProjectResponse, ControlPlaneError> {
        let request = self.request(Method::GET, self.project_url(project_type, project_id));
        self.send_project("get project", request, &[StatusCode::OK]).await
    }

    async fn list_projects(&self, project_type: ProjectType) -> Result<Value, ControlPlaneError> {
        let request = self.request(Method::GET, self.projects_url(project_type));
        self.send_json("list projects", request, &[StatusCode::OK]).await
    }
}
