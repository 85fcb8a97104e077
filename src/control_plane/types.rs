use crate::config::{OptimizedFor, ProjectType};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Phase reported once a project is ready to serve traffic
pub const PHASE_INITIALIZED: &str = "initialized";

/// What to create in one region
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectSpec {
    pub project_type: ProjectType,
    pub name: String,
    pub region_id: String,
    pub alias: Option<String>,
    pub optimized_for: Option<OptimizedFor>,
}

/// Body of `POST /projects/{type}`
#[derive(Debug, Serialize)]
pub(crate) struct CreateProjectRequest<'a> {
    pub name: &'a str,
    pub region_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alias: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub optimized_for: Option<OptimizedFor>,
}

impl<'a> From<&'a ProjectSpec> for CreateProjectRequest<'a> {
    fn from(spec: &'a ProjectSpec) -> Self {
        Self {
            name: &spec.name,
            region_id: &spec.region_id,
            alias: spec.alias.as_deref().filter(|a| !a.is_empty()),
            optimized_for: spec
                .optimized_for
                .filter(|_| spec.project_type == ProjectType::Elasticsearch),
        }
    }
}

/// Fields to change on `PATCH /projects/{type}/{id}`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProjectUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    /// ETag from an earlier read, sent as `If-Match`
    #[serde(skip)]
    pub if_match: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

/// A project as returned by the control plane. Unknown fields are kept so the
/// record serializes back to the response it came from.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region_id: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub project_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cloud_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoints: Option<BTreeMap<String, String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credentials: Option<Credentials>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectStatus {
    #[serde(default)]
    pub phase: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ProjectStatus {
    pub fn is_initialized(&self) -> bool {
        self.phase.as_deref() == Some(PHASE_INITIALIZED)
    }

    pub fn phase_or_unknown(&self) -> &str {
        self.phase.as_deref().unwrap_or("unknown")
    }
}

/// A decoded project plus the body it was decoded from. The raw value is
/// what gets printed and written to the results file, so fields the record
/// does not model (and explicit nulls) come through unchanged.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectResponse {
    pub record: ProjectRecord,
    pub raw: Value,
}

impl ProjectResponse {
    pub fn from_raw(raw: Value) -> Result<Self, serde_json::Error> {
        let record = ProjectRecord::deserialize(&raw)?;
        Ok(Self { record, raw })
    }
}
