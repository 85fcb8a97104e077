//! Flat key/value document kept per project in the secret store.
//!
//! Keys mirror what downstream deployments read from Vault: identifiers in
//! lower case, connection settings as upper-case environment-style names.

use crate::config::ProjectType;
use crate::control_plane::{Credentials, ProjectRecord};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

pub const KEY_ID: &str = "id";
pub const KEY_NAME: &str = "name";
pub const KEY_ALIAS: &str = "alias";
pub const KEY_REGION_ID: &str = "region_id";
pub const KEY_CLOUD_ID: &str = "CLOUD_ID";
pub const KEY_TYPE: &str = "type";
pub const KEY_PROJECT_TYPE: &str = "project_type";
pub const KEY_ELASTICSEARCH_URL: &str = "ELASTICSEARCH_URL";
pub const KEY_KIBANA_URL: &str = "KIBANA_URL";
pub const KEY_USERNAME: &str = "ELASTICSEARCH_USERNAME";
pub const KEY_PASSWORD: &str = "ELASTICSEARCH_PASSWORD";
pub const KEY_CLOUD_AUTH: &str = "CLOUD_AUTH";

const ENDPOINT_KEYS: [(&str, &str); 2] = [
    ("elasticsearch", KEY_ELASTICSEARCH_URL),
    ("kibana", KEY_KIBANA_URL),
];

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SecretDocument(BTreeMap<String, String>);

impl SecretDocument {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the document stored after a project is created
    pub fn from_created_project(record: &ProjectRecord, project_type: ProjectType) -> Self {
        let mut doc = Self::new();
        doc.set_opt(KEY_ID, record.id.as_deref());
        doc.set_opt(KEY_NAME, record.name.as_deref());
        doc.set_opt(KEY_ALIAS, record.alias.as_deref());
        doc.set_opt(KEY_REGION_ID, record.region_id.as_deref());
        doc.set_opt(KEY_CLOUD_ID, record.cloud_id.as_deref());
        doc.set_opt(KEY_TYPE, record.project_type.as_deref());
        doc.insert(KEY_PROJECT_TYPE, project_type.as_str());

        if let Some(endpoints) = &record.endpoints {
            for (service, key) in ENDPOINT_KEYS {
                doc.set_opt(key, endpoints.get(service).map(String::as_str));
            }
        }
        if let Some(credentials) = &record.credentials {
            doc.apply_credentials(credentials);
        }
        doc
    }

    /// Convert the `data` object of a Vault read. Non-string scalars are
    /// rendered as JSON text and nulls are dropped.
    pub fn from_json_map(data: Map<String, Value>) -> Self {
        let entries = data
            .into_iter()
            .filter_map(|(key, value)| match value {
                Value::Null => None,
                Value::String(s) => Some((key, s)),
                other => Some((key, other.to_string())),
            })
            .collect();
        Self(entries)
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    /// Absent and empty values leave the existing entry alone
    fn set_opt(&mut self, key: &str, value: Option<&str>) {
        if let Some(value) = value.filter(|v| !v.is_empty()) {
            self.insert(key, value);
        }
    }

    pub fn project_id(&self) -> Option<&str> {
        self.get(KEY_ID)
    }

    pub fn project_type(&self) -> Option<&str> {
        self.get(KEY_PROJECT_TYPE)
    }

    /// Take the new name/alias from an update response; keep the stored values otherwise
    pub fn apply_update(&mut self, record: &ProjectRecord) {
        self.set_opt(KEY_NAME, record.name.as_deref());
        self.set_opt(KEY_ALIAS, record.alias.as_deref());
    }

    /// Store new credentials and keep CLOUD_AUTH equal to `username:password`
    pub fn apply_credentials(&mut self, credentials: &Credentials) {
        self.set_opt(KEY_USERNAME, credentials.username.as_deref());
        self.set_opt(KEY_PASSWORD, credentials.password.as_deref());

        let auth = match (self.get(KEY_USERNAME), self.get(KEY_PASSWORD)) {
            (Some(username), Some(password)) if !username.is_empty() && !password.is_empty() => {
                Some(format!("{username}:{password}"))
            }
            _ => None,
        };
        if let Some(auth) = auth {
            self.insert(KEY_CLOUD_AUTH, auth);
        }
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for SecretDocument {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}
