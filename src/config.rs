use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_API_BASE_URL: &str = "https://api.elastic-cloud.com/api/v1/serverless";
pub const DEFAULT_VAULT_PATH_PREFIX: &str = "secret/k8s/eden/staging-3";
pub const DEFAULT_RESULTS_PATH: &str = "/tmp/project_results.json";
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 5;
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

/// Optional configuration file picked up from the working directory
pub const CONFIG_FILE_NAME: &str = "serverless-projects.toml";

/// Serverless project flavours accepted by the control plane
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectType {
    Elasticsearch,
    Observability,
    Security,
}

impl ProjectType {
    pub const ALL: [ProjectType; 3] = [
        ProjectType::Elasticsearch,
        ProjectType::Observability,
        ProjectType::Security,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectType::Elasticsearch => "elasticsearch",
            ProjectType::Observability => "observability",
            ProjectType::Security => "security",
        }
    }

    pub fn valid_values() -> String {
        Self::ALL
            .iter()
            .map(|t| t.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for ProjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProjectType {
    type Err = SettingsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| SettingsError::InvalidProjectType(s.to_string()))
    }
}

/// Optimization profile, only meaningful for elasticsearch projects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OptimizedFor {
    GeneralPurpose,
    Vector,
}

impl OptimizedFor {
    pub const ALL: [OptimizedFor; 2] = [OptimizedFor::GeneralPurpose, OptimizedFor::Vector];

    pub fn as_str(&self) -> &'static str {
        match self {
            OptimizedFor::GeneralPurpose => "general_purpose",
            OptimizedFor::Vector => "vector",
        }
    }

    pub fn valid_values() -> String {
        Self::ALL
            .iter()
            .map(|o| o.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl FromStr for OptimizedFor {
    type Err = SettingsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|o| o.as_str() == s)
            .ok_or_else(|| SettingsError::InvalidOptimizedFor(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Create,
    Delete,
    Update,
    ResetCredentials,
    List,
    Get,
}

impl Operation {
    pub const ALL: [Operation; 6] = [
        Operation::Create,
        Operation::Delete,
        Operation::Update,
        Operation::ResetCredentials,
        Operation::List,
        Operation::Get,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Create => "create",
            Operation::Delete => "delete",
            Operation::Update => "update",
            Operation::ResetCredentials => "reset-credentials",
            Operation::List => "list",
            Operation::Get => "get",
        }
    }

    /// Operations that act on one existing project and need its id
    pub fn targets_existing_project(&self) -> bool {
        matches!(
            self,
            Operation::Delete | Operation::Update | Operation::ResetCredentials | Operation::Get
        )
    }

    /// Wording used in "Project ID is required for ..." messages
    pub fn purpose(&self) -> &'static str {
        match self {
            Operation::Create => "creation",
            Operation::Delete => "deletion",
            Operation::Update => "update",
            Operation::ResetCredentials => "resetting credentials",
            Operation::List => "listing",
            Operation::Get => "retrieval",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Operation {
    type Err = SettingsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|op| op.as_str() == s)
            .ok_or_else(|| SettingsError::UnknownOperation(s.to_string()))
    }
}

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),
    #[error("API key is required")]
    MissingApiKey,
    #[error("Operation is required")]
    MissingOperation,
    #[error("Project type is required")]
    MissingProjectType,
    #[error("Invalid project type '{0}'. Valid values are: {valid}", valid = ProjectType::valid_values())]
    InvalidProjectType(String),
    #[error("Invalid optimized_for value '{0}'. Valid values are: {valid}", valid = OptimizedFor::valid_values())]
    InvalidOptimizedFor(String),
    #[error("Unknown operation: {0}")]
    UnknownOperation(String),
    #[error("Project name and regions are required for creation")]
    MissingCreateParameters,
    #[error("At least one region is required for creation")]
    NoRegions,
    #[error("Either Project name or Project ID is required for {0} operation")]
    MissingProjectTarget(Operation),
    #[error("{0} must be greater than zero")]
    ZeroDuration(&'static str),
}

/// Optional features compiled into this build, resolved once at startup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    /// Vault support is available
    pub secret_store: bool,
}

impl Capabilities {
    pub fn detect() -> Self {
        Self {
            secret_store: cfg!(feature = "vault"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VaultSettings {
    pub addr: String,
    pub token: String,
    pub namespace: Option<String>,
}

/// How long and how often to poll a new project for readiness.
/// `timeout: None` waits until the project is initialized or the process is interrupted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitPolicy {
    pub enabled: bool,
    pub interval: Duration,
    pub timeout: Option<Duration>,
}

impl Default for WaitPolicy {
    fn default() -> Self {
        Self {
            enabled: false,
            interval: Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS),
            timeout: None,
        }
    }
}

/// Fully resolved and validated settings for one invocation
#[derive(Debug, Clone)]
pub struct Settings {
    pub api_key: String,
    pub operation: Operation,
    pub project_type: ProjectType,
    pub regions: Vec<String>,
    pub project_name: Option<String>,
    pub project_id: Option<String>,
    pub alias: Option<String>,
    pub optimized_for: Option<OptimizedFor>,
    pub if_match: Option<String>,
    pub wait: WaitPolicy,
    pub results_path: PathBuf,
    pub api_base_url: String,
    pub http_timeout: Duration,
    pub vault: Option<VaultSettings>,
    pub vault_path_prefix: String,
    /// Non-fatal problems found during validation, reported before dispatch
    pub warnings: Vec<String>,
}

/// Where configuration comes from besides the command line
#[derive(Debug, Clone, Default)]
pub struct ConfigSources {
    pub config_file: Option<PathBuf>,
    /// Replaces the process environment when set
    pub environment: Option<config::Map<String, String>>,
}

impl ConfigSources {
    /// Process environment plus the config file in the working directory, if any
    pub fn process() -> Self {
        let file = Path::new(CONFIG_FILE_NAME);
        Self {
            config_file: file.exists().then(|| file.to_path_buf()),
            environment: None,
        }
    }

    /// A fixed environment and no config file
    pub fn isolated(environment: config::Map<String, String>) -> Self {
        Self {
            config_file: None,
            environment: Some(environment),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawSettings {
    api_key: Option<String>,
    operation: Option<String>,
    project_type: Option<String>,
    regions: Option<String>,
    project_name: Option<String>,
    project_id: Option<String>,
    project_alias: Option<String>,
    optimized_for: Option<String>,
    if_match: Option<String>,
    /// Free-form switch from the file or ELASTIC_WAIT_FOR_READY
    wait_for_ready: Option<String>,
    /// The --wait-for-ready flag; kept apart so a stray env value cannot clear it
    #[serde(default)]
    wait_for_ready_flag: bool,
    poll_interval_secs: u64,
    wait_timeout_secs: Option<u64>,
    results_path: String,
    api_base_url: String,
    http_timeout_secs: u64,
    vault_addr: Option<String>,
    vault_token: Option<String>,
    vault_namespace: Option<String>,
    vault_path_prefix: String,
}

impl Settings {
    /// Resolve settings from layered sources, lowest precedence first:
    /// 1. Default values
    /// 2. Configuration file (serverless-projects.toml)
    /// 3. Command-line flags
    /// 4. Environment variables (ELASTIC_* and VAULT_*)
    pub fn resolve<F: Serialize>(
        flags: &F,
        sources: ConfigSources,
        capabilities: Capabilities,
    ) -> Result<Self, SettingsError> {
        let mut builder = Config::builder()
            .set_default("poll_interval_secs", DEFAULT_POLL_INTERVAL_SECS)?
            .set_default("results_path", DEFAULT_RESULTS_PATH)?
            .set_default("api_base_url", DEFAULT_API_BASE_URL)?
            .set_default("http_timeout_secs", DEFAULT_HTTP_TIMEOUT_SECS)?
            .set_default("vault_path_prefix", DEFAULT_VAULT_PATH_PREFIX)?;

        if let Some(path) = &sources.config_file {
            builder = builder.add_source(File::from(path.as_path()));
        }

        builder = builder.add_source(Config::try_from(flags)?);

        // ELASTIC_API_KEY -> api_key, VAULT_ADDR -> vault_addr
        builder = builder
            .add_source(
                Environment::with_prefix("ELASTIC")
                    .ignore_empty(true)
                    .source(sources.environment.clone()),
            )
            .add_source(
                Environment::with_prefix("VAULT")
                    .keep_prefix(true)
                    .ignore_empty(true)
                    .source(sources.environment),
            );

        let raw: RawSettings = builder.build()?.try_deserialize()?;
        raw.validate(capabilities)
    }

    /// Load .env file if it exists
    pub fn load_env_file() -> anyhow::Result<()> {
        if Path::new(".env").exists() {
            dotenvy::dotenv()?;
            tracing::info!("Loaded environment variables from .env file");
        }
        Ok(())
    }

}

impl RawSettings {
    fn validate(self, capabilities: Capabilities) -> Result<Settings, SettingsError> {
        let mut warnings = Vec::new();

        let api_key = non_empty(self.api_key).ok_or(SettingsError::MissingApiKey)?;
        let operation = non_empty(self.operation).ok_or(SettingsError::MissingOperation)?;
        let project_type = non_empty(self.project_type).ok_or(SettingsError::MissingProjectType)?;
        let project_type: ProjectType = project_type.parse()?;

        let optimized_for = match non_empty(self.optimized_for) {
            None => None,
            Some(value) if project_type != ProjectType::Elasticsearch => {
                warnings.push(format!(
                    "optimized_for parameter is only applicable to 'elasticsearch' projects, not '{project_type}' projects. Ignoring this parameter."
                ));
                tracing::warn!(optimized_for = %value, %project_type, "ignoring optimized_for");
                None
            }
            Some(value) => Some(value.parse::<OptimizedFor>()?),
        };

        let operation: Operation = operation.parse()?;
        let project_name = non_empty(self.project_name);
        let project_id = non_empty(self.project_id);
        let regions_raw = non_empty(self.regions);

        if operation == Operation::Create && (project_name.is_none() || regions_raw.is_none()) {
            return Err(SettingsError::MissingCreateParameters);
        }
        if operation.targets_existing_project() && project_name.is_none() && project_id.is_none() {
            return Err(SettingsError::MissingProjectTarget(operation));
        }

        let regions = regions_raw.as_deref().map(split_regions).unwrap_or_default();
        if operation == Operation::Create && regions.is_empty() {
            return Err(SettingsError::NoRegions);
        }

        if self.poll_interval_secs == 0 {
            return Err(SettingsError::ZeroDuration("poll_interval_secs"));
        }
        if self.wait_timeout_secs == Some(0) {
            return Err(SettingsError::ZeroDuration("wait_timeout_secs"));
        }
        if self.http_timeout_secs == 0 {
            return Err(SettingsError::ZeroDuration("http_timeout_secs"));
        }

        let vault = match (non_empty(self.vault_addr), non_empty(self.vault_token)) {
            (Some(addr), Some(token)) if capabilities.secret_store => Some(VaultSettings {
                addr,
                token,
                namespace: non_empty(self.vault_namespace),
            }),
            (Some(_), Some(_)) => {
                warnings.push(
                    "Vault integration is not available in this build. Continuing without Vault integration..."
                        .to_string(),
                );
                None
            }
            _ => None,
        };

        Ok(Settings {
            api_key,
            operation,
            project_type,
            regions,
            project_name,
            project_id,
            alias: non_empty(self.project_alias),
            optimized_for,
            if_match: non_empty(self.if_match),
            wait: WaitPolicy {
                enabled: self.wait_for_ready_flag || is_true(self.wait_for_ready.as_deref()),
                interval: Duration::from_secs(self.poll_interval_secs),
                timeout: self.wait_timeout_secs.map(Duration::from_secs),
            },
            results_path: PathBuf::from(self.results_path),
            api_base_url: self.api_base_url,
            http_timeout: Duration::from_secs(self.http_timeout_secs),
            vault,
            vault_path_prefix: self.vault_path_prefix,
            warnings,
        })
    }
}

/// Only "true", in any case, switches a setting on; anything else is off
fn is_true(value: Option<&str>) -> bool {
    value.is_some_and(|v| v.trim().eq_ignore_ascii_case("true"))
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Split a comma-separated region list, dropping blank entries
pub fn split_regions(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .map(str::to_string)
        .collect()
}
