use clap::Parser;
use serde::Serialize;

/// Command-line flags. Every flag is optional here; required combinations are
/// checked after the flags are merged with the environment, which takes
/// precedence over anything given on the command line.
#[derive(Parser, Debug, Default, Serialize)]
#[command(name = "serverless-project-manager")]
#[command(about = "Manage Elastic Cloud serverless projects via the control-plane API")]
#[command(long_about = "Create, delete, update, inspect and reset credentials for Elastic Cloud \
                       serverless projects (elasticsearch, observability, security). Connection \
                       details can be stored in HashiCorp Vault. Every flag can also be set \
                       through ELASTIC_* / VAULT_* environment variables, which take precedence.")]
pub struct Cli {
    /// Operation to perform
    #[arg(long, value_parser = ["create", "delete", "update", "reset-credentials", "list", "get"])]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operation: Option<String>,

    /// Type of project
    #[arg(long, value_parser = ["elasticsearch", "observability", "security"])]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_type: Option<String>,

    /// Comma-separated list of regions
    #[arg(long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub regions: Option<String>,

    /// Name of the project (for creation, or to look up the ID in Vault)
    #[arg(long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_name: Option<String>,

    /// ID of the project (for deletion/update)
    #[arg(long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,

    /// API key for authentication
    #[arg(long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Custom domain label
    #[arg(long)]
    #[serde(rename = "project_alias", skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,

    /// Optimization type (elasticsearch projects only)
    #[arg(long, value_parser = ["general_purpose", "vector"])]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub optimized_for: Option<String>,

    /// ETag from a previous GET, sent as If-Match on update
    #[arg(long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub if_match: Option<String>,

    /// Wait for the project to be fully initialized
    #[arg(long)]
    #[serde(rename = "wait_for_ready_flag", skip_serializing_if = "std::ops::Not::not")]
    pub wait_for_ready: bool,

    /// Seconds between readiness checks
    #[arg(long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub poll_interval_secs: Option<u64>,

    /// Give up waiting for readiness after this many seconds (waits indefinitely when unset)
    #[arg(long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wait_timeout_secs: Option<u64>,

    /// Where to write the per-region creation results
    #[arg(long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub results_path: Option<String>,

    /// Control-plane base URL
    #[arg(long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_base_url: Option<String>,

    /// HTTP request timeout in seconds
    #[arg(long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub http_timeout_secs: Option<u64>,

    /// HashiCorp Vault address
    #[arg(long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vault_addr: Option<String>,

    /// Token for Vault authentication
    #[arg(long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vault_token: Option<String>,

    /// Vault namespace (for Enterprise Vault)
    #[arg(long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vault_namespace: Option<String>,

    /// Prefix for Vault paths
    #[arg(long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vault_path_prefix: Option<String>,

    /// Log filter used when RUST_LOG is unset
    #[arg(long, default_value = "warn")]
    #[serde(skip)]
    pub log_level: String,
}
