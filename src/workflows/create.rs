use super::polling::wait_until_initialized;
use super::{Orchestrator, RunReport, WorkflowError};
use crate::config::SettingsError;
use crate::control_plane::{ProjectRecord, ProjectSpec};
use crate::fs::write_creating_parents;
use crate::vault::SecretDocument;
use serde_json::{Map, Value};
use tracing::info;

const SEPARATOR_WIDTH: usize = 80;

impl Orchestrator {
    /// Create the project in every configured region, one after another.
    ///
    /// Each region's secret document goes to the same `{prefix}/{name}/info`
    /// path, so with several regions the last one written is what remains.
    pub(crate) async fn create(&self, report: &mut RunReport) -> Result<(), WorkflowError> {
        let settings = &self.settings;
        let name = settings
            .project_name
            .as_deref()
            .ok_or(SettingsError::MissingCreateParameters)?;

        let mut results = Map::new();
        for region in &settings.regions {
            println!(
                "Creating {} project '{}' in region {}...",
                settings.project_type, name, region
            );
            let spec = ProjectSpec {
                project_type: settings.project_type,
                name: name.to_string(),
                region_id: region.clone(),
                alias: settings.alias.clone(),
                optimized_for: settings.optimized_for,
            };
            let response = self.control_plane.create_project(&spec).await?;
            let record = &response.record;
            info!(region = %region, project_id = ?record.id, "project created");

            if let (true, Some(project_id)) = (settings.wait.enabled, record.id.as_deref()) {
                wait_until_initialized(
                    self.control_plane.as_ref(),
                    settings.project_type,
                    project_id,
                    &settings.wait,
                )
                .await?;
            }

            print_created(region, record);

            if let Some(store) = &self.secret_store {
                let document = SecretDocument::from_created_project(record, settings.project_type);
                let outcome = store.write(self.vault_prefix(), name, &document).await;
                if outcome.ok {
                    println!(
                        "Successfully stored project information in Vault at {}",
                        outcome.detail
                    );
                } else {
                    report.advise(format!(
                        "Failed to store project information in Vault: {}",
                        outcome.detail
                    ));
                }
                report.secret_writes.push(outcome);
            }

            results.insert(region.clone(), response.raw);
        }

        self.write_results(&Value::Object(results)).await
    }

    async fn write_results(&self, results: &Value) -> Result<(), WorkflowError> {
        let path = &self.settings.results_path;
        let contents = serde_json::to_vec_pretty(results)?;
        write_creating_parents(self.fs.as_ref(), path, &contents)
            .await
            .map_err(|error| WorkflowError::Results {
                path: path.clone(),
                error,
            })?;
        println!("Results written to {}", path.display());
        Ok(())
    }
}

fn print_created(region: &str, record: &ProjectRecord) {
    println!(
        "Successfully created project in {}. Project ID: {}",
        region,
        record.id.as_deref().unwrap_or("N/A")
    );

    if let Some(endpoints) = &record.endpoints {
        println!("\nEndpoints:");
        for (service, url) in endpoints {
            println!("  {service}: {url}");
        }
    }

    if let Some(credentials) = &record.credentials {
        println!("\nCredentials:");
        println!("  Username: {}", credentials.username.as_deref().unwrap_or("N/A"));
        println!("  Password: {}", credentials.password.as_deref().unwrap_or("N/A"));
    }

    println!("\nCloud ID: {}", record.cloud_id.as_deref().unwrap_or("N/A"));
    println!("{}", "=".repeat(SEPARATOR_WIDTH));
}
