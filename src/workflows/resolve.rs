use super::{Orchestrator, RunReport, WorkflowError};
use crate::config::ProjectType;

/// The project an operation acts on
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub project_id: String,
    pub project_type: ProjectType,
}

impl Orchestrator {
    /// Use the explicit project id, or look it up by name in the secret store.
    ///
    /// A stored `project_type` replaces the configured type only while the
    /// configured one is still `elasticsearch`, the usual default.
    pub(crate) async fn resolve_target(
        &self,
        report: &mut RunReport,
    ) -> Result<Target, WorkflowError> {
        let mut project_type = self.settings.project_type;

        if let Some(project_id) = &self.settings.project_id {
            return Ok(Target {
                project_id: project_id.clone(),
                project_type,
            });
        }

        if let (Some(name), Some(store)) = (&self.settings.project_name, &self.secret_store) {
            println!("Project ID not provided, attempting to retrieve from Vault...");
            let stored = store.read(self.vault_prefix(), name).await;

            if let Some(document) = stored {
                if let Some(project_id) = document.project_id() {
                    println!("Found project ID in Vault: {project_id}");

                    if project_type == ProjectType::Elasticsearch {
                        if let Some(stored_type) = document.project_type() {
                            match stored_type.parse::<ProjectType>() {
                                Ok(parsed) => {
                                    project_type = parsed;
                                    println!("Using project type from Vault: {project_type}");
                                }
                                Err(_) => report.advise(format!(
                                    "Ignoring unknown project type '{stored_type}' stored in Vault"
                                )),
                            }
                        }
                    }

                    return Ok(Target {
                        project_id: project_id.to_string(),
                        project_type,
                    });
                }
            }
            report.advise("Could not find project information in Vault");
        }

        Err(WorkflowError::MissingProjectId(self.settings.operation))
    }
}
