use super::{Orchestrator, RunReport, WorkflowError};
use crate::control_plane::ProjectUpdate;
use crate::vault::SecretDocument;

impl Orchestrator {
    pub(crate) async fn delete(&self, report: &mut RunReport) -> Result<(), WorkflowError> {
        let target = self.resolve_target(report).await?;
        println!(
            "Deleting {} project {}...",
            target.project_type, target.project_id
        );
        if self
            .control_plane
            .delete_project(target.project_type, &target.project_id)
            .await?
        {
            println!("Successfully deleted project {}", target.project_id);
        }
        Ok(())
    }

    pub(crate) async fn update(&self, report: &mut RunReport) -> Result<(), WorkflowError> {
        let target = self.resolve_target(report).await?;
        println!(
            "Updating {} project {}...",
            target.project_type, target.project_id
        );

        let update = ProjectUpdate {
            name: self.settings.project_name.clone(),
            alias: self.settings.alias.clone(),
            if_match: self.settings.if_match.clone(),
        };
        let response = self
            .control_plane
            .update_project(target.project_type, &target.project_id, &update)
            .await?;
        println!("Successfully updated project {}", target.project_id);
        println!("{}", serde_json::to_string_pretty(&response.raw)?);

        self.rewrite_document(
            report,
            |document| document.apply_update(&response.record),
            "project information",
        )
        .await;
        Ok(())
    }

    pub(crate) async fn reset_credentials(
        &self,
        report: &mut RunReport,
    ) -> Result<(), WorkflowError> {
        let target = self.resolve_target(report).await?;
        println!(
            "Resetting credentials for {} project {}...",
            target.project_type, target.project_id
        );
        let credentials = self
            .control_plane
            .reset_credentials(target.project_type, &target.project_id)
            .await?;
        println!("Successfully reset credentials for project {}", target.project_id);

        if let (Some(username), Some(password)) = (&credentials.username, &credentials.password) {
            println!("\nNew Credentials:");
            println!("  Username: {username}");
            println!("  Password: {password}");
        }

        if credentials.username.is_some() || credentials.password.is_some() {
            self.rewrite_document(
                report,
                |document| document.apply_credentials(&credentials),
                "credentials",
            )
            .await;
        }
        Ok(())
    }

    pub(crate) async fn list(&self) -> Result<(), WorkflowError> {
        let project_type = self.settings.project_type;
        println!("Listing all {project_type} projects...");
        let listing = self.control_plane.list_projects(project_type).await?;
        println!("{}", serde_json::to_string_pretty(&listing)?);
        Ok(())
    }

    pub(crate) async fn get(&self, report: &mut RunReport) -> Result<(), WorkflowError> {
        let target = self.resolve_target(report).await?;
        println!(
            "Fetching {} project {}...",
            target.project_type, target.project_id
        );
        let response = self
            .control_plane
            .get_project(target.project_type, &target.project_id)
            .await?;
        println!("{}", serde_json::to_string_pretty(&response.raw)?);
        Ok(())
    }

    /// Read-modify-write the stored document for the configured project name.
    /// Does nothing without a secret store or a name; never writes a document
    /// that did not exist before.
    async fn rewrite_document<F>(&self, report: &mut RunReport, change: F, what: &str)
    where
        F: FnOnce(&mut SecretDocument),
    {
        let (Some(store), Some(name)) = (&self.secret_store, &self.settings.project_name) else {
            return;
        };

        let Some(mut document) = store.read(self.vault_prefix(), name).await else {
            report.advise(format!(
                "No existing project information found in Vault for {name}"
            ));
            return;
        };

        change(&mut document);
        let outcome = store.write(self.vault_prefix(), name, &document).await;
        if outcome.ok {
            println!("Successfully updated {what} in Vault");
        } else {
            report.advise(format!("Failed to update {what} in Vault: {}", outcome.detail));
        }
        report.secret_writes.push(outcome);
    }
}
