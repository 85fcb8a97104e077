use super::WorkflowError;
use crate::config::{ProjectType, WaitPolicy};
use crate::control_plane::{ControlPlane, ProjectStatus};
use tokio::time::{sleep, sleep_until, Instant};
use tracing::debug;

/// Poll the project status every `policy.interval` until it reports
/// `initialized`. Gives up once `policy.timeout` elapses; with no timeout,
/// or one too large to represent as a deadline, it waits indefinitely.
pub async fn wait_until_initialized(
    control_plane: &dyn ControlPlane,
    project_type: ProjectType,
    project_id: &str,
    policy: &WaitPolicy,
) -> Result<ProjectStatus, WorkflowError> {
    println!("Waiting for project {project_id} to be fully initialized...");
    let started = Instant::now();
    let deadline = policy
        .timeout
        .and_then(|timeout| started.checked_add(timeout));

    loop {
        let status = control_plane.project_status(project_type, project_id).await?;
        if status.is_initialized() {
            println!("Project {project_id} is now ready!");
            return Ok(status);
        }
        println!("Project status: {}. Waiting...", status.phase_or_unknown());
        debug!(project_id, phase = status.phase_or_unknown(), "project not ready");

        let deadline_passed = async {
            match deadline {
                Some(deadline) => sleep_until(deadline).await,
                None => std::future::pending().await,
            }
        };

        tokio::select! {
            _ = sleep(policy.interval) => {}
            _ = deadline_passed => {
                return Err(WorkflowError::WaitTimedOut {
                    project_id: project_id.to_string(),
                    waited: started.elapsed(),
                });
            }
        }
    }
}
