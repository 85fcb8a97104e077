use super::*;
use crate::config::{
    ProjectType, WaitPolicy, DEFAULT_API_BASE_URL, DEFAULT_VAULT_PATH_PREFIX,
};
use crate::control_plane::{
    Credentials, ProjectResponse, ProjectSpec, ProjectStatus, ProjectUpdate,
};
use crate::fs::MockFileSystemOperations;
use crate::shutdown::ShutdownCoordinator;
use crate::vault::{secret_path, SecretDocument};
use async_trait::async_trait;
use mockall::predicate::{always, eq};
use serde_json::{json, Value};
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

const FOO_PATH: &str = "secret/k8s/eden/staging-3/foo/info";

/// Control plane that answers from canned responses and records every call
#[derive(Default)]
struct FakeControlPlane {
    created: Mutex<VecDeque<Value>>,
    /// Phases returned by successive status calls; the last one repeats
    phases: Mutex<VecDeque<&'static str>>,
    /// Body of the update response; an empty object when unset
    updated: Option<Value>,
    credentials: Credentials,
    /// List calls never complete
    stall_list: bool,
    updates: Mutex<Vec<ProjectUpdate>>,
    calls: Mutex<Vec<String>>,
}

impl FakeControlPlane {
    fn with_created(records: Vec<Value>) -> Self {
        Self {
            created: Mutex::new(records.into_iter().collect()),
            ..Default::default()
        }
    }

    fn with_phases(mut self, phases: &[&'static str]) -> Self {
        self.phases = Mutex::new(phases.iter().copied().collect());
        self
    }

    fn record_call(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ControlPlane for FakeControlPlane {
    async fn create_project(&self, spec: &ProjectSpec) -> Result<ProjectResponse, ControlPlaneError> {
        self.record_call(format!("create:{}", spec.region_id));
        let raw = self.created.lock().unwrap().pop_front().ok_or_else(|| {
            ControlPlaneError::ApiFailure {
                operation: "create project",
                status: 500,
                body: "region unavailable".into(),
            }
        })?;
        Ok(response(raw))
    }

    async fn project_status(
        &self,
        _project_type: ProjectType,
        project_id: &str,
    ) -> Result<ProjectStatus, ControlPlaneError> {
        self.record_call(format!("status:{project_id}"));
        let mut phases = self.phases.lock().unwrap();
        let phase = if phases.len() > 1 {
            phases.pop_front()
        } else {
            phases.front().copied()
        };
        Ok(ProjectStatus {
            phase: phase.map(str::to_string),
            ..Default::default()
        })
    }

    async fn update_project(
        &self,
        project_type: ProjectType,
        project_id: &str,
        update: &ProjectUpdate,
    ) -> Result<ProjectResponse, ControlPlaneError> {
        self.record_call(format!("update:{project_type}:{project_id}"));
        self.updates.lock().unwrap().push(update.clone());
        Ok(response(self.updated.clone().unwrap_or_else(|| json!({}))))
    }

    async fn delete_project(
        &self,
        project_type: ProjectType,
        project_id: &str,
    ) -> Result<bool, ControlPlaneError> {
        self.record_call(format!("delete:{project_type}:{project_id}"));
        Ok(true)
    }

    async fn reset_credentials(
        &self,
        project_type: ProjectType,
        project_id: &str,
    ) -> Result<Credentials, ControlPlaneError> {
        self.record_call(format!("reset:{project_type}:{project_id}"));
        Ok(self.credentials.clone())
    }

    async fn get_project(
        &self,
        project_type: ProjectType,
        project_id: &str,
    ) -> Result<ProjectResponse, ControlPlaneError> {
        self.record_call(format!("get:{project_type}:{project_id}"));
        Ok(response(json!({"id": project_id})))
    }

    async fn list_projects(
        &self,
        project_type: ProjectType,
    ) -> Result<Value, ControlPlaneError> {
        self.record_call(format!("list:{project_type}"));
        if self.stall_list {
            std::future::pending::<()>().await;
        }
        Ok(json!({"items": [{"id": "p1"}], "next_page": null}))
    }
}

/// In-memory secret store keyed by full path
#[derive(Default)]
struct FakeSecretStore {
    documents: Mutex<HashMap<String, SecretDocument>>,
    writes: Mutex<Vec<(String, SecretDocument)>>,
    fail_writes: bool,
}

impl FakeSecretStore {
    fn holding(path: &str, document: SecretDocument) -> Self {
        let store = Self::default();
        store
            .documents
            .lock()
            .unwrap()
            .insert(path.to_string(), document);
        store
    }

    fn failing() -> Self {
        Self {
            fail_writes: true,
            ..Default::default()
        }
    }

    fn writes(&self) -> Vec<(String, SecretDocument)> {
        self.writes.lock().unwrap().clone()
    }

    fn document(&self, path: &str) -> Option<SecretDocument> {
        self.documents.lock().unwrap().get(path).cloned()
    }
}

#[async_trait]
impl SecretStore for FakeSecretStore {
    async fn write(&self, prefix: &str, project_name: &str, document: &SecretDocument) -> Outcome {
        let path = secret_path(prefix, project_name);
        self.writes
            .lock()
            .unwrap()
            .push((path.clone(), document.clone()));
        if self.fail_writes {
            return Outcome::failure("Error storing project info in Vault: permission denied");
        }
        self.documents
            .lock()
            .unwrap()
            .insert(path.clone(), document.clone());
        Outcome::success(path)
    }

    async fn read(&self, prefix: &str, project_name: &str) -> Option<SecretDocument> {
        self.document(&secret_path(prefix, project_name))
    }
}

fn response(raw: Value) -> ProjectResponse {
    ProjectResponse::from_raw(raw).unwrap()
}

fn settings(operation: Operation) -> Settings {
    Settings {
        api_key: "test-key".into(),
        operation,
        project_type: ProjectType::Elasticsearch,
        regions: Vec::new(),
        project_name: Some("foo".into()),
        project_id: None,
        alias: None,
        optimized_for: None,
        if_match: None,
        wait: WaitPolicy::default(),
        results_path: PathBuf::from("/out/project_results.json"),
        api_base_url: DEFAULT_API_BASE_URL.into(),
        http_timeout: Duration::from_secs(30),
        vault: None,
        vault_path_prefix: DEFAULT_VAULT_PATH_PREFIX.into(),
        warnings: Vec::new(),
    }
}

fn create_settings(regions: &[&str]) -> Settings {
    let mut settings = settings(Operation::Create);
    settings.regions = regions.iter().map(|r| r.to_string()).collect();
    settings
}

/// File system mock that captures the results artifact
fn capturing_fs() -> (MockFileSystemOperations, Arc<Mutex<Vec<u8>>>) {
    let written = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&written);
    let mut mock_fs = MockFileSystemOperations::new();
    mock_fs
        .expect_create_dir_all()
        .with(eq("/out"))
        .times(1)
        .returning(|_| Ok(()));
    mock_fs
        .expect_write()
        .with(eq("/out/project_results.json"), always())
        .times(1)
        .returning(move |_, contents| {
            sink.lock().unwrap().extend_from_slice(contents);
            Ok(())
        });
    (mock_fs, written)
}

fn untouched_fs() -> Arc<MockFileSystemOperations> {
    let mut mock_fs = MockFileSystemOperations::new();
    mock_fs.expect_create_dir_all().times(0);
    mock_fs.expect_write().times(0);
    Arc::new(mock_fs)
}

fn orchestrator(
    settings: Settings,
    control_plane: &Arc<FakeControlPlane>,
    store: Option<&Arc<FakeSecretStore>>,
) -> Orchestrator {
    Orchestrator::new(settings, control_plane.clone())
        .with_secret_store(store.map(|s| s.clone() as Arc<dyn SecretStore>))
        .with_file_system(untouched_fs())
}

#[tokio::test]
async fn test_two_region_create_writes_results_and_shared_document() {
    let control_plane = Arc::new(FakeControlPlane::with_created(vec![
        json!({
            "id": "p1",
            "name": "foo",
            "region_id": "us-east-1",
            "credentials": {"username": "u", "password": "p"}
        }),
        json!({"id": "p2", "name": "foo", "region_id": "us-west-2"}),
    ]));
    let store = Arc::new(FakeSecretStore::default());
    let (mock_fs, written) = capturing_fs();

    let report = orchestrator(create_settings(&["us-east-1", "us-west-2"]), &control_plane, Some(&store))
        .with_file_system(Arc::new(mock_fs))
        .run()
        .await
        .unwrap();

    assert_eq!(control_plane.calls(), vec!["create:us-east-1", "create:us-west-2"]);

    let results: Value = serde_json::from_slice(&written.lock().unwrap()).unwrap();
    assert_eq!(results["us-east-1"]["id"], "p1");
    assert_eq!(results["us-east-1"]["credentials"]["username"], "u");
    assert_eq!(results["us-west-2"]["id"], "p2");
    assert_eq!(results.as_object().unwrap().len(), 2);

    let writes = store.writes();
    assert_eq!(writes.len(), 2);
    assert!(writes.iter().all(|(path, _)| path == FOO_PATH));
    assert_eq!(writes[0].1.get("CLOUD_AUTH"), Some("u:p"));
    // Second region overwrites the first region's document
    assert_eq!(store.document(FOO_PATH).unwrap().project_id(), Some("p2"));
    assert!(report.advisories.is_empty());
}

#[tokio::test]
async fn test_results_keep_fields_exactly_as_returned() {
    let control_plane = Arc::new(FakeControlPlane::with_created(vec![json!({
        "id": "p1",
        "alias": null,
        "metadata": {"created_at": "2024-01-01T00:00:00Z", "suspended_at": null}
    })]));
    let (mock_fs, written) = capturing_fs();

    orchestrator(create_settings(&["us-east-1"]), &control_plane, None)
        .with_file_system(Arc::new(mock_fs))
        .run()
        .await
        .unwrap();

    let results: Value = serde_json::from_slice(&written.lock().unwrap()).unwrap();
    assert_eq!(
        results["us-east-1"],
        json!({
            "id": "p1",
            "alias": null,
            "metadata": {"created_at": "2024-01-01T00:00:00Z", "suspended_at": null}
        })
    );
}

#[tokio::test]
async fn test_create_survives_secret_store_failure() {
    let control_plane = Arc::new(FakeControlPlane::with_created(vec![json!({"id": "p1"})]));
    let store = Arc::new(FakeSecretStore::failing());
    let (mock_fs, _written) = capturing_fs();

    let report = orchestrator(create_settings(&["us-east-1"]), &control_plane, Some(&store))
        .with_file_system(Arc::new(mock_fs))
        .run()
        .await
        .unwrap();

    assert_eq!(report.secret_writes.len(), 1);
    assert!(!report.secret_writes[0].ok);
    assert_eq!(report.advisories.len(), 1);
    assert!(report.advisories[0].starts_with("Failed to store project information in Vault"));
}

#[tokio::test]
async fn test_create_without_store_skips_documents() {
    let control_plane = Arc::new(FakeControlPlane::with_created(vec![json!({"id": "p1"})]));
    let (mock_fs, written) = capturing_fs();

    let report = orchestrator(create_settings(&["us-east-1"]), &control_plane, None)
        .with_file_system(Arc::new(mock_fs))
        .run()
        .await
        .unwrap();

    assert!(report.secret_writes.is_empty());
    assert!(!written.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_failed_region_aborts_before_results_are_written() {
    let control_plane = Arc::new(FakeControlPlane::with_created(vec![json!({"id": "p1"})]));
    let store = Arc::new(FakeSecretStore::default());

    let err = orchestrator(create_settings(&["us-east-1", "us-west-2"]), &control_plane, Some(&store))
        .run()
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        WorkflowError::ControlPlane(ControlPlaneError::ApiFailure { status: 500, .. })
    ));
    assert_eq!(store.writes().len(), 1);
}

#[tokio::test]
async fn test_missing_project_id_makes_no_control_plane_call() {
    for operation in [Operation::Delete, Operation::Update, Operation::ResetCredentials] {
        let control_plane = Arc::new(FakeControlPlane::default());

        let err = orchestrator(settings(operation), &control_plane, None)
            .run()
            .await
            .unwrap_err();

        assert!(matches!(err, WorkflowError::MissingProjectId(op) if op == operation));
        assert!(control_plane.calls().is_empty());
    }
}

#[tokio::test]
async fn test_unknown_name_in_store_is_a_missing_id() {
    let control_plane = Arc::new(FakeControlPlane::default());
    let store = Arc::new(FakeSecretStore::default());

    let err = orchestrator(settings(Operation::Delete), &control_plane, Some(&store))
        .run()
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "Project ID is required for deletion");
    assert!(control_plane.calls().is_empty());
}

#[tokio::test]
async fn test_delete_resolves_id_and_type_from_store() {
    let control_plane = Arc::new(FakeControlPlane::default());
    let store = Arc::new(FakeSecretStore::holding(
        FOO_PATH,
        SecretDocument::from_iter([("id", "p9"), ("project_type", "security")]),
    ));

    orchestrator(settings(Operation::Delete), &control_plane, Some(&store))
        .run()
        .await
        .unwrap();

    assert_eq!(control_plane.calls(), vec!["delete:security:p9"]);
}

#[tokio::test]
async fn test_explicit_type_is_not_replaced_by_stored_type() {
    let control_plane = Arc::new(FakeControlPlane::default());
    let store = Arc::new(FakeSecretStore::holding(
        FOO_PATH,
        SecretDocument::from_iter([("id", "p9"), ("project_type", "security")]),
    ));
    let mut settings = settings(Operation::Get);
    settings.project_type = ProjectType::Observability;

    orchestrator(settings, &control_plane, Some(&store))
        .run()
        .await
        .unwrap();

    assert_eq!(control_plane.calls(), vec!["get:observability:p9"]);
}

#[tokio::test]
async fn test_update_merges_into_existing_document() {
    let control_plane = Arc::new(FakeControlPlane {
        updated: Some(json!({"id": "p1", "name": "n"})),
        ..Default::default()
    });
    let store = Arc::new(FakeSecretStore::holding(
        FOO_PATH,
        SecretDocument::from_iter([("a", "1"), ("b", "2")]),
    ));
    let mut settings = settings(Operation::Update);
    settings.project_id = Some("p1".into());
    settings.if_match = Some("\"etag-1\"".into());

    let report = orchestrator(settings, &control_plane, Some(&store))
        .run()
        .await
        .unwrap();

    assert_eq!(
        store.document(FOO_PATH).unwrap(),
        SecretDocument::from_iter([("a", "1"), ("b", "2"), ("name", "n")])
    );
    let updates = control_plane.updates.lock().unwrap().clone();
    assert_eq!(
        updates,
        vec![ProjectUpdate {
            name: Some("foo".into()),
            alias: None,
            if_match: Some("\"etag-1\"".into()),
        }]
    );
    assert!(report.secret_writes[0].ok);
}

#[tokio::test]
async fn test_update_without_stored_document_writes_nothing() {
    let control_plane = Arc::new(FakeControlPlane::default());
    let store = Arc::new(FakeSecretStore::default());
    let mut settings = settings(Operation::Update);
    settings.project_id = Some("p1".into());

    let report = orchestrator(settings, &control_plane, Some(&store))
        .run()
        .await
        .unwrap();

    assert!(store.writes().is_empty());
    assert_eq!(
        report.advisories,
        vec!["No existing project information found in Vault for foo"]
    );
}

#[tokio::test]
async fn test_reset_credentials_refreshes_auth_in_document() {
    let control_plane = Arc::new(FakeControlPlane {
        credentials: Credentials {
            username: Some("admin".into()),
            password: Some("fresh".into()),
        },
        ..Default::default()
    });
    let store = Arc::new(FakeSecretStore::holding(
        FOO_PATH,
        SecretDocument::from_iter([
            ("id", "p1"),
            ("ELASTICSEARCH_USERNAME", "admin"),
            ("ELASTICSEARCH_PASSWORD", "stale"),
            ("CLOUD_AUTH", "admin:stale"),
            ("KIBANA_URL", "https://kb.example"),
        ]),
    ));

    orchestrator(settings(Operation::ResetCredentials), &control_plane, Some(&store))
        .run()
        .await
        .unwrap();

    assert_eq!(control_plane.calls(), vec!["reset:elasticsearch:p1"]);
    let document = store.document(FOO_PATH).unwrap();
    assert_eq!(document.get("ELASTICSEARCH_PASSWORD"), Some("fresh"));
    assert_eq!(document.get("CLOUD_AUTH"), Some("admin:fresh"));
    assert_eq!(document.get("KIBANA_URL"), Some("https://kb.example"));
}

#[tokio::test]
async fn test_list_uses_configured_type() {
    let control_plane = Arc::new(FakeControlPlane::default());
    let mut settings = settings(Operation::List);
    settings.project_type = ProjectType::Security;

    orchestrator(settings, &control_plane, None).run().await.unwrap();

    assert_eq!(control_plane.calls(), vec!["list:security"]);
}

#[tokio::test]
async fn test_settings_warnings_are_reported_first() {
    let control_plane = Arc::new(FakeControlPlane::default());
    let mut settings = settings(Operation::List);
    settings.warnings.push("optimized_for ignored".into());

    let report = orchestrator(settings, &control_plane, None).run().await.unwrap();

    assert_eq!(report.advisories, vec!["Warning: optimized_for ignored"]);
}

#[tokio::test(start_paused = true)]
async fn test_wait_polls_until_initialized() {
    let control_plane = Arc::new(
        FakeControlPlane::with_created(vec![json!({"id": "p1"})])
            .with_phases(&["initializing", "initializing", "initialized"]),
    );
    let (mock_fs, _written) = capturing_fs();
    let mut settings = create_settings(&["us-east-1"]);
    settings.wait.enabled = true;
    let started = tokio::time::Instant::now();

    orchestrator(settings, &control_plane, None)
        .with_file_system(Arc::new(mock_fs))
        .run()
        .await
        .unwrap();

    assert_eq!(
        control_plane.calls(),
        vec!["create:us-east-1", "status:p1", "status:p1", "status:p1"]
    );
    assert_eq!(started.elapsed(), Duration::from_secs(10));
}

#[tokio::test(start_paused = true)]
async fn test_wait_times_out_without_writing_results() {
    let control_plane = Arc::new(
        FakeControlPlane::with_created(vec![json!({"id": "p1"})]).with_phases(&["initializing"]),
    );
    let mut settings = create_settings(&["us-east-1"]);
    settings.wait.enabled = true;
    settings.wait.timeout = Some(Duration::from_secs(12));

    let err = orchestrator(settings, &control_plane, None)
        .run()
        .await
        .unwrap_err();

    match err {
        WorkflowError::WaitTimedOut { project_id, waited } => {
            assert_eq!(project_id, "p1");
            assert_eq!(waited, Duration::from_secs(12));
        }
        other => panic!("expected timeout, got {other:?}"),
    }
    assert_eq!(control_plane.calls().len(), 4);
}

#[tokio::test(start_paused = true)]
async fn test_huge_wait_timeout_means_no_deadline() {
    let control_plane = Arc::new(
        FakeControlPlane::with_created(vec![json!({"id": "p1"})])
            .with_phases(&["initializing", "initialized"]),
    );
    let (mock_fs, _written) = capturing_fs();
    let mut settings = create_settings(&["us-east-1"]);
    settings.wait.enabled = true;
    settings.wait.timeout = Some(Duration::from_secs(u64::MAX));

    orchestrator(settings, &control_plane, None)
        .with_file_system(Arc::new(mock_fs))
        .run()
        .await
        .unwrap();

    assert_eq!(
        control_plane.calls(),
        vec!["create:us-east-1", "status:p1", "status:p1"]
    );
}

#[tokio::test(start_paused = true)]
async fn test_wait_stops_on_shutdown() {
    let control_plane = Arc::new(
        FakeControlPlane::with_created(vec![json!({"id": "p1"})]).with_phases(&["initializing"]),
    );
    let coordinator = ShutdownCoordinator::new();
    let mut settings = create_settings(&["us-east-1"]);
    settings.wait.enabled = true;
    let shutdown = coordinator.signal();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(12)).await;
        coordinator.trigger();
    });

    let err = orchestrator(settings, &control_plane, None)
        .with_shutdown(shutdown)
        .run()
        .await
        .unwrap_err();

    assert!(matches!(err, WorkflowError::Interrupted(Operation::Create)));
    assert_eq!(control_plane.calls()[0], "create:us-east-1");
    assert!(control_plane.calls()[1..].iter().all(|call| call == "status:p1"));
}

#[tokio::test]
async fn test_shutdown_before_run_makes_no_control_plane_call() {
    let control_plane = Arc::new(FakeControlPlane::default());
    let coordinator = ShutdownCoordinator::new();
    coordinator.trigger();

    let err = orchestrator(settings(Operation::List), &control_plane, None)
        .with_shutdown(coordinator.signal())
        .run()
        .await
        .unwrap_err();

    assert!(matches!(err, WorkflowError::Interrupted(Operation::List)));
    assert!(control_plane.calls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_interrupts_request_in_flight() {
    let control_plane = Arc::new(FakeControlPlane {
        stall_list: true,
        ..Default::default()
    });
    let coordinator = ShutdownCoordinator::new();
    let shutdown = coordinator.signal();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(1)).await;
        coordinator.trigger();
    });

    let err = orchestrator(settings(Operation::List), &control_plane, None)
        .with_shutdown(shutdown)
        .run()
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "Interrupted during list operation");
    assert_eq!(control_plane.calls(), vec!["list:elasticsearch"]);
}
