use anyhow::Result;
use clap::Parser;
use serverless_project_manager::cli::Cli;
use serverless_project_manager::config::{Capabilities, ConfigSources, Settings, VaultSettings};
use serverless_project_manager::control_plane::ControlPlaneClient;
use serverless_project_manager::shutdown::ShutdownCoordinator;
use serverless_project_manager::telemetry::{
    create_invocation_span, generate_correlation_id, init_telemetry,
};
use serverless_project_manager::vault::{SecretStore, VaultClient};
use serverless_project_manager::workflows::Orchestrator;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tracing::Instrument;

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Load .env before reading the environment; a broken file is not fatal
    if let Err(e) = Settings::load_env_file() {
        eprintln!("Warning: could not load .env file: {e}");
    }

    let settings = match Settings::resolve(&cli, ConfigSources::process(), Capabilities::detect()) {
        Ok(settings) => settings,
        Err(e) => {
            println!("Error: {e}");
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = init_telemetry(&cli.log_level) {
        eprintln!("Warning: failed to initialize logging: {e}");
    }

    match run(settings) {
        Ok(code) => code,
        Err(e) => {
            println!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(settings: Settings) -> Result<ExitCode> {
    let control_plane = Arc::new(ControlPlaneClient::new(
        &settings.api_base_url,
        &settings.api_key,
        settings.http_timeout,
    )?);

    let rt = tokio::runtime::Runtime::new()?;
    let code = rt.block_on(async move {
        let correlation_id = generate_correlation_id();
        let span = create_invocation_span(
            settings.operation.as_str(),
            settings.project_type.as_str(),
            &correlation_id,
        );

        async move {
            let secret_store = match &settings.vault {
                Some(vault) => connect_vault(vault, settings.http_timeout).await,
                None => None,
            };
            let shutdown = ShutdownCoordinator::new().install_signal_handlers();

            let orchestrator = Orchestrator::new(settings, control_plane)
                .with_secret_store(secret_store)
                .with_shutdown(shutdown);

            match orchestrator.run().await {
                Ok(report) => {
                    tracing::info!(advisories = report.advisories.len(), "operation finished");
                    ExitCode::SUCCESS
                }
                Err(e) => {
                    println!("Error: {e}");
                    for hint in e.hints() {
                        println!("  - {hint}");
                    }
                    ExitCode::FAILURE
                }
            }
        }
        .instrument(span)
        .await
    });
    Ok(code)
}

/// Connect to Vault, falling back to running without it on any failure
async fn connect_vault(vault: &VaultSettings, timeout: Duration) -> Option<Arc<dyn SecretStore>> {
    println!("Initializing Vault client with address: {}", vault.addr);
    match VaultClient::connect(vault, timeout).await {
        Ok(client) => {
            println!("Successfully connected to Vault");
            Some(Arc::new(client) as Arc<dyn SecretStore>)
        }
        Err(e) => {
            println!("Warning: Failed to initialize Vault client: {e}");
            println!("Continuing without Vault integration...");
            None
        }
    }
}
