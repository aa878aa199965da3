//! Jupyter notebook operator - turns JupyterNotebook custom resources into notebook instances

mod cli;
mod controller_runner;

use std::sync::Arc;

use clap::Parser;
use k8s_openapi::apiextensions_apiserver::pkg::apis::apiextensions::v1::CustomResourceDefinition;
use kube::api::{Patch, PatchParams};
use kube::{Api, Client};

use jupyter_common::crd::{notebook_crd, NOTEBOOK_CRD_NAME};
use jupyter_common::kube_utils::create_client_with_timeout;
use jupyter_common::telemetry::init_telemetry;
use jupyter_common::FIELD_MANAGER;
use jupyter_notebook::Context;

use cli::{Cli, Commands, Settings};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if cli.crd {
        // Generate CRD YAML
        let crd = serde_yaml::to_string(&notebook_crd()?)
            .map_err(|e| anyhow::anyhow!("Failed to serialize CRD: {}", e))?;
        println!("{crd}");
        return Ok(());
    }

    init_telemetry(cli.settings.telemetry_config())
        .map_err(|e| anyhow::anyhow!("Failed to initialize telemetry: {}", e))?;

    match cli.command {
        Some(Commands::Controller) | None => run_controller(&cli.settings).await,
    }
}

/// Install the JupyterNotebook CRD with server-side apply
///
/// The operator installs its own CRD on startup so the served versions
/// always match the operator version.
async fn ensure_crd_installed(client: &Client) -> anyhow::Result<()> {
    let crds: Api<CustomResourceDefinition> = Api::all(client.clone());
    let params = PatchParams::apply(FIELD_MANAGER).force();

    tracing::info!("Installing JupyterNotebook CRD...");
    crds.patch(NOTEBOOK_CRD_NAME, &params, &Patch::Apply(&notebook_crd()?))
        .await
        .map_err(|e| anyhow::anyhow!("Failed to install JupyterNotebook CRD: {}", e))?;

    Ok(())
}

async fn run_controller(settings: &Settings) -> anyhow::Result<()> {
    tracing::info!("Jupyter operator starting...");

    let config = settings.operator_config();
    let retry = settings.retry_policy();
    match &config.ingress_domain {
        Some(domain) => tracing::info!(ingress_domain = %domain, "default ingress domain"),
        None => tracing::warn!(
            "INGRESS_DOMAIN is not set; notebooks must name their own ingress domain"
        ),
    }
    tracing::info!(
        retry_limit = retry.max_attempts,
        retry_delay_secs = retry.delay.as_secs(),
        priority_class = ?config.priority_class(),
        "operator configuration loaded"
    );

    let client = create_client_with_timeout(
        settings.kubeconfig.as_deref(),
        settings.connect_timeout(),
        settings.read_timeout(),
    )
    .await
    .map_err(|e| anyhow::anyhow!("Failed to create Kubernetes client: {}", e))?;

    ensure_crd_installed(&client).await?;

    let ctx = Arc::new(Context::new(client.clone(), config, retry));

    tracing::info!("Starting controllers:");
    controller_runner::build_notebook_controller(client, ctx).await;

    tracing::info!("Jupyter operator shut down");
    Ok(())
}
