//! JupyterNotebook controller
//!
//! Hooks the reconciliation driver into a kube-rs `Controller` and records
//! each attempt's outcome in the notebook's status:
//! - `Pending` / new spec generation → run an attempt
//! - transient failure → `Retrying`, next attempt after the fixed delay
//! - permanent or validation failure, or retries exhausted → `Failed`
//! - success → `Ready`, never reconciled again
//!
//! A `Failed` notebook is picked up again only once its spec changes, which
//! starts a new series of attempts with the retry count reset.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use kube::runtime::controller::Action;
use kube::{Client, ResourceExt};
use tracing::{debug, error, info, warn};

use jupyter_common::crd::{JupyterNotebook, JupyterNotebookStatus, NotebookPhase};
use jupyter_common::{Error, OperatorConfig, RetryDecision, RetryPolicy};

use crate::apply::{KubeClient, KubeClientImpl};
use crate::driver::{run_reconciliation, ReconcileFailure};
use crate::instance::InstanceRequest;

/// Controller context shared by every reconciliation
pub struct Context {
    /// Kubernetes client for API operations (trait object for testability)
    pub kube: Arc<dyn KubeClient>,
    /// Operator-wide defaults
    pub config: OperatorConfig,
    /// Ceiling and delay for transient failures
    pub retry: RetryPolicy,
}

impl Context {
    /// Create a new controller context with the given Kubernetes client
    pub fn new(client: Client, config: OperatorConfig, retry: RetryPolicy) -> Self {
        Self {
            kube: Arc::new(KubeClientImpl::new(client)),
            config,
            retry,
        }
    }

    /// Create a context with a custom KubeClient for testing
    #[cfg(test)]
    pub fn for_testing(
        kube: Arc<dyn KubeClient>,
        config: OperatorConfig,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            kube,
            config,
            retry,
        }
    }
}

/// Error policy for the JupyterNotebook controller.
///
/// Reached only when the outcome of an attempt could not be recorded; the
/// attempt is repeated after the retry delay.
pub fn error_policy(notebook: Arc<JupyterNotebook>, error: &Error, ctx: Arc<Context>) -> Action {
    warn!(
        notebook = %notebook.name_any(),
        error = %error,
        "JupyterNotebook reconcile error, will retry"
    );
    Action::requeue(ctx.retry.delay)
}

/// Reconcile a JupyterNotebook.
pub async fn reconcile(notebook: Arc<JupyterNotebook>, ctx: Arc<Context>) -> Result<Action, Error> {
    let name = notebook.name_any();
    let generation = notebook.metadata.generation;
    let status = notebook.status.clone().unwrap_or_default();
    let same_generation = status.observed_generation == generation;

    match status.phase {
        NotebookPhase::Ready => {
            debug!(notebook = %name, "notebook is ready, nothing to do");
            return Ok(Action::await_change());
        }
        NotebookPhase::Failed if same_generation => {
            debug!(notebook = %name, "notebook failed, waiting for a spec change");
            return Ok(Action::await_change());
        }
        NotebookPhase::Retrying if same_generation => {
            // Our own status write wakes the controller before the delay is up
            if let Some(wait) = remaining_delay(
                status.last_attempt_time.as_deref(),
                ctx.retry.delay,
                Utc::now(),
            ) {
                return Ok(Action::requeue(wait));
            }
        }
        _ => {}
    }

    let prior_attempts = if same_generation {
        status.retry_count
    } else {
        0
    };

    let request = InstanceRequest::from_notebook(&notebook)?;
    info!(
        notebook = %name,
        namespace = %request.namespace,
        attempt = prior_attempts + 1,
        "Reconciling JupyterNotebook"
    );

    let outcome = run_reconciliation(ctx.kube.as_ref(), &ctx.config, &request).await;
    let now = Utc::now().to_rfc3339();

    let (next, action) = match outcome {
        Ok(report) => {
            info!(notebook = %name, url = %report.observed.notebook.url, "notebook ready");
            let workload =
                workload_generation(&status, generation, report.created_workload());
            let message = stale_workload_message(workload, generation);
            if let Some(message) = &message {
                warn!(notebook = %name, "{}", message);
            }
            let next = JupyterNotebookStatus {
                phase: NotebookPhase::Ready,
                jupyter: Some(report.observed),
                message,
                retry_count: prior_attempts,
                observed_generation: generation,
                last_attempt_time: Some(now),
                workload_generation: workload,
            };
            (next, Action::await_change())
        }
        Err(failure) => {
            let workload =
                workload_generation(&status, generation, failure.created_workload());
            status_after_failure(
                &name,
                &failure,
                prior_attempts,
                &ctx.retry,
                generation,
                workload,
                now,
            )
        }
    };

    ctx.kube
        .patch_status(&request.namespace, &name, &next)
        .await?;

    Ok(action)
}

fn status_after_failure(
    name: &str,
    failure: &ReconcileFailure,
    prior_attempts: u32,
    policy: &RetryPolicy,
    generation: Option<i64>,
    workload_generation: Option<i64>,
    now: String,
) -> (JupyterNotebookStatus, Action) {
    let failed = |message: String, retry_count: u32| JupyterNotebookStatus {
        phase: NotebookPhase::Failed,
        jupyter: None,
        message: Some(message),
        retry_count,
        observed_generation: generation,
        last_attempt_time: Some(now.clone()),
        workload_generation,
    };

    if !failure.is_retryable() {
        error!(notebook = %name, error = %failure, "notebook request rejected");
        return (failed(failure.to_string(), prior_attempts), Action::await_change());
    }

    let attempts = prior_attempts.saturating_add(1);
    match policy.decide(attempts) {
        RetryDecision::RetryAfter(delay) => {
            warn!(
                notebook = %name,
                attempts,
                retry_in_secs = delay.as_secs(),
                error = %failure,
                "attempt failed, will retry"
            );
            let next = JupyterNotebookStatus {
                phase: NotebookPhase::Retrying,
                jupyter: None,
                message: Some(failure.to_string()),
                retry_count: attempts,
                observed_generation: generation,
                last_attempt_time: Some(now.clone()),
                workload_generation,
            };
            (next, Action::requeue(delay))
        }
        RetryDecision::GiveUp => {
            error!(notebook = %name, attempts, error = %failure, "giving up on notebook");
            let message = format!("giving up after {} attempts: {}", attempts, failure);
            (failed(message, attempts), Action::await_change())
        }
    }
}

/// Generation the Deployment was created for, carried across attempts
fn workload_generation(
    prior: &JupyterNotebookStatus,
    generation: Option<i64>,
    created_now: bool,
) -> Option<i64> {
    if created_now {
        generation
    } else {
        prior.workload_generation
    }
}

/// Warning for a Ready notebook whose Deployment predates its spec
fn stale_workload_message(workload: Option<i64>, generation: Option<i64>) -> Option<String> {
    let created_for = workload?;
    (Some(created_for) != generation).then(|| {
        format!(
            "existing resources were created for generation {} and do not reflect later spec changes",
            created_for
        )
    })
}

/// Time left before the next attempt is due, `None` when it is due now.
///
/// A missing or unreadable timestamp means due now.
pub fn remaining_delay(
    last_attempt: Option<&str>,
    delay: Duration,
    now: DateTime<Utc>,
) -> Option<Duration> {
    let last = DateTime::parse_from_rfc3339(last_attempt?)
        .ok()?
        .with_timezone(&Utc);
    let elapsed = now.signed_duration_since(last).to_std().unwrap_or_default();
    delay.checked_sub(elapsed).filter(|wait| !wait.is_zero())
}
