//! Reconciliation driver
//!
//! Runs one attempt for one notebook as an explicit sequence of states:
//!
//! ```text
//! Start -> Resolve -> TokenContinuity -> Synthesize -> ApplyConfigMaps
//!       -> ApplyWorkload -> ApplyEndpoint -> ApplyRoute -> Done
//! ```
//!
//! A request made with a retired or unknown schema version ends in
//! `LegacyRejected` straight from `Start`. Any other failure ends in
//! `Failed(class)`, remembering the step it happened in. Nothing is rolled
//! back: whatever was created stays for the next attempt to find.

use tracing::{debug, info, warn};

use jupyter_common::crd::{
    NotebookAccess, NotebookObservedState, ObservedProject, ObservedResources, ResourceAmounts,
    SchemaVersion,
};
use jupyter_common::{Error, ErrorClass, OperatorConfig};

use crate::apply::{apply, ApplyOutcome, KubeClient};
use crate::instance::InstanceRequest;
use crate::ownership::adopt;
use crate::resolver::{resolve, Quantities, ResolvedConfig};
use crate::resources::config_maps::config_map_name;
use crate::resources::route::notebook_path;
use crate::resources::{synthesize, ManagedResource};
use crate::token::{lookup_token, Token, TokenLookup, TokenSource};

/// States of a reconciliation attempt
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReconcileState {
    /// Schema version check
    Start,
    /// Defaults applied to the request
    Resolve,
    /// Earlier token read back, or a new one minted
    TokenContinuity,
    /// Resource bodies built and linked to the notebook
    Synthesize,
    /// ConfigMaps created
    ApplyConfigMaps,
    /// Deployment created
    ApplyWorkload,
    /// Service created
    ApplyEndpoint,
    /// Ingress created
    ApplyRoute,
    /// Every resource exists
    Done,
    /// The request's schema version is not served any more
    LegacyRejected,
    /// The attempt failed with an error of this class
    Failed(ErrorClass),
}

impl std::fmt::Display for ReconcileState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Start => write!(f, "Start"),
            Self::Resolve => write!(f, "Resolve"),
            Self::TokenContinuity => write!(f, "TokenContinuity"),
            Self::Synthesize => write!(f, "Synthesize"),
            Self::ApplyConfigMaps => write!(f, "ApplyConfigMaps"),
            Self::ApplyWorkload => write!(f, "ApplyWorkload"),
            Self::ApplyEndpoint => write!(f, "ApplyEndpoint"),
            Self::ApplyRoute => write!(f, "ApplyRoute"),
            Self::Done => write!(f, "Done"),
            Self::LegacyRejected => write!(f, "LegacyRejected"),
            Self::Failed(class) => write!(f, "Failed({})", class),
        }
    }
}

/// A completed attempt
#[derive(Clone, Debug, PartialEq)]
pub struct ReconcileReport {
    /// State to publish in status
    pub observed: NotebookObservedState,
    /// Resources this attempt created, as `Kind/name`
    pub created: Vec<String>,
    /// Resources an earlier attempt had already created, as `Kind/name`
    pub kept: Vec<String>,
}

impl ReconcileReport {
    /// Whether this attempt created the Deployment
    pub fn created_workload(&self) -> bool {
        created_workload(&self.created)
    }
}

/// Why an attempt stopped short of `Done`
#[derive(Debug)]
pub struct ReconcileFailure {
    /// The step that was running
    pub step: ReconcileState,
    /// Terminal state: `LegacyRejected` or `Failed(class)`
    pub state: ReconcileState,
    /// The cause
    pub error: Error,
    /// Resources created before the failure, as `Kind/name`
    pub created: Vec<String>,
}

impl ReconcileFailure {
    fn at(step: ReconcileState, error: Error) -> Self {
        let state = match &error {
            Error::UnsupportedSchema { .. } => ReconcileState::LegacyRejected,
            _ => ReconcileState::Failed(error.classify()),
        };
        Self {
            step,
            state,
            error,
            created: Vec::new(),
        }
    }

    fn after(mut self, created: Vec<String>) -> Self {
        self.created = created;
        self
    }

    /// Whether the Deployment was created before the failure
    pub fn created_workload(&self) -> bool {
        created_workload(&self.created)
    }

    /// Retry class of the failure
    pub fn class(&self) -> ErrorClass {
        self.error.classify()
    }

    /// Whether another attempt may succeed
    pub fn is_retryable(&self) -> bool {
        self.class().is_retryable()
    }
}

impl std::fmt::Display for ReconcileFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} during {}: {}", self.state, self.step, self.error)
    }
}

impl std::error::Error for ReconcileFailure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

/// Run one reconciliation attempt for `request`.
///
/// Returns the observed state to publish once every resource exists.
pub async fn run_reconciliation(
    client: &dyn KubeClient,
    config: &OperatorConfig,
    request: &InstanceRequest,
) -> Result<ReconcileReport, ReconcileFailure> {
    let name = request.name.as_str();
    let mut state = ReconcileState::Start;

    let supported = SchemaVersion::from_api_version(&request.api_version)
        .is_some_and(SchemaVersion::is_supported);
    if !supported {
        warn!(notebook = %name, api_version = %request.api_version, "rejecting request");
        return Err(ReconcileFailure::at(
            state,
            Error::unsupported_schema(name, request.api_version.as_str()),
        ));
    }

    state = advance(name, ReconcileState::Resolve);
    let resolved =
        resolve(name, &request.spec, config).map_err(|e| ReconcileFailure::at(state, e))?;

    state = advance(name, ReconcileState::TokenContinuity);
    let grant = lookup_token(client, &request.namespace, name)
        .await
        .into_grant()
        .map_err(|e| ReconcileFailure::at(state, e))?;
    if grant.source == TokenSource::Minted {
        info!(notebook = %name, "minted new access token");
    }
    let needs_config_map = grant.needs_config_map();
    let mut token = grant.token;

    state = advance(name, ReconcileState::Synthesize);
    let mut resources =
        synthesize(&resolved, &token).map_err(|e| ReconcileFailure::at(state, e))?;
    adopt(&mut resources, request);
    if !needs_config_map {
        resources.retain(|r| !r.holds_token());
    }

    let mut created = Vec::new();
    let mut kept = Vec::new();
    for resource in &resources {
        let step = stage_of(resource);
        if step != state {
            state = advance(name, step);
        }
        let id = resource_id(resource);
        match apply(client, resource).await {
            Ok(ApplyOutcome::Created) => created.push(id),
            Ok(ApplyOutcome::AlreadyExists) => {
                kept.push(id);
                // Another attempt stored its token first; the server runs with that one
                if resource.holds_token() {
                    match stored_token(client, request).await {
                        Ok(stored) => token = stored,
                        Err(e) => return Err(ReconcileFailure::at(state, e).after(created)),
                    }
                    info!(notebook = %name, "adopted token stored by a concurrent attempt");
                }
            }
            Err(e) => return Err(ReconcileFailure::at(state, e).after(created)),
        }
    }

    advance(name, ReconcileState::Done);
    info!(
        notebook = %name,
        created = created.len(),
        existing = kept.len(),
        "notebook resources in place"
    );

    Ok(ReconcileReport {
        observed: observed_state(&resolved, &token),
        created,
        kept,
    })
}

fn resource_id(resource: &ManagedResource) -> String {
    format!("{}/{}", resource.kind(), resource.name())
}

fn created_workload(created: &[String]) -> bool {
    created.iter().any(|id| id.starts_with("Deployment/"))
}

/// Read back the token held by a Config ConfigMap that already existed
async fn stored_token(client: &dyn KubeClient, request: &InstanceRequest) -> Result<Token, Error> {
    match lookup_token(client, &request.namespace, &request.name).await {
        TokenLookup::Found(token) => Ok(token),
        TokenLookup::NotFound => Err(Error::internal_with_context(
            "token continuity",
            format!(
                "{} conflicted on create but cannot be read",
                config_map_name(&request.name)
            ),
        )),
        TokenLookup::Error(e) => Err(e),
    }
}

fn advance(notebook: &str, next: ReconcileState) -> ReconcileState {
    debug!(notebook = %notebook, state = %next, "reconcile step");
    next
}

fn stage_of(resource: &ManagedResource) -> ReconcileState {
    match resource {
        ManagedResource::ConfigMap { .. } => ReconcileState::ApplyConfigMaps,
        ManagedResource::Deployment(_) => ReconcileState::ApplyWorkload,
        ManagedResource::Service(_) => ReconcileState::ApplyEndpoint,
        ManagedResource::Route(_) => ReconcileState::ApplyRoute,
    }
}

/// Public URL of a notebook, token included
pub fn notebook_url(domain: &str, notebook: &str, token: &Token) -> String {
    format!(
        "http://{}{}?token={}",
        domain,
        notebook_path(notebook),
        token.as_str()
    )
}

fn observed_state(config: &ResolvedConfig, token: &Token) -> NotebookObservedState {
    NotebookObservedState {
        notebook: NotebookAccess {
            url: notebook_url(&config.ingress_domain, &config.name, token),
            token: token.as_str().to_string(),
            interface: config.requested_interface.clone(),
        },
        image: config.image.reference.clone(),
        service_account_name: config.service_account.clone(),
        resources: ObservedResources {
            requests: amounts(&config.requests),
            limits: amounts(&config.limits),
        },
        project: ObservedProject {
            claim_name: config.project_claim.clone(),
            id: config.project_id.clone(),
        },
    }
}

fn amounts(quantities: &Quantities) -> ResourceAmounts {
    ResourceAmounts {
        cpu: quantities.cpu.clone(),
        memory: quantities.memory.clone(),
    }
}
