//! JupyterNotebook CRD types (`squonk.it/v2`)
//!
//! Everything the Data Manager supplies is namespaced under
//! `spec.imDataManager`. Every field is optional; defaults are applied by the
//! resolver, not by serde, so a missing value stays distinguishable from an
//! explicit one.

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

// =============================================================================
// Spec
// =============================================================================

/// A request for one notebook instance
#[derive(CustomResource, Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[kube(
    group = "squonk.it",
    version = "v2",
    kind = "JupyterNotebook",
    plural = "jupyternotebooks",
    shortname = "jn",
    namespaced,
    status = "JupyterNotebookStatus",
    printcolumn = r#"{"name":"Phase","type":"string","jsonPath":".status.phase"}"#,
    printcolumn = r#"{"name":"URL","type":"string","jsonPath":".status.jupyter.notebook.url","priority":1}"#,
    printcolumn = r#"{"name":"Age","type":"date","jsonPath":".metadata.creationTimestamp"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct JupyterNotebookSpec {
    /// Material provided by the Data Manager
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub im_data_manager: Option<DataManagerSpec>,
}

/// Data Manager material describing the notebook instance
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DataManagerSpec {
    /// Container image reference
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,

    /// ServiceAccount the notebook pod runs as
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_account_name: Option<String>,

    /// CPU and memory requests and limits
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resources: Option<ResourcesSpec>,

    /// Numeric user and group the notebook runs as
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub security_context: Option<SecurityContextSpec>,

    /// Project volume the notebook works in
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project: Option<ProjectSpec>,

    /// Notebook server options
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notebook: Option<NotebookOptions>,

    /// Maximum request body size accepted by the ingress (e.g. "500m")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ingress_proxy_body_size: Option<String>,

    /// Ingress class
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ingress_class: Option<String>,

    /// Host the notebook is exposed on
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ingress_domain: Option<String>,

    /// Pre-provisioned TLS secret for the ingress host
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ingress_tls_secret: Option<String>,

    /// Extra pod labels, each of the form `key=value`
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub labels: Vec<String>,
}

/// Requests and limits
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ResourcesSpec {
    /// Resource limits
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limits: Option<ResourceQuantities>,
    /// Resource requests
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requests: Option<ResourceQuantities>,
}

/// CPU and memory quantities, as Kubernetes quantity strings
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ResourceQuantities {
    /// CPU quantity (e.g. "500m")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cpu: Option<String>,
    /// Memory quantity (e.g. "1Gi")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory: Option<String>,
}

/// Numeric identity of the notebook process
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SecurityContextSpec {
    /// User ID
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_as_user: Option<i64>,
    /// Group ID, also used as the pod's filesystem group
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_as_group: Option<i64>,
}

/// Project volume linkage
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProjectSpec {
    /// PersistentVolumeClaim holding all projects
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub claim_name: Option<String>,
    /// Project identifier, also the sub-path inside the claim
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

/// Notebook server options
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NotebookOptions {
    /// User interface: "lab" (default) or "classic"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interface: Option<String>,
}

// =============================================================================
// Status
// =============================================================================

/// Lifecycle phase of a JupyterNotebook
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
pub enum NotebookPhase {
    /// No attempt has completed yet
    #[default]
    Pending,
    /// The last attempt failed transiently; another is scheduled
    Retrying,
    /// All resources exist and the notebook is reachable
    Ready,
    /// The request was rejected or retries are exhausted
    Failed,
}

impl std::fmt::Display for NotebookPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "Pending"),
            Self::Retrying => write!(f, "Retrying"),
            Self::Ready => write!(f, "Ready"),
            Self::Failed => write!(f, "Failed"),
        }
    }
}

/// Status of a JupyterNotebook
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct JupyterNotebookStatus {
    /// Current phase
    #[serde(default)]
    pub phase: NotebookPhase,

    /// Observed state of a successfully created notebook
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jupyter: Option<NotebookObservedState>,

    /// Failure description for Retrying and Failed, or a warning on Ready.
    /// Serialized as null when absent so a merge patch clears it.
    #[serde(default)]
    pub message: Option<String>,

    /// Failed attempts since the last spec change
    #[serde(default)]
    pub retry_count: u32,

    /// Generation the phase refers to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observed_generation: Option<i64>,

    /// When the last attempt finished (RFC 3339)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_attempt_time: Option<String>,

    /// Generation the existing Deployment was created for. Resources are
    /// never updated, so a later spec change does not reach them.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workload_generation: Option<i64>,
}

/// What a completed reconciliation produced
#[derive(Clone, Debug, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NotebookObservedState {
    /// How to reach the notebook
    pub notebook: NotebookAccess,
    /// Image the notebook runs
    pub image: String,
    /// ServiceAccount the notebook runs as
    pub service_account_name: String,
    /// Requests and limits applied
    pub resources: ObservedResources,
    /// Project linkage
    pub project: ObservedProject,
}

/// External access details
#[derive(Clone, Debug, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NotebookAccess {
    /// Full URL including the access token
    pub url: String,
    /// Access token
    pub token: String,
    /// User interface ("lab" or "classic")
    pub interface: String,
}

/// Applied requests and limits
#[derive(Clone, Debug, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ObservedResources {
    /// Requests
    pub requests: ResourceAmounts,
    /// Limits
    pub limits: ResourceAmounts,
}

/// Resolved CPU and memory quantities
#[derive(Clone, Debug, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ResourceAmounts {
    /// CPU quantity
    pub cpu: String,
    /// Memory quantity
    pub memory: String,
}

/// Applied project linkage
#[derive(Clone, Debug, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ObservedProject {
    /// PersistentVolumeClaim name
    pub claim_name: String,
    /// Project identifier
    pub id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spec_parses_data_manager_material() {
        let spec: JupyterNotebookSpec = serde_json::from_value(serde_json::json!({
            "imDataManager": {
                "image": "repo/img:6.3.0",
                "serviceAccountName": "notebooks",
                "resources": {"limits": {"cpu": "2"}, "requests": {"memory": "1Gi"}},
                "securityContext": {"runAsUser": 1001, "runAsGroup": 100},
                "project": {"claimName": "pvc-1", "id": "proj-42"},
                "notebook": {"interface": "classic"},
                "ingressDomain": "example.com",
                "labels": ["team/owner=alice"]
            }
        }))
        .unwrap();

        let material = spec.im_data_manager.unwrap();
        assert_eq!(material.image.as_deref(), Some("repo/img:6.3.0"));
        assert_eq!(
            material.resources.unwrap().limits.unwrap().cpu.as_deref(),
            Some("2")
        );
        assert_eq!(material.security_context.unwrap().run_as_user, Some(1001));
        assert_eq!(material.project.unwrap().id.as_deref(), Some("proj-42"));
        assert_eq!(material.labels, vec!["team/owner=alice".to_string()]);
    }

    #[test]
    fn empty_spec_is_valid() {
        let spec: JupyterNotebookSpec = serde_json::from_value(serde_json::json!({})).unwrap();
        assert!(spec.im_data_manager.is_none());
    }

    #[test]
    fn unknown_fields_are_ignored() {
        let spec: JupyterNotebookSpec = serde_json::from_value(serde_json::json!({
            "imDataManager": {"somethingNew": true}
        }))
        .unwrap();
        assert_eq!(spec.im_data_manager, Some(DataManagerSpec::default()));
    }

    #[test]
    fn status_round_trips_camel_case() {
        let status = JupyterNotebookStatus {
            phase: NotebookPhase::Retrying,
            retry_count: 2,
            observed_generation: Some(3),
            workload_generation: Some(2),
            ..Default::default()
        };
        let json = serde_json::to_value(&status).unwrap();
        assert_eq!(json["phase"], "Retrying");
        assert_eq!(json["retryCount"], 2);
        assert_eq!(json["observedGeneration"], 3);
        assert_eq!(json["workloadGeneration"], 2);
        assert!(json.get("jupyter").is_none());
        assert!(json["message"].is_null());
    }

    #[test]
    fn phase_default_is_pending() {
        assert_eq!(NotebookPhase::default(), NotebookPhase::Pending);
    }
}
