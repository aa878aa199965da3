//! The notebook instance a reconciliation acts for

use std::collections::BTreeMap;

use kube::ResourceExt;

use jupyter_common::crd::{JupyterNotebook, JupyterNotebookSpec};
use jupyter_common::kube_utils::submitted_api_version;
use jupyter_common::{Error, FIELD_MANAGER};

/// Kind of the parent resource, used in owner references
pub const NOTEBOOK_KIND: &str = "JupyterNotebook";

/// One notebook request, as seen by a single reconciliation attempt.
///
/// `uid` is stable across retries for the same object.
#[derive(Clone, Debug, PartialEq)]
pub struct InstanceRequest {
    /// Notebook name; every child resource name derives from it
    pub name: String,
    /// Namespace of the notebook and all of its children
    pub namespace: String,
    /// Kubernetes UID of the notebook object
    pub uid: String,
    /// apiVersion the request was submitted with
    pub api_version: String,
    /// apiVersion of the object the owner reference points at
    pub owner_api_version: String,
    /// Labels on the notebook object, propagated to children
    pub labels: BTreeMap<String, String>,
    /// The declarative request
    pub spec: JupyterNotebookSpec,
}

impl InstanceRequest {
    /// Build a request from a watched notebook object.
    ///
    /// Fails when the object lacks a namespace or UID, which the API server
    /// always sets on stored namespaced objects.
    pub fn from_notebook(notebook: &JupyterNotebook) -> Result<Self, Error> {
        let name = notebook.name_any();
        let namespace = notebook.namespace().ok_or_else(|| {
            Error::validation_for_field(&name, "metadata.namespace", "notebook must be namespaced")
        })?;
        let uid = notebook.uid().ok_or_else(|| {
            Error::internal_with_context("instance", format!("notebook {} has no UID", name))
        })?;

        let owner_api_version = <JupyterNotebook as kube::Resource>::api_version(&()).to_string();
        let api_version = submitted_api_version(&notebook.metadata, FIELD_MANAGER)
            .map(str::to_string)
            .unwrap_or_else(|| owner_api_version.clone());

        Ok(Self {
            name,
            namespace,
            uid,
            api_version,
            owner_api_version,
            labels: notebook.labels().clone(),
            spec: notebook.spec.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::ManagedFieldsEntry;

    fn notebook(name: &str) -> JupyterNotebook {
        let mut nb = JupyterNotebook::new(name, JupyterNotebookSpec::default());
        nb.metadata.namespace = Some("data-manager".to_string());
        nb.metadata.uid = Some("uid-123".to_string());
        nb
    }

    #[test]
    fn request_carries_identity() {
        let request = InstanceRequest::from_notebook(&notebook("nb-7")).unwrap();
        assert_eq!(request.name, "nb-7");
        assert_eq!(request.namespace, "data-manager");
        assert_eq!(request.uid, "uid-123");
        assert_eq!(request.owner_api_version, "squonk.it/v2");
        assert_eq!(request.api_version, "squonk.it/v2");
    }

    #[test]
    fn submitted_version_wins_over_watched_version() {
        let mut nb = notebook("nb-7");
        nb.metadata.managed_fields = Some(vec![ManagedFieldsEntry {
            api_version: Some("squonk.it/v1alpha3".to_string()),
            manager: Some("kubectl".to_string()),
            ..Default::default()
        }]);
        let request = InstanceRequest::from_notebook(&nb).unwrap();
        assert_eq!(request.api_version, "squonk.it/v1alpha3");
        assert_eq!(request.owner_api_version, "squonk.it/v2");
    }

    #[test]
    fn missing_namespace_is_rejected() {
        let mut nb = notebook("nb-7");
        nb.metadata.namespace = None;
        let err = InstanceRequest::from_notebook(&nb).unwrap_err();
        assert!(!err.is_retryable());
    }

    #[test]
    fn missing_uid_is_an_error() {
        let mut nb = notebook("nb-7");
        nb.metadata.uid = None;
        assert!(InstanceRequest::from_notebook(&nb).is_err());
    }
}
