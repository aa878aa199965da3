//! Custom Resource Definitions for the Jupyter notebook operator
//!
//! One kind, `JupyterNotebook`, served at two versions: `v2` (storage, the
//! only version the operator acts on) and the retired `v1alpha3`.

pub mod legacy;
mod notebook;

use k8s_openapi::apiextensions_apiserver::pkg::apis::apiextensions::v1::CustomResourceDefinition;
use kube::core::crd::merge_crds;
use kube::CustomResourceExt;

pub use notebook::{
    DataManagerSpec, JupyterNotebook, JupyterNotebookSpec, JupyterNotebookStatus, NotebookAccess,
    NotebookObservedState, NotebookOptions, NotebookPhase, ObservedProject, ObservedResources,
    ProjectSpec, ResourceAmounts, ResourceQuantities, ResourcesSpec, SecurityContextSpec,
};

use crate::Error;

/// apiVersion of the current schema
pub const CURRENT_API_VERSION: &str = "squonk.it/v2";

/// apiVersion of the retired schema
pub const LEGACY_API_VERSION: &str = "squonk.it/v1alpha3";

/// Warning the API server returns to clients using the retired version
pub const LEGACY_DEPRECATION_WARNING: &str =
    "squonk.it/v1alpha3 JupyterNotebook is no longer supported; use squonk.it/v2";

/// Name of the JupyterNotebook CRD object
pub const NOTEBOOK_CRD_NAME: &str = "jupyternotebooks.squonk.it";

/// Schema version a notebook request was made with
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SchemaVersion {
    /// `squonk.it/v2`
    V2,
    /// `squonk.it/v1alpha3`, no longer supported
    V1Alpha3,
}

impl SchemaVersion {
    /// Parse an apiVersion string; `None` for anything this operator never served
    pub fn from_api_version(api_version: &str) -> Option<Self> {
        match api_version {
            CURRENT_API_VERSION => Some(Self::V2),
            LEGACY_API_VERSION => Some(Self::V1Alpha3),
            _ => None,
        }
    }

    /// Whether the operator still acts on requests of this version
    pub fn is_supported(self) -> bool {
        matches!(self, Self::V2)
    }
}

/// The JupyterNotebook CRD with every served version, `v2` as storage
pub fn notebook_crd() -> Result<CustomResourceDefinition, Error> {
    let mut crd = merge_crds(
        vec![legacy::JupyterNotebook::crd(), JupyterNotebook::crd()],
        "v2",
    )
    .map_err(|e| Error::serialization_for_kind("CustomResourceDefinition", e.to_string()))?;

    for version in &mut crd.spec.versions {
        if version.name == "v1alpha3" {
            version.deprecated = Some(true);
            version.deprecation_warning = Some(LEGACY_DEPRECATION_WARNING.to_string());
        }
    }
    Ok(crd)
}
