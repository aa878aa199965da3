//! Retired JupyterNotebook schema (`squonk.it/v1alpha3`)
//!
//! Still served so existing objects remain readable; `notebook_crd` marks it
//! deprecated.
//! Requests made against it are rejected permanently by the reconciler, so
//! the payload is kept opaque.

use kube::CustomResource;
use schemars::gen::SchemaGenerator;
use schemars::schema::{InstanceType, Schema, SchemaObject};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Retired notebook request
#[derive(CustomResource, Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[kube(
    group = "squonk.it",
    version = "v1alpha3",
    kind = "JupyterNotebook",
    plural = "jupyternotebooks",
    shortname = "jn",
    namespaced
)]
pub struct JupyterNotebookSpec {
    /// Whatever the old client sent
    #[serde(flatten)]
    pub payload: serde_json::Map<String, serde_json::Value>,
}

impl JsonSchema for JupyterNotebookSpec {
    fn schema_name() -> String {
        "LegacyJupyterNotebookSpec".to_string()
    }

    fn json_schema(_gen: &mut SchemaGenerator) -> Schema {
        let mut schema = SchemaObject {
            instance_type: Some(InstanceType::Object.into()),
            ..Default::default()
        };
        schema.extensions.insert(
            "x-kubernetes-preserve-unknown-fields".to_string(),
            serde_json::Value::Bool(true),
        );
        Schema::Object(schema)
    }
}
