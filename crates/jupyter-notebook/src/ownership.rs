//! Ownership linking
//!
//! Every child of a notebook carries the same controller owner reference, so
//! deleting the notebook garbage-collects all of them. Children also inherit
//! the notebook's own labels, without losing any label they were built with.

use k8s_openapi::apimachinery::pkg::apis::meta::v1::OwnerReference;

use crate::instance::{InstanceRequest, NOTEBOOK_KIND};
use crate::resources::ManagedResource;

/// Owner reference pointing at the notebook
pub fn owner_reference(request: &InstanceRequest) -> OwnerReference {
    OwnerReference {
        api_version: request.owner_api_version.clone(),
        kind: NOTEBOOK_KIND.to_string(),
        name: request.name.clone(),
        uid: request.uid.clone(),
        controller: Some(true),
        block_owner_deletion: Some(true),
    }
}

/// Link every resource to the notebook and place it in its namespace.
pub fn adopt(resources: &mut [ManagedResource], request: &InstanceRequest) {
    let owner = owner_reference(request);
    for resource in resources.iter_mut() {
        let meta = resource.metadata_mut();
        meta.namespace = Some(request.namespace.clone());
        meta.owner_references = Some(vec![owner.clone()]);

        if !request.labels.is_empty() {
            let labels = meta.labels.get_or_insert_with(Default::default);
            for (key, value) in &request.labels {
                labels
                    .entry(key.clone())
                    .or_insert_with(|| value.clone());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::resolve;
    use crate::resources::synthesize;
    use crate::token::Token;
    use jupyter_common::crd::{DataManagerSpec, JupyterNotebookSpec, ProjectSpec};
    use jupyter_common::OperatorConfig;
    use std::collections::BTreeMap;

    fn request(labels: BTreeMap<String, String>) -> InstanceRequest {
        InstanceRequest {
            name: "nb-7".to_string(),
            namespace: "data-manager".to_string(),
            uid: "uid-123".to_string(),
            api_version: "squonk.it/v2".to_string(),
            owner_api_version: "squonk.it/v2".to_string(),
            labels,
            spec: JupyterNotebookSpec {
                im_data_manager: Some(DataManagerSpec {
                    project: Some(ProjectSpec {
                        claim_name: Some("pvc".to_string()),
                        id: Some("p1".to_string()),
                    }),
                    ..Default::default()
                }),
            },
        }
    }

    fn adopted(request: &InstanceRequest) -> Vec<ManagedResource> {
        let config = resolve(
            &request.name,
            &request.spec,
            &OperatorConfig::with_ingress_domain("example.com"),
        )
        .unwrap();
        let mut resources = synthesize(&config, &Token::new("T")).unwrap();
        adopt(&mut resources, request);
        resources
    }

    #[test]
    fn every_child_shares_one_controller_reference() {
        let request = request(BTreeMap::new());
        let resources = adopted(&request);
        let expected = owner_reference(&request);

        assert_eq!(expected.kind, "JupyterNotebook");
        assert_eq!(expected.controller, Some(true));
        assert_eq!(expected.block_owner_deletion, Some(true));

        for resource in &resources {
            let meta = resource.metadata();
            assert_eq!(meta.namespace.as_deref(), Some("data-manager"));
            assert_eq!(meta.owner_references.as_deref(), Some(&[expected.clone()][..]));
        }
    }

    #[test]
    fn parent_labels_propagate_without_overriding() {
        let labels = BTreeMap::from([
            ("team".to_string(), "chem".to_string()),
            ("app".to_string(), "something-else".to_string()),
        ]);
        let resources = adopted(&request(labels));

        for resource in &resources {
            let labels = resource.metadata().labels.as_ref().unwrap();
            assert_eq!(labels["team"], "chem");
            assert_eq!(labels["app"], "nb-7");
        }
    }
}
