//! The CRD manifest printed by `jupyter-operator --crd` and installed on startup

use jupyter_common::crd::{notebook_crd, JupyterNotebook, NOTEBOOK_CRD_NAME};
use kube::Resource;

#[test]
fn manifest_serves_both_versions_with_v2_stored() {
    let crd = notebook_crd().unwrap();
    let yaml = serde_yaml::to_string(&crd).unwrap();
    let parsed: serde_yaml::Value = serde_yaml::from_str(&yaml).unwrap();

    assert_eq!(parsed["metadata"]["name"].as_str(), Some(NOTEBOOK_CRD_NAME));
    assert_eq!(parsed["spec"]["group"].as_str(), Some("squonk.it"));
    assert_eq!(parsed["spec"]["scope"].as_str(), Some("Namespaced"));
    assert_eq!(parsed["spec"]["names"]["kind"].as_str(), Some("JupyterNotebook"));

    let versions = parsed["spec"]["versions"].as_sequence().unwrap();
    let stored: Vec<&str> = versions
        .iter()
        .filter(|v| v["storage"].as_bool() == Some(true))
        .filter_map(|v| v["name"].as_str())
        .collect();
    assert_eq!(stored, vec!["v2"]);
    assert!(versions.iter().all(|v| v["served"].as_bool() == Some(true)));
}

#[test]
fn current_version_has_status_subresource() {
    let crd = notebook_crd().unwrap();
    let v2 = crd.spec.versions.iter().find(|v| v.name == "v2").unwrap();
    assert!(v2
        .subresources
        .as_ref()
        .and_then(|s| s.status.as_ref())
        .is_some());

    let schema = serde_json::to_value(v2.schema.as_ref().unwrap()).unwrap();
    let props = &schema["openAPIV3Schema"]["properties"]["spec"]["properties"];
    assert!(props.get("imDataManager").is_some());
}

#[test]
fn controller_watches_the_stored_version() {
    assert_eq!(JupyterNotebook::api_version(&()), "squonk.it/v2");
    assert_eq!(JupyterNotebook::kind(&()), "JupyterNotebook");
    assert_eq!(JupyterNotebook::plural(&()), "jupyternotebooks");
}
