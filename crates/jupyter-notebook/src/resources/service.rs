//! Notebook Service construction

use std::collections::BTreeMap;

use k8s_openapi::api::core::v1::{Service, ServicePort, ServiceSpec};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;

use jupyter_common::{LABEL_APP, LABEL_DEPLOYMENT};

use super::deployment::{NOTEBOOK_PORT, NOTEBOOK_PORT_NAME};

/// Build the ClusterIP Service in front of the notebook pod
pub fn build_service(notebook: &str) -> Service {
    Service {
        metadata: ObjectMeta {
            name: Some(notebook.to_string()),
            labels: Some(BTreeMap::from([(
                LABEL_APP.to_string(),
                notebook.to_string(),
            )])),
            ..Default::default()
        },
        spec: Some(ServiceSpec {
            type_: Some("ClusterIP".to_string()),
            ports: Some(vec![ServicePort {
                name: Some(NOTEBOOK_PORT_NAME.to_string()),
                port: NOTEBOOK_PORT,
                protocol: Some("TCP".to_string()),
                target_port: Some(IntOrString::Int(NOTEBOOK_PORT)),
                ..Default::default()
            }]),
            selector: Some(BTreeMap::from([(
                LABEL_DEPLOYMENT.to_string(),
                notebook.to_string(),
            )])),
            ..Default::default()
        }),
        ..Default::default()
    }
}
