//! Notebook Ingress construction
//!
//! The notebook is served under `/{name}` on the ingress domain. TLS uses a
//! pre-provisioned secret when one is known, otherwise a cert-manager
//! ClusterIssuer annotation when an issuer is configured.

use std::collections::BTreeMap;

use k8s_openapi::api::networking::v1::{
    HTTPIngressPath, HTTPIngressRuleValue, Ingress, IngressBackend, IngressRule,
    IngressServiceBackend, IngressSpec, IngressTLS, ServiceBackendPort,
};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;

use jupyter_common::LABEL_APP;

use super::deployment::NOTEBOOK_PORT;
use crate::resolver::ResolvedConfig;

/// Annotation selecting the ingress controller
pub const INGRESS_CLASS_ANNOTATION: &str = "kubernetes.io/ingress.class";
/// Annotation limiting the request body size
pub const PROXY_BODY_SIZE_ANNOTATION: &str = "nginx.ingress.kubernetes.io/proxy-body-size";
/// Annotation asking cert-manager for a certificate
pub const CLUSTER_ISSUER_ANNOTATION: &str = "cert-manager.io/cluster-issuer";

/// Path prefix the notebook is served under
pub fn notebook_path(notebook: &str) -> String {
    format!("/{}", notebook)
}

/// Build the notebook Ingress
pub fn build_ingress(config: &ResolvedConfig) -> Ingress {
    let name = &config.name;

    let mut annotations = BTreeMap::from([
        (
            INGRESS_CLASS_ANNOTATION.to_string(),
            config.ingress_class.clone(),
        ),
        (
            PROXY_BODY_SIZE_ANNOTATION.to_string(),
            config.proxy_body_size.clone(),
        ),
    ]);
    if let Some(issuer) = &config.ingress_cert_issuer {
        annotations.insert(CLUSTER_ISSUER_ANNOTATION.to_string(), issuer.clone());
    }

    Ingress {
        metadata: ObjectMeta {
            name: Some(name.clone()),
            labels: Some(BTreeMap::from([(LABEL_APP.to_string(), name.clone())])),
            annotations: Some(annotations),
            ..Default::default()
        },
        spec: Some(IngressSpec {
            tls: Some(vec![IngressTLS {
                hosts: Some(vec![config.ingress_domain.clone()]),
                secret_name: config.ingress_tls_secret.clone(),
            }]),
            rules: Some(vec![IngressRule {
                host: Some(config.ingress_domain.clone()),
                http: Some(HTTPIngressRuleValue {
                    paths: vec![HTTPIngressPath {
                        path: Some(notebook_path(name)),
                        path_type: "Prefix".to_string(),
                        backend: IngressBackend {
                            service: Some(IngressServiceBackend {
                                name: name.clone(),
                                port: Some(ServiceBackendPort {
                                    number: Some(NOTEBOOK_PORT),
                                    ..Default::default()
                                }),
                            }),
                            ..Default::default()
                        },
                    }],
                }),
            }]),
            ..Default::default()
        }),
        ..Default::default()
    }
}
