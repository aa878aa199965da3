//! Shared Kubernetes utilities using kube-rs

use std::path::Path;
use std::time::Duration;

use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::{Client, Config};

use crate::Error;

/// Default connection timeout for kube clients
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
/// Default read timeout for kube clients
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(30);

/// Create a kube client from optional kubeconfig path with custom timeouts
///
/// Every API call made through the returned client is bounded by both
/// timeouts: one for establishing the connection, one for reading the reply.
pub async fn create_client_with_timeout(
    kubeconfig: Option<&Path>,
    connect_timeout: Duration,
    read_timeout: Duration,
) -> Result<Client, Error> {
    let mut config = match kubeconfig {
        Some(path) => {
            let kubeconfig = Kubeconfig::read_from(path).map_err(|e| {
                Error::internal_with_context(
                    "create_client",
                    format!("failed to read kubeconfig: {}", e),
                )
            })?;
            Config::from_custom_kubeconfig(kubeconfig, &KubeConfigOptions::default())
                .await
                .map_err(|e| {
                    Error::internal_with_context(
                        "create_client",
                        format!("failed to load kubeconfig: {}", e),
                    )
                })?
        }
        None => Config::infer().await.map_err(|e| {
            Error::internal_with_context("create_client", format!("failed to infer config: {}", e))
        })?,
    };

    config.connect_timeout = Some(connect_timeout);
    config.read_timeout = Some(read_timeout);
    Client::try_from(config).map_err(|e| {
        Error::internal_with_context("create_client", format!("failed to create client: {}", e))
    })
}

/// The apiVersion recorded by the manager that submitted an object.
///
/// The API server serves every object at every version of its CRD, so the
/// apiVersion of a watched object only says which version was watched. The
/// `managedFields` entries still carry the version each manager wrote with.
/// Entries written by `own_manager` and status-subresource writes are skipped.
pub fn submitted_api_version<'a>(
    meta: &'a k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta,
    own_manager: &str,
) -> Option<&'a str> {
    meta.managed_fields
        .as_deref()?
        .iter()
        .filter(|entry| entry.manager.as_deref() != Some(own_manager))
        .filter(|entry| entry.subresource.as_deref() != Some("status"))
        .find_map(|entry| entry.api_version.as_deref())
}
