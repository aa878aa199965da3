//! Idempotent apply
//!
//! Resources are created, never updated. A create that finds the object
//! already there counts as success, which lets a retried attempt run the
//! whole sequence again and only fill in what an earlier attempt missed.

use async_trait::async_trait;
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::{ConfigMap, Service};
use k8s_openapi::api::networking::v1::Ingress;
use kube::api::{Api, Patch, PatchParams, PostParams};
use kube::Client;
#[cfg(test)]
use mockall::automock;
use tracing::debug;

use jupyter_common::crd::{JupyterNotebook, JupyterNotebookStatus};
use jupyter_common::{Error, FIELD_MANAGER};

use crate::resources::ManagedResource;

/// Result of applying one resource
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// This attempt created the resource
    Created,
    /// An earlier attempt already created it; left untouched
    AlreadyExists,
}

/// Trait abstracting the Kubernetes calls the reconciler makes
#[cfg_attr(test, automock)]
#[async_trait]
pub trait KubeClient: Send + Sync {
    /// Read a ConfigMap, `None` when it does not exist
    async fn get_config_map(&self, namespace: &str, name: &str)
        -> Result<Option<ConfigMap>, Error>;

    /// Create a ConfigMap
    async fn create_config_map(&self, namespace: &str, body: &ConfigMap) -> Result<(), Error>;

    /// Create a Deployment
    async fn create_deployment(&self, namespace: &str, body: &Deployment) -> Result<(), Error>;

    /// Create a Service
    async fn create_service(&self, namespace: &str, body: &Service) -> Result<(), Error>;

    /// Create an Ingress
    async fn create_ingress(&self, namespace: &str, body: &Ingress) -> Result<(), Error>;

    /// Replace the status of a JupyterNotebook
    async fn patch_status(
        &self,
        namespace: &str,
        name: &str,
        status: &JupyterNotebookStatus,
    ) -> Result<(), Error>;
}

/// Real Kubernetes client implementation
pub struct KubeClientImpl {
    client: Client,
}

impl KubeClientImpl {
    /// Create a new KubeClientImpl wrapping the given client
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl KubeClient for KubeClientImpl {
    async fn get_config_map(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<ConfigMap>, Error> {
        let api: Api<ConfigMap> = Api::namespaced(self.client.clone(), namespace);
        Ok(api.get_opt(name).await?)
    }

    async fn create_config_map(&self, namespace: &str, body: &ConfigMap) -> Result<(), Error> {
        let api: Api<ConfigMap> = Api::namespaced(self.client.clone(), namespace);
        api.create(&PostParams::default(), body).await?;
        Ok(())
    }

    async fn create_deployment(&self, namespace: &str, body: &Deployment) -> Result<(), Error> {
        let api: Api<Deployment> = Api::namespaced(self.client.clone(), namespace);
        api.create(&PostParams::default(), body).await?;
        Ok(())
    }

    async fn create_service(&self, namespace: &str, body: &Service) -> Result<(), Error> {
        let api: Api<Service> = Api::namespaced(self.client.clone(), namespace);
        api.create(&PostParams::default(), body).await?;
        Ok(())
    }

    async fn create_ingress(&self, namespace: &str, body: &Ingress) -> Result<(), Error> {
        let api: Api<Ingress> = Api::namespaced(self.client.clone(), namespace);
        api.create(&PostParams::default(), body).await?;
        Ok(())
    }

    async fn patch_status(
        &self,
        namespace: &str,
        name: &str,
        status: &JupyterNotebookStatus,
    ) -> Result<(), Error> {
        let api: Api<JupyterNotebook> = Api::namespaced(self.client.clone(), namespace);

        let status_patch = serde_json::json!({
            "status": status
        });

        api.patch_status(
            name,
            &PatchParams::apply(FIELD_MANAGER),
            &Patch::Merge(&status_patch),
        )
        .await?;

        Ok(())
    }
}

/// Create one resource, treating "already exists" as success.
///
/// The resource must already carry its namespace (see
/// [`crate::ownership::adopt`]).
pub async fn apply(
    client: &dyn KubeClient,
    resource: &ManagedResource,
) -> Result<ApplyOutcome, Error> {
    let namespace = resource.metadata().namespace.as_deref().ok_or_else(|| {
        Error::internal_with_context(
            "apply",
            format!("{} {} has no namespace", resource.kind(), resource.name()),
        )
    })?;

    let result = match resource {
        ManagedResource::ConfigMap { body, .. } => client.create_config_map(namespace, body).await,
        ManagedResource::Deployment(body) => client.create_deployment(namespace, body).await,
        ManagedResource::Service(body) => client.create_service(namespace, body).await,
        ManagedResource::Route(body) => client.create_ingress(namespace, body).await,
    };

    match result {
        Ok(()) => {
            debug!(kind = resource.kind(), name = %resource.name(), "created");
            Ok(ApplyOutcome::Created)
        }
        Err(e) if e.is_conflict() => {
            debug!(kind = resource.kind(), name = %resource.name(), "already exists");
            Ok(ApplyOutcome::AlreadyExists)
        }
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::service::build_service;
    use jupyter_common::ErrorClass;

    fn api_error(code: u16) -> Error {
        Error::from(kube::Error::Api(kube::core::ErrorResponse {
            status: "Failure".to_string(),
            message: "nope".to_string(),
            reason: if code == 409 { "AlreadyExists" } else { "Forbidden" }.to_string(),
            code,
        }))
    }

    fn service() -> ManagedResource {
        let mut service = build_service("nb-7");
        service.metadata.namespace = Some("data-manager".to_string());
        ManagedResource::Service(service)
    }

    #[tokio::test]
    async fn create_reports_created() {
        let mut client = MockKubeClient::new();
        client
            .expect_create_service()
            .times(1)
            .returning(|ns, _| {
                assert_eq!(ns, "data-manager");
                Ok(())
            });

        let outcome = apply(&client, &service()).await.unwrap();
        assert_eq!(outcome, ApplyOutcome::Created);
    }

    #[tokio::test]
    async fn conflict_is_absorbed() {
        let mut client = MockKubeClient::new();
        client
            .expect_create_service()
            .returning(|_, _| Err(api_error(409)));

        let outcome = apply(&client, &service()).await.unwrap();
        assert_eq!(outcome, ApplyOutcome::AlreadyExists);
    }

    #[tokio::test]
    async fn other_api_failures_are_transient() {
        let mut client = MockKubeClient::new();
        client
            .expect_create_service()
            .returning(|_, _| Err(api_error(403)));

        let err = apply(&client, &service()).await.unwrap_err();
        assert_eq!(err.classify(), ErrorClass::Transient);
    }

    #[tokio::test]
    async fn resource_without_namespace_is_not_sent() {
        // No expectations: any call would panic
        let client = MockKubeClient::new();
        let resource = ManagedResource::Service(build_service("nb-7"));
        assert!(apply(&client, &resource).await.is_err());
    }
}
