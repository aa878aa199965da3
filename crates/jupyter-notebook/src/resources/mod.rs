//! Resource synthesis
//!
//! Pure construction of every Kubernetes object a notebook needs, in the
//! order they are applied: ConfigMaps, Deployment, Service, Ingress. The
//! order only makes progress easier to follow; each create stands alone.

pub mod config_maps;
pub mod deployment;
pub mod route;
pub mod service;

use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::{ConfigMap, Service};
use k8s_openapi::api::networking::v1::Ingress;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;

use jupyter_common::Error;

pub use config_maps::ConfigMapRole;

use crate::resolver::ResolvedConfig;
use crate::token::Token;

/// A resource the operator creates for a notebook
#[derive(Clone, Debug, PartialEq)]
pub enum ManagedResource {
    /// One of the three ConfigMaps
    ConfigMap {
        /// Which ConfigMap this is
        role: ConfigMapRole,
        /// The object
        body: ConfigMap,
    },
    /// The notebook workload
    Deployment(Deployment),
    /// The in-cluster endpoint
    Service(Service),
    /// External access
    Route(Ingress),
}

impl ManagedResource {
    /// Kubernetes kind
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ConfigMap { .. } => "ConfigMap",
            Self::Deployment(_) => "Deployment",
            Self::Service(_) => "Service",
            Self::Route(_) => "Ingress",
        }
    }

    /// Object metadata
    pub fn metadata(&self) -> &ObjectMeta {
        match self {
            Self::ConfigMap { body, .. } => &body.metadata,
            Self::Deployment(d) => &d.metadata,
            Self::Service(s) => &s.metadata,
            Self::Route(i) => &i.metadata,
        }
    }

    /// Mutable object metadata
    pub fn metadata_mut(&mut self) -> &mut ObjectMeta {
        match self {
            Self::ConfigMap { body, .. } => &mut body.metadata,
            Self::Deployment(d) => &mut d.metadata,
            Self::Service(s) => &mut s.metadata,
            Self::Route(i) => &mut i.metadata,
        }
    }

    /// Object name
    pub fn name(&self) -> &str {
        self.metadata().name.as_deref().unwrap_or_default()
    }

    /// Whether this is the ConfigMap holding the access token
    pub fn holds_token(&self) -> bool {
        matches!(
            self,
            Self::ConfigMap {
                role: ConfigMapRole::Config,
                ..
            }
        )
    }
}

/// Synthesize every resource for a resolved notebook.
pub fn synthesize(config: &ResolvedConfig, token: &Token) -> Result<Vec<ManagedResource>, Error> {
    let name = &config.name;
    Ok(vec![
        ManagedResource::ConfigMap {
            role: ConfigMapRole::Bootstrap,
            body: config_maps::build_bootstrap_config_map(name),
        },
        ManagedResource::ConfigMap {
            role: ConfigMapRole::Startup,
            body: config_maps::build_startup_config_map(name),
        },
        ManagedResource::ConfigMap {
            role: ConfigMapRole::Config,
            body: config_maps::build_config_config_map(name, token)?,
        },
        ManagedResource::Deployment(deployment::build_deployment(config)),
        ManagedResource::Service(service::build_service(name)),
        ManagedResource::Route(route::build_ingress(config)),
    ])
}
