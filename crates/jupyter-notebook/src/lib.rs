//! JupyterNotebook reconciliation for the Jupyter notebook operator
//!
//! Turns one `JupyterNotebook` request into three ConfigMaps, a Deployment,
//! a Service and an Ingress, created idempotently so that a retried attempt
//! finishes whatever an earlier one left undone:
//! - [`resolver`] merges the request with operator defaults
//! - [`token`] reuses the access token of an earlier attempt, or mints one
//! - [`resources`] synthesizes the typed resource bodies
//! - [`ownership`] links every resource to the notebook for cascading deletion
//! - [`apply`] creates resources, treating "already exists" as success
//! - [`driver`] sequences the steps and classifies failures
//! - [`controller`] hooks the driver into a kube-rs `Controller`

#![deny(missing_docs)]

pub mod apply;
pub mod controller;
pub mod driver;
pub mod instance;
pub mod ownership;
pub mod resolver;
pub mod resources;
pub mod token;

pub use apply::{ApplyOutcome, KubeClient, KubeClientImpl};
pub use controller::{error_policy, reconcile, Context};
pub use driver::{run_reconciliation, ReconcileFailure, ReconcileReport, ReconcileState};
pub use instance::InstanceRequest;
pub use resolver::{resolve, ResolvedConfig};
pub use resources::{synthesize, ManagedResource};
pub use token::{Token, TokenGrant, TokenLookup};
