//! Common types for the Jupyter notebook operator: CRDs, errors, configuration and utilities

#![deny(missing_docs)]

pub mod config;
pub mod crd;
pub mod error;
pub mod kube_utils;
pub mod retry;
pub mod telemetry;

pub use config::OperatorConfig;
pub use error::{Error, ErrorClass};
pub use retry::{RetryDecision, RetryPolicy};

/// Result type alias using our custom Error type
pub type Result<T> = std::result::Result<T, Error>;

/// API group of the JupyterNotebook custom resource
pub const NOTEBOOK_GROUP: &str = "squonk.it";

/// Field manager name used for server-side apply and status patches
pub const FIELD_MANAGER: &str = "jupyter-operator";

/// Label key carried by every resource the operator creates for an instance
pub const LABEL_APP: &str = "app";

/// Pod label used by the Deployment selector and the Service selector
pub const LABEL_DEPLOYMENT: &str = "deployment";
