//! Error types for the Jupyter notebook operator
//!
//! Errors are structured with fields to aid debugging in production.
//! Each variant carries the notebook instance it concerns where one is known,
//! and every error maps onto exactly one [`ErrorClass`] that drives retry
//! handling in the controller.

use thiserror::Error;

/// Default context value when no specific context is available
pub const UNKNOWN_CONTEXT: &str = "unknown";

/// How the controller must treat a failed reconciliation
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorClass {
    /// The request can never succeed (e.g. a retired schema version)
    Permanent,
    /// The request is structurally invalid; retrying cannot repair it
    Validation,
    /// The failure may clear on its own; retried with a fixed delay
    Transient,
}

impl ErrorClass {
    /// Whether errors of this class are worth another attempt
    pub fn is_retryable(self) -> bool {
        matches!(self, ErrorClass::Transient)
    }
}

impl std::fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Permanent => write!(f, "Permanent"),
            Self::Validation => write!(f, "Validation"),
            Self::Transient => write!(f, "Transient"),
        }
    }
}

/// Main error type for notebook operations
#[derive(Debug, Error)]
pub enum Error {
    /// Kubernetes API error
    #[error("kubernetes error: {source}")]
    Kube {
        /// The underlying kube-rs error
        #[from]
        source: kube::Error,
    },

    /// Missing or malformed notebook configuration
    #[error("validation error for {notebook}: {message}")]
    Validation {
        /// Name of the notebook with invalid configuration
        notebook: String,
        /// Description of what's invalid
        message: String,
        /// The invalid field path (e.g., "imDataManager.ingressDomain")
        field: Option<String>,
    },

    /// The request uses a schema version the operator no longer serves
    #[error("unsupported schema version {version} for {notebook}: no longer supported")]
    UnsupportedSchema {
        /// Name of the notebook
        notebook: String,
        /// The apiVersion the request was made with
        version: String,
    },

    /// An existing Config ConfigMap holds no usable token
    #[error("config {config_map} for {notebook} is corrupt: {message}")]
    CorruptConfig {
        /// Name of the notebook
        notebook: String,
        /// Name of the ConfigMap that was read
        config_map: String,
        /// Description of what's wrong with it
        message: String,
    },

    /// Serialization/deserialization error
    #[error("serialization error: {message}")]
    Serialization {
        /// Description of what failed
        message: String,
        /// The resource kind being serialized (if known)
        kind: Option<String>,
    },

    /// Internal/operational error
    #[error("internal error [{context}]: {message}")]
    Internal {
        /// Description of what failed
        message: String,
        /// Context where the error occurred (e.g., "controller", "startup")
        context: String,
    },
}

impl Error {
    /// Create a validation error with the given message
    ///
    /// For simple validation errors without notebook context.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            notebook: UNKNOWN_CONTEXT.to_string(),
            message: msg.into(),
            field: None,
        }
    }

    /// Create a validation error with notebook context and field path
    pub fn validation_for_field(
        notebook: impl Into<String>,
        field: impl Into<String>,
        msg: impl Into<String>,
    ) -> Self {
        Self::Validation {
            notebook: notebook.into(),
            message: msg.into(),
            field: Some(field.into()),
        }
    }

    /// Create an unsupported-schema error
    pub fn unsupported_schema(notebook: impl Into<String>, version: impl Into<String>) -> Self {
        Self::UnsupportedSchema {
            notebook: notebook.into(),
            version: version.into(),
        }
    }

    /// Create a corrupt-config error
    pub fn corrupt_config(
        notebook: impl Into<String>,
        config_map: impl Into<String>,
        msg: impl Into<String>,
    ) -> Self {
        Self::CorruptConfig {
            notebook: notebook.into(),
            config_map: config_map.into(),
            message: msg.into(),
        }
    }

    /// Create a serialization error with resource kind context
    pub fn serialization_for_kind(kind: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Serialization {
            message: msg.into(),
            kind: Some(kind.into()),
        }
    }

    /// Create an internal error with context
    pub fn internal_with_context(context: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Internal {
            message: msg.into(),
            context: context.into(),
        }
    }

    /// Classify this error for the controller's retry handling
    ///
    /// Every API failure is transient, including 4xx responses: credentials,
    /// quota and admission problems are fixed outside the operator and the
    /// next attempt may succeed. Conflicts never reach here, the apply engine
    /// absorbs them.
    pub fn classify(&self) -> ErrorClass {
        match self {
            Error::Kube { .. } => ErrorClass::Transient,
            Error::Internal { .. } => ErrorClass::Transient,
            Error::UnsupportedSchema { .. } => ErrorClass::Permanent,
            Error::Validation { .. } => ErrorClass::Validation,
            Error::CorruptConfig { .. } => ErrorClass::Validation,
            Error::Serialization { .. } => ErrorClass::Validation,
        }
    }

    /// Check if this error is retryable
    pub fn is_retryable(&self) -> bool {
        self.classify().is_retryable()
    }

    /// Whether this is an API "already exists" (HTTP 409) response
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            Error::Kube { source: kube::Error::Api(ae) } if ae.code == 409
        )
    }

    /// Get the notebook name if this error is associated with a specific instance
    pub fn notebook(&self) -> Option<&str> {
        match self {
            Error::Validation { notebook, .. } => Some(notebook),
            Error::UnsupportedSchema { notebook, .. } => Some(notebook),
            Error::CorruptConfig { notebook, .. } => Some(notebook),
            Error::Kube { .. } => None,
            Error::Serialization { .. } => None,
            Error::Internal { .. } => None,
        }
    }
}
