//! Process-wide operator configuration
//!
//! Built once at startup (from flags and environment in the operator binary)
//! and threaded explicitly into the resolver. Nothing below this layer reads
//! process state.

/// Default node selector key used to place notebook pods
pub const DEFAULT_NODE_SELECTOR_KEY: &str = "informaticsmatters.com/purpose-application";

/// Default node selector value used to place notebook pods
pub const DEFAULT_NODE_SELECTOR_VALUE: &str = "yes";

/// Default pod priority class, used when priority classes are enabled
pub const DEFAULT_POD_PRIORITY_CLASS: &str = "im-application-low";

/// Environment-derived defaults shared by every reconciliation
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OperatorConfig {
    /// Ingress domain used when a notebook does not name one
    pub ingress_domain: Option<String>,
    /// TLS secret used when a notebook does not name one.
    /// When set, cert-manager is not involved.
    pub ingress_tls_secret: Option<String>,
    /// cert-manager ClusterIssuer, used only when no TLS secret is known
    pub ingress_cert_issuer: Option<String>,
    /// Node selector key for notebook pods
    pub node_selector_key: String,
    /// Node selector value for notebook pods
    pub node_selector_value: String,
    /// Whether notebook pods get a priority class
    pub apply_pod_priority_class: bool,
    /// Priority class name applied when `apply_pod_priority_class` is set
    pub pod_priority_class: String,
}

impl Default for OperatorConfig {
    fn default() -> Self {
        Self {
            ingress_domain: None,
            ingress_tls_secret: None,
            ingress_cert_issuer: None,
            node_selector_key: DEFAULT_NODE_SELECTOR_KEY.to_string(),
            node_selector_value: DEFAULT_NODE_SELECTOR_VALUE.to_string(),
            apply_pod_priority_class: false,
            pod_priority_class: DEFAULT_POD_PRIORITY_CLASS.to_string(),
        }
    }
}

impl OperatorConfig {
    /// Create a config with the given default ingress domain
    pub fn with_ingress_domain(domain: impl Into<String>) -> Self {
        Self {
            ingress_domain: Some(domain.into()),
            ..Default::default()
        }
    }

    /// The priority class to stamp on notebook pods, if any
    pub fn priority_class(&self) -> Option<&str> {
        self.apply_pod_priority_class
            .then_some(self.pod_priority_class.as_str())
    }
}

/// Interpret an "any value enables it" toggle from the environment.
///
/// Unset and empty both mean disabled.
pub fn toggle_enabled(value: Option<&str>) -> bool {
    value.is_some_and(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_cluster_conventions() {
        let config = OperatorConfig::default();
        assert_eq!(config.ingress_domain, None);
        assert_eq!(config.node_selector_key, DEFAULT_NODE_SELECTOR_KEY);
        assert_eq!(config.node_selector_value, "yes");
        assert_eq!(config.priority_class(), None);
    }

    #[test]
    fn priority_class_only_when_enabled() {
        let config = OperatorConfig {
            apply_pod_priority_class: true,
            ..OperatorConfig::with_ingress_domain("example.com")
        };
        assert_eq!(config.priority_class(), Some("im-application-low"));
    }

    #[test]
    fn toggle_accepts_any_non_empty_value() {
        assert!(toggle_enabled(Some("yes")));
        assert!(toggle_enabled(Some("0")));
        assert!(!toggle_enabled(Some("")));
        assert!(!toggle_enabled(Some("  ")));
        assert!(!toggle_enabled(None));
    }
}
