//! Command line and environment configuration

use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand, ValueEnum};

use jupyter_common::config::{
    toggle_enabled, DEFAULT_NODE_SELECTOR_KEY, DEFAULT_NODE_SELECTOR_VALUE,
    DEFAULT_POD_PRIORITY_CLASS,
};
use jupyter_common::telemetry::{LogFormat, TelemetryConfig};
use jupyter_common::{OperatorConfig, RetryPolicy};

/// Jupyter notebook operator - runs JupyterNotebook custom resources as notebook instances
#[derive(Parser, Debug)]
#[command(name = "jupyter-operator", version, about, long_about = None)]
pub struct Cli {
    /// Print the JupyterNotebook CRD manifest and exit
    #[arg(long)]
    pub crd: bool,

    #[command(flatten)]
    pub settings: Settings,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Run as controller (default mode)
    ///
    /// Installs the JupyterNotebook CRD, then watches JupyterNotebooks in
    /// every namespace and creates their notebook instances.
    Controller,
}

/// Log output format
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogFormatArg {
    /// One JSON object per line
    Json,
    /// Human-readable text
    Text,
}

/// Operator settings, each flag falling back to an environment variable
#[derive(Args, Debug)]
pub struct Settings {
    /// Ingress domain for notebooks that do not name one
    #[arg(long, env = "INGRESS_DOMAIN")]
    pub ingress_domain: Option<String>,

    /// TLS secret for notebook ingresses; disables cert-manager when set
    #[arg(long, env = "INGRESS_TLS_SECRET")]
    pub ingress_tls_secret: Option<String>,

    /// cert-manager ClusterIssuer used when no TLS secret is known
    #[arg(long, env = "INGRESS_CERT_ISSUER")]
    pub ingress_cert_issuer: Option<String>,

    /// Node selector key for notebook pods
    #[arg(long, env = "JO_POD_NODE_SELECTOR_KEY", default_value = DEFAULT_NODE_SELECTOR_KEY)]
    pub node_selector_key: String,

    /// Node selector value for notebook pods
    #[arg(long, env = "JO_POD_NODE_SELECTOR_VALUE", default_value = DEFAULT_NODE_SELECTOR_VALUE)]
    pub node_selector_value: String,

    /// Any non-empty value gives notebook pods a priority class
    #[arg(long, env = "JO_APPLY_POD_PRIORITY_CLASS")]
    pub apply_pod_priority_class: Option<String>,

    /// Priority class for notebook pods
    #[arg(long, env = "JO_DEFAULT_POD_PRIORITY_CLASS", default_value = DEFAULT_POD_PRIORITY_CLASS)]
    pub pod_priority_class: String,

    /// Attempts per notebook before a transient failure is final (0 = unlimited)
    #[arg(long, env = "JO_RETRY_LIMIT", default_value_t = jupyter_common::retry::DEFAULT_RETRY_LIMIT)]
    pub retry_limit: u32,

    /// Seconds between attempts after a transient failure
    #[arg(long, env = "JO_RETRY_DELAY_SECS", default_value_t = 60)]
    pub retry_delay_secs: u64,

    /// Kubernetes API connect timeout in seconds
    #[arg(long, default_value_t = 5)]
    pub connect_timeout_secs: u64,

    /// Kubernetes API read timeout in seconds
    #[arg(long, default_value_t = 30)]
    pub read_timeout_secs: u64,

    /// Path to a kubeconfig file (defaults to in-cluster or $KUBECONFIG)
    #[arg(long)]
    pub kubeconfig: Option<PathBuf>,

    /// OTLP collector endpoint for trace export
    #[arg(long, env = "OTEL_EXPORTER_OTLP_ENDPOINT")]
    pub otlp_endpoint: Option<String>,

    /// Log line format
    #[arg(long, env = "JO_LOG_FORMAT", value_enum, default_value_t = LogFormatArg::Json)]
    pub log_format: LogFormatArg,
}

impl Settings {
    /// Defaults handed to every reconciliation
    pub fn operator_config(&self) -> OperatorConfig {
        OperatorConfig {
            ingress_domain: non_empty(&self.ingress_domain),
            ingress_tls_secret: non_empty(&self.ingress_tls_secret),
            ingress_cert_issuer: non_empty(&self.ingress_cert_issuer),
            node_selector_key: self.node_selector_key.clone(),
            node_selector_value: self.node_selector_value.clone(),
            apply_pod_priority_class: toggle_enabled(self.apply_pod_priority_class.as_deref()),
            pod_priority_class: self.pod_priority_class.clone(),
        }
    }

    /// Ceiling and delay for transient failures
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.retry_limit, Duration::from_secs(self.retry_delay_secs))
    }

    /// Connect timeout for the Kubernetes client
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    /// Read timeout for the Kubernetes client
    pub fn read_timeout(&self) -> Duration {
        Duration::from_secs(self.read_timeout_secs)
    }

    /// Logging and trace export settings
    pub fn telemetry_config(&self) -> TelemetryConfig {
        TelemetryConfig {
            otlp_endpoint: non_empty(&self.otlp_endpoint),
            format: match self.log_format {
                LogFormatArg::Json => LogFormat::Json,
                LogFormatArg::Text => LogFormat::Text,
            },
            ..Default::default()
        }
    }
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value.clone().filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        let mut argv = vec!["jupyter-operator"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).unwrap()
    }

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn flags_build_operator_config() {
        let cli = parse(&[
            "--ingress-domain",
            "example.com",
            "--ingress-cert-issuer",
            "letsencrypt",
            "--apply-pod-priority-class",
            "yes",
            "--retry-limit",
            "3",
            "--retry-delay-secs",
            "15",
            "controller",
        ]);
        assert_eq!(cli.command, Some(Commands::Controller));

        let config = cli.settings.operator_config();
        assert_eq!(config.ingress_domain.as_deref(), Some("example.com"));
        assert_eq!(config.ingress_cert_issuer.as_deref(), Some("letsencrypt"));
        assert_eq!(config.priority_class(), Some(DEFAULT_POD_PRIORITY_CLASS));

        assert_eq!(
            cli.settings.retry_policy(),
            RetryPolicy::new(3, Duration::from_secs(15))
        );
    }

    #[test]
    fn empty_values_count_as_unset() {
        let cli = parse(&["--ingress-tls-secret", "", "--apply-pod-priority-class", ""]);
        let config = cli.settings.operator_config();
        assert_eq!(config.ingress_tls_secret, None);
        assert_eq!(config.priority_class(), None);
    }

    #[test]
    fn timeouts_default_to_client_defaults() {
        let cli = parse(&["--crd"]);
        assert!(cli.crd);
        assert_eq!(
            cli.settings.connect_timeout(),
            jupyter_common::kube_utils::DEFAULT_CONNECT_TIMEOUT
        );
        assert_eq!(
            cli.settings.read_timeout(),
            jupyter_common::kube_utils::DEFAULT_READ_TIMEOUT
        );
        assert_eq!(cli.settings.telemetry_config().format, LogFormat::Json);
    }
}
