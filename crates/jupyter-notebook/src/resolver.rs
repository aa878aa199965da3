//! Spec resolution
//!
//! Merges a notebook request with the operator's startup configuration. Every
//! optional value resolves through the same three tiers, in order: the value
//! in the request, the operator-wide default, then a built-in constant. An
//! empty string in the request counts as absent.
//!
//! Resolution is pure: the same request and configuration always produce the
//! same [`ResolvedConfig`].

use std::collections::BTreeMap;

use jupyter_common::crd::{DataManagerSpec, JupyterNotebookSpec, ResourceQuantities};
use jupyter_common::{Error, OperatorConfig, LABEL_DEPLOYMENT};

/// Image used when the request names none
pub const DEFAULT_IMAGE: &str = "jupyter/minimal-notebook:notebook-6.3.0";
/// ServiceAccount used when the request names none
pub const DEFAULT_SERVICE_ACCOUNT: &str = "default";
/// CPU limit used when the request names none
pub const DEFAULT_CPU_LIMIT: &str = "1";
/// CPU request used when the request names none
pub const DEFAULT_CPU_REQUEST: &str = "10m";
/// Memory limit used when the request names none
pub const DEFAULT_MEMORY_LIMIT: &str = "1Gi";
/// Memory request used when the request names none
pub const DEFAULT_MEMORY_REQUEST: &str = "256Mi";
/// User ID the notebook runs as by default
pub const DEFAULT_USER_ID: i64 = 1000;
/// Group ID the notebook runs as by default
pub const DEFAULT_GROUP_ID: i64 = 100;
/// Ingress request body limit used when the request names none
pub const DEFAULT_PROXY_BODY_SIZE: &str = "500m";
/// Ingress class used when the request names none
pub const DEFAULT_INGRESS_CLASS: &str = "nginx";
/// Owner reported to the notebook when no `*/owner` label is supplied
pub const UNKNOWN_OWNER: &str = "Unknown";

const LATEST_TAG: &str = "latest";
const OWNER_LABEL_SUFFIX: &str = "/owner";
const MAX_LABEL_SEGMENT_LEN: usize = 63;
const MAX_LABEL_PREFIX_LEN: usize = 253;

/// Image pull policy for the notebook container
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PullPolicy {
    /// Re-pull on every start; used for moving tags
    Always,
    /// Pull once per node
    IfNotPresent,
}

impl PullPolicy {
    /// Pull policy for an image tag: moving tags (`latest`, `stable`) are
    /// always pulled.
    pub fn for_tag(tag: &str) -> Self {
        if tag.eq_ignore_ascii_case("latest") || tag.eq_ignore_ascii_case("stable") {
            Self::Always
        } else {
            Self::IfNotPresent
        }
    }

    /// Value of `imagePullPolicy`
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Always => "Always",
            Self::IfNotPresent => "IfNotPresent",
        }
    }
}

/// A container image reference and its tag
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImageRef {
    /// The reference exactly as requested
    pub reference: String,
    /// The tag, `latest` when the reference has none
    pub tag: String,
}

impl ImageRef {
    /// Parse an image reference.
    ///
    /// The tag follows the last `:`, unless that suffix contains a `/`, in
    /// which case the `:` separated a registry port (`host:5000/img`).
    pub fn parse(reference: &str) -> Self {
        let tag = match reference.rsplit_once(':') {
            Some((_, suffix)) if !suffix.contains('/') && !suffix.is_empty() => suffix,
            _ => LATEST_TAG,
        };
        Self {
            reference: reference.to_string(),
            tag: tag.to_string(),
        }
    }

    /// Pull policy implied by the tag
    pub fn pull_policy(&self) -> PullPolicy {
        PullPolicy::for_tag(&self.tag)
    }
}

/// Notebook user interface
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum InterfaceMode {
    /// JupyterLab
    #[default]
    Lab,
    /// The classic notebook UI
    Classic,
}

impl InterfaceMode {
    /// Only an exact `classic` selects the classic UI
    pub fn parse(value: Option<&str>) -> Self {
        match value {
            Some("classic") => Self::Classic,
            _ => Self::Lab,
        }
    }

    /// Whether `JUPYTER_ENABLE_LAB` is set in the container
    pub fn enables_lab(self) -> bool {
        matches!(self, Self::Lab)
    }

    /// Canonical name of the mode
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Lab => "lab",
            Self::Classic => "classic",
        }
    }
}

/// CPU and memory amounts after defaulting
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Quantities {
    /// CPU quantity
    pub cpu: String,
    /// Memory quantity
    pub memory: String,
}

/// A notebook request with every default applied
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedConfig {
    /// Notebook name
    pub name: String,
    /// Container image
    pub image: ImageRef,
    /// Pull policy derived from the image tag
    pub pull_policy: PullPolicy,
    /// ServiceAccount the pod runs as
    pub service_account: String,
    /// Resource requests
    pub requests: Quantities,
    /// Resource limits
    pub limits: Quantities,
    /// User ID of the notebook process
    pub run_as_user: i64,
    /// Group ID of the notebook process and the pod's filesystem group
    pub run_as_group: i64,
    /// PersistentVolumeClaim holding the project
    pub project_claim: String,
    /// Project identifier, the sub-path mounted as the home directory
    pub project_id: String,
    /// Host the notebook is exposed on
    pub ingress_domain: String,
    /// Ingress class
    pub ingress_class: String,
    /// TLS secret for the ingress host
    pub ingress_tls_secret: Option<String>,
    /// cert-manager ClusterIssuer, only when no TLS secret is known
    pub ingress_cert_issuer: Option<String>,
    /// Ingress request body limit
    pub proxy_body_size: String,
    /// User interface
    pub interface: InterfaceMode,
    /// Interface as requested, echoed in status
    pub requested_interface: String,
    /// Extra pod labels
    pub labels: BTreeMap<String, String>,
    /// Value of the last `*/owner` label
    pub owner: String,
    /// Node selector for the pod
    pub node_selector: (String, String),
    /// Pod priority class, when enabled
    pub priority_class: Option<String>,
}

/// Resolve a notebook request against the operator configuration.
///
/// Fails with a validation error when no ingress domain is known, when the
/// project claim or id is missing, or when a label is malformed.
pub fn resolve(
    name: &str,
    spec: &JupyterNotebookSpec,
    config: &OperatorConfig,
) -> Result<ResolvedConfig, Error> {
    let empty = DataManagerSpec::default();
    let material = spec.im_data_manager.as_ref().unwrap_or(&empty);

    let ingress_domain = explicit(&material.ingress_domain)
        .or(config.ingress_domain.as_deref())
        .ok_or_else(|| {
            Error::validation_for_field(
                name,
                "imDataManager.ingressDomain",
                "no ingress domain in the request and no operator default",
            )
        })?
        .to_string();

    let project = material.project.clone().unwrap_or_default();
    let project_claim = explicit(&project.claim_name)
        .ok_or_else(|| {
            Error::validation_for_field(
                name,
                "imDataManager.project.claimName",
                "project claim name is required",
            )
        })?
        .to_string();
    let project_id = explicit(&project.id)
        .ok_or_else(|| {
            Error::validation_for_field(name, "imDataManager.project.id", "project id is required")
        })?
        .to_string();

    let (labels, owner) = parse_labels(name, &material.labels)?;

    let image = ImageRef::parse(explicit(&material.image).unwrap_or(DEFAULT_IMAGE));
    let pull_policy = image.pull_policy();

    let resources = material.resources.clone().unwrap_or_default();
    let requests = quantities(
        resources.requests.as_ref(),
        DEFAULT_CPU_REQUEST,
        DEFAULT_MEMORY_REQUEST,
    );
    let limits = quantities(
        resources.limits.as_ref(),
        DEFAULT_CPU_LIMIT,
        DEFAULT_MEMORY_LIMIT,
    );

    let security = material.security_context.clone().unwrap_or_default();
    let requested_interface = material
        .notebook
        .as_ref()
        .and_then(|nb| explicit(&nb.interface));

    // A pre-provisioned secret makes the issuer irrelevant
    let ingress_tls_secret = explicit(&material.ingress_tls_secret)
        .or(config.ingress_tls_secret.as_deref())
        .map(str::to_string);
    let ingress_cert_issuer = match ingress_tls_secret {
        Some(_) => None,
        None => config
            .ingress_cert_issuer
            .as_deref()
            .filter(|issuer| !issuer.is_empty())
            .map(str::to_string),
    };

    Ok(ResolvedConfig {
        name: name.to_string(),
        image,
        pull_policy,
        service_account: explicit(&material.service_account_name)
            .unwrap_or(DEFAULT_SERVICE_ACCOUNT)
            .to_string(),
        requests,
        limits,
        run_as_user: security.run_as_user.unwrap_or(DEFAULT_USER_ID),
        run_as_group: security.run_as_group.unwrap_or(DEFAULT_GROUP_ID),
        project_claim,
        project_id,
        ingress_domain,
        ingress_class: explicit(&material.ingress_class)
            .unwrap_or(DEFAULT_INGRESS_CLASS)
            .to_string(),
        ingress_tls_secret,
        ingress_cert_issuer,
        proxy_body_size: explicit(&material.ingress_proxy_body_size)
            .unwrap_or(DEFAULT_PROXY_BODY_SIZE)
            .to_string(),
        interface: InterfaceMode::parse(requested_interface),
        requested_interface: requested_interface
            .unwrap_or(InterfaceMode::Lab.as_str())
            .to_string(),
        labels,
        owner,
        node_selector: (
            config.node_selector_key.clone(),
            config.node_selector_value.clone(),
        ),
        priority_class: config.priority_class().map(str::to_string),
    })
}

/// Parse `key=value` label strings, splitting on the first `=`.
///
/// Returns the labels and the owner carried by the last key ending in
/// `/owner`. Keys and values must be valid Kubernetes label syntax, and the
/// `deployment` key is reserved for the pod selector.
pub fn parse_labels(
    notebook: &str,
    raw: &[String],
) -> Result<(BTreeMap<String, String>, String), Error> {
    let mut labels = BTreeMap::new();
    let mut owner = UNKNOWN_OWNER.to_string();

    for label in raw {
        let (key, value) = label.split_once('=').ok_or_else(|| {
            Error::validation_for_field(
                notebook,
                "imDataManager.labels",
                format!("label '{}' is not of the form key=value", label),
            )
        })?;
        if let Err(reason) = validate_label_key(key).and_then(|()| validate_label_value(value)) {
            return Err(Error::validation_for_field(
                notebook,
                "imDataManager.labels",
                format!("label '{}': {}", label, reason),
            ));
        }
        if key == LABEL_DEPLOYMENT {
            return Err(Error::validation_for_field(
                notebook,
                "imDataManager.labels",
                format!("label key '{}' is reserved", key),
            ));
        }
        if key.ends_with(OWNER_LABEL_SUFFIX) {
            owner = value.to_string();
        }
        labels.insert(key.to_string(), value.to_string());
    }

    Ok((labels, owner))
}

/// Validate a label key: an optional DNS subdomain prefix and `/`, then a name.
fn validate_label_key(key: &str) -> Result<(), String> {
    let name = match key.split_once('/') {
        Some((prefix, name)) => {
            validate_label_prefix(prefix)?;
            name
        }
        None => key,
    };
    if name.is_empty() {
        return Err("key name cannot be empty".to_string());
    }
    validate_label_segment(name, "key name")
}

/// Validate a label value; empty is allowed
fn validate_label_value(value: &str) -> Result<(), String> {
    if value.is_empty() {
        return Ok(());
    }
    validate_label_segment(value, "value")
}

/// Key prefix rules: lowercase DNS subdomain, at most 253 characters.
fn validate_label_prefix(prefix: &str) -> Result<(), String> {
    if prefix.is_empty() || prefix.len() > MAX_LABEL_PREFIX_LEN {
        return Err(format!(
            "key prefix must be 1-{} characters",
            MAX_LABEL_PREFIX_LEN
        ));
    }
    for part in prefix.split('.') {
        let alnum_ends = part.starts_with(|c: char| c.is_ascii_lowercase() || c.is_ascii_digit())
            && part.ends_with(|c: char| c.is_ascii_lowercase() || c.is_ascii_digit());
        if !alnum_ends
            || !part
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
        {
            return Err(format!("key prefix must be a DNS subdomain: {}", prefix));
        }
    }
    Ok(())
}

/// Name and value rules: at most 63 characters of alphanumerics, `-`, `_`
/// and `.`, starting and ending with an alphanumeric.
fn validate_label_segment(s: &str, what: &str) -> Result<(), String> {
    if s.len() > MAX_LABEL_SEGMENT_LEN {
        return Err(format!(
            "{} cannot exceed {} characters",
            what, MAX_LABEL_SEGMENT_LEN
        ));
    }
    let alnum_ends = s.starts_with(|c: char| c.is_ascii_alphanumeric())
        && s.ends_with(|c: char| c.is_ascii_alphanumeric());
    if !alnum_ends {
        return Err(format!("{} must start and end with an alphanumeric: {}", what, s));
    }
    if let Some(c) = s
        .chars()
        .find(|c| !c.is_ascii_alphanumeric() && !matches!(c, '-' | '_' | '.'))
    {
        return Err(format!("{} contains invalid character {:?}: {}", what, c, s));
    }
    Ok(())
}

fn explicit(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

fn quantities(
    requested: Option<&ResourceQuantities>,
    default_cpu: &str,
    default_memory: &str,
) -> Quantities {
    Quantities {
        cpu: requested
            .and_then(|q| explicit(&q.cpu))
            .unwrap_or(default_cpu)
            .to_string(),
        memory: requested
            .and_then(|q| explicit(&q.memory))
            .unwrap_or(default_memory)
            .to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jupyter_common::crd::{
        NotebookOptions, ProjectSpec, ResourcesSpec, SecurityContextSpec,
    };
    use jupyter_common::ErrorClass;
    use proptest::prelude::*;
    use rstest::rstest;

    fn material() -> DataManagerSpec {
        DataManagerSpec {
            project: Some(ProjectSpec {
                claim_name: Some("pvc-projects".to_string()),
                id: Some("project-42".to_string()),
            }),
            ..Default::default()
        }
    }

    fn spec_with(material: DataManagerSpec) -> JupyterNotebookSpec {
        JupyterNotebookSpec {
            im_data_manager: Some(material),
        }
    }

    fn config() -> OperatorConfig {
        OperatorConfig::with_ingress_domain("example.com")
    }

    // =========================================================================
    // Defaults
    // =========================================================================

    #[test]
    fn minimal_request_gets_every_default() {
        let resolved = resolve("nb-1", &spec_with(material()), &config()).unwrap();

        assert_eq!(resolved.image.reference, DEFAULT_IMAGE);
        assert_eq!(resolved.image.tag, "notebook-6.3.0");
        assert_eq!(resolved.pull_policy, PullPolicy::IfNotPresent);
        assert_eq!(resolved.service_account, "default");
        assert_eq!(resolved.requests.cpu, "10m");
        assert_eq!(resolved.requests.memory, "256Mi");
        assert_eq!(resolved.limits.cpu, "1");
        assert_eq!(resolved.limits.memory, "1Gi");
        assert_eq!(resolved.run_as_user, 1000);
        assert_eq!(resolved.run_as_group, 100);
        assert_eq!(resolved.ingress_domain, "example.com");
        assert_eq!(resolved.ingress_class, "nginx");
        assert_eq!(resolved.proxy_body_size, "500m");
        assert_eq!(resolved.interface, InterfaceMode::Lab);
        assert_eq!(resolved.owner, UNKNOWN_OWNER);
        assert_eq!(resolved.priority_class, None);
        assert_eq!(
            resolved.node_selector,
            (
                "informaticsmatters.com/purpose-application".to_string(),
                "yes".to_string()
            )
        );
    }

    #[test]
    fn explicit_values_win_over_defaults() {
        let mut m = material();
        m.image = Some("registry.local/team/nb:2.1".to_string());
        m.service_account_name = Some("notebooks".to_string());
        m.resources = Some(ResourcesSpec {
            limits: Some(ResourceQuantities {
                cpu: Some("4".to_string()),
                memory: None,
            }),
            requests: Some(ResourceQuantities {
                cpu: None,
                memory: Some("2Gi".to_string()),
            }),
        });
        m.security_context = Some(SecurityContextSpec {
            run_as_user: Some(2000),
            run_as_group: Some(300),
        });
        m.ingress_domain = Some("nb.example.org".to_string());
        m.ingress_class = Some("traefik".to_string());
        m.ingress_proxy_body_size = Some("1g".to_string());

        let resolved = resolve("nb-1", &spec_with(m), &config()).unwrap();

        assert_eq!(resolved.image.tag, "2.1");
        assert_eq!(resolved.service_account, "notebooks");
        assert_eq!(resolved.limits.cpu, "4");
        assert_eq!(resolved.limits.memory, "1Gi");
        assert_eq!(resolved.requests.cpu, "10m");
        assert_eq!(resolved.requests.memory, "2Gi");
        assert_eq!(resolved.run_as_user, 2000);
        assert_eq!(resolved.run_as_group, 300);
        assert_eq!(resolved.ingress_domain, "nb.example.org");
        assert_eq!(resolved.ingress_class, "traefik");
        assert_eq!(resolved.proxy_body_size, "1g");
    }

    #[test]
    fn empty_strings_fall_through_to_defaults() {
        let mut m = material();
        m.image = Some(String::new());
        m.ingress_domain = Some(String::new());
        let resolved = resolve("nb-1", &spec_with(m), &config()).unwrap();
        assert_eq!(resolved.image.reference, DEFAULT_IMAGE);
        assert_eq!(resolved.ingress_domain, "example.com");
    }

    #[test]
    fn priority_class_follows_operator_toggle() {
        let config = OperatorConfig {
            apply_pod_priority_class: true,
            pod_priority_class: "notebooks-low".to_string(),
            ..config()
        };
        let resolved = resolve("nb-1", &spec_with(material()), &config).unwrap();
        assert_eq!(resolved.priority_class.as_deref(), Some("notebooks-low"));
    }

    // =========================================================================
    // Ingress TLS
    // =========================================================================

    #[test]
    fn request_tls_secret_beats_operator_secret_and_issuer() {
        let mut m = material();
        m.ingress_tls_secret = Some("own-cert".to_string());
        let config = OperatorConfig {
            ingress_tls_secret: Some("wildcard".to_string()),
            ingress_cert_issuer: Some("letsencrypt".to_string()),
            ..config()
        };
        let resolved = resolve("nb-1", &spec_with(m), &config).unwrap();
        assert_eq!(resolved.ingress_tls_secret.as_deref(), Some("own-cert"));
        assert_eq!(resolved.ingress_cert_issuer, None);
    }

    #[test]
    fn issuer_used_only_without_any_secret() {
        let config = OperatorConfig {
            ingress_cert_issuer: Some("letsencrypt".to_string()),
            ..config()
        };
        let resolved = resolve("nb-1", &spec_with(material()), &config).unwrap();
        assert_eq!(resolved.ingress_tls_secret, None);
        assert_eq!(resolved.ingress_cert_issuer.as_deref(), Some("letsencrypt"));
    }

    // =========================================================================
    // Validation
    // =========================================================================

    #[test]
    fn missing_ingress_domain_is_a_validation_error() {
        let err = resolve("nb-1", &spec_with(material()), &OperatorConfig::default())
            .unwrap_err();
        assert_eq!(err.classify(), ErrorClass::Validation);
        assert_eq!(err.notebook(), Some("nb-1"));
        assert!(err.to_string().contains("ingress domain"));
    }

    #[test]
    fn missing_project_is_a_validation_error() {
        let err = resolve("nb-1", &JupyterNotebookSpec::default(), &config()).unwrap_err();
        assert_eq!(err.classify(), ErrorClass::Validation);

        let mut m = material();
        m.project = Some(ProjectSpec {
            claim_name: Some("pvc".to_string()),
            id: None,
        });
        let err = resolve("nb-1", &spec_with(m), &config()).unwrap_err();
        assert!(err.to_string().contains("project id"));
    }

    // =========================================================================
    // Image tags and pull policy
    // =========================================================================

    #[rstest]
    #[case::no_tag("jupyter/minimal-notebook", "latest", PullPolicy::Always)]
    #[case::latest("jupyter/minimal-notebook:latest", "latest", PullPolicy::Always)]
    #[case::stable_uppercase("repo/img:STABLE", "STABLE", PullPolicy::Always)]
    #[case::pinned("repo/img:6.3.0", "6.3.0", PullPolicy::IfNotPresent)]
    #[case::registry_port_no_tag("registry:5000/img", "latest", PullPolicy::Always)]
    #[case::registry_port_with_tag("registry:5000/img:1.2", "1.2", PullPolicy::IfNotPresent)]
    #[case::trailing_colon("repo/img:", "latest", PullPolicy::Always)]
    fn image_tag_drives_pull_policy(
        #[case] image: &str,
        #[case] tag: &str,
        #[case] policy: PullPolicy,
    ) {
        let parsed = ImageRef::parse(image);
        assert_eq!(parsed.tag, tag);
        assert_eq!(parsed.pull_policy(), policy);
    }

    // =========================================================================
    // Interface
    // =========================================================================

    #[rstest]
    #[case::absent(None, InterfaceMode::Lab)]
    #[case::lab(Some("lab"), InterfaceMode::Lab)]
    #[case::classic(Some("classic"), InterfaceMode::Classic)]
    #[case::unknown(Some("retro"), InterfaceMode::Lab)]
    fn interface_mode_from_request(#[case] value: Option<&str>, #[case] mode: InterfaceMode) {
        let mut m = material();
        m.notebook = Some(NotebookOptions {
            interface: value.map(str::to_string),
        });
        let resolved = resolve("nb-1", &spec_with(m), &config()).unwrap();
        assert_eq!(resolved.interface, mode);
        assert_eq!(resolved.interface.enables_lab(), mode == InterfaceMode::Lab);
    }

    #[test]
    fn requested_interface_is_kept_verbatim() {
        let mut m = material();
        m.notebook = Some(NotebookOptions {
            interface: Some("retro".to_string()),
        });
        let resolved = resolve("nb-1", &spec_with(m), &config()).unwrap();
        assert_eq!(resolved.interface, InterfaceMode::Lab);
        assert_eq!(resolved.requested_interface, "retro");

        let resolved = resolve("nb-1", &spec_with(material()), &config()).unwrap();
        assert_eq!(resolved.requested_interface, "lab");
    }

    // =========================================================================
    // Labels
    // =========================================================================

    #[test]
    fn labels_split_on_first_equals() {
        let raw = vec![
            "a.b/role=worker".to_string(),
            "team=data".to_string(),
            "squonk.it/empty=".to_string(),
        ];
        let (labels, owner) = parse_labels("nb-1", &raw).unwrap();
        assert_eq!(labels.get("a.b/role").map(String::as_str), Some("worker"));
        assert_eq!(labels.get("team").map(String::as_str), Some("data"));
        assert_eq!(labels.get("squonk.it/empty").map(String::as_str), Some(""));
        assert_eq!(owner, UNKNOWN_OWNER);

        // Everything after the first '=' is the value, so a second one is
        // part of the value and fails value syntax
        let err = parse_labels("nb-1", &["a.b/role=x=y".to_string()]).unwrap_err();
        assert!(err.to_string().contains("invalid character '='"));
    }

    #[test]
    fn last_owner_label_wins() {
        let raw = vec![
            "squonk.it/owner=alice".to_string(),
            "other.io/owner=bob".to_string(),
        ];
        let (labels, owner) = parse_labels("nb-1", &raw).unwrap();
        assert_eq!(owner, "bob");
        assert_eq!(labels.len(), 2);
    }

    #[rstest]
    #[case::no_equals("justakey")]
    #[case::empty_key("=value")]
    #[case::reserved_key("deployment=other")]
    #[case::space_in_value("team/owner=alice smith")]
    #[case::space_in_key("my team=data")]
    #[case::value_edge("team=-data")]
    #[case::empty_prefix("/owner=alice")]
    #[case::uppercase_prefix("Squonk.IT/owner=alice")]
    #[case::empty_name("squonk.it/=alice")]
    #[case::long_value(
        "team=aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa"
    )]
    fn malformed_labels_are_rejected(#[case] label: &str) {
        let err = parse_labels("nb-1", &[label.to_string()]).unwrap_err();
        assert_eq!(err.classify(), ErrorClass::Validation);
    }

    proptest! {
        #[test]
        fn resolution_is_deterministic(
            image in "[a-z]{1,8}(/[a-z]{1,8})?(:[a-z0-9.]{1,6})?",
            cpu in proptest::option::of("[1-9][0-9]{0,2}m"),
            owner in "[a-z]{1,10}",
            classic in any::<bool>(),
        ) {
            let mut m = material();
            m.image = Some(image);
            m.resources = Some(ResourcesSpec {
                limits: None,
                requests: Some(ResourceQuantities { cpu, memory: None }),
            });
            m.labels = vec![format!("squonk.it/owner={}", owner)];
            m.notebook = Some(NotebookOptions {
                interface: Some(if classic { "classic" } else { "lab" }.to_string()),
            });
            let spec = spec_with(m);

            let first = resolve("nb-1", &spec, &config()).unwrap();
            let second = resolve("nb-1", &spec, &config()).unwrap();
            prop_assert_eq!(&first, &second);
            prop_assert_eq!(first.owner, owner);
        }
    }
}
