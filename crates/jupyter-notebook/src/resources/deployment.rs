//! Notebook Deployment construction
//!
//! One replica of a single `notebook` container, replaced with the
//! `Recreate` strategy so two pods never share the project volume sub-path.
//! The container runs the mounted startup script as its command.

use std::collections::BTreeMap;

use k8s_openapi::api::apps::v1::{Deployment, DeploymentSpec, DeploymentStrategy};
use k8s_openapi::api::core::v1::{
    ConfigMapVolumeSource, Container, ContainerPort, EnvVar, PersistentVolumeClaimVolumeSource,
    PodSecurityContext, PodSpec, PodTemplateSpec, ResourceRequirements, Volume, VolumeMount,
};
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{LabelSelector, ObjectMeta};

use jupyter_common::{LABEL_APP, LABEL_DEPLOYMENT};

use super::config_maps::{
    bootstrap_config_map_name, config_map_name, startup_config_map_name, BASH_PROFILE_KEY,
    CONFIG_FILE_KEY,
};
use crate::resolver::{Quantities, ResolvedConfig};

/// Name of the notebook container
pub const CONTAINER_NAME: &str = "notebook";
/// Port the notebook server listens on
pub const NOTEBOOK_PORT: i32 = 8888;
/// Name of the notebook port, shared with the Service
pub const NOTEBOOK_PORT_NAME: &str = "8888-tcp";

const STARTUP_DIR: &str = "/usr/local/bin";
const STARTUP_SCRIPT_PATH: &str = "/usr/local/bin/start.sh";
const USER_HOME: &str = "/home/jovyan";

/// Build the notebook Deployment
pub fn build_deployment(config: &ResolvedConfig) -> Deployment {
    let name = &config.name;

    let selector = BTreeMap::from([(LABEL_DEPLOYMENT.to_string(), name.clone())]);
    let mut pod_labels = selector.clone();
    pod_labels.extend(config.labels.clone());

    let container = Container {
        name: CONTAINER_NAME.to_string(),
        image: Some(config.image.reference.clone()),
        image_pull_policy: Some(config.pull_policy.as_str().to_string()),
        command: Some(vec!["bash".to_string(), STARTUP_SCRIPT_PATH.to_string()]),
        resources: Some(ResourceRequirements {
            requests: Some(quantities(&config.requests)),
            limits: Some(quantities(&config.limits)),
            ..Default::default()
        }),
        ports: Some(vec![ContainerPort {
            name: Some(NOTEBOOK_PORT_NAME.to_string()),
            container_port: NOTEBOOK_PORT,
            protocol: Some("TCP".to_string()),
            ..Default::default()
        }]),
        env: Some(env(config)),
        volume_mounts: Some(vec![
            VolumeMount {
                name: "startup".to_string(),
                mount_path: STARTUP_DIR.to_string(),
                ..Default::default()
            },
            VolumeMount {
                name: "config".to_string(),
                mount_path: format!("/etc/{}", CONFIG_FILE_KEY),
                sub_path: Some(CONFIG_FILE_KEY.to_string()),
                ..Default::default()
            },
            VolumeMount {
                name: "bp".to_string(),
                mount_path: format!("/etc/{}", BASH_PROFILE_KEY),
                sub_path: Some(BASH_PROFILE_KEY.to_string()),
                ..Default::default()
            },
            VolumeMount {
                name: "project".to_string(),
                mount_path: USER_HOME.to_string(),
                sub_path: Some(config.project_id.clone()),
                ..Default::default()
            },
        ]),
        ..Default::default()
    };

    let volumes = vec![
        config_map_volume("startup", startup_config_map_name(name)),
        config_map_volume("bp", bootstrap_config_map_name(name)),
        config_map_volume("config", config_map_name(name)),
        Volume {
            name: "project".to_string(),
            persistent_volume_claim: Some(PersistentVolumeClaimVolumeSource {
                claim_name: config.project_claim.clone(),
                ..Default::default()
            }),
            ..Default::default()
        },
    ];

    let (selector_key, selector_value) = &config.node_selector;

    Deployment {
        metadata: ObjectMeta {
            name: Some(name.clone()),
            labels: Some(BTreeMap::from([(LABEL_APP.to_string(), name.clone())])),
            ..Default::default()
        },
        spec: Some(DeploymentSpec {
            replicas: Some(1),
            selector: LabelSelector {
                match_labels: Some(selector),
                ..Default::default()
            },
            strategy: Some(DeploymentStrategy {
                type_: Some("Recreate".to_string()),
                ..Default::default()
            }),
            template: PodTemplateSpec {
                metadata: Some(ObjectMeta {
                    labels: Some(pod_labels),
                    ..Default::default()
                }),
                spec: Some(PodSpec {
                    service_account_name: Some(config.service_account.clone()),
                    node_selector: Some(BTreeMap::from([(
                        selector_key.clone(),
                        selector_value.clone(),
                    )])),
                    priority_class_name: config.priority_class.clone(),
                    containers: vec![container],
                    security_context: Some(PodSecurityContext {
                        run_as_user: Some(config.run_as_user),
                        run_as_group: Some(config.run_as_group),
                        fs_group: Some(config.run_as_group),
                        ..Default::default()
                    }),
                    volumes: Some(volumes),
                    ..Default::default()
                }),
            },
            ..Default::default()
        }),
        ..Default::default()
    }
}

fn env(config: &ResolvedConfig) -> Vec<EnvVar> {
    let mut env = vec![env_var("HOME", format!("{}/.{}", USER_HOME, config.name))];
    if config.interface.enables_lab() {
        env.push(env_var("JUPYTER_ENABLE_LAB", "true"));
    }
    env.push(env_var("DM_PROJECT_ID", config.project_id.clone()));
    env.push(env_var("DM_INSTANCE_OWNER", config.owner.clone()));
    env
}

fn env_var(name: &str, value: impl Into<String>) -> EnvVar {
    EnvVar {
        name: name.to_string(),
        value: Some(value.into()),
        ..Default::default()
    }
}

fn config_map_volume(volume: &str, config_map: String) -> Volume {
    Volume {
        name: volume.to_string(),
        config_map: Some(ConfigMapVolumeSource {
            name: config_map,
            ..Default::default()
        }),
        ..Default::default()
    }
}

fn quantities(amounts: &Quantities) -> BTreeMap<String, Quantity> {
    BTreeMap::from([
        ("cpu".to_string(), Quantity(amounts.cpu.clone())),
        ("memory".to_string(), Quantity(amounts.memory.clone())),
    ])
}
