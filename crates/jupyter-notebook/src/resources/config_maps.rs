//! The three ConfigMaps a notebook pod mounts

use std::collections::BTreeMap;

use k8s_openapi::api::core::v1::ConfigMap;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;

use jupyter_common::{Error, LABEL_APP};

use crate::token::Token;

/// Key of the bootstrap file in the Bootstrap ConfigMap
pub const BASH_PROFILE_KEY: &str = ".bash_profile";
/// Key of the startup script in the Startup ConfigMap
pub const STARTUP_SCRIPT_KEY: &str = "start.sh";
/// Key of the server configuration in the Config ConfigMap
pub const CONFIG_FILE_KEY: &str = "jupyter_notebook_config.json";

/// Sources `~/.bashrc` for login shells
pub const BASH_PROFILE: &str = r#"if [ -f ~/.bashrc ]; then
    source ~/.bashrc
fi
"#;

/// Container command: resets `~/.bashrc`, seeds the home directory from the
/// mounted files on first start, then launches the server.
pub const STARTUP_SCRIPT: &str = r#"#!/bin/bash
echo "PS1='\$(pwd) \$UID$ '" > ~/.bashrc
echo "umask 0002" >> ~/.bashrc
conda init
source ~/.bashrc

if [ ! -f ~/.bash_profile ]; then
    echo "Copying bash_profile into place"
    cp /etc/.bash_profile ~
fi

if [ ! -f ~/jupyter_notebook_config.json ]; then
    echo "Copying config into place"
    cp /etc/jupyter_notebook_config.json ~
fi

jupyter lab --config=~/jupyter_notebook_config.json
"#;

/// What a notebook ConfigMap holds
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConfigMapRole {
    /// `.bash_profile`
    Bootstrap,
    /// `start.sh`
    Startup,
    /// `jupyter_notebook_config.json`, including the access token
    Config,
}

impl ConfigMapRole {
    /// Name of the ConfigMap in this role for a notebook
    pub fn name_for(self, notebook: &str) -> String {
        match self {
            Self::Bootstrap => bootstrap_config_map_name(notebook),
            Self::Startup => startup_config_map_name(notebook),
            Self::Config => config_map_name(notebook),
        }
    }
}

/// Name of the Bootstrap ConfigMap
pub fn bootstrap_config_map_name(notebook: &str) -> String {
    format!("bp-{}", notebook)
}

/// Name of the Startup ConfigMap
pub fn startup_config_map_name(notebook: &str) -> String {
    format!("startup-{}", notebook)
}

/// Name of the Config ConfigMap, the one that carries the token
pub fn config_map_name(notebook: &str) -> String {
    format!("config-{}", notebook)
}

/// Build the Bootstrap ConfigMap
pub fn build_bootstrap_config_map(notebook: &str) -> ConfigMap {
    config_map(ConfigMapRole::Bootstrap, notebook, BASH_PROFILE_KEY, BASH_PROFILE)
}

/// Build the Startup ConfigMap
pub fn build_startup_config_map(notebook: &str) -> ConfigMap {
    config_map(ConfigMapRole::Startup, notebook, STARTUP_SCRIPT_KEY, STARTUP_SCRIPT)
}

/// Build the Config ConfigMap embedding `token`.
///
/// The server is served under `/{notebook}` on all interfaces.
pub fn build_config_config_map(notebook: &str, token: &Token) -> Result<ConfigMap, Error> {
    let config = serde_json::json!({
        "ServerApp": {
            "token": token.as_str(),
            "base_url": notebook,
            "ip": "0.0.0.0",
        }
    });
    let content = serde_json::to_string_pretty(&config)
        .map_err(|e| Error::serialization_for_kind("ConfigMap", e.to_string()))?;
    Ok(config_map(ConfigMapRole::Config, notebook, CONFIG_FILE_KEY, &content))
}

fn config_map(role: ConfigMapRole, notebook: &str, key: &str, content: &str) -> ConfigMap {
    ConfigMap {
        metadata: ObjectMeta {
            name: Some(role.name_for(notebook)),
            labels: Some(BTreeMap::from([(
                LABEL_APP.to_string(),
                notebook.to_string(),
            )])),
            ..Default::default()
        },
        data: Some(BTreeMap::from([(key.to_string(), content.to_string())])),
        ..Default::default()
    }
}
