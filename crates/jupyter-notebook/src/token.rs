//! Access token continuity
//!
//! A notebook's access token is minted once and then lives in its Config
//! ConfigMap for the lifetime of the instance. Every attempt reads that
//! ConfigMap before synthesizing anything, so a retry after a partial failure
//! reuses the token the running workload already serves with.

use k8s_openapi::api::core::v1::ConfigMap;
use rand::distributions::Alphanumeric;
use rand::Rng;
use tracing::debug;

use jupyter_common::Error;

use crate::apply::KubeClient;
use crate::resources::config_maps::{config_map_name, CONFIG_FILE_KEY};

/// Number of characters in a minted token
pub const TOKEN_LENGTH: usize = 16;

/// A notebook access token
#[derive(Clone, PartialEq, Eq)]
pub struct Token(String);

impl Token {
    /// Mint a fresh token: each character drawn independently and uniformly
    /// from the 62 ASCII letters and digits.
    pub fn mint() -> Self {
        let token = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(TOKEN_LENGTH)
            .map(char::from)
            .collect();
        Self(token)
    }

    /// Wrap an existing token
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// The token text
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Token(<redacted>)")
    }
}

/// Where a token came from
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TokenSource {
    /// Read back from an existing Config ConfigMap
    Reused,
    /// Minted by this attempt; the Config ConfigMap still has to be created
    Minted,
}

/// The token an attempt will use
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TokenGrant {
    /// The token
    pub token: Token,
    /// Whether it was reused or minted
    pub source: TokenSource,
}

impl TokenGrant {
    /// Whether the Config ConfigMap must be created by this attempt
    pub fn needs_config_map(&self) -> bool {
        self.source == TokenSource::Minted
    }
}

/// Outcome of looking for an earlier attempt's token
#[derive(Debug)]
pub enum TokenLookup {
    /// The Config ConfigMap exists and holds this token
    Found(Token),
    /// No Config ConfigMap exists yet
    NotFound,
    /// The lookup failed; nothing may be created
    Error(Error),
}

impl TokenLookup {
    /// Turn the lookup into the token this attempt uses, minting one when no
    /// earlier token exists.
    pub fn into_grant(self) -> Result<TokenGrant, Error> {
        match self {
            Self::Found(token) => Ok(TokenGrant {
                token,
                source: TokenSource::Reused,
            }),
            Self::NotFound => Ok(TokenGrant {
                token: Token::mint(),
                source: TokenSource::Minted,
            }),
            Self::Error(e) => Err(e),
        }
    }
}

/// Look up the token stored by an earlier attempt for `name`.
pub async fn lookup_token(client: &dyn KubeClient, namespace: &str, name: &str) -> TokenLookup {
    let cm_name = config_map_name(name);
    match client.get_config_map(namespace, &cm_name).await {
        Ok(Some(cm)) => match token_from_config_map(name, &cm) {
            Ok(token) => {
                debug!(notebook = %name, config_map = %cm_name, "reusing existing token");
                TokenLookup::Found(token)
            }
            Err(e) => TokenLookup::Error(e),
        },
        Ok(None) => TokenLookup::NotFound,
        Err(e) => TokenLookup::Error(e),
    }
}

/// Extract `ServerApp.token` from a Config ConfigMap.
///
/// A ConfigMap that exists without a usable token is corrupt: replacing the
/// token would diverge from what the workload serves.
pub fn token_from_config_map(notebook: &str, cm: &ConfigMap) -> Result<Token, Error> {
    let cm_name = cm
        .metadata
        .name
        .clone()
        .unwrap_or_else(|| config_map_name(notebook));
    let corrupt = |msg: &str| Error::corrupt_config(notebook, cm_name.as_str(), msg);

    let raw = cm
        .data
        .as_ref()
        .and_then(|data| data.get(CONFIG_FILE_KEY))
        .ok_or_else(|| corrupt("missing jupyter_notebook_config.json"))?;
    let config: serde_json::Value = serde_json::from_str(raw)
        .map_err(|e| corrupt(&format!("invalid notebook config JSON: {}", e)))?;

    config
        .get("ServerApp")
        .and_then(|server| server.get("token"))
        .and_then(serde_json::Value::as_str)
        .filter(|token| !token.is_empty())
        .map(Token::new)
        .ok_or_else(|| corrupt("no ServerApp.token in notebook config"))
}
