use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use fragments_store::Storage;
use serde::{Deserialize, Serialize};

use crate::auth::{AllowAllAuth, AuthProvider, BasicUsersAuth};
use crate::error::{ServerError, ServerResult};

/// Prefix of the environment variables that override file settings.
pub const ENV_PREFIX: &str = "FRAGMENTS_";

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    /// Public base URL used for `Location` headers. Falls back to the
    /// request's `Host` when unset.
    pub api_url: Option<String>,
    pub max_body_bytes: usize,
    pub request_timeout_secs: u64,
    pub storage: StorageConfig,
    pub auth: AuthConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 8080)),
            api_url: None,
            max_body_bytes: 5 * 1024 * 1024,
            request_timeout_secs: 30,
            storage: StorageConfig::Memory,
            auth: AuthConfig::AllowAll,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "backend", rename_all = "snake_case")]
pub enum StorageConfig {
    Memory,
    Filesystem { root: PathBuf },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "provider", rename_all = "snake_case")]
pub enum AuthConfig {
    AllowAll,
    /// Fixed `user -> password` table.
    Basic { users: BTreeMap<String, String> },
}

impl ServerConfig {
    pub fn from_toml_str(text: &str) -> ServerResult<Self> {
        toml::from_str(text).map_err(|e| ServerError::Config(e.to_string()))
    }

    /// Load from an optional TOML file, then apply `FRAGMENTS_*` overrides
    /// from the process environment.
    pub fn load(path: Option<&Path>) -> ServerResult<Self> {
        let mut config = match path {
            Some(path) => {
                let text = std::fs::read_to_string(path).map_err(|e| {
                    ServerError::Config(format!("cannot read {}: {e}", path.display()))
                })?;
                Self::from_toml_str(&text)?
            }
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Apply overrides looked up through `var` (keys include the prefix).
    ///
    /// Recognised: `BIND_ADDR`, `API_URL`, `MAX_BODY_BYTES`,
    /// `REQUEST_TIMEOUT_SECS`, and `STORAGE_ROOT` (switches to the
    /// filesystem backend).
    pub fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) -> ServerResult<()> {
        let get = |name: &str| var(&format!("{ENV_PREFIX}{name}")).filter(|v| !v.is_empty());

        if let Some(v) = get("BIND_ADDR") {
            self.bind_addr = parse_env("BIND_ADDR", &v)?;
        }
        if let Some(v) = get("API_URL") {
            self.api_url = Some(v.trim_end_matches('/').to_string());
        }
        if let Some(v) = get("MAX_BODY_BYTES") {
            self.max_body_bytes = parse_env("MAX_BODY_BYTES", &v)?;
        }
        if let Some(v) = get("REQUEST_TIMEOUT_SECS") {
            self.request_timeout_secs = parse_env("REQUEST_TIMEOUT_SECS", &v)?;
        }
        if let Some(v) = get("STORAGE_ROOT") {
            self.storage = StorageConfig::Filesystem { root: v.into() };
        }
        Ok(())
    }

    pub fn build_storage(&self) -> Storage {
        match &self.storage {
            StorageConfig::Memory => Storage::in_memory(),
            StorageConfig::Filesystem { root } => Storage::filesystem(root),
        }
    }

    pub fn build_auth(&self) -> Arc<dyn AuthProvider> {
        match &self.auth {
            AuthConfig::AllowAll => Arc::new(AllowAllAuth),
            AuthConfig::Basic { users } => Arc::new(BasicUsersAuth::new(users.clone())),
        }
    }
}

fn parse_env<T: std::str::FromStr>(name: &str, value: &str) -> ServerResult<T>
where
    T::Err: std::fmt::Display,
{
    value
        .parse()
        .map_err(|e| ServerError::Config(format!("{ENV_PREFIX}{name}={value}: {e}")))
}
