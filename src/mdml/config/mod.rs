//! Client settings shared by every flow
//!
//! Settings are layered: built-in defaults, then an optional YAML file, then
//! `MDML_*` environment variables. The binaries apply their command-line flags last.
//!
//! ```yaml
//! brokers:
//!   - "kafka-1:9092"
//!   - "kafka-2:9092"
//! schema_registry_url: "http://schema-registry:8081"
//! schema_registry_username: "mdml"
//! schema_registry_password: "secret"
//! group_id: "test-group"
//! auto_offset_reset: latest
//! ```

use log::debug;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::mdml::error::{MdmlError, MdmlResult};
use crate::mdml::kafka::common_config::{BrokerEndpoints, CommonKafkaConfig, OffsetReset};
use crate::mdml::schema::client::{AuthConfig, RegistryClientConfig};

pub const ENV_BROKERS: &str = "MDML_KAFKA_BROKERS";
pub const ENV_SCHEMA_REGISTRY_URL: &str = "MDML_SCHEMA_REGISTRY_URL";
pub const ENV_SCHEMA_REGISTRY_USERNAME: &str = "MDML_SCHEMA_REGISTRY_USERNAME";
pub const ENV_SCHEMA_REGISTRY_PASSWORD: &str = "MDML_SCHEMA_REGISTRY_PASSWORD";
pub const ENV_SCHEMA_REGISTRY_TOKEN: &str = "MDML_SCHEMA_REGISTRY_TOKEN";
pub const ENV_CLIENT_ID: &str = "MDML_CLIENT_ID";
pub const ENV_GROUP_ID: &str = "MDML_GROUP_ID";
pub const ENV_REQUEST_TIMEOUT_MS: &str = "MDML_REQUEST_TIMEOUT_MS";
pub const ENV_AUTO_OFFSET_RESET: &str = "MDML_AUTO_OFFSET_RESET";
/// Path of a YAML settings file, used when no path is given explicitly
pub const ENV_CONFIG: &str = "MDML_CONFIG";

const DEFAULT_REGISTRY_PORT: u16 = 8081;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ClientSettings {
    pub brokers: BrokerEndpoints,
    /// Defaults to port 8081 on the first broker's host
    pub schema_registry_url: Option<String>,
    /// Basic auth for the registry; requires `schema_registry_password`
    pub schema_registry_username: Option<String>,
    pub schema_registry_password: Option<String>,
    /// Bearer token for the registry, exclusive with basic auth
    pub schema_registry_token: Option<String>,
    pub client_id: String,
    pub group_id: String,
    pub request_timeout_ms: u64,
    pub auto_offset_reset: OffsetReset,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            brokers: BrokerEndpoints::default(),
            schema_registry_url: None,
            schema_registry_username: None,
            schema_registry_password: None,
            schema_registry_token: None,
            client_id: "mdml-streams".to_string(),
            group_id: "test-group".to_string(),
            request_timeout_ms: 30_000,
            auto_offset_reset: OffsetReset::Earliest,
        }
    }
}

impl ClientSettings {
    pub fn from_yaml_str(yaml: &str) -> MdmlResult<Self> {
        let settings: Self = serde_yaml::from_str(yaml)
            .map_err(|e| MdmlError::config(format!("invalid settings: {}", e)))?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn from_file(path: &Path) -> MdmlResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            MdmlError::config(format!("cannot read settings file {}: {}", path.display(), e))
        })?;
        Self::from_yaml_str(&content).map_err(|e| match e {
            MdmlError::Config { message } => {
                MdmlError::config(format!("{}: {}", path.display(), message))
            }
            other => other,
        })
    }

    /// Loads defaults, then `path` (or the file named by `MDML_CONFIG`), then the environment
    pub fn load(path: Option<&Path>) -> MdmlResult<Self> {
        let path = path
            .map(Path::to_path_buf)
            .or_else(|| std::env::var_os(ENV_CONFIG).map(PathBuf::from));
        let mut settings = match path {
            Some(path) => {
                debug!("Loading settings from {}", path.display());
                Self::from_file(&path)?
            }
            None => Self::default(),
        };
        settings.apply_env()?;
        Ok(settings)
    }

    pub fn apply_env(&mut self) -> MdmlResult<()> {
        self.apply_overrides(|name| std::env::var(name).ok())
    }

    /// Overrides fields from the `MDML_*` variables `lookup` returns
    pub fn apply_overrides<F>(&mut self, lookup: F) -> MdmlResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        if let Some(brokers) = lookup(ENV_BROKERS) {
            self.brokers = BrokerEndpoints::parse(&brokers)
                .map_err(|e| MdmlError::config(format!("{}: {}", ENV_BROKERS, e)))?;
        }
        if let Some(url) = lookup(ENV_SCHEMA_REGISTRY_URL) {
            self.schema_registry_url = Some(url.trim().to_string());
        }
        if let Some(username) = lookup(ENV_SCHEMA_REGISTRY_USERNAME) {
            self.schema_registry_username = Some(username);
        }
        if let Some(password) = lookup(ENV_SCHEMA_REGISTRY_PASSWORD) {
            self.schema_registry_password = Some(password);
        }
        if let Some(token) = lookup(ENV_SCHEMA_REGISTRY_TOKEN) {
            self.schema_registry_token = Some(token);
        }
        if let Some(client_id) = lookup(ENV_CLIENT_ID) {
            self.client_id = client_id;
        }
        if let Some(group_id) = lookup(ENV_GROUP_ID) {
            self.group_id = group_id;
        }
        if let Some(timeout) = lookup(ENV_REQUEST_TIMEOUT_MS) {
            self.request_timeout_ms = timeout.trim().parse().map_err(|_| {
                MdmlError::config(format!(
                    "{} must be a number of milliseconds, got '{}'",
                    ENV_REQUEST_TIMEOUT_MS, timeout
                ))
            })?;
        }
        if let Some(reset) = lookup(ENV_AUTO_OFFSET_RESET) {
            self.auto_offset_reset = reset
                .parse()
                .map_err(|e| MdmlError::config(format!("{}: {}", ENV_AUTO_OFFSET_RESET, e)))?;
        }
        self.validate()
    }

    pub fn validate(&self) -> MdmlResult<()> {
        if self.client_id.trim().is_empty() {
            return Err(MdmlError::config("client_id must not be empty"));
        }
        if self.group_id.trim().is_empty() {
            return Err(MdmlError::config("group_id must not be empty"));
        }
        if self.request_timeout_ms == 0 {
            return Err(MdmlError::config("request_timeout_ms must be positive"));
        }
        if let Some(url) = &self.schema_registry_url {
            let parsed = reqwest::Url::parse(url).map_err(|e| {
                MdmlError::config(format!("invalid schema registry URL '{}': {}", url, e))
            })?;
            if !matches!(parsed.scheme(), "http" | "https") {
                return Err(MdmlError::config(format!(
                    "schema registry URL '{}' must use http or https",
                    url
                )));
            }
        }
        match (
            &self.schema_registry_username,
            &self.schema_registry_password,
            &self.schema_registry_token,
        ) {
            (Some(_), _, Some(_)) => Err(MdmlError::config(
                "schema registry basic auth and bearer token are mutually exclusive",
            )),
            (Some(_), None, _) | (None, Some(_), _) => Err(MdmlError::config(
                "schema registry basic auth needs both a username and a password",
            )),
            _ => Ok(()),
        }
    }

    /// Explicit registry URL, or `http://<first broker host>:8081`
    pub fn registry_url(&self) -> String {
        match &self.schema_registry_url {
            Some(url) => url.clone(),
            None => format!(
                "http://{}:{}",
                self.brokers.first_host(),
                DEFAULT_REGISTRY_PORT
            ),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn kafka_config(&self) -> CommonKafkaConfig {
        CommonKafkaConfig::new(self.brokers.clone())
            .client_id(self.client_id.clone())
            .request_timeout(self.request_timeout())
    }

    pub fn registry_auth(&self) -> AuthConfig {
        match (
            &self.schema_registry_username,
            &self.schema_registry_password,
            &self.schema_registry_token,
        ) {
            (Some(username), Some(password), _) => AuthConfig::Basic {
                username: username.clone(),
                password: password.clone(),
            },
            (_, _, Some(token)) => AuthConfig::Bearer {
                token: token.clone(),
            },
            _ => AuthConfig::None,
        }
    }

    pub fn registry_client_config(&self) -> RegistryClientConfig {
        RegistryClientConfig {
            timeout: self.request_timeout(),
            auth: self.registry_auth(),
        }
    }
}
