use rdkafka::config::ClientConfig;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::mdml::kafka::utils::rdkafka_log_level_property;

/// Error raised when a broker endpoint list cannot be used
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EndpointError {
    #[error("broker list is empty")]
    Empty,
    #[error("invalid broker endpoint '{endpoint}': {reason}")]
    Invalid { endpoint: String, reason: String },
}

/// Ordered, non-empty list of `host:port` broker addresses
///
/// The list is validated once on construction and never changes afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct BrokerEndpoints(Vec<String>);

impl BrokerEndpoints {
    pub fn new<I, S>(endpoints: I) -> Result<Self, EndpointError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let endpoints: Vec<String> = endpoints
            .into_iter()
            .map(|e| e.into().trim().to_string())
            .collect();
        if endpoints.is_empty() {
            return Err(EndpointError::Empty);
        }
        for endpoint in &endpoints {
            validate_endpoint(endpoint)?;
        }
        Ok(Self(endpoints))
    }

    /// Parses a comma separated list such as `broker1:9092,broker2:9092`
    pub fn parse(list: &str) -> Result<Self, EndpointError> {
        Self::new(list.split(',').filter(|s| !s.trim().is_empty()))
    }

    /// Value for librdkafka's `bootstrap.servers`
    pub fn bootstrap_servers(&self) -> String {
        self.0.join(",")
    }

    /// Host part of the first endpoint
    pub fn first_host(&self) -> &str {
        // validated: every endpoint has a non-empty host before the last ':'
        self.0[0]
            .rsplit_once(':')
            .map(|(host, _)| host)
            .unwrap_or(&self.0[0])
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }
}

fn validate_endpoint(endpoint: &str) -> Result<(), EndpointError> {
    let invalid = |reason: &str| EndpointError::Invalid {
        endpoint: endpoint.to_string(),
        reason: reason.to_string(),
    };
    let (host, port) = endpoint
        .rsplit_once(':')
        .ok_or_else(|| invalid("missing port"))?;
    if host.is_empty() || (host.contains(':') && !host.starts_with('[')) {
        return Err(invalid("missing or malformed host"));
    }
    port.parse::<u16>()
        .map_err(|_| invalid("port must be a number between 0 and 65535"))?;
    Ok(())
}

impl Default for BrokerEndpoints {
    /// A single local broker, `localhost:9092`
    fn default() -> Self {
        Self(vec!["localhost:9092".to_string()])
    }
}

impl TryFrom<Vec<String>> for BrokerEndpoints {
    type Error = EndpointError;

    fn try_from(value: Vec<String>) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<BrokerEndpoints> for Vec<String> {
    fn from(value: BrokerEndpoints) -> Self {
        value.0
    }
}

impl fmt::Display for BrokerEndpoints {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.bootstrap_servers())
    }
}

/// Where a consumer group without committed offsets starts reading
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OffsetReset {
    #[default]
    Earliest,
    Latest,
}

impl OffsetReset {
    pub fn as_str(&self) -> &'static str {
        match self {
            OffsetReset::Earliest => "earliest",
            OffsetReset::Latest => "latest",
        }
    }
}

impl FromStr for OffsetReset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "earliest" => Ok(OffsetReset::Earliest),
            "latest" => Ok(OffsetReset::Latest),
            other => Err(format!(
                "unknown offset reset '{}', expected 'earliest' or 'latest'",
                other
            )),
        }
    }
}

/// Configuration shared between producers and consumers
#[derive(Debug, Clone)]
pub struct CommonKafkaConfig {
    pub brokers: BrokerEndpoints,
    pub client_id: Option<String>,
    /// Request timeout for Kafka operations, also used as the connect probe timeout
    pub request_timeout: Duration,
    /// Additional librdkafka properties, applied last
    pub custom_config: HashMap<String, String>,
}

impl CommonKafkaConfig {
    pub fn new(brokers: BrokerEndpoints) -> Self {
        Self {
            brokers,
            client_id: None,
            request_timeout: Duration::from_secs(30),
            custom_config: HashMap::new(),
        }
    }

    pub fn client_id(mut self, client_id: impl Into<String>) -> Self {
        self.client_id = Some(client_id.into());
        self
    }

    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn custom_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.custom_config.insert(key.into(), value.into());
        self
    }

    fn base_client_config(&self) -> ClientConfig {
        let mut config = ClientConfig::new();
        config
            .set("bootstrap.servers", self.brokers.bootstrap_servers())
            .set(
                "request.timeout.ms",
                self.request_timeout.as_millis().to_string(),
            )
            .set("log_level", rdkafka_log_level_property());
        if let Some(client_id) = &self.client_id {
            config.set("client.id", client_id);
        }
        config
    }

    fn apply_custom(&self, config: &mut ClientConfig) {
        for (key, value) in &self.custom_config {
            config.set(key, value);
        }
    }

    /// librdkafka configuration for a producer
    pub fn producer_client_config(&self) -> ClientConfig {
        let mut config = self.base_client_config();
        config.set(
            "message.timeout.ms",
            self.request_timeout.as_millis().to_string(),
        );
        self.apply_custom(&mut config);
        config
    }

    /// librdkafka configuration for a consumer in `group_id`
    pub fn consumer_client_config(
        &self,
        group_id: &str,
        offset_reset: OffsetReset,
    ) -> ClientConfig {
        let mut config = self.base_client_config();
        config
            .set("group.id", group_id)
            .set("auto.offset.reset", offset_reset.as_str())
            .set("enable.auto.commit", "true");
        self.apply_custom(&mut config);
        config
    }
}
