//! Pieces shared by the command-line entry points

use clap::Args;
use log::error;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use crate::mdml::config::ClientSettings;
use crate::mdml::error::{MdmlError, MdmlResult};
use crate::mdml::flows::consumer::{ConsumeOptions, DecodeFailurePolicy};
use crate::mdml::kafka::common_config::{BrokerEndpoints, OffsetReset};
use crate::mdml::schema::client::SchemaRegistryClient;

/// Broker connection flags
#[derive(Debug, Clone, Default, Args)]
pub struct ConnectionArgs {
    /// YAML settings file (falls back to $MDML_CONFIG)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Comma separated broker list, e.g. localhost:9092
    #[arg(long)]
    pub brokers: Option<String>,

    #[arg(long)]
    pub client_id: Option<String>,
}

impl ConnectionArgs {
    /// Settings from defaults, file and environment, with these flags applied on top
    pub fn settings(&self) -> MdmlResult<ClientSettings> {
        let mut settings = ClientSettings::load(self.config.as_deref())?;
        if let Some(brokers) = &self.brokers {
            settings.brokers = BrokerEndpoints::parse(brokers)
                .map_err(|e| MdmlError::config(format!("--brokers: {}", e)))?;
        }
        if let Some(client_id) = &self.client_id {
            settings.client_id = client_id.clone();
        }
        settings.validate()?;
        Ok(settings)
    }
}

#[derive(Debug, Clone, Default, Args)]
pub struct RegistryArgs {
    /// Schema registry URL [default: http://<first broker host>:8081]
    #[arg(long = "schema-registry")]
    pub schema_registry: Option<String>,

    /// Registry basic-auth user; the password comes from the settings or --registry-password
    #[arg(long)]
    pub registry_username: Option<String>,

    #[arg(long)]
    pub registry_password: Option<String>,

    /// Registry bearer token
    #[arg(long)]
    pub registry_token: Option<String>,
}

impl RegistryArgs {
    pub fn apply(&self, settings: &mut ClientSettings) -> MdmlResult<()> {
        if let Some(url) = &self.schema_registry {
            settings.schema_registry_url = Some(url.clone());
        }
        if let Some(username) = &self.registry_username {
            settings.schema_registry_username = Some(username.clone());
        }
        if let Some(password) = &self.registry_password {
            settings.schema_registry_password = Some(password.clone());
        }
        if let Some(token) = &self.registry_token {
            settings.schema_registry_token = Some(token.clone());
        }
        settings.validate()
    }
}

/// Flags common to both consumers
#[derive(Debug, Clone, Args)]
pub struct ConsumeArgs {
    /// Topic to consume; repeat for several topics
    #[arg(long = "topic", short = 't')]
    pub topics: Vec<String>,

    /// Consumer group id [default: from settings]
    #[arg(long, short = 'g')]
    pub group: Option<String>,

    /// Start from the latest offset when the group has none committed
    #[arg(long)]
    pub latest: bool,

    /// Stop after this many seconds without a message
    #[arg(long)]
    pub timeout_secs: Option<u64>,

    /// Stop after this many messages
    #[arg(long)]
    pub max_messages: Option<usize>,

    /// What to do with undecodable messages: skip or fail
    #[arg(long, default_value = "skip")]
    pub on_decode_error: DecodeFailurePolicy,
}

impl ConsumeArgs {
    /// Applies the group and offset flags to `settings`
    pub fn apply(&self, settings: &mut ClientSettings) -> MdmlResult<()> {
        if let Some(group) = &self.group {
            settings.group_id = group.clone();
        }
        if self.latest {
            settings.auto_offset_reset = OffsetReset::Latest;
        }
        settings.validate()
    }

    pub fn options(&self, default_topic: &str) -> ConsumeOptions {
        let topics = if self.topics.is_empty() {
            vec![default_topic.to_string()]
        } else {
            self.topics.clone()
        };
        ConsumeOptions {
            topics,
            idle_timeout: self.timeout_secs.map(Duration::from_secs),
            max_messages: self.max_messages,
            on_decode_error: self.on_decode_error,
        }
    }
}

pub fn registry_client(settings: &ClientSettings) -> MdmlResult<SchemaRegistryClient> {
    SchemaRegistryClient::with_config(&settings.registry_url(), settings.registry_client_config())
        .map_err(|e| MdmlError::config(e.to_string()))
}

/// Logs to stderr at `info` unless `RUST_LOG` says otherwise
pub fn init_logging() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
}

/// Exit status for a finished flow: 0 on success, 1 after logging the error
pub fn exit_code<T>(result: MdmlResult<T>) -> ExitCode {
    match result {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e.report());
            ExitCode::FAILURE
        }
    }
}
