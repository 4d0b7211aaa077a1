//! Schema Registry Client Implementation
//!
//! HTTP client for the Confluent Schema Registry REST API, plus the
//! [`SchemaRegistry`] seam shared with the in-memory registry.

use async_trait::async_trait;
use log::{debug, info};
use reqwest::{Client, RequestBuilder, Response, StatusCode, Url};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::mdml::schema::error::{SchemaError, SchemaResult};
use crate::mdml::schema::types::{RegisteredSchema, SchemaType};

const CONTENT_TYPE: &str = "application/vnd.schemaregistry.v1+json";

/// Operations the flows need from a schema registry
#[async_trait]
pub trait SchemaRegistry: Send + Sync {
    /// Registers `schema` under `subject`, returning its id
    ///
    /// Registering content that is already registered returns the existing id.
    async fn register(
        &self,
        schema_type: SchemaType,
        schema: &str,
        subject: &str,
    ) -> SchemaResult<u32>;

    /// Looks up a schema by id
    async fn get_schema(&self, id: u32) -> SchemaResult<RegisteredSchema>;
}

#[async_trait]
impl<T: SchemaRegistry + ?Sized> SchemaRegistry for Arc<T> {
    async fn register(
        &self,
        schema_type: SchemaType,
        schema: &str,
        subject: &str,
    ) -> SchemaResult<u32> {
        (**self).register(schema_type, schema, subject).await
    }

    async fn get_schema(&self, id: u32) -> SchemaResult<RegisteredSchema> {
        (**self).get_schema(id).await
    }
}

/// Configuration for the HTTP client
#[derive(Debug, Clone)]
pub struct RegistryClientConfig {
    pub timeout: Duration,
    pub auth: AuthConfig,
}

impl Default for RegistryClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            auth: AuthConfig::None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthConfig {
    None,
    Basic { username: String, password: String },
    Bearer { token: String },
}

#[derive(Debug, Serialize)]
struct RegisterSchemaRequest<'a> {
    schema: &'a str,
    #[serde(rename = "schemaType", skip_serializing_if = "Option::is_none")]
    schema_type: Option<SchemaType>,
}

#[derive(Debug, Deserialize)]
struct RegisterSchemaResponse {
    id: u32,
}

#[derive(Debug, Deserialize)]
struct SchemaByIdResponse {
    schema: String,
    #[serde(rename = "schemaType", default)]
    schema_type: SchemaType,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error_code: Option<i64>,
    message: Option<String>,
}

/// Confluent Schema Registry client
///
/// Schemas fetched by id are cached for the lifetime of the client; ids are
/// immutable in the registry so entries never go stale.
pub struct SchemaRegistryClient {
    base_url: Url,
    http_client: Client,
    config: RegistryClientConfig,
    cache: RwLock<HashMap<u32, RegisteredSchema>>,
}

impl SchemaRegistryClient {
    pub fn new(base_url: &str) -> SchemaResult<Self> {
        Self::with_config(base_url, RegistryClientConfig::default())
    }

    pub fn with_config(base_url: &str, config: RegistryClientConfig) -> SchemaResult<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| SchemaError::Configuration(format!("invalid URL '{}': {}", base_url, e)))?;
        if base_url.cannot_be_a_base() || !matches!(base_url.scheme(), "http" | "https") {
            return Err(SchemaError::Configuration(format!(
                "'{}' is not an http(s) base URL",
                base_url
            )));
        }
        let http_client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| SchemaError::Configuration(e.to_string()))?;

        Ok(Self {
            base_url,
            http_client,
            config,
            cache: RwLock::new(HashMap::new()),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, segments: &[&str]) -> SchemaResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| {
                SchemaError::Configuration(format!("'{}' cannot be a base", self.base_url))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.config.auth {
            AuthConfig::None => request,
            AuthConfig::Basic { username, password } => {
                request.basic_auth(username, Some(password))
            }
            AuthConfig::Bearer { token } => request.bearer_auth(token),
        }
    }

    async fn execute(&self, request: RequestBuilder) -> SchemaResult<Response> {
        self.authorize(request)
            .header(reqwest::header::ACCEPT, CONTENT_TYPE)
            .send()
            .await
            .map_err(|e| SchemaError::Unreachable {
                url: self.base_url.to_string(),
                reason: e.to_string(),
            })
    }
}

/// Reads a registry error body, falling back to the raw text
async fn error_message(response: Response) -> (StatusCode, Option<i64>, String) {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    match serde_json::from_str::<ErrorResponse>(&body) {
        Ok(ErrorResponse {
            error_code,
            message: Some(message),
        }) => (status, error_code, message),
        _ => (status, None, body),
    }
}

#[async_trait]
impl SchemaRegistry for SchemaRegistryClient {
    async fn register(
        &self,
        schema_type: SchemaType,
        schema: &str,
        subject: &str,
    ) -> SchemaResult<u32> {
        let url = self.endpoint(&["subjects", subject, "versions"])?;
        let body = serde_json::to_vec(&RegisterSchemaRequest {
            schema,
            schema_type: (schema_type != SchemaType::Avro).then_some(schema_type),
        })?;

        let request = self
            .http_client
            .post(url)
            .header(reqwest::header::CONTENT_TYPE, CONTENT_TYPE)
            .body(body);
        let response = self.execute(request).await?;

        if !response.status().is_success() {
            let (status, code, message) = error_message(response).await;
            let rejected =
                status == StatusCode::UNPROCESSABLE_ENTITY || status == StatusCode::CONFLICT;
            return Err(if rejected {
                SchemaError::Rejected {
                    subject: subject.to_string(),
                    reason: match code {
                        Some(code) => format!("{} (error {})", message, code),
                        None => message,
                    },
                }
            } else {
                SchemaError::Registry {
                    status: status.as_u16(),
                    message,
                }
            });
        }

        let registered: RegisterSchemaResponse =
            response.json().await.map_err(|e| SchemaError::Registry {
                status: StatusCode::OK.as_u16(),
                message: format!("Failed to parse registration response: {}", e),
            })?;
        info!(
            "Registered {} schema for subject '{}' with id {}",
            schema_type, subject, registered.id
        );
        Ok(registered.id)
    }

    async fn get_schema(&self, id: u32) -> SchemaResult<RegisteredSchema> {
        if let Some(cached) = self.cache.read().await.get(&id) {
            return Ok(cached.clone());
        }

        let url = self.endpoint(&["schemas", "ids", &id.to_string()])?;
        let response = self.execute(self.http_client.get(url)).await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(SchemaError::NotFound(id));
        }
        if !response.status().is_success() {
            let (status, _, message) = error_message(response).await;
            return Err(SchemaError::Registry {
                status: status.as_u16(),
                message,
            });
        }

        let fetched: SchemaByIdResponse =
            response.json().await.map_err(|e| SchemaError::Registry {
                status: StatusCode::OK.as_u16(),
                message: format!("Failed to parse schema response: {}", e),
            })?;
        let schema = RegisteredSchema {
            id,
            schema_type: fetched.schema_type,
            schema: fetched.schema,
        };
        debug!("Fetched {} schema {} from registry", schema.schema_type, id);

        self.cache.write().await.insert(id, schema.clone());
        Ok(schema)
    }
}
