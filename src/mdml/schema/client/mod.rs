pub mod memory;
pub mod registry_client;

pub use memory::InMemorySchemaRegistry;
pub use registry_client::{AuthConfig, RegistryClientConfig, SchemaRegistry, SchemaRegistryClient};
