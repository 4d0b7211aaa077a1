// Unit tests - no external services; brokers and registries are in-process or mocked

pub mod config_test;
pub mod producer_flow_test;
pub mod registry_client_test;
