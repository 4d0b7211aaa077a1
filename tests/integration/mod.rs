// Integration Tests - Require running Kafka and schema registry
// Run with: cargo test --test integration -- --ignored

pub mod kafka_flows_test;
