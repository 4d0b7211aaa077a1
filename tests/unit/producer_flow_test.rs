use crate::common::*;
use async_trait::async_trait;
use mdml_streams::{
    produce_schemaless, produce_with_schema, schemaless_example, DeliveryReport,
    KafkaClientError,
};

/// Producer double that connects but rejects every send
#[derive(Default)]
struct RejectingProducer {
    connected: bool,
    disconnects: usize,
}

#[async_trait]
impl BrokerProducer for RejectingProducer {
    async fn connect(&mut self) -> Result<(), KafkaClientError> {
        self.connected = true;
        Ok(())
    }

    async fn send(
        &mut self,
        topic: &str,
        _messages: Vec<OutgoingMessage>,
    ) -> Result<Vec<DeliveryReport>, KafkaClientError> {
        Err(KafkaClientError::Delivery {
            topic: topic.to_string(),
            reason: "message too large".to_string(),
        })
    }

    async fn disconnect(&mut self) -> Result<(), KafkaClientError> {
        self.connected = false;
        self.disconnects += 1;
        Ok(())
    }
}

#[tokio::test]
async fn test_schema_producer_publishes_framed_record() {
    init_logger();
    let broker = MemoryBroker::new();
    let (_, serde) = registry();
    let mut producer = broker.producer();

    let summary = produce_with_schema(
        &mut producer,
        &serde,
        &SchemaProducerJob::default(),
        &[hello_record()],
    )
    .await
    .unwrap();

    let schema_id = summary.schema_id.unwrap();
    assert_eq!(summary.deliveries.len(), 1);
    assert_eq!(summary.deliveries[0].topic, EXAMPLE_TOPIC);

    let stored = broker.messages(EXAMPLE_TOPIC);
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].key, None);
    assert_eq!(&stored[0].value[..5], &[0, 0, 0, 0, schema_id as u8]);
    assert_eq!(broker.open_connections(), 0);
}

#[tokio::test]
async fn test_schema_producer_uses_topic_value_subject() {
    let broker = MemoryBroker::new();
    let (registry, serde) = registry();
    let mut producer = broker.producer();

    let job = SchemaProducerJob::new("sensors");
    assert_eq!(job.subject, "sensors-value");
    produce_with_schema(&mut producer, &serde, &job, &[hello_record()])
        .await
        .unwrap();

    assert_eq!(registry.subject_versions("sensors-value").len(), 1);
    assert!(registry.subject_versions(EXAMPLE_SUBJECT).is_empty());
}

#[tokio::test]
async fn test_repeated_runs_reuse_schema_id() {
    let broker = MemoryBroker::new();
    let (_, serde) = registry();
    let job = SchemaProducerJob::default();

    let first = produce_with_schema(&mut broker.producer(), &serde, &job, &[hello_record()])
        .await
        .unwrap();
    let second = produce_with_schema(&mut broker.producer(), &serde, &job, &[hello_record()])
        .await
        .unwrap();

    assert_eq!(first.schema_id, second.schema_id);
    assert_eq!(broker.messages(EXAMPLE_TOPIC).len(), 2);
}

#[tokio::test]
async fn test_sequence_is_published_in_order() {
    let broker = MemoryBroker::new();
    let (_, serde) = registry();
    let records: Vec<ExampleRecord> = (0..3)
        .map(|i| ExampleRecord {
            time: Some(f64::from(i)),
            description_string: format!("record {}", i),
            some_value: i as f64,
        })
        .collect();
    let job = SchemaProducerJob::default().with_interval(Duration::from_millis(5));

    let summary = produce_with_schema(&mut broker.producer(), &serde, &job, &records)
        .await
        .unwrap();

    let offsets: Vec<i64> = summary.deliveries.iter().map(|d| d.offset).collect();
    assert_eq!(offsets, vec![0, 1, 2]);
    for (i, stored) in broker.messages(EXAMPLE_TOPIC).iter().enumerate() {
        let decoded: ExampleRecord = serde.decode_as(&stored.value).await.unwrap();
        assert_eq!(decoded, records[i]);
    }
}

#[tokio::test]
async fn test_invalid_payload_is_encoding_error_and_disconnects() {
    let broker = MemoryBroker::new();
    let (_, serde) = registry();
    let mut producer = broker.producer();

    let err = produce_with_schema(
        &mut producer,
        &serde,
        &SchemaProducerJob::default(),
        &[json!({"description_string": "missing value"})],
    )
    .await
    .unwrap_err();

    assert!(matches!(err, MdmlError::Encoding { schema_id: Some(_), .. }));
    assert!(broker.messages(EXAMPLE_TOPIC).is_empty());
    assert_eq!(broker.open_connections(), 0);
}

#[tokio::test]
async fn test_malformed_schema_is_registration_error() {
    let broker = MemoryBroker::new();
    let (_, serde) = registry();
    let job = SchemaProducerJob::default().with_schema("{ not json");

    let err = produce_with_schema(&mut broker.producer(), &serde, &job, &[hello_record()])
        .await
        .unwrap_err();

    assert!(matches!(err, MdmlError::SchemaRegistration { .. }));
    assert_eq!(broker.open_connections(), 0);
}

#[tokio::test]
async fn test_unreachable_registry_is_connection_error() {
    let broker = MemoryBroker::new();
    let (registry, serde) = registry();
    registry.set_reachable(false);

    let err = produce_with_schema(
        &mut broker.producer(),
        &serde,
        &SchemaProducerJob::default(),
        &[hello_record()],
    )
    .await
    .unwrap_err();

    assert!(err.is_connection());
    assert!(broker.messages(EXAMPLE_TOPIC).is_empty());
}

#[tokio::test]
async fn test_unreachable_broker_is_connection_error() {
    let broker = MemoryBroker::new();
    broker.set_reachable(false);
    let (_, serde) = registry();

    let err = produce_with_schema(
        &mut broker.producer(),
        &serde,
        &SchemaProducerJob::default(),
        &[hello_record()],
    )
    .await
    .unwrap_err();

    assert!(err.is_connection());
    assert_eq!(broker.open_connections(), 0);
}

#[tokio::test]
async fn test_publish_failure_disconnects() {
    let (_, serde) = registry();
    let mut producer = RejectingProducer::default();

    let err = produce_with_schema(
        &mut producer,
        &serde,
        &SchemaProducerJob::default(),
        &[hello_record()],
    )
    .await
    .unwrap_err();

    assert!(matches!(err, MdmlError::Publish { ref topic, .. } if topic == EXAMPLE_TOPIC));
    assert!(!producer.connected);
    assert_eq!(producer.disconnects, 1);
}

#[tokio::test]
async fn test_schemaless_producer_publishes_json_text() {
    let broker = MemoryBroker::new();
    let mut producer = broker.producer();

    let summary = produce_schemaless(
        &mut producer,
        SCHEMALESS_TOPIC,
        &[schemaless_example()],
        Duration::ZERO,
    )
    .await
    .unwrap();

    assert_eq!(summary.schema_id, None);
    let stored = broker.messages(SCHEMALESS_TOPIC);
    let parsed: Value = serde_json::from_slice(&stored[0].value).unwrap();
    assert_eq!(parsed, json!({"string": "Hello world", "number": 12.345}));
    assert_eq!(broker.open_connections(), 0);
}

#[tokio::test]
async fn test_schemaless_publish_failure_disconnects() {
    let mut producer = RejectingProducer::default();

    let err = produce_schemaless(
        &mut producer,
        SCHEMALESS_TOPIC,
        &[schemaless_example()],
        Duration::ZERO,
    )
    .await
    .unwrap_err();

    assert!(matches!(err, MdmlError::Publish { .. }));
    assert_eq!(producer.disconnects, 1);
}
