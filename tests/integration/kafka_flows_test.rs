use mdml_streams::{
    consume_schemaless, consume_with_schema, produce_schemaless, produce_with_schema,
    schemaless_example, BrokerEndpoints, ClientSettings, ConsumeOptions, ExampleRecord,
    KafkaConsumer, KafkaProducer, OffsetReset, RegistrySerde, SchemaProducerJob,
    SchemaRegistryClient, EXAMPLE_SCHEMA,
};
use serial_test::serial;
use std::net::TcpStream;
use std::time::Duration;
use uuid::Uuid;

const BROKER: &str = "localhost:9092";

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn is_kafka_running() -> bool {
    match TcpStream::connect(BROKER) {
        Ok(_) => true,
        Err(_) => {
            println!("WARNING: Kafka is not running at {}", BROKER);
            println!("Tests requiring Kafka will be skipped.");
            false
        }
    }
}

fn settings() -> ClientSettings {
    ClientSettings {
        brokers: BrokerEndpoints::parse(BROKER).unwrap(),
        ..ClientSettings::default()
    }
}

fn generate_topic(prefix: &str) -> String {
    format!("{}-{}", prefix, Uuid::new_v4())
}

#[tokio::test]
#[ignore]
#[serial]
async fn test_schema_flow_against_live_cluster() {
    init_logger();
    if !is_kafka_running() {
        return;
    }
    let settings = settings();
    let topic = generate_topic("mdml-example-kafkajs");
    let serde = RegistrySerde::new(SchemaRegistryClient::new(&settings.registry_url()).unwrap());
    let record = ExampleRecord::hello_world();

    let mut producer = KafkaProducer::new(settings.kafka_config());
    let job = SchemaProducerJob::new(&topic);
    produce_with_schema(&mut producer, &serde, &job, &[record.clone()])
        .await
        .unwrap();

    let mut consumer = KafkaConsumer::new(
        settings.kafka_config(),
        format!("test-group-{}", Uuid::new_v4()),
        OffsetReset::Earliest,
    );
    let options = ConsumeOptions::new([topic.clone()])
        .with_idle_timeout(Duration::from_secs(10))
        .with_max_messages(1);
    let mut received = Vec::new();
    consume_with_schema(
        &mut consumer,
        &serde,
        &job.subject,
        EXAMPLE_SCHEMA,
        &options,
        |_, _, message| received.push(message.into_value()),
    )
    .await
    .unwrap();

    assert_eq!(received.len(), 1);
    let decoded: ExampleRecord = serde_json::from_value(received.remove(0)).unwrap();
    assert_eq!(decoded, record);
}

#[tokio::test]
#[ignore]
#[serial]
async fn test_schemaless_flow_against_live_cluster() {
    init_logger();
    if !is_kafka_running() {
        return;
    }
    let settings = settings();
    let topic = generate_topic("mdml-kafkajs-test-topic");

    let mut producer = KafkaProducer::new(settings.kafka_config());
    produce_schemaless(&mut producer, &topic, &[schemaless_example()], Duration::ZERO)
        .await
        .unwrap();

    let mut consumer = KafkaConsumer::new(
        settings.kafka_config(),
        format!("test-{}", Uuid::new_v4()),
        OffsetReset::Earliest,
    );
    let options = ConsumeOptions::new([topic.clone()])
        .with_idle_timeout(Duration::from_secs(10))
        .with_max_messages(1);
    let mut received = Vec::new();
    consume_schemaless(&mut consumer, &options, |_, _, message| {
        received.push(message.into_value())
    })
    .await
    .unwrap();

    assert_eq!(received, vec![schemaless_example()]);
}

#[tokio::test]
#[ignore]
async fn test_unreachable_broker_fails_connect() {
    init_logger();
    let settings = ClientSettings {
        brokers: BrokerEndpoints::parse("127.0.0.1:1").unwrap(),
        request_timeout_ms: 2_000,
        ..ClientSettings::default()
    };

    let mut producer = KafkaProducer::new(settings.kafka_config());
    let err = produce_schemaless(&mut producer, "unused", &[schemaless_example()], Duration::ZERO)
        .await
        .unwrap_err();
    assert!(err.is_connection());
}
