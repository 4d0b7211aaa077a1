//! Schema-registered producer
//!
//! Registers the example JSON Schema, then publishes `--count` example records
//! encoded against it.

use clap::Parser;
use log::info;
use mdml_streams::mdml::cli::{self, ConnectionArgs, RegistryArgs};
use mdml_streams::{
    produce_with_schema, ExampleRecord, KafkaProducer, MdmlResult, RegistrySerde,
    SchemaProducerJob, EXAMPLE_TOPIC,
};
use std::process::ExitCode;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "mdml-producer")]
#[command(about = "Publish example records encoded against a registered JSON Schema")]
#[command(version)]
struct Cli {
    #[command(flatten)]
    connection: ConnectionArgs,

    #[command(flatten)]
    registry: RegistryArgs,

    #[arg(long, short = 't', default_value = EXAMPLE_TOPIC)]
    topic: String,

    /// Schema subject [default: <topic>-value]
    #[arg(long)]
    subject: Option<String>,

    /// Number of records to publish
    #[arg(long, short = 'n', default_value_t = 1)]
    count: usize,

    /// Milliseconds to wait between records
    #[arg(long, default_value_t = 0)]
    interval_ms: u64,
}

async fn run(cli: Cli) -> MdmlResult<()> {
    let mut settings = cli.connection.settings()?;
    cli.registry.apply(&mut settings)?;

    let serde = RegistrySerde::new(cli::registry_client(&settings)?);
    let mut producer = KafkaProducer::new(settings.kafka_config());

    let mut job = SchemaProducerJob::new(&cli.topic)
        .with_interval(Duration::from_millis(cli.interval_ms));
    if let Some(subject) = cli.subject {
        job = job.with_subject(subject);
    }

    let records: Vec<ExampleRecord> = (0..cli.count)
        .map(|_| ExampleRecord::hello_world())
        .collect();
    let summary = produce_with_schema(&mut producer, &serde, &job, &records).await?;

    for report in &summary.deliveries {
        info!(
            "sent to {}[{}]@{}",
            report.topic, report.partition, report.offset
        );
    }
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    cli::init_logging();
    cli::exit_code(run(Cli::parse()).await)
}
