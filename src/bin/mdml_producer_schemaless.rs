//! Schemaless producer: publishes one JSON object as text

use clap::Parser;
use mdml_streams::mdml::cli::{self, ConnectionArgs};
use mdml_streams::{
    produce_schemaless, schemaless_example, KafkaProducer, MdmlError, MdmlResult,
    SCHEMALESS_TOPIC,
};
use serde_json::Value;
use std::process::ExitCode;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "mdml-producer-schemaless")]
#[command(about = "Publish a JSON message without a schema")]
#[command(version)]
struct Cli {
    #[command(flatten)]
    connection: ConnectionArgs,

    #[arg(long, short = 't', default_value = SCHEMALESS_TOPIC)]
    topic: String,

    /// JSON text to publish [default: {"string": "Hello world", "number": 12.345}]
    #[arg(long)]
    message: Option<String>,
}

async fn run(cli: Cli) -> MdmlResult<()> {
    let settings = cli.connection.settings()?;
    let message: Value = match &cli.message {
        Some(text) => serde_json::from_str(text)
            .map_err(|e| MdmlError::config(format!("--message is not valid JSON: {}", e)))?,
        None => schemaless_example(),
    };

    let mut producer = KafkaProducer::new(settings.kafka_config());
    produce_schemaless(&mut producer, &cli.topic, &[message], Duration::ZERO).await?;
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    cli::init_logging();
    cli::exit_code(run(Cli::parse()).await)
}
