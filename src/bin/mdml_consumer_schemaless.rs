//! Schemaless consumer: parses each value as JSON text

use clap::Parser;
use mdml_streams::mdml::cli::{self, ConnectionArgs, ConsumeArgs};
use mdml_streams::{consume_schemaless, KafkaConsumer, MdmlResult, SCHEMALESS_TOPIC};
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "mdml-consumer-schemaless")]
#[command(about = "Consume JSON text messages without a schema")]
#[command(version)]
struct Cli {
    #[command(flatten)]
    connection: ConnectionArgs,

    #[command(flatten)]
    consume: ConsumeArgs,
}

async fn run(cli: Cli) -> MdmlResult<()> {
    let mut settings = cli.connection.settings()?;
    cli.consume.apply(&mut settings)?;

    let options = cli.consume.options(SCHEMALESS_TOPIC);
    let mut consumer = KafkaConsumer::new(
        settings.kafka_config(),
        settings.group_id.clone(),
        settings.auto_offset_reset,
    );

    consume_schemaless(&mut consumer, &options, |_topic, _partition, message| {
        println!("Message: {}", message.value);
        if let Some(text) = message.value.get("string") {
            println!("Message string part: {}", text);
        }
        if let Some(number) = message.value.get("number") {
            println!("Message number part: {}", number);
        }
    })
    .await?;
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    cli::init_logging();
    cli::exit_code(run(Cli::parse()).await)
}
