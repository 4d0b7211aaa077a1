//! Schema-aware consumer
//!
//! Pre-registers the example schema, then prints every record decoded through the
//! schema registry until stopped.

use clap::Parser;
use mdml_streams::mdml::cli::{self, ConnectionArgs, ConsumeArgs, RegistryArgs};
use mdml_streams::{
    consume_with_schema, KafkaConsumer, MdmlResult, RegistrySerde, EXAMPLE_SCHEMA,
    EXAMPLE_TOPIC,
};
use mdml_streams::mdml::schema::topic_value_subject;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "mdml-consumer")]
#[command(about = "Consume and decode schema-registered JSON records")]
#[command(version)]
struct Cli {
    #[command(flatten)]
    connection: ConnectionArgs,

    #[command(flatten)]
    registry: RegistryArgs,

    #[command(flatten)]
    consume: ConsumeArgs,

    /// Subject to pre-register the schema under [default: <first topic>-value]
    #[arg(long)]
    subject: Option<String>,
}

async fn run(cli: Cli) -> MdmlResult<()> {
    let mut settings = cli.connection.settings()?;
    cli.registry.apply(&mut settings)?;
    cli.consume.apply(&mut settings)?;

    let options = cli.consume.options(EXAMPLE_TOPIC);
    let subject = cli
        .subject
        .unwrap_or_else(|| topic_value_subject(&options.topics[0]));

    let serde = RegistrySerde::new(cli::registry_client(&settings)?);
    let mut consumer = KafkaConsumer::new(
        settings.kafka_config(),
        settings.group_id.clone(),
        settings.auto_offset_reset,
    );

    consume_with_schema(
        &mut consumer,
        &serde,
        &subject,
        EXAMPLE_SCHEMA,
        &options,
        |topic, partition, message| {
            println!(
                "{}[{}]@{} key={:?} value={}",
                topic,
                partition,
                message.offset,
                message.key_str(),
                message.value
            );
        },
    )
    .await?;
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    cli::init_logging();
    cli::exit_code(run(Cli::parse()).await)
}
