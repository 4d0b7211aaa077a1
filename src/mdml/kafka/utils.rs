use rdkafka::config::RDKafkaLogLevel;

/// Maps librdkafka syslog-style levels onto the `log` crate's levels
pub fn convert_kafka_log_level(kafka_level: RDKafkaLogLevel) -> log::Level {
    match kafka_level {
        RDKafkaLogLevel::Emerg | RDKafkaLogLevel::Alert | RDKafkaLogLevel::Critical => {
            log::Level::Error
        }
        RDKafkaLogLevel::Error => log::Level::Error,
        RDKafkaLogLevel::Warning => log::Level::Warn,
        RDKafkaLogLevel::Notice | RDKafkaLogLevel::Info => log::Level::Info,
        RDKafkaLogLevel::Debug => log::Level::Debug,
    }
}

/// librdkafka `log_level` property matching the most verbose level enabled in `log`
pub fn rdkafka_log_level_property() -> &'static str {
    match log::max_level() {
        log::LevelFilter::Trace | log::LevelFilter::Debug => "7",
        log::LevelFilter::Info => "6",
        log::LevelFilter::Warn => "4",
        log::LevelFilter::Error | log::LevelFilter::Off => "3",
    }
}

/// Current wall-clock time in milliseconds since the Unix epoch
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
