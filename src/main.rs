use clap::Parser;
use kafka_producer_template::kafka::{InFlight, JsonEncoder, KeyHashPartitioner, KeyStrategy, RecordHeader};
use kafka_producer_template::{Config, Error, ProducerTemplate, Result};
use serde_json::Value;
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

#[derive(Parser, Debug)]
#[command(name = "kafka-producer-template")]
#[command(about = "Publish newline-delimited JSON from stdin to Kafka", long_about = None)]
struct Args {
    #[arg(short, long, value_name = "FILE", default_value = "config.toml")]
    config: PathBuf,

    #[arg(short, long, help = "Fixed key for every record")]
    key: Option<String>,

    #[arg(long = "key-field", value_name = "PATH", help = "Dotted field path used as key; repeat for a composite key")]
    key_fields: Vec<String>,

    #[arg(long, help = "Stamp records with the time they were read")]
    stamp: bool,

    #[arg(long, default_value_t = 10_000, help = "Maximum number of unacknowledged records")]
    max_in_flight: usize,

    #[arg(short, long, help = "Enable JSON output for logs")]
    json_logs: bool,

    #[arg(short, long, help = "Verbose logging")]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(args.json_logs, args.verbose);

    info!("Starting kafka-producer-template");
    info!("Loading configuration from {:?}", args.config);

    let config = match Config::from_file(&args.config) {
        Ok(cfg) => {
            info!("Configuration loaded successfully");
            cfg
        }
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            return Err(Error::Config(e.to_string()));
        }
    };

    info!(
        kafka_brokers = ?config.kafka.brokers,
        default_topic = %config.producer.default_topic,
        "Configuration summary"
    );

    let key_strategy = match args.key {
        Some(key) => KeyStrategy::Fixed(key),
        None => KeyStrategy::from_fields(args.key_fields),
    };

    let template = tokio::task::spawn_blocking(move || {
        ProducerTemplate::<Value>::builder()
            .settings(config.kafka)
            .encoder(JsonEncoder::new())
            .partitioner(KeyHashPartitioner)
            .default_topic(config.producer.default_topic)
            .build()
    })
    .await
    .map_err(|e| Error::Io(std::io::Error::other(e)))??;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut in_flight = InFlight::new(args.max_in_flight);
    let mut line_number = 0u64;

    while let Some(line) = lines.next_line().await? {
        line_number += 1;
        if line.trim().is_empty() {
            continue;
        }

        let value: Value = match serde_json::from_str(&line) {
            Ok(value) => value,
            Err(e) => {
                warn!(line = line_number, "Skipping invalid JSON: {}", e);
                continue;
            }
        };

        let key = key_strategy.extract_key(&value);
        let timestamp = args.stamp.then(|| chrono::Utc::now().timestamp_millis());
        let headers = vec![RecordHeader::new("content-type", "application/json")];

        in_flight
            .submit(|| template.send_with_timestamp(key.as_deref(), &value, timestamp, headers.clone()))
            .await?;
    }

    let summary = in_flight.finish().await;
    info!(
        delivered = summary.delivered,
        failed = summary.failed,
        "Finished publishing"
    );

    tokio::task::spawn_blocking(move || template.close())
        .await
        .map_err(|e| Error::Io(std::io::Error::other(e)))?
}

fn init_logging(json: bool, verbose: bool) {
    let env_filter = if verbose {
        EnvFilter::new("kafka_producer_template=debug,info")
    } else {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("kafka_producer_template=info,warn"))
    };

    let fmt_layer = if json {
        tracing_subscriber::fmt::layer()
            .json()
            .flatten_event(true)
            .with_current_span(false)
            .with_span_list(false)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .with_target(false)
            .with_thread_ids(false)
            .with_thread_names(false)
            .boxed()
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();
}
