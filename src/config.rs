use rdkafka::ClientConfig;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;
use tracing::warn;

/// Java client serializer properties. librdkafka rejects them, and the
/// template always sends string keys and pre-encoded byte payloads.
const SERIALIZER_PROPERTIES: [&str; 2] = ["key.serializer", "value.serializer"];

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub kafka: KafkaSettings,
    pub producer: ProducerConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProducerConfig {
    pub default_topic: String,
}

/// Connection settings for the broker client.
///
/// Read once when a template is built; the builder takes them by value.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct KafkaSettings {
    pub brokers: Vec<String>,
    #[serde(default)]
    pub client_id: Option<String>,
    #[serde(default = "default_acks")]
    pub acks: String,
    #[serde(default = "default_retries")]
    pub retries: u32,
    #[serde(default = "default_compression")]
    pub compression: String,
    #[serde(default = "default_linger_ms")]
    pub linger_ms: u32,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    /// Local buffer budget in bytes.
    #[serde(default = "default_buffer_memory")]
    pub buffer_memory: usize,
    #[serde(default = "default_message_timeout_ms")]
    pub message_timeout_ms: u64,
    #[serde(default = "default_metadata_timeout_ms")]
    pub metadata_timeout_ms: u64,
    #[serde(default = "default_close_timeout_ms")]
    pub close_timeout_ms: u64,
    /// Extra librdkafka properties, applied last.
    #[serde(default)]
    pub properties: BTreeMap<String, String>,
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ::config::ConfigError> {
        let settings = ::config::Config::builder()
            .add_source(::config::File::from(path.as_ref()))
            .add_source(
                ::config::Environment::with_prefix("KAFKA_TEMPLATE")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;

        settings.try_deserialize()
    }
}

impl KafkaSettings {
    pub fn new(brokers: Vec<String>) -> Self {
        Self {
            brokers,
            client_id: None,
            acks: default_acks(),
            retries: default_retries(),
            compression: default_compression(),
            linger_ms: default_linger_ms(),
            batch_size: default_batch_size(),
            buffer_memory: default_buffer_memory(),
            message_timeout_ms: default_message_timeout_ms(),
            metadata_timeout_ms: default_metadata_timeout_ms(),
            close_timeout_ms: default_close_timeout_ms(),
            properties: BTreeMap::new(),
        }
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    /// Translates the settings into the native librdkafka configuration.
    pub fn to_client_config(&self) -> ClientConfig {
        let mut client_config = ClientConfig::new();
        client_config
            .set("bootstrap.servers", self.brokers.join(","))
            .set("acks", &self.acks)
            .set("retries", self.retries.to_string())
            .set("compression.type", &self.compression)
            .set("linger.ms", self.linger_ms.to_string())
            .set("batch.size", self.batch_size.to_string())
            .set(
                "queue.buffering.max.kbytes",
                (self.buffer_memory / 1024).max(1).to_string(),
            )
            .set("message.timeout.ms", self.message_timeout_ms.to_string());

        if let Some(client_id) = &self.client_id {
            client_config.set("client.id", client_id);
        }

        for (key, value) in &self.properties {
            if SERIALIZER_PROPERTIES.contains(&key.as_str()) {
                warn!(property = %key, "Ignoring serializer property; keys are sent as strings and values as raw bytes");
                continue;
            }
            client_config.set(key, value);
        }

        client_config
    }

    pub fn metadata_timeout(&self) -> Duration {
        Duration::from_millis(self.metadata_timeout_ms)
    }

    pub fn close_timeout(&self) -> Duration {
        Duration::from_millis(self.close_timeout_ms)
    }
}

fn default_acks() -> String {
    "all".to_string()
}

fn default_retries() -> u32 {
    3
}

fn default_compression() -> String {
    "none".to_string()
}

fn default_linger_ms() -> u32 {
    5
}

fn default_batch_size() -> usize {
    16384
}

fn default_buffer_memory() -> usize {
    33_554_432 // 32MB
}

fn default_message_timeout_ms() -> u64 {
    30_000
}

fn default_metadata_timeout_ms() -> u64 {
    10_000
}

fn default_close_timeout_ms() -> u64 {
    5_000
}
