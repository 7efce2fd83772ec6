#![allow(dead_code)]

use futures::future::{self, Ready};
use kafka_producer_template::config::KafkaSettings;
use kafka_producer_template::kafka::{
    BrokerClient, DeliveryResult, OutboundRecord, PartitionInfo, RecordMetadata,
};
use kafka_producer_template::DeliveryError;
use rdkafka::error::{KafkaError, KafkaResult};
use rdkafka::types::RDKafkaErrorCode;
use rdkafka::ClientConfig;
use serde::Serialize;
use std::env;
use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Shared state of a [`FakeBrokerClient`], observable after the template
/// that owns the client is gone.
#[derive(Default)]
pub struct FakeState {
    records: Mutex<Vec<OutboundRecord>>,
    flushes: AtomicUsize,
    next_offset: AtomicI64,
}

impl FakeState {
    pub fn records(&self) -> Vec<OutboundRecord> {
        self.records.lock().unwrap().clone()
    }

    pub fn flushes(&self) -> usize {
        self.flushes.load(Ordering::SeqCst)
    }
}

/// In-memory broker client driven by `fake.*` properties:
///
/// - `bootstrap.servers` containing `unreachable`: metadata fetches fail
/// - `fake.fail.create`: client creation fails
/// - `fake.partitions`: partition count of every known topic (default 3)
/// - `fake.topics`: comma-separated known topics (default: any)
/// - `fake.max.message.bytes`: larger payloads fail delivery
pub struct FakeBrokerClient {
    config: ClientConfig,
    partitions: i32,
    max_message_bytes: Option<usize>,
    state: Arc<FakeState>,
}

impl FakeBrokerClient {
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn state(&self) -> Arc<FakeState> {
        Arc::clone(&self.state)
    }

    pub fn records(&self) -> Vec<OutboundRecord> {
        self.state.records()
    }
}

impl BrokerClient for FakeBrokerClient {
    type Pending = Ready<DeliveryResult>;

    fn create(config: &ClientConfig) -> KafkaResult<Self> {
        if config.get("fake.fail.create").is_some() {
            return Err(KafkaError::ClientCreation(
                "invalid client configuration".to_string(),
            ));
        }

        Ok(Self {
            config: config.clone(),
            partitions: config
                .get("fake.partitions")
                .and_then(|value| value.parse().ok())
                .unwrap_or(3),
            max_message_bytes: config
                .get("fake.max.message.bytes")
                .and_then(|value| value.parse().ok()),
            state: Arc::new(FakeState::default()),
        })
    }

    fn partitions_for(&self, topic: &str, _timeout: Duration) -> KafkaResult<Vec<PartitionInfo>> {
        let brokers = self.config.get("bootstrap.servers").unwrap_or_default();
        if brokers.contains("unreachable") {
            return Err(KafkaError::MetadataFetch(RDKafkaErrorCode::AllBrokersDown));
        }

        if let Some(known) = self.config.get("fake.topics") {
            if !known.split(',').any(|name| name == topic) {
                return Err(KafkaError::MetadataFetch(
                    RDKafkaErrorCode::UnknownTopicOrPartition,
                ));
            }
        }

        Ok((0..self.partitions)
            .map(|id| PartitionInfo {
                topic: topic.to_string(),
                partition: id,
                leader: 1,
                replicas: vec![1],
                isr: vec![1],
            })
            .collect())
    }

    fn send(&self, record: OutboundRecord) -> Self::Pending {
        let too_large = self
            .max_message_bytes
            .is_some_and(|max| record.payload.len() > max);
        let metadata = RecordMetadata {
            partition: record.partition.unwrap_or(0),
            offset: self.state.next_offset.fetch_add(1, Ordering::SeqCst),
            timestamp: record.timestamp,
        };
        self.state.records.lock().unwrap().push(record);

        if too_large {
            return future::ready(Err(DeliveryError::Broker(KafkaError::MessageProduction(
                RDKafkaErrorCode::MessageSizeTooLarge,
            ))));
        }
        future::ready(Ok(metadata))
    }

    fn flush(&self, _timeout: Duration) -> KafkaResult<()> {
        self.state.flushes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Reading {
    pub device: String,
    pub celsius: f64,
}

impl Reading {
    pub fn new(device: &str, celsius: f64) -> Self {
        Self {
            device: device.to_string(),
            celsius,
        }
    }
}

/// Settings for the fake client.
pub fn fake_settings() -> KafkaSettings {
    KafkaSettings::new(vec!["fake-broker:9092".to_string()])
}

/// Settings for a real broker, from environment variables.
pub fn get_test_settings() -> KafkaSettings {
    KafkaSettings {
        linger_ms: 0, // Immediate sending for tests
        batch_size: 1, // Small batches for tests
        buffer_memory: 1_048_576, // 1MB for tests
        ..KafkaSettings::new(
            env::var("TEST_KAFKA_BROKERS")
                .unwrap_or_else(|_| "localhost:9092".to_string())
                .split(',')
                .map(|s| s.trim().to_string())
                .collect(),
        )
    }
}
