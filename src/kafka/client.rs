//! The broker client seam.
//!
//! [`ProducerTemplate`](crate::ProducerTemplate) talks to the broker only
//! through [`BrokerClient`]. The production implementation is
//! [`KafkaBrokerClient`](super::KafkaBrokerClient); tests plug in fakes
//! that capture [`OutboundRecord`]s.

use crate::error::DeliveryError;
use rdkafka::error::KafkaResult;
use rdkafka::ClientConfig;
use std::future::Future;
use std::time::Duration;

/// One partition of a topic, as reported by the broker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionInfo {
    pub topic: String,
    pub partition: i32,
    /// Broker id of the leader, `-1` when there is none.
    pub leader: i32,
    pub replicas: Vec<i32>,
    pub isr: Vec<i32>,
}

impl PartitionInfo {
    pub fn new(topic: impl Into<String>, partition: i32) -> Self {
        Self {
            topic: topic.into(),
            partition,
            leader: -1,
            replicas: Vec::new(),
            isr: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordHeader {
    pub key: String,
    pub value: Vec<u8>,
}

impl RecordHeader {
    pub fn new(key: impl Into<String>, value: impl Into<Vec<u8>>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// A fully resolved record, ready to be enqueued by the broker client.
///
/// Keys are always UTF-8 strings and payloads are always the encoder's
/// bytes; the client never serializes anything itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundRecord {
    pub topic: String,
    /// `None` lets the broker client pick the partition.
    pub partition: Option<i32>,
    /// Milliseconds since the Unix epoch.
    pub timestamp: Option<i64>,
    pub key: Option<String>,
    pub payload: Vec<u8>,
    pub headers: Vec<RecordHeader>,
}

/// Where a record ended up once the broker acknowledged it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordMetadata {
    pub partition: i32,
    pub offset: i64,
    /// The timestamp the record was sent with, echoed back. This is not the
    /// broker-assigned timestamp, and it is `None` when the caller passed
    /// none, even if the broker stamped the record.
    pub timestamp: Option<i64>,
}

pub type DeliveryResult = std::result::Result<RecordMetadata, DeliveryError>;

/// Minimal producer-side surface of a broker client.
///
/// Implementations must be safe to share between threads: the template
/// calls `send` concurrently without locking.
pub trait BrokerClient: Send + Sync + Sized {
    /// Pending outcome of a single send. Dropping it must not cancel a
    /// record that was already enqueued.
    type Pending: Future<Output = DeliveryResult> + Send + 'static;

    /// Creates the client from its native configuration.
    fn create(config: &ClientConfig) -> KafkaResult<Self>;

    /// Fetches the partitions of `topic`, blocking for at most `timeout`.
    fn partitions_for(&self, topic: &str, timeout: Duration) -> KafkaResult<Vec<PartitionInfo>>;

    /// Enqueues `record` without waiting for the broker.
    fn send(&self, record: OutboundRecord) -> Self::Pending;

    /// Waits up to `timeout` for every enqueued record to be delivered.
    fn flush(&self, timeout: Duration) -> KafkaResult<()>;
}
