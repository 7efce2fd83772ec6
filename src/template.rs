//! Typed producer built on top of a [`BrokerClient`].
//!
//! # Example
//!
//! ```rust,no_run
//! use kafka_producer_template::config::KafkaSettings;
//! use kafka_producer_template::kafka::{JsonEncoder, KeyHashPartitioner};
//! use kafka_producer_template::ProducerTemplate;
//! use serde::Serialize;
//!
//! #[derive(Serialize)]
//! struct Reading {
//!     device: String,
//!     celsius: f64,
//! }
//!
//! #[tokio::main]
//! async fn main() -> kafka_producer_template::Result<()> {
//!     let template = ProducerTemplate::<Reading>::builder()
//!         .settings(KafkaSettings::new(vec!["localhost:9092".to_string()]))
//!         .encoder(JsonEncoder::new())
//!         .partitioner(KeyHashPartitioner)
//!         .default_topic("readings")
//!         .build()?;
//!
//!     let reading = Reading { device: "device-42".to_string(), celsius: 21.5 };
//!     let pending = template.send(Some("device-42"), &reading)?;
//!     match pending.await {
//!         Ok(metadata) => println!("Stored at {}:{}", metadata.partition, metadata.offset),
//!         Err(e) => eprintln!("Delivery failed: {}", e),
//!     }
//!
//!     template.close()
//! }
//! ```

use crate::config::KafkaSettings;
use crate::kafka::{
    BrokerClient, Encoder, KafkaBrokerClient, OutboundRecord, PartitionCache, PartitionInfo,
    Partitioner, RecordHeader,
};
use crate::{Error, Result};
use std::marker::PhantomData;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Publishes values of type `T` to a default topic.
///
/// Every `send*` method encodes and partitions on the calling thread, then
/// hands the record to the broker client and returns its pending result
/// without waiting for the broker.
///
/// # Delivery failures
///
/// Errors returned by `send*` are local: encoding failures and sends on a
/// closed template. Broker-side failures are only reported through the
/// returned pending result as a
/// [`DeliveryError`](crate::error::DeliveryError). **A caller that drops
/// pending results without awaiting them never learns that a record was
/// lost.** The record itself is still delivered on a best-effort basis,
/// since dropping the handle does not cancel it.
///
/// # Partition snapshot
///
/// The partitions of the default topic are fetched once, in
/// [`ProducerTemplateBuilder::build`], and never refreshed.
///
/// # Explicit topics
///
/// [`send_to`](Self::send_to) accepts a topic but always writes to the
/// default topic. See its documentation.
pub struct ProducerTemplate<T, C: BrokerClient = KafkaBrokerClient> {
    client: C,
    encoder: Box<dyn Encoder<T>>,
    partitioner: Option<Box<dyn Partitioner<T>>>,
    partitions: PartitionCache,
    default_topic: String,
    close_timeout: Duration,
    closed: AtomicBool,
}

pub struct ProducerTemplateBuilder<T, C: BrokerClient = KafkaBrokerClient> {
    settings: Option<KafkaSettings>,
    encoder: Option<Box<dyn Encoder<T>>>,
    partitioner: Option<Box<dyn Partitioner<T>>>,
    default_topic: Option<String>,
    _client: PhantomData<fn() -> C>,
}

impl<T, C: BrokerClient> Default for ProducerTemplateBuilder<T, C> {
    fn default() -> Self {
        Self {
            settings: None,
            encoder: None,
            partitioner: None,
            default_topic: None,
            _client: PhantomData,
        }
    }
}

impl<T, C: BrokerClient> ProducerTemplateBuilder<T, C> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn settings(mut self, settings: KafkaSettings) -> Self {
        self.settings = Some(settings);
        self
    }

    pub fn encoder<E>(mut self, encoder: E) -> Self
    where
        E: Encoder<T> + 'static,
    {
        self.encoder = Some(Box::new(encoder));
        self
    }

    /// Optional. Without a partitioner every record is left to the broker
    /// client's own partition assignment.
    pub fn partitioner<P>(mut self, partitioner: P) -> Self
    where
        P: Partitioner<T> + 'static,
    {
        self.partitioner = Some(Box::new(partitioner));
        self
    }

    pub fn default_topic(mut self, topic: impl Into<String>) -> Self {
        self.default_topic = Some(topic.into());
        self
    }

    /// Creates the broker client and caches the default topic's partitions.
    ///
    /// Blocks for up to the configured metadata timeout. Async callers
    /// should run it on a blocking thread.
    ///
    /// # Errors
    ///
    /// - [`Error::Config`] if settings, encoder or default topic are missing,
    ///   or if no broker is configured. Nothing is created in that case.
    /// - [`Error::Construction`] if the client cannot be created or the
    ///   partitions of the default topic cannot be fetched.
    pub fn build(self) -> Result<ProducerTemplate<T, C>> {
        let settings = self
            .settings
            .ok_or_else(|| Error::Config("producer settings are required".to_string()))?;
        let encoder = self
            .encoder
            .ok_or_else(|| Error::Config("an encoder is required".to_string()))?;
        let default_topic = self
            .default_topic
            .filter(|topic| !topic.is_empty())
            .ok_or_else(|| Error::Config("a non-empty default topic is required".to_string()))?;
        if settings.brokers.is_empty() {
            return Err(Error::Config("at least one broker is required".to_string()));
        }

        let client = C::create(&settings.to_client_config()).map_err(|source| {
            Error::Construction {
                message: "failed to create broker client".to_string(),
                source,
            }
        })?;

        let partitions = PartitionCache::fetch(&client, &default_topic, settings.metadata_timeout())
            .map_err(|source| Error::Construction {
                message: format!("failed to fetch partitions for topic '{}'", default_topic),
                source,
            })?;

        info!(
            topic = %default_topic,
            partitions = partitions.len(),
            brokers = ?settings.brokers,
            partitioner = self.partitioner.is_some(),
            "Producer template created"
        );

        Ok(ProducerTemplate {
            client,
            encoder,
            partitioner: self.partitioner,
            partitions,
            default_topic,
            close_timeout: settings.close_timeout(),
            closed: AtomicBool::new(false),
        })
    }
}

impl<T, C: BrokerClient> ProducerTemplate<T, C> {
    pub fn builder() -> ProducerTemplateBuilder<T, C> {
        ProducerTemplateBuilder::new()
    }

    pub fn default_topic(&self) -> &str {
        &self.default_topic
    }

    /// Partitions of the default topic as of construction.
    pub fn partitions(&self) -> &[PartitionInfo] {
        self.partitions.partitions()
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    pub fn send(&self, key: Option<&str>, value: &T) -> Result<C::Pending> {
        self.send_with_timestamp(key, value, None, Vec::new())
    }

    pub fn send_with_headers(
        &self,
        key: Option<&str>,
        value: &T,
        headers: Vec<RecordHeader>,
    ) -> Result<C::Pending> {
        self.send_with_timestamp(key, value, None, headers)
    }

    /// `timestamp` is in milliseconds since the Unix epoch; `None` lets the
    /// client stamp the record.
    pub fn send_with_timestamp(
        &self,
        key: Option<&str>,
        value: &T,
        timestamp: Option<i64>,
        headers: Vec<RecordHeader>,
    ) -> Result<C::Pending> {
        self.send_to(&self.default_topic, key, value, timestamp, headers)
    }

    /// Most general send.
    ///
    /// `topic` is accepted but **not used for routing**: the record is
    /// always built against the default topic, and the partitioner is
    /// always consulted with the default topic. Partition, timestamp and
    /// headers are honored.
    ///
    /// # Errors
    ///
    /// - [`Error::Closed`] after [`close`](Self::close).
    /// - [`Error::Encoding`] if the encoder fails. No record is enqueued.
    pub fn send_to(
        &self,
        topic: &str,
        key: Option<&str>,
        value: &T,
        timestamp: Option<i64>,
        headers: Vec<RecordHeader>,
    ) -> Result<C::Pending> {
        if self.is_closed() {
            return Err(Error::Closed);
        }

        let payload = self.encoder.encode(value)?;
        let partition = self.partition_for(key, value, &payload);

        if topic != self.default_topic {
            debug!(
                requested_topic = %topic,
                default_topic = %self.default_topic,
                "Explicit topic ignored, sending to default topic"
            );
        }
        debug!(
            topic = %self.default_topic,
            partition = ?partition,
            bytes = payload.len(),
            "Sending record"
        );

        let record = OutboundRecord {
            topic: self.default_topic.clone(),
            partition,
            timestamp,
            key: key.map(str::to_owned),
            payload,
            headers,
        };

        Ok(self.client.send(record))
    }

    fn partition_for(&self, key: Option<&str>, value: &T, payload: &[u8]) -> Option<i32> {
        self.partitioner.as_ref().and_then(|partitioner| {
            partitioner.partition(&self.default_topic, key, value, payload, self.partitions.partitions())
        })
    }

    /// Flushes in-flight records and rejects further sends.
    ///
    /// Idempotent: only the first call flushes, later calls return `Ok`.
    /// If the close timeout expires the flush error is returned and the
    /// template stays closed.
    pub fn close(&self) -> Result<()> {
        if self.closed.swap(true, Ordering::AcqRel) {
            debug!(topic = %self.default_topic, "Producer template already closed");
            return Ok(());
        }

        info!(topic = %self.default_topic, "Closing producer template");
        self.client.flush(self.close_timeout)?;
        info!(topic = %self.default_topic, "Producer template closed");
        Ok(())
    }
}

impl<T, C: BrokerClient> Drop for ProducerTemplate<T, C> {
    fn drop(&mut self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }

        warn!(topic = %self.default_topic, "Producer template dropped without close, flushing");
        if let Err(e) = self.client.flush(self.close_timeout) {
            warn!("Flush on drop failed: {}", e);
        }
    }
}
