use super::client::{BrokerClient, DeliveryResult, OutboundRecord, PartitionInfo, RecordHeader, RecordMetadata};
use crate::error::DeliveryError;
use futures::future::{self, BoxFuture, FutureExt};
use rdkafka::config::FromClientConfig;
use rdkafka::error::{IsError, KafkaError, KafkaResult};
use rdkafka::message::{Header, OwnedHeaders};
use rdkafka::producer::{FutureProducer, FutureRecord, Producer};
use rdkafka::ClientConfig;
use std::time::Duration;
use tracing::debug;

/// [`BrokerClient`] backed by librdkafka's [`FutureProducer`].
///
/// librdkafka owns the background I/O threads; they are released when the
/// client is dropped.
pub struct KafkaBrokerClient {
    producer: FutureProducer,
}

impl BrokerClient for KafkaBrokerClient {
    type Pending = BoxFuture<'static, DeliveryResult>;

    fn create(config: &ClientConfig) -> KafkaResult<Self> {
        let producer = FutureProducer::from_config(config)?;
        Ok(Self { producer })
    }

    fn partitions_for(&self, topic: &str, timeout: Duration) -> KafkaResult<Vec<PartitionInfo>> {
        let metadata = self
            .producer
            .client()
            .fetch_metadata(Some(topic), timeout)?;

        let topic_metadata = metadata
            .topics()
            .iter()
            .find(|metadata| metadata.name() == topic)
            .ok_or(KafkaError::MetadataFetch(
                rdkafka::types::RDKafkaErrorCode::UnknownTopicOrPartition,
            ))?;

        if let Some(err) = topic_metadata.error().filter(IsError::is_error) {
            return Err(KafkaError::MetadataFetch(err.into()));
        }

        Ok(topic_metadata
            .partitions()
            .iter()
            .map(|partition| PartitionInfo {
                topic: topic.to_string(),
                partition: partition.id(),
                leader: partition.leader(),
                replicas: partition.replicas().to_vec(),
                isr: partition.isr().to_vec(),
            })
            .collect())
    }

    fn send(&self, record: OutboundRecord) -> Self::Pending {
        let timestamp = record.timestamp;
        match self.producer.send_result(future_record(&record)) {
            Ok(delivery) => async move {
                match delivery.await {
                    Ok(Ok((partition, offset))) => Ok(RecordMetadata {
                        partition,
                        offset,
                        timestamp,
                    }),
                    Ok(Err((e, _message))) => Err(DeliveryError::Broker(e)),
                    Err(_canceled) => Err(DeliveryError::Canceled),
                }
            }
            .boxed(),
            Err((e, _record)) => {
                debug!("Record rejected by the local queue: {}", e);
                future::ready(Err(DeliveryError::Broker(e))).boxed()
            }
        }
    }

    fn flush(&self, timeout: Duration) -> KafkaResult<()> {
        self.producer.flush(timeout)
    }
}

pub(crate) fn future_record(record: &OutboundRecord) -> FutureRecord<'_, str, [u8]> {
    let mut future_record = FutureRecord::<str, [u8]>::to(&record.topic).payload(record.payload.as_slice());

    if let Some(key) = record.key.as_deref() {
        future_record = future_record.key(key);
    }
    if let Some(partition) = record.partition {
        future_record = future_record.partition(partition);
    }
    if let Some(timestamp) = record.timestamp {
        future_record = future_record.timestamp(timestamp);
    }
    if !record.headers.is_empty() {
        future_record = future_record.headers(owned_headers(&record.headers));
    }
    future_record
}

fn owned_headers(headers: &[RecordHeader]) -> OwnedHeaders {
    headers.iter().fold(OwnedHeaders::new(), |acc, header| {
        acc.insert(Header {
            key: &header.key,
            value: Some(header.value.as_slice()),
        })
    })
}
