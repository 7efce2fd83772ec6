use super::client::{BrokerClient, PartitionInfo};
use rdkafka::error::{KafkaError, KafkaResult};
use rdkafka::types::RDKafkaErrorCode;
use std::ops::Deref;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument};

/// Snapshot of a topic's partitions taken once, when the producer is built.
///
/// There is no refresh: if the topic is repartitioned while the producer
/// is alive, partitioners keep seeing the old list.
#[derive(Debug, Clone)]
pub struct PartitionCache {
    topic: String,
    partitions: Arc<[PartitionInfo]>,
}

impl PartitionCache {
    /// Fetches the partition list of `topic` through `client`.
    ///
    /// An empty list is reported as an unknown topic, since no record
    /// could ever be routed to it.
    #[instrument(skip(client, timeout))]
    pub fn fetch<C: BrokerClient>(client: &C, topic: &str, timeout: Duration) -> KafkaResult<Self> {
        let partitions = client.partitions_for(topic, timeout)?;
        if partitions.is_empty() {
            return Err(KafkaError::MetadataFetch(
                RDKafkaErrorCode::UnknownTopicOrPartition,
            ));
        }

        debug!("Cached {} partitions", partitions.len());
        Ok(Self::from_partitions(topic, partitions))
    }

    pub fn from_partitions(topic: impl Into<String>, partitions: Vec<PartitionInfo>) -> Self {
        Self {
            topic: topic.into(),
            partitions: partitions.into(),
        }
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn partitions(&self) -> &[PartitionInfo] {
        &self.partitions
    }
}

impl Deref for PartitionCache {
    type Target = [PartitionInfo];

    fn deref(&self) -> &Self::Target {
        &self.partitions
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_keeps_broker_order() {
        let cache = PartitionCache::from_partitions(
            "events",
            vec![
                PartitionInfo::new("events", 2),
                PartitionInfo::new("events", 0),
                PartitionInfo::new("events", 1),
            ],
        );

        assert_eq!(cache.topic(), "events");
        assert_eq!(cache.len(), 3);
        let ids: Vec<i32> = cache.iter().map(|p| p.partition).collect();
        assert_eq!(ids, vec![2, 0, 1]);
    }

    #[test]
    fn test_clones_share_the_snapshot() {
        let cache = PartitionCache::from_partitions("events", vec![PartitionInfo::new("events", 0)]);
        let clone = cache.clone();

        assert!(std::ptr::eq(cache.partitions(), clone.partitions()));
    }
}
