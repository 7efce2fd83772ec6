#[cfg(test)]
mod tests {
    use super::super::*;
    use crate::config::KafkaSettings;
    use crate::error::DeliveryError;
    use futures::FutureExt;
    use rdkafka::error::KafkaError;
    use rdkafka::message::Headers;
    use rdkafka::types::RDKafkaErrorCode;
    use serde_json::json;
    use std::time::Duration;

    fn create_test_settings() -> KafkaSettings {
        KafkaSettings {
            compression: "none".to_string(),
            acks: "1".to_string(),
            linger_ms: 0,
            batch_size: 1,
            buffer_memory: 1024 * 1024,
            ..KafkaSettings::new(vec!["localhost:9092".to_string()])
        }
    }

    // Nothing listens on port 1: records are accepted locally and never acknowledged.
    fn unreachable_settings() -> KafkaSettings {
        KafkaSettings {
            linger_ms: 0,
            ..KafkaSettings::new(vec!["127.0.0.1:1".to_string()])
        }
    }

    fn test_record(payload: &[u8]) -> OutboundRecord {
        OutboundRecord {
            topic: "events".to_string(),
            partition: None,
            timestamp: None,
            key: Some("device-42".to_string()),
            payload: payload.to_vec(),
            headers: Vec::new(),
        }
    }

    fn test_partitions() -> Vec<PartitionInfo> {
        (0..3).map(|id| PartitionInfo::new("events", id)).collect()
    }

    #[test]
    fn test_key_strategy_feeds_partitioner() {
        let value = json!({"device": {"id": "device-42"}, "celsius": 21.5});
        let encoder = JsonEncoder::new();
        let partitions = test_partitions();

        let key = KeyStrategy::FieldPath("device.id".to_string()).extract_key(&value);
        let encoded = encoder.encode(&value).unwrap();

        let first = KeyHashPartitioner.partition("events", key.as_deref(), &value, &encoded, &partitions);
        let second = KeyHashPartitioner.partition("events", Some("device-42"), &json!({}), b"", &partitions);

        assert!(first.is_some());
        assert_eq!(first, second);
    }

    #[test]
    fn test_missing_key_leaves_partition_to_broker() {
        let value = json!({"celsius": 21.5});
        let partitions = test_partitions();

        let key = KeyStrategy::FieldPath("device.id".to_string()).extract_key(&value);
        assert_eq!(key, None);
        assert_eq!(
            KeyHashPartitioner.partition("events", key.as_deref(), &value, b"{}", &partitions),
            None
        );
    }

    #[test]
    fn test_headers_and_records_compare_by_value() {
        let record = OutboundRecord {
            topic: "events".to_string(),
            partition: Some(1),
            timestamp: Some(1_700_000_000_000),
            key: Some("device-42".to_string()),
            payload: b"{}".to_vec(),
            headers: vec![RecordHeader::new("content-type", "application/json")],
        };

        assert_eq!(record.clone(), record);
        assert_eq!(record.headers[0].value, b"application/json".to_vec());
    }

    #[test]
    fn test_outbound_record_maps_to_future_record() {
        let record = OutboundRecord {
            partition: Some(2),
            timestamp: Some(1_700_000_000_000),
            headers: vec![
                RecordHeader::new("content-type", "application/json"),
                RecordHeader::new("schema-version", vec![0u8, 2]),
            ],
            ..test_record(b"{\"celsius\":21.5}")
        };

        let future_record = producer::future_record(&record);

        assert_eq!(future_record.topic, "events");
        assert_eq!(future_record.key, Some("device-42"));
        assert_eq!(future_record.payload, Some(&b"{\"celsius\":21.5}"[..]));
        assert_eq!(future_record.partition, Some(2));
        assert_eq!(future_record.timestamp, Some(1_700_000_000_000));

        let headers = future_record.headers.expect("headers are set");
        assert_eq!(headers.count(), 2);
        assert_eq!(headers.get(0).key, "content-type");
        assert_eq!(headers.get(0).value, Some(&b"application/json"[..]));
        assert_eq!(headers.get(1).key, "schema-version");
        assert_eq!(headers.get(1).value, Some(&[0u8, 2][..]));
    }

    #[test]
    fn test_bare_record_leaves_optional_fields_unset() {
        let record = OutboundRecord {
            key: None,
            ..test_record(b"x")
        };

        let future_record = producer::future_record(&record);

        assert_eq!(future_record.key, None);
        assert_eq!(future_record.partition, None);
        assert_eq!(future_record.timestamp, None);
        assert!(future_record.headers.is_none());
    }

    #[tokio::test]
    async fn test_full_local_queue_fails_the_pending_result() {
        let config = unreachable_settings()
            .with_property("queue.buffering.max.messages", "10")
            .with_property("batch.num.messages", "10")
            .to_client_config();
        let client = KafkaBrokerClient::create(&config).unwrap();

        let accepted: Vec<_> = (0..10).map(|_| client.send(test_record(b"{}"))).collect();
        let rejected = client.send(test_record(b"{}")).now_or_never();

        assert_eq!(accepted.len(), 10);
        assert_eq!(
            rejected,
            Some(Err(DeliveryError::Broker(KafkaError::MessageProduction(
                RDKafkaErrorCode::QueueFull
            ))))
        );
    }

    #[tokio::test]
    async fn test_undelivered_record_times_out_in_pending_result() {
        let settings = KafkaSettings {
            message_timeout_ms: 1,
            ..unreachable_settings()
        };
        let client = KafkaBrokerClient::create(&settings.to_client_config()).unwrap();

        let result = tokio::time::timeout(Duration::from_secs(30), client.send(test_record(b"{}")))
            .await
            .expect("delivery report not received");

        assert_eq!(
            result,
            Err(DeliveryError::Broker(KafkaError::MessageProduction(
                RDKafkaErrorCode::MessageTimedOut
            )))
        );
    }

    #[tokio::test]
    #[ignore] // May fail if system has specific network configurations
    async fn test_client_creation() {
        let config = create_test_settings().to_client_config();
        let result = KafkaBrokerClient::create(&config);

        // Should succeed even if Kafka is not running (just creates the client)
        assert!(result.is_ok());
    }

    #[tokio::test]
    #[ignore] // Requires running Kafka
    async fn test_partitions_for_unknown_topic() {
        let config = create_test_settings().to_client_config();
        let client = KafkaBrokerClient::create(&config).unwrap();

        let result = PartitionCache::fetch(&client, "does-not-exist-7f3a", Duration::from_secs(5));
        assert!(result.is_err());
    }
}
