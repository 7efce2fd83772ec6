pub mod client;
pub mod encoder;
pub mod in_flight;
pub mod key_strategy;
pub mod metadata;
pub mod partitioner;
pub mod producer;

#[cfg(test)]
mod tests;

pub use client::{BrokerClient, DeliveryResult, OutboundRecord, PartitionInfo, RecordHeader, RecordMetadata};
pub use encoder::{Encoder, JsonEncoder, JsonFormat};
pub use in_flight::{DeliverySummary, InFlight};
pub use key_strategy::KeyStrategy;
pub use metadata::PartitionCache;
pub use partitioner::{KeyHashPartitioner, Partitioner};
pub use producer::KafkaBrokerClient;
