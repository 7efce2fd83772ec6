//! Error types and result handling for kafka-producer-template.
//!
//! Two families of errors exist and they never mix:
//!
//! - [`Error`] is returned synchronously: construction, encoding and
//!   configuration failures all happen before a record reaches the broker
//!   client.
//! - [`DeliveryError`] only ever appears inside a pending send result, once
//!   the record has been handed to the broker client.
//!
//! # Example
//!
//! ```rust
//! use kafka_producer_template::{Error, Result};
//!
//! fn validate_topic(topic: &str) -> Result<()> {
//!     if topic.is_empty() {
//!         return Err(Error::Config("default topic must not be empty".to_string()));
//!     }
//!     Ok(())
//! }
//!
//! match validate_topic("") {
//!     Ok(()) => println!("Valid"),
//!     Err(Error::Config(msg)) => eprintln!("Configuration error: {}", msg),
//!     Err(e) => eprintln!("Other error: {}", e),
//! }
//! ```

use rdkafka::error::KafkaError;
use thiserror::Error;

/// The main error type for producer template operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error, from a config file, environment variables or a
    /// missing builder field.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The broker client could not be created or the initial partition
    /// metadata fetch failed.
    ///
    /// Construction is never retried internally.
    #[error("Producer construction failed: {message}")]
    Construction {
        /// What the template was doing when it failed
        message: String,
        /// Underlying client error
        #[source]
        source: KafkaError,
    },

    /// The encoder rejected a value. Raised before any broker interaction.
    #[error("Encoding error: {0}")]
    Encoding(#[from] EncodeError),

    /// A send was attempted after [`close`](crate::ProducerTemplate::close).
    #[error("Producer template is closed")]
    Closed,

    /// Kafka client error outside of construction, e.g. a failed flush.
    #[error("Kafka error: {0}")]
    Kafka(#[from] KafkaError),

    /// JSON error when reading input records.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O error, typically from reading stdin.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failure raised by an [`Encoder`](crate::kafka::Encoder).
///
/// Kept apart from [`Error`] so that encoders cannot report broker
/// failures by accident.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct EncodeError(pub String);

impl EncodeError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

impl From<serde_json::Error> for EncodeError {
    fn from(e: serde_json::Error) -> Self {
        Self(e.to_string())
    }
}

/// Broker-side failure of a single send, observed through its pending result.
///
/// The template performs no retry beyond what the broker client is
/// configured to do.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DeliveryError {
    /// The broker or the client rejected the record (timeout, message too
    /// large, leader not available, full local queue, ...).
    #[error("Delivery failed: {0}")]
    Broker(KafkaError),

    /// The client dropped the delivery report before it completed, e.g.
    /// because it was shut down.
    #[error("Delivery report was canceled")]
    Canceled,
}

/// A convenient Result type alias for producer template operations.
///
/// This is equivalent to `std::result::Result<T, kafka_producer_template::Error>`.
pub type Result<T> = std::result::Result<T, Error>;
