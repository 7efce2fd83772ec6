pub mod config;
pub mod error;
pub mod template;

pub mod kafka;

pub use crate::config::{Config, KafkaSettings};
pub use error::{DeliveryError, EncodeError, Error, Result};
pub use template::{ProducerTemplate, ProducerTemplateBuilder};
