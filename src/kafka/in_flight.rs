//! Bounded set of pending deliveries.
//!
//! librdkafka rejects a record outright when its local queue is full, so a
//! caller publishing faster than the broker drains must hold back. An
//! [`InFlight`] caps the number of outstanding sends and retries records
//! the queue turned away once an older delivery has completed.

use super::client::DeliveryResult;
use crate::error::DeliveryError;
use crate::Result;
use futures::stream::{FuturesUnordered, StreamExt};
use futures::FutureExt;
use rdkafka::error::KafkaError;
use rdkafka::types::RDKafkaErrorCode;
use std::future::Future;
use tracing::{debug, error};

/// Delivered and failed counts once every pending send has completed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeliverySummary {
    pub delivered: u64,
    pub failed: u64,
}

pub struct InFlight<F> {
    pending: FuturesUnordered<F>,
    limit: usize,
    summary: DeliverySummary,
}

impl<F> InFlight<F>
where
    F: Future<Output = DeliveryResult> + Unpin,
{
    /// `limit` is clamped to at least one outstanding send.
    pub fn new(limit: usize) -> Self {
        Self {
            pending: FuturesUnordered::new(),
            limit: limit.max(1),
            summary: DeliverySummary::default(),
        }
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn summary(&self) -> DeliverySummary {
        self.summary
    }

    /// Sends one record through `send`, waiting for older deliveries first
    /// when the limit is reached or the local queue is full.
    ///
    /// `send` may be called more than once for the same record. Errors it
    /// returns are local (encoding, closed template) and are passed through
    /// without retrying.
    pub async fn submit<S>(&mut self, mut send: S) -> Result<()>
    where
        S: FnMut() -> Result<F>,
    {
        while self.pending.len() >= self.limit {
            self.complete_one().await;
        }

        loop {
            let mut delivery = send()?;
            match (&mut delivery).now_or_never() {
                Some(result) if is_queue_full(&result) && !self.pending.is_empty() => {
                    debug!(in_flight = self.pending.len(), "Local queue full, waiting for a delivery");
                    self.complete_one().await;
                }
                Some(result) => {
                    self.record(result);
                    return Ok(());
                }
                None => {
                    self.pending.push(delivery);
                    return Ok(());
                }
            }
        }
    }

    /// Waits for every outstanding delivery.
    pub async fn finish(mut self) -> DeliverySummary {
        while self.complete_one().await {}
        self.summary
    }

    async fn complete_one(&mut self) -> bool {
        match self.pending.next().await {
            Some(result) => {
                self.record(result);
                true
            }
            None => false,
        }
    }

    fn record(&mut self, result: DeliveryResult) {
        match result {
            Ok(_) => self.summary.delivered += 1,
            Err(e) => {
                error!("Delivery failed: {}", e);
                self.summary.failed += 1;
            }
        }
    }
}

fn is_queue_full(result: &DeliveryResult) -> bool {
    matches!(
        result,
        Err(DeliveryError::Broker(KafkaError::MessageProduction(
            RDKafkaErrorCode::QueueFull
        )))
    )
}
