//! Partition selection strategies.
//!
//! A [`Partitioner`] is the only way a template guarantees that records
//! sharing a key land on the same partition, and therefore keep their
//! relative order. Returning `None` leaves the choice to the broker client.

use super::client::PartitionInfo;

/// Picks the target partition of a record.
///
/// `partitions` is the snapshot cached when the producer was built. For
/// per-key ordering the result must be a pure function of
/// `(topic, key, value, partitions)`.
pub trait Partitioner<T>: Send + Sync {
    fn partition(
        &self,
        topic: &str,
        key: Option<&str>,
        value: &T,
        encoded: &[u8],
        partitions: &[PartitionInfo],
    ) -> Option<i32>;
}

impl<T, F> Partitioner<T> for F
where
    F: Fn(&str, Option<&str>, &T, &[u8], &[PartitionInfo]) -> Option<i32> + Send + Sync,
{
    fn partition(
        &self,
        topic: &str,
        key: Option<&str>,
        value: &T,
        encoded: &[u8],
        partitions: &[PartitionInfo],
    ) -> Option<i32> {
        self(topic, key, value, encoded, partitions)
    }
}

/// Routes keyed records the way the Java client's default partitioner does:
/// `toPositive(murmur2(key)) % partition_count`.
///
/// Keyless records are left to the broker client.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeyHashPartitioner;

impl<T> Partitioner<T> for KeyHashPartitioner {
    fn partition(
        &self,
        _topic: &str,
        key: Option<&str>,
        _value: &T,
        _encoded: &[u8],
        partitions: &[PartitionInfo],
    ) -> Option<i32> {
        let key = key?;
        if partitions.is_empty() {
            return None;
        }
        let index = (murmur2(key.as_bytes()) & 0x7fff_ffff) as usize % partitions.len();
        Some(partitions[index].partition)
    }
}

/// Kafka-compatible murmur2 hash (seed `0x9747b28c`).
pub fn murmur2(data: &[u8]) -> u32 {
    const SEED: u32 = 0x9747_b28c;
    const M: u32 = 0x5bd1_e995;
    const R: u32 = 24;

    let len = data.len();
    let mut h: u32 = SEED ^ (len as u32);

    let mut chunks = data.chunks_exact(4);
    for chunk in &mut chunks {
        let mut k = u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
        k = k.wrapping_mul(M);
        k ^= k >> R;
        k = k.wrapping_mul(M);
        h = h.wrapping_mul(M);
        h ^= k;
    }

    let tail = chunks.remainder();
    if tail.len() >= 3 {
        h ^= (tail[2] as u32) << 16;
    }
    if tail.len() >= 2 {
        h ^= (tail[1] as u32) << 8;
    }
    if !tail.is_empty() {
        h ^= tail[0] as u32;
        h = h.wrapping_mul(M);
    }

    h ^= h >> 13;
    h = h.wrapping_mul(M);
    h ^= h >> 15;

    h
}
