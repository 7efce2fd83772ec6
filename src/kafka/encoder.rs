use crate::error::EncodeError;
use serde::Serialize;
use std::marker::PhantomData;

/// Turns a domain value into the bytes that become the record payload.
///
/// Must be side-effect free; failures are reported as [`EncodeError`] and
/// surface synchronously from `send`.
pub trait Encoder<T>: Send + Sync {
    fn encode(&self, value: &T) -> Result<Vec<u8>, EncodeError>;
}

impl<T, F> Encoder<T> for F
where
    F: Fn(&T) -> Result<Vec<u8>, EncodeError> + Send + Sync,
{
    fn encode(&self, value: &T) -> Result<Vec<u8>, EncodeError> {
        self(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JsonFormat {
    #[default]
    Compact,
    Pretty,
}

/// Encodes any `Serialize` value as JSON.
pub struct JsonEncoder<T> {
    format: JsonFormat,
    _marker: PhantomData<fn(&T)>,
}

impl<T> JsonEncoder<T> {
    pub fn new() -> Self {
        Self::with_format(JsonFormat::Compact)
    }

    pub fn pretty() -> Self {
        Self::with_format(JsonFormat::Pretty)
    }

    pub fn with_format(format: JsonFormat) -> Self {
        Self {
            format,
            _marker: PhantomData,
        }
    }
}

impl<T> Default for JsonEncoder<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Serialize> Encoder<T> for JsonEncoder<T> {
    fn encode(&self, value: &T) -> Result<Vec<u8>, EncodeError> {
        let bytes = match self.format {
            JsonFormat::Compact => serde_json::to_vec(value)?,
            JsonFormat::Pretty => serde_json::to_vec_pretty(value)?,
        };
        Ok(bytes)
    }
}
