//! Decoder trait shared by the supported document formats.

use serde_json::Value;
use std::io::Read;

use super::{CsvDecoder, JsonStreamDecoder};
use crate::config::{FileSourceSpec, SourceFormat};
use crate::error::DecodeError;

/// The decoded contents of one file, in source order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DecodedDocument {
    values: Vec<Value>,
}

impl DecodedDocument {
    pub fn new(values: Vec<Value>) -> Self {
        Self { values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// The whole document as one list value, the input to a query.
    pub fn into_value(self) -> Value {
        Value::Array(self.values)
    }
}

/// Trait for decoders that turn raw file bytes into document values.
pub trait DocumentDecoder: Send + Sync {
    /// Decode a file, pulling bytes from `data` as values are parsed.
    ///
    /// `location` is only used for error messages. A failure to read from
    /// `data` is reported as [`DecodeError::Read`].
    fn decode(&self, data: &mut dyn Read, location: &str) -> Result<DecodedDocument, DecodeError>;
}

/// The decoder configured for a file.
pub fn decoder_for(spec: &FileSourceSpec) -> Box<dyn DocumentDecoder> {
    match spec.format {
        SourceFormat::Json => Box::new(JsonStreamDecoder),
        SourceFormat::Csv => Box::new(CsvDecoder::from_options(&spec.csv)),
    }
}
