//! CSV decoding into string-keyed records.
//!
//! The first row is the header. Every later row becomes a map from trimmed
//! header name to the raw cell text. Cells are never coerced, so every CSV
//! column infers as a string.

use serde_json::{Map, Value};
use std::collections::HashSet;
use std::io::Read;
use tracing::debug;

use super::{DecodedDocument, DocumentDecoder};
use crate::config::{CsvOptions, FieldCountMismatch};
use crate::error::DecodeError;

/// Decoder for delimited text with a header row.
#[derive(Debug, Clone, Copy)]
pub struct CsvDecoder {
    delimiter: u8,
    on_mismatch: FieldCountMismatch,
}

impl Default for CsvDecoder {
    fn default() -> Self {
        Self {
            delimiter: b',',
            on_mismatch: FieldCountMismatch::Pad,
        }
    }
}

impl CsvDecoder {
    pub fn new(delimiter: u8, on_mismatch: FieldCountMismatch) -> Self {
        Self {
            delimiter,
            on_mismatch,
        }
    }

    /// Build from validated options. An invalid delimiter falls back to `,`.
    pub fn from_options(options: &CsvOptions) -> Self {
        Self::new(
            options.delimiter_byte().unwrap_or(b','),
            options.on_field_count_mismatch,
        )
    }

    fn reader<R: Read>(&self, data: R) -> ::csv::Reader<R> {
        ::csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .delimiter(self.delimiter)
            .from_reader(data)
    }
}

impl DocumentDecoder for CsvDecoder {
    fn decode(&self, data: &mut dyn Read, location: &str) -> Result<DecodedDocument, DecodeError> {
        let mut reader = self.reader(data);
        let mut records = reader.records();

        let header = match records.next() {
            Some(row) => row.map_err(|source| DecodeError::from_csv(location, source))?,
            None => return Ok(DecodedDocument::default()),
        };

        let names: Vec<String> = header.iter().map(|name| name.trim().to_string()).collect();
        let mut seen = HashSet::new();
        for name in &names {
            if !seen.insert(name.as_str()) {
                return Err(DecodeError::DuplicateHeader {
                    location: location.to_string(),
                    name: name.clone(),
                });
            }
        }

        let mut values = Vec::new();
        let mut skipped = 0usize;

        for row in records {
            let row = row.map_err(|source| DecodeError::from_csv(location, source))?;

            if row.len() != names.len() {
                match self.on_mismatch {
                    FieldCountMismatch::Pad => {}
                    FieldCountMismatch::Skip => {
                        skipped += 1;
                        continue;
                    }
                    FieldCountMismatch::Reject => {
                        return Err(DecodeError::FieldCount {
                            location: location.to_string(),
                            line: row.position().map(|p| p.line()).unwrap_or_default(),
                            expected: names.len(),
                            found: row.len(),
                        });
                    }
                }
            }

            let record: Map<String, Value> = names
                .iter()
                .enumerate()
                .map(|(i, name)| {
                    let cell = row.get(i).unwrap_or_default();
                    (name.clone(), Value::String(cell.to_string()))
                })
                .collect();
            values.push(Value::Object(record));
        }

        if skipped > 0 {
            debug!("Skipped {skipped} CSV row(s) with mismatched field count in {location}");
        }

        Ok(DecodedDocument::new(values))
    }
}
