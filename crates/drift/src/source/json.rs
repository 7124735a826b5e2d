//! Concatenated JSON document stream decoding.

use serde_json::{Deserializer, Value};
use std::io::{BufReader, Read};

use super::{DecodedDocument, DocumentDecoder};
use crate::error::DecodeError;

/// Decodes a stream of whitespace-separated JSON values.
///
/// Any malformed value fails the whole file. Values decoded before the
/// failure are discarded.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonStreamDecoder;

impl DocumentDecoder for JsonStreamDecoder {
    fn decode(&self, data: &mut dyn Read, location: &str) -> Result<DecodedDocument, DecodeError> {
        let values = Deserializer::from_reader(BufReader::new(data))
            .into_iter::<Value>()
            .collect::<Result<Vec<_>, _>>()
            .map_err(|source| DecodeError::from_json(location, source))?;

        Ok(DecodedDocument::new(values))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn decode(input: &str) -> Result<DecodedDocument, DecodeError> {
        JsonStreamDecoder.decode(&mut input.as_bytes(), "test.json")
    }

    #[test]
    fn test_one_value_per_top_level_document() {
        let document = decode("{\"id\": 1}\n{\"id\": 2}\n[1, 2]\n\"x\" 42").unwrap();

        assert_eq!(document.len(), 5);
        assert_eq!(document.values()[0], json!({"id": 1}));
        assert_eq!(document.values()[2], json!([1, 2]));
        assert_eq!(document.values()[4], json!(42));
    }

    #[test]
    fn test_whitespace_only_is_empty() {
        assert!(decode("").unwrap().is_empty());
        assert!(decode("  \n\t\r\n").unwrap().is_empty());
    }

    #[test]
    fn test_malformed_value_fails_whole_file() {
        let err = decode("{\"id\": 1}\n{\"id\": }\n{\"id\": 3}").unwrap_err();

        assert!(matches!(err, DecodeError::Json { .. }));
        assert!(err.to_string().contains("test.json"));
    }

    #[test]
    fn test_preserves_key_order() {
        let document = decode(r#"{"z": 1, "a": 2, "m": 3}"#).unwrap();
        let keys: Vec<_> = document.values()[0]
            .as_object()
            .unwrap()
            .keys()
            .cloned()
            .collect();
        assert_eq!(keys, vec!["z", "a", "m"]);
    }

    #[test]
    fn test_into_value_wraps_in_list() {
        let value = decode("1 2").unwrap().into_value();
        assert_eq!(value, json!([1, 2]));
    }

    #[test]
    fn test_read_failure_is_not_a_syntax_error() {
        struct Interrupted(&'static [u8]);

        impl Read for Interrupted {
            fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
                if self.0.is_empty() {
                    return Err(std::io::Error::other("connection reset"));
                }
                let n = self.0.read(buf)?;
                Ok(n)
            }
        }

        let mut source = Interrupted(b"{\"id\": 1}\n{\"id\"");
        let err = JsonStreamDecoder.decode(&mut source, "remote.json").unwrap_err();

        assert!(matches!(err, DecodeError::Read { .. }), "unexpected error: {err}");
        assert!(err.to_string().contains("connection reset"));
    }
}
