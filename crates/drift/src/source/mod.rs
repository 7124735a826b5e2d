//! Source reading and document decoding.
//!
//! The reader opens a configured location as a byte stream. A decoder pulls
//! from that stream on a blocking thread and turns it into an ordered
//! sequence of document values.

mod csv;
mod json;
mod reader;
mod traits;

pub use self::csv::CsvDecoder;
pub use json::JsonStreamDecoder;
pub use reader::{BlockingRead, SourceReader};
pub use traits::{DecodedDocument, DocumentDecoder, decoder_for};
