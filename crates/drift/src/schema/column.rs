//! Inferred column types and their Arrow mapping.

use arrow_schema::{DataType, Field};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt;

use super::ValueKind;

/// Arrow extension name tagging Utf8 fields that hold JSON text.
pub const JSON_EXTENSION_NAME: &str = "arrow.json";

const EXTENSION_NAME_KEY: &str = "ARROW:extension:name";

/// The type of an inferred column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnType {
    Boolean,
    Integer,
    Float,
    String,
    /// Nested maps and lists, kept as JSON.
    Json,
}

impl ColumnType {
    /// Column type for a sampled value. Null samples default to string.
    pub fn from_kind(kind: ValueKind) -> Self {
        match kind {
            ValueKind::Bool => ColumnType::Boolean,
            ValueKind::Integer => ColumnType::Integer,
            ValueKind::Float => ColumnType::Float,
            ValueKind::String | ValueKind::Null => ColumnType::String,
            ValueKind::Array | ValueKind::Object => ColumnType::Json,
        }
    }

    /// Suffix appended to the field name to form the column name.
    pub fn suffix(&self) -> &'static str {
        match self {
            ColumnType::Boolean => ":bool",
            ColumnType::Integer => ":int",
            ColumnType::Float => ":float",
            ColumnType::String => ":str",
            ColumnType::Json => ":json",
        }
    }

    pub fn to_arrow_type(self) -> DataType {
        match self {
            ColumnType::Boolean => DataType::Boolean,
            ColumnType::Integer => DataType::Int64,
            ColumnType::Float => DataType::Float64,
            ColumnType::String | ColumnType::Json => DataType::Utf8,
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.suffix()[1..])
    }
}

/// One column of a table, derived from one field of the sampled record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InferredColumn {
    /// `<field><suffix>`, e.g. `id:int`.
    pub name: String,
    pub column_type: ColumnType,
    /// The record key the column reads from.
    pub access_path: String,
}

impl InferredColumn {
    pub fn new(field: &str, column_type: ColumnType) -> Self {
        Self {
            name: format!("{field}{}", column_type.suffix()),
            column_type,
            access_path: field.to_string(),
        }
    }

    /// The value of this column in `record`. Missing keys read as null.
    pub fn extract<'a>(&self, record: &'a Map<String, Value>) -> &'a Value {
        record.get(&self.access_path).unwrap_or(&Value::Null)
    }

    /// Nullable Arrow field for this column.
    pub fn to_arrow_field(&self) -> Field {
        let field = Field::new(&self.name, self.column_type.to_arrow_type(), true);
        match self.column_type {
            ColumnType::Json => field.with_metadata(HashMap::from([(
                EXTENSION_NAME_KEY.to_string(),
                JSON_EXTENSION_NAME.to_string(),
            )])),
            _ => field,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_names_and_suffixes() {
        assert_eq!(InferredColumn::new("id", ColumnType::Integer).name, "id:int");
        assert_eq!(InferredColumn::new("ok", ColumnType::Boolean).name, "ok:bool");
        assert_eq!(InferredColumn::new("x", ColumnType::Float).name, "x:float");
        assert_eq!(InferredColumn::new("s", ColumnType::String).name, "s:str");
        assert_eq!(InferredColumn::new("tags", ColumnType::Json).name, "tags:json");
        assert_eq!(ColumnType::Json.to_string(), "json");
    }

    #[test]
    fn test_null_defaults_to_string() {
        assert_eq!(ColumnType::from_kind(ValueKind::Null), ColumnType::String);
    }

    #[test]
    fn test_extract() {
        let record = json!({"id": 7, "name": "a"});
        let record = record.as_object().unwrap();
        let column = InferredColumn::new("id", ColumnType::Integer);

        assert_eq!(column.extract(record), &json!(7));
        assert_eq!(
            InferredColumn::new("missing", ColumnType::String).extract(record),
            &Value::Null
        );
    }

    #[test]
    fn test_arrow_fields() {
        let int = InferredColumn::new("id", ColumnType::Integer).to_arrow_field();
        assert_eq!(int.name(), "id:int");
        assert_eq!(int.data_type(), &DataType::Int64);
        assert!(int.is_nullable());
        assert!(int.metadata().is_empty());

        let json = InferredColumn::new("tags", ColumnType::Json).to_arrow_field();
        assert_eq!(json.data_type(), &DataType::Utf8);
        assert_eq!(
            json.metadata().get("ARROW:extension:name").map(String::as_str),
            Some("arrow.json")
        );
    }
}
