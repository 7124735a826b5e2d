//! Classification of document values.

use serde_json::Value;

/// The kind of a document value, as seen by inference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Null,
    Bool,
    /// A number written without fraction or exponent that fits in `i64`.
    Integer,
    /// Any other number.
    Float,
    String,
    Array,
    Object,
}

impl ValueKind {
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Null => ValueKind::Null,
            Value::Bool(_) => ValueKind::Bool,
            Value::Number(n) if n.is_i64() => ValueKind::Integer,
            Value::Number(_) => ValueKind::Float,
            Value::String(_) => ValueKind::String,
            Value::Array(_) => ValueKind::Array,
            Value::Object(_) => ValueKind::Object,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_classify() {
        assert_eq!(ValueKind::of(&json!(null)), ValueKind::Null);
        assert_eq!(ValueKind::of(&json!(true)), ValueKind::Bool);
        assert_eq!(ValueKind::of(&json!(-3)), ValueKind::Integer);
        assert_eq!(ValueKind::of(&json!(2.5)), ValueKind::Float);
        assert_eq!(ValueKind::of(&json!("x")), ValueKind::String);
        assert_eq!(ValueKind::of(&json!([1])), ValueKind::Array);
        assert_eq!(ValueKind::of(&json!({})), ValueKind::Object);
    }

    #[test]
    fn test_number_lexical_form_decides() {
        let whole: Value = serde_json::from_str("1.0").unwrap();
        assert_eq!(ValueKind::of(&whole), ValueKind::Float);

        let big: Value = serde_json::from_str("18446744073709551615").unwrap();
        assert_eq!(ValueKind::of(&big), ValueKind::Float);
    }
}
