//! JMESPath filtering of decoded documents.
//!
//! The decoded document is presented to the query as one list value holding
//! every top-level value in order. An absent or blank query is the identity.
//!
//! Maps produced by a non-identity query come back with their keys sorted,
//! since the evaluator does not keep insertion order.

use serde_json::{Map, Value};

use crate::error::QueryError;

/// The value left after applying a query to a document.
#[derive(Debug, Clone, PartialEq)]
pub struct FilteredResult(Value);

impl FilteredResult {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    pub fn value(&self) -> &Value {
        &self.0
    }

    pub fn into_value(self) -> Value {
        self.0
    }

    /// The record inference samples: the first element of a list, or the
    /// value itself when it is a map. `None` for any other shape.
    pub fn first_record(&self) -> Option<&Map<String, Value>> {
        match &self.0 {
            Value::Array(items) => items.first().and_then(Value::as_object),
            Value::Object(record) => Some(record),
            _ => None,
        }
    }

    /// Number of records the result holds: list length, one for a map.
    pub fn len(&self) -> usize {
        match &self.0 {
            Value::Array(items) => items.len(),
            Value::Object(_) => 1,
            _ => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Apply `expression` to `document`.
pub fn apply(document: Value, expression: Option<&str>) -> Result<FilteredResult, QueryError> {
    let Some(expression) = expression.filter(|e| !e.trim().is_empty()) else {
        return Ok(FilteredResult::new(document));
    };

    let compiled = jmespath::compile(expression).map_err(|e| QueryError::InvalidExpression {
        expression: expression.to_string(),
        message: e.to_string(),
    })?;

    let evaluation = |message: String| QueryError::Evaluation {
        expression: expression.to_string(),
        message,
    };

    let result = compiled
        .search(document)
        .map_err(|e| evaluation(e.to_string()))?;
    let value = serde_json::to_value(&*result).map_err(|e| evaluation(e.to_string()))?;

    Ok(FilteredResult::new(value))
}
