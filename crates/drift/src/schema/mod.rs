//! Type inference and column building.
//!
//! Columns come from a single sampled record: the first element when the
//! filtered result is a list, the result itself when it is a map. Fields are
//! kept only when listed in `only` and not listed in `except`, and appear in
//! the order of the sampled record.

mod column;
mod kind;

pub use column::{ColumnType, InferredColumn, JSON_EXTENSION_NAME};
pub use kind::ValueKind;

use arrow_schema::{Schema, SchemaRef};
use indexmap::IndexSet;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::config::FileSourceSpec;
use crate::query::FilteredResult;

/// Include/exclude field selection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Projection {
    only: IndexSet<String>,
    except: IndexSet<String>,
}

impl Projection {
    pub fn new(
        only: impl IntoIterator<Item = impl Into<String>>,
        except: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            only: only.into_iter().map(Into::into).collect(),
            except: except.into_iter().map(Into::into).collect(),
        }
    }

    pub fn from_spec(spec: &FileSourceSpec) -> Self {
        Self {
            only: spec.only.clone(),
            except: spec.except.clone(),
        }
    }

    /// Exclusion always wins; anything not listed in `only` is dropped.
    pub fn includes(&self, field: &str) -> bool {
        !self.except.contains(field) && self.only.contains(field)
    }
}

/// Build the columns of a table from its filtered result.
pub fn build(filtered: &FilteredResult, projection: &Projection, table: &str) -> Vec<InferredColumn> {
    let record = match filtered.value() {
        Value::Array(items) if items.is_empty() => {
            debug!(target = %table, "Query result is an empty list, no columns inferred");
            return Vec::new();
        }
        _ => match filtered.first_record() {
            Some(record) => record,
            None => {
                warn!(
                    target = %table,
                    "Query result has no record to sample ({}), no columns inferred",
                    shape(filtered.value())
                );
                return Vec::new();
            }
        },
    };

    record
        .iter()
        .filter(|(field, _)| projection.includes(field))
        .map(|(field, value)| InferredColumn::new(field, ColumnType::from_kind(ValueKind::of(value))))
        .collect()
}

/// Arrow schema for an ordered set of columns.
pub fn arrow_schema(columns: &[InferredColumn]) -> SchemaRef {
    Arc::new(Schema::new(
        columns
            .iter()
            .map(InferredColumn::to_arrow_field)
            .collect::<Vec<_>>(),
    ))
}

fn shape(value: &Value) -> &'static str {
    match value {
        Value::Array(_) => "list whose first element is not a map",
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Object(_) => "map",
    }
}
