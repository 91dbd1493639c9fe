use crate::core::value::{FieldValue, Value};
use serde::{Deserialize, Serialize};

/// One flat result row as returned by a query executor. Field names are the
/// column labels of the rendered query.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RowData {
    pub field_values: Vec<FieldValue>,
}

impl RowData {
    pub fn new(field_values: Vec<FieldValue>) -> Self {
        RowData { field_values }
    }

    pub fn from_pairs<I, K>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        RowData {
            field_values: pairs
                .into_iter()
                .map(|(name, value)| FieldValue {
                    name: name.into(),
                    value,
                })
                .collect(),
        }
    }

    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.field_values.iter().find(|f| f.name == field)
    }

    pub fn get_value(&self, field: &str) -> Value {
        self.get(field)
            .map(|f| f.value.clone())
            .unwrap_or(Value::Null)
    }
}
