use crate::{
    core::value::Value,
    pagination::{error::MalformedCursorError, order::OrderSpec},
    records::row::RowData,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Position of a row within an ordering: the values of its key columns.
///
/// Keys are stored in canonical form (trimmed, ASCII lowercase). A cursor is
/// never updated in place; a later position is a new cursor from `from_row`.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(transparent)]
pub struct Cursor {
    values: BTreeMap<String, Value>,
}

pub fn canonical_key(name: &str) -> String {
    name.trim().to_ascii_lowercase()
}

impl Cursor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pairs<I, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, Value)>,
        S: AsRef<str>,
    {
        let values = pairs
            .into_iter()
            .map(|(name, value)| (canonical_key(name.as_ref()), value))
            .collect();
        Cursor { values }
    }

    /// Captures the key column values of `row`.
    ///
    /// A nullable column missing from the row is recorded as NULL; a
    /// non-nullable one is an error.
    pub fn from_row(order: &OrderSpec, row: &RowData) -> Result<Self, MalformedCursorError> {
        let mut values = BTreeMap::new();
        for column in order.key_columns() {
            let value = row
                .get(&column.name)
                .and_then(|f| f.value.clone())
                .unwrap_or(Value::Null);
            if value.is_null() && !column.nullable {
                return Err(MalformedCursorError::MissingRowValue(column.name.clone()));
            }
            values.insert(canonical_key(&column.name), value);
        }
        Ok(Cursor { values })
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(&canonical_key(name))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Checks that this cursor fits `order` and returns how many leading key
    /// columns it constrains.
    ///
    /// Every key must name a key column, the keys must form a contiguous
    /// prefix of the key columns, and NULL is only allowed for nullable ones.
    pub fn validate_for(&self, order: &OrderSpec) -> Result<usize, MalformedCursorError> {
        for name in self.values.keys() {
            if order.key_position(name).is_none() {
                return Err(MalformedCursorError::UnknownColumn(name.clone()));
            }
        }

        let keys = order.key_columns();
        let prefix = keys
            .iter()
            .take_while(|c| self.get(&c.name).is_some())
            .count();

        if let Some(gap) = keys[prefix..].iter().find(|c| self.get(&c.name).is_some()) {
            return Err(MalformedCursorError::NonContiguous {
                column: gap.name.clone(),
                missing: keys[prefix].name.clone(),
            });
        }

        for column in &keys[..prefix] {
            if !column.nullable && self.get(&column.name).is_some_and(Value::is_null) {
                return Err(MalformedCursorError::NullNotAllowed(column.name.clone()));
            }
        }

        Ok(prefix)
    }
}
