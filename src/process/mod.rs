// src/process/mod.rs
//! Turns a driver's untyped [`RawTable`] into typed [`Record`]s for a schema.

pub mod parse;
pub mod raw_table;
pub mod resolve;

pub use raw_table::RawTable;
pub use resolve::{resolve_column, resolve_schema, Match};

use crate::schema::{FieldSpec, Value};
use serde::ser::{Serialize, SerializeMap, Serializer};
use thiserror::Error;
use tracing::{debug, trace};

/// The whole table was rejected by the meter; no record is built from it.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("table error {code}: {message}")]
pub struct TableError {
    pub code: i32,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub spec: FieldSpec,
    pub value: Value,
}

/// One typed row: a value for every schema field, in schema order.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    fields: Vec<Field>,
}

impl Record {
    /// Every field at its zero value.
    pub fn zeroed(schema: &[FieldSpec]) -> Self {
        Self {
            fields: schema
                .iter()
                .map(|spec| Field {
                    spec: *spec,
                    value: Value::zero(spec.value_type),
                })
                .collect(),
        }
    }

    /// Look a field up by name or serialized key.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields
            .iter()
            .find(|f| f.spec.name == name || f.spec.key == name)
            .map(|f| &f.value)
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for f in &self.fields {
            map.serialize_entry(f.spec.key, &f.value)?;
        }
        map.end()
    }
}

/// Map every row of `table` onto `schema`.
///
/// A nonzero table status rejects the whole table. Otherwise every row yields a
/// record; fields without a usable column or with an unparseable cell keep their
/// zero value.
pub fn map_table(table: &RawTable, schema: &[FieldSpec]) -> Result<Vec<Record>, TableError> {
    if !table.is_ok() {
        return Err(TableError {
            code: table.error_code,
            message: table.error_message.clone(),
        });
    }
    if table.rows.is_empty() {
        return Ok(Vec::new());
    }

    let columns = resolve_schema(schema, &table.column_labels);
    let unresolved: Vec<&str> = schema
        .iter()
        .zip(&columns)
        .filter(|(_, c)| c.is_none())
        .map(|(s, _)| s.name)
        .collect();
    if !unresolved.is_empty() {
        debug!(fields = ?unresolved, labels = ?table.column_labels, "fields without a column");
    }

    let records = table
        .rows
        .iter()
        .map(|row| {
            let mut record = Record::zeroed(schema);
            for (field, col) in record.fields.iter_mut().zip(&columns) {
                let Some(cell) = col.and_then(|i| row.get(i)) else {
                    continue;
                };
                match parse::parse_value(cell, field.spec.value_type) {
                    Some(v) => field.value = v,
                    None => trace!(field = field.spec.name, cell = %cell, "unparseable cell"),
                }
            }
            record
        })
        .collect();

    Ok(records)
}
