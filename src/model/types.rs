//! Row/Table data model.
//!
//! The store returns heterogeneous JSON records whose schema is not known
//! ahead of time, so a [`Row`] is a plain field → value mapping and a
//! [`Table`] is an ordered sequence of rows sharing a best-effort common
//! field set. An empty table is a normal state (absence of data, not
//! absence of connectivity).

use serde_json::{Map, Value};

// ---------------------------------------------------------------------------
// Row
// ---------------------------------------------------------------------------

/// A single record: field name → JSON value.
///
/// Nested objects from the source response are flattened into dot-joined
/// field names (`"meta.city"`), so lookups never have to walk a tree.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    fields: Map<String, Value>,
}

impl Row {
    /// Build a row from a source object, flattening nested objects.
    pub fn from_object(object: Map<String, Value>) -> Self {
        let mut fields = Map::new();
        flatten_into(None, object, &mut fields);
        Self { fields }
    }

    /// Raw value of `field`, if the row carries it.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// Canonical string key for `field`, used for category/group bucketing.
    ///
    /// Strings pass through, numbers and bools render to their literal
    /// form. Null, absent fields, arrays and objects yield `None` — they
    /// are never bucketing keys.
    pub fn key(&self, field: &str) -> Option<String> {
        scalar_key(self.fields.get(field)?)
    }

    /// Number of fields on this row.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the row carries no fields at all.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// The row as a JSON object, for previews and envelopes.
    pub fn to_json(&self) -> Value {
        Value::Object(self.fields.clone())
    }
}

/// Flatten `object` into `out`, dot-joining nested object keys.
fn flatten_into(prefix: Option<&str>, object: Map<String, Value>, out: &mut Map<String, Value>) {
    for (name, value) in object {
        let field = match prefix {
            Some(p) => format!("{p}.{name}"),
            None => name,
        };
        match value {
            Value::Object(nested) => flatten_into(Some(&field), nested, out),
            other => {
                out.insert(field, other);
            }
        }
    }
}

/// Canonical string rendering of a scalar, or `None` for non-scalars.
fn scalar_key(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

// ---------------------------------------------------------------------------
// Table
// ---------------------------------------------------------------------------

/// An ordered sequence of rows. May be empty; never `null`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    rows: Vec<Row>,
}

impl Table {
    /// The empty table.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a table from already-normalized rows.
    pub fn from_rows(rows: Vec<Row>) -> Self {
        Self { rows }
    }

    /// Normalize a raw store response into a table.
    ///
    /// A JSON array of objects becomes one row per object; anything else —
    /// `null`, a bare scalar, a non-array — normalizes to the empty table.
    /// Non-object items inside an array are skipped rather than failing
    /// the whole fetch.
    pub fn from_response(response: Value) -> Self {
        let Value::Array(items) = response else {
            return Self::empty();
        };
        let rows = items
            .into_iter()
            .filter_map(|item| match item {
                Value::Object(object) => Some(Row::from_object(object)),
                _ => None,
            })
            .collect();
        Self { rows }
    }

    /// Row count.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table holds no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// The rows, in source order.
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Iterate over the rows in source order.
    pub fn iter(&self) -> std::slice::Iter<'_, Row> {
        self.rows.iter()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
