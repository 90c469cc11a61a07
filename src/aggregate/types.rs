//! Derived summary structures produced by the transforms.

use serde::Serialize;
use serde_json::{Value, json};

// ---------------------------------------------------------------------------
// Distribution
// ---------------------------------------------------------------------------

/// One category cell of a [`Distribution`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryCount {
    pub category: String,
    pub count: u64,
}

/// Ordered category → count mapping.
///
/// Categories are exactly the distinct non-null values observed in a field.
/// Iteration order is descending count; ties keep the order in which the
/// category was first seen in the source table. Absent categories read as
/// zero.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Distribution {
    entries: Vec<CategoryCount>,
}

impl Distribution {
    /// Wrap entries that are already in presentation order.
    pub(crate) fn from_ordered(entries: Vec<CategoryCount>) -> Self {
        Self { entries }
    }

    /// Count for `category`; zero when absent.
    pub fn get(&self, category: &str) -> u64 {
        self.entries
            .iter()
            .find(|entry| entry.category == category)
            .map_or(0, |entry| entry.count)
    }

    /// Number of distinct categories.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no category was observed.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sum of all counts.
    pub fn total(&self) -> u64 {
        self.entries.iter().map(|entry| entry.count).sum()
    }

    /// Cells in presentation order.
    pub fn iter(&self) -> std::slice::Iter<'_, CategoryCount> {
        self.entries.iter()
    }

    /// Order-preserving JSON: an array of `{category, count}` cells.
    pub fn to_json(&self) -> Value {
        Value::Array(
            self.entries
                .iter()
                .map(|entry| json!({"category": entry.category, "count": entry.count}))
                .collect(),
        )
    }
}

impl<'a> IntoIterator for &'a Distribution {
    type Item = &'a CategoryCount;
    type IntoIter = std::slice::Iter<'a, CategoryCount>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

// ---------------------------------------------------------------------------
// GroupedCounts
// ---------------------------------------------------------------------------

/// Category counts for a single group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupRow {
    pub key: String,
    /// Sum of this group's category counts.
    pub total: u64,
    pub counts: Distribution,
}

/// Per-group category counts plus the full observed category set.
///
/// Rows are ordered by group total descending, ties broken by group key
/// ascending. `categories` carries every category observed anywhere in the
/// source (ascending lexicographic), so absent (group, category) cells can
/// be materialized as zero via [`GroupedCounts::matrix`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GroupedCounts {
    pub rows: Vec<GroupRow>,
    pub categories: Vec<String>,
}

impl GroupedCounts {
    /// Number of observed groups.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether no (group, category) pair was observed.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Zero-filled fixed-width matrix: one `(group key, cells)` row per
    /// group in presentation order, cells aligned to `categories`.
    pub fn matrix(&self) -> Vec<(String, Vec<u64>)> {
        self.rows
            .iter()
            .map(|row| {
                let cells = self
                    .categories
                    .iter()
                    .map(|category| row.counts.get(category))
                    .collect();
                (row.key.clone(), cells)
            })
            .collect()
    }

    /// JSON with the zero-filled matrix materialized alongside the rows.
    pub fn to_json(&self) -> Value {
        let rows: Vec<Value> = self
            .rows
            .iter()
            .map(|row| {
                json!({
                    "key": row.key,
                    "total": row.total,
                    "counts": row.counts.to_json(),
                })
            })
            .collect();
        let matrix: Vec<Value> = self
            .matrix()
            .into_iter()
            .map(|(key, cells)| json!({"key": key, "cells": cells}))
            .collect();
        json!({
            "categories": self.categories,
            "rows": rows,
            "matrix": matrix,
        })
    }
}

// ---------------------------------------------------------------------------
// RankedEntry
// ---------------------------------------------------------------------------

/// One row of a top-N ranking: group key, total, per-category breakdown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RankedEntry {
    pub key: String,
    /// Row count for this group in the source table.
    pub total: u64,
    pub by_category: Distribution,
}

impl RankedEntry {
    pub fn to_json(&self) -> Value {
        json!({
            "key": self.key,
            "total": self.total,
            "by_category": self.by_category.to_json(),
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
