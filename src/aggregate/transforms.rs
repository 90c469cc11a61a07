//! The transforms: totals, distributions, grouped counts, rankings.
//!
//! A table entirely missing a referenced field yields an empty result, not
//! an error — the transforms never assume schema presence beyond what they
//! query per call.

use std::collections::{BTreeSet, HashMap, hash_map::Entry};

use crate::model::types::Table;

use super::types::{CategoryCount, Distribution, GroupRow, GroupedCounts, RankedEntry};

/// Row count of `table`.
pub fn total(table: &Table) -> usize {
    table.len()
}

/// Distribution over the non-null values of `field`.
///
/// Rows where `field` is null, absent, or non-scalar are excluded, not
/// zero-categorized. An empty table or an all-null field yields an empty
/// distribution.
pub fn distribution(table: &Table, field: &str) -> Distribution {
    let mut counts: HashMap<String, u64> = HashMap::new();
    let mut first_seen: Vec<String> = Vec::new();

    for row in table.iter() {
        let Some(category) = row.key(field) else {
            continue;
        };
        match counts.entry(category.clone()) {
            Entry::Occupied(mut cell) => *cell.get_mut() += 1,
            Entry::Vacant(cell) => {
                cell.insert(1);
                first_seen.push(category);
            }
        }
    }

    Distribution::from_ordered(order_cells(first_seen, &counts))
}

/// Per-group category counts over `(group_field, category_field)`.
///
/// Rows with a null group or null category contribute to no cell. Groups
/// are ordered by total descending (summed across that group's observed
/// categories), ties broken by group key ascending; the observed category
/// set is carried in ascending lexicographic order for zero-filling.
pub fn grouped_counts(table: &Table, group_field: &str, category_field: &str) -> GroupedCounts {
    #[derive(Default)]
    struct Acc {
        counts: HashMap<String, u64>,
        first_seen: Vec<String>,
    }

    let mut groups: HashMap<String, Acc> = HashMap::new();
    let mut categories: BTreeSet<String> = BTreeSet::new();

    for row in table.iter() {
        let (Some(group), Some(category)) = (row.key(group_field), row.key(category_field)) else {
            continue;
        };
        categories.insert(category.clone());
        let acc = groups.entry(group).or_default();
        match acc.counts.entry(category.clone()) {
            Entry::Occupied(mut cell) => *cell.get_mut() += 1,
            Entry::Vacant(cell) => {
                cell.insert(1);
                acc.first_seen.push(category);
            }
        }
    }

    let mut rows: Vec<GroupRow> = groups
        .into_iter()
        .map(|(key, acc)| {
            let cells = order_cells(acc.first_seen, &acc.counts);
            let total = cells.iter().map(|cell| cell.count).sum();
            GroupRow {
                key,
                total,
                counts: Distribution::from_ordered(cells),
            }
        })
        .collect();
    rows.sort_by(|a, b| b.total.cmp(&a.total).then_with(|| a.key.cmp(&b.key)));

    GroupedCounts {
        rows,
        categories: categories.into_iter().collect(),
    }
}

/// The `n` groups with the most rows, with per-group category breakdowns.
///
/// A group's total is its row count in `table`; ties are broken by group
/// key ascending. Fewer than `n` distinct groups returns them all; `n == 0`
/// returns an empty ranking.
pub fn top_n(table: &Table, group_field: &str, category_field: &str, n: usize) -> Vec<RankedEntry> {
    if n == 0 {
        return Vec::new();
    }

    #[derive(Default)]
    struct Acc {
        total: u64,
        counts: HashMap<String, u64>,
        first_seen: Vec<String>,
    }

    let mut groups: HashMap<String, Acc> = HashMap::new();
    for row in table.iter() {
        let Some(group) = row.key(group_field) else {
            continue;
        };
        let acc = groups.entry(group).or_default();
        acc.total += 1;
        if let Some(category) = row.key(category_field) {
            match acc.counts.entry(category.clone()) {
                Entry::Occupied(mut cell) => *cell.get_mut() += 1,
                Entry::Vacant(cell) => {
                    cell.insert(1);
                    acc.first_seen.push(category);
                }
            }
        }
    }

    let mut ranking: Vec<RankedEntry> = groups
        .into_iter()
        .map(|(key, acc)| RankedEntry {
            key,
            total: acc.total,
            by_category: Distribution::from_ordered(order_cells(acc.first_seen, &acc.counts)),
        })
        .collect();
    ranking.sort_by(|a, b| b.total.cmp(&a.total).then_with(|| a.key.cmp(&b.key)));
    ranking.truncate(n);
    ranking
}

/// Cells sorted by count descending; the stable sort keeps first-seen order
/// on ties.
fn order_cells(first_seen: Vec<String>, counts: &HashMap<String, u64>) -> Vec<CategoryCount> {
    let mut cells: Vec<CategoryCount> = first_seen
        .into_iter()
        .map(|category| {
            let count = counts[&category];
            CategoryCount { category, count }
        })
        .collect();
    cells.sort_by(|a, b| b.count.cmp(&a.count));
    cells
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
