//! Pure aggregation transforms over in-memory tables.
//!
//! No I/O and no shared mutable state: every function here takes a
//! [`Table`](crate::model::types::Table) reference and produces a derived
//! summary structure with deterministic ordering and tie-breaking.
//!
//! - [`types`] — distribution, grouped-count, and ranking structures
//! - [`transforms`] — `total` / `distribution` / `grouped_counts` / `top_n`

pub mod transforms;
pub mod types;

pub use transforms::{distribution, grouped_counts, top_n, total};
pub use types::{CategoryCount, Distribution, GroupRow, GroupedCounts, RankedEntry};
