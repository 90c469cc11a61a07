//! Supplier analytics core for the IVY dashboards.
//!
//! Fetches supplier/event records from a remote tabular store (a
//! Supabase/PostgREST backend), memoizes the normalized tables for a bounded
//! time window, and turns them into summary views — totals, categorical
//! distributions, per-supplier rankings — for an arbitrary presentation
//! layer to render.
//!
//! # Module structure
//!
//! - [`model`] — dynamically-schemaed [`Row`]/[`Table`] pair and response
//!   normalization
//! - [`store`] — the [`TableSource`] seam, connection settings, and the
//!   PostgREST client
//! - [`cache`] — construct-once resource handle and the TTL query cache
//! - [`aggregate`] — pure transforms: totals, distributions, grouped
//!   counts, top-N rankings
//! - [`summary`] — the assembled [`SummaryView`] consumed by presentation
//! - [`cli`] — a thin command-line consumer of the above

pub mod aggregate;
pub mod cache;
pub mod cli;
pub mod model;
pub mod store;
pub mod summary;

pub use aggregate::{CategoryCount, Distribution, GroupRow, GroupedCounts, RankedEntry};
pub use cache::{QueryCache, ResourceCache};
pub use model::types::{Row, Table};
pub use store::{StoreConfig, StoreError, SupabaseSource, TableSource};
pub use summary::{SummaryOptions, SummaryView, build_summary};
