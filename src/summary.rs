//! Assembled summary views for presentation consumers.
//!
//! This is the only module that knows which tables and fields the
//! dashboards care about; everything below it is generic over table and
//! field names.

use std::time::{Duration, Instant};

use chrono::Utc;
use serde_json::{Value, json};
use tracing::debug;

use crate::aggregate::{self, Distribution, GroupedCounts, RankedEntry};
use crate::cache::QueryCache;
use crate::store::StoreError;

/// Supplier master table.
pub const SUPPLIERS_TABLE: &str = "suppliers";
/// Supplier/event join table.
pub const EVENTS_SUPPLIERS_TABLE: &str = "events_suppliers";

const SUPPLIER_STATUS_FIELD: &str = "status";
const EVENT_SUPPLIER_FIELD: &str = "supplier_id";
const EVENT_STATUS_FIELD: &str = "status";

/// Knobs for [`build_summary`].
#[derive(Debug, Clone)]
pub struct SummaryOptions {
    /// Cache window for the underlying table fetches.
    pub ttl: Duration,
    /// How many suppliers to rank.
    pub top: usize,
}

impl Default for SummaryOptions {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(300),
            top: 10,
        }
    }
}

/// Everything the dashboards render, in presentation order.
#[derive(Debug, Clone)]
pub struct SummaryView {
    /// Row count of the suppliers table.
    pub total_suppliers: usize,
    /// Supplier status mix.
    pub supplier_status: Distribution,
    /// Events per supplier, broken down by event status.
    pub events_by_supplier: GroupedCounts,
    /// Suppliers ranked by event count.
    pub top_suppliers: Vec<RankedEntry>,
    /// Wall time spent building the view, fetches included.
    pub elapsed_ms: u64,
    /// The options the view was built with.
    pub options: SummaryOptions,
}

/// Fetch both tables through `cache` and aggregate the dashboard views.
///
/// Aggregation itself is pure and cache-independent; the only fallible
/// step is the fetch, and its errors propagate untouched.
pub fn build_summary(cache: &QueryCache, options: &SummaryOptions) -> Result<SummaryView, StoreError> {
    let started = Instant::now();

    let suppliers = cache.fetch(SUPPLIERS_TABLE, options.ttl)?;
    let events = cache.fetch(EVENTS_SUPPLIERS_TABLE, options.ttl)?;

    let view = SummaryView {
        total_suppliers: aggregate::total(&suppliers),
        supplier_status: aggregate::distribution(&suppliers, SUPPLIER_STATUS_FIELD),
        events_by_supplier: aggregate::grouped_counts(
            &events,
            EVENT_SUPPLIER_FIELD,
            EVENT_STATUS_FIELD,
        ),
        top_suppliers: aggregate::top_n(&events, EVENT_SUPPLIER_FIELD, EVENT_STATUS_FIELD, options.top),
        elapsed_ms: started.elapsed().as_millis() as u64,
        options: options.clone(),
    };
    debug!(
        suppliers = view.total_suppliers,
        events = events.len(),
        elapsed_ms = view.elapsed_ms,
        "summary built"
    );
    Ok(view)
}

impl SummaryView {
    /// The stable JSON envelope for machine consumers.
    pub fn to_cli_json(&self) -> Value {
        let ranking: Vec<Value> = self
            .top_suppliers
            .iter()
            .map(RankedEntry::to_json)
            .collect();
        json!({
            "total_suppliers": self.total_suppliers,
            "supplier_status": self.supplier_status.to_json(),
            "events_by_supplier": self.events_by_supplier.to_json(),
            "top_suppliers": ranking,
            "_meta": {
                "generated_at": Utc::now().to_rfc3339(),
                "elapsed_ms": self.elapsed_ms,
                "ttl_secs": self.options.ttl.as_secs(),
                "top": self.options.top,
            }
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{ResourceCache, SharedSource};
    use crate::model::types::Table;
    use crate::store::TableSource;
    use serde_json::json;
    use std::sync::Arc;

    struct CannedSource;

    impl TableSource for CannedSource {
        fn get(&self, table: &str) -> Result<Table, StoreError> {
            let body = match table {
                SUPPLIERS_TABLE => json!([
                    {"id": 1, "status": "approved"},
                    {"id": 2, "status": "approved"},
                    {"id": 3, "status": "active"},
                ]),
                EVENTS_SUPPLIERS_TABLE => json!([
                    {"event_id": 1, "supplier_id": "A", "status": "done"},
                    {"event_id": 2, "supplier_id": "B", "status": "done"},
                    {"event_id": 3, "supplier_id": "B", "status": "open"},
                ]),
                _ => json!([]),
            };
            Ok(Table::from_response(body))
        }
    }

    fn canned_cache() -> QueryCache {
        QueryCache::new(ResourceCache::new(|| {
            Ok(Arc::new(CannedSource) as SharedSource)
        }))
    }

    #[test]
    fn summary_assembles_all_views() {
        let cache = canned_cache();
        let view = build_summary(&cache, &SummaryOptions::default()).expect("summary");

        assert_eq!(view.total_suppliers, 3);
        assert_eq!(view.supplier_status.get("approved"), 2);
        assert_eq!(view.events_by_supplier.len(), 2);
        assert_eq!(view.top_suppliers[0].key, "B");
        assert_eq!(view.top_suppliers[0].total, 2);
    }

    #[test]
    fn envelope_has_the_documented_shape() {
        let cache = canned_cache();
        let view = build_summary(&cache, &SummaryOptions::default()).expect("summary");
        let envelope = view.to_cli_json();

        assert_eq!(envelope["total_suppliers"], 3);
        assert!(envelope["supplier_status"].is_array());
        assert!(envelope["events_by_supplier"]["matrix"].is_array());
        assert!(envelope["top_suppliers"].is_array());
        assert!(envelope["_meta"]["generated_at"].is_string());
        assert_eq!(envelope["_meta"]["ttl_secs"], 300);
    }

    #[test]
    fn empty_tables_summarize_to_empty_views_without_error() {
        let cache = QueryCache::new(ResourceCache::new(|| {
            struct EmptySource;
            impl TableSource for EmptySource {
                fn get(&self, _table: &str) -> Result<Table, StoreError> {
                    Ok(Table::empty())
                }
            }
            Ok(Arc::new(EmptySource) as SharedSource)
        }));
        let view = build_summary(&cache, &SummaryOptions::default()).expect("summary");

        assert_eq!(view.total_suppliers, 0);
        assert!(view.supplier_status.is_empty());
        assert!(view.events_by_supplier.is_empty());
        assert!(view.top_suppliers.is_empty());
    }
}
