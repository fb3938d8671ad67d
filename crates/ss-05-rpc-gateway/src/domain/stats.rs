//! Per-category dispatch counters.

use serde_json::{json, Map, Value};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Counters for one category.
#[derive(Debug, Default)]
pub struct CategoryCounters {
    dispatched: AtomicU64,
    rejected_busy: AtomicU64,
    rejected_access: AtomicU64,
}

impl CategoryCounters {
    pub fn record_dispatched(&self) {
        self.dispatched.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_busy(&self) {
        self.rejected_busy.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_forbidden(&self) {
        self.rejected_access.fetch_add(1, Ordering::Relaxed);
    }

    pub fn dispatched(&self) -> u64 {
        self.dispatched.load(Ordering::Relaxed)
    }

    pub fn rejected_busy(&self) -> u64 {
        self.rejected_busy.load(Ordering::Relaxed)
    }

    pub fn rejected_access(&self) -> u64 {
        self.rejected_access.load(Ordering::Relaxed)
    }

    fn to_json(&self) -> Value {
        json!({
            "dispatched": self.dispatched(),
            "rejected_busy": self.rejected_busy(),
            "rejected_access": self.rejected_access(),
        })
    }
}

/// Counters for every declared category. The set of categories is fixed
/// once the gateway is built.
#[derive(Debug, Default)]
pub struct GatewayStats {
    categories: BTreeMap<String, Arc<CategoryCounters>>,
}

impl GatewayStats {
    pub(crate) fn register(&mut self, category: &str) -> Arc<CategoryCounters> {
        self.categories
            .entry(category.to_string())
            .or_default()
            .clone()
    }

    pub fn category(&self, name: &str) -> Option<&CategoryCounters> {
        self.categories.get(name).map(Arc::as_ref)
    }

    pub fn to_json(&self) -> Value {
        let categories: Map<String, Value> = self
            .categories
            .iter()
            .map(|(name, counters)| (name.clone(), counters.to_json()))
            .collect();
        Value::Object(categories)
    }
}
