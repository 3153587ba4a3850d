//! Mock inventory and connectivity probes for testing.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::campaign::Category;
use crate::gate::ConnectivityProbe;
use crate::inventory::{InventoryError, InventoryProbe};
use crate::source::QueryFilters;

/// Mock implementation of the InventoryProbe trait.
///
/// Reports an item as present when its exact search term was registered
/// with [`set_present`](Self::set_present).
#[derive(Debug, Default)]
pub struct MockInventory {
    present: Arc<RwLock<HashSet<String>>>,
    failing: Arc<RwLock<bool>>,
    calls: Arc<RwLock<Vec<String>>>,
}

impl MockInventory {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set_present(&self, term: &str) {
        self.present.write().await.insert(term.to_string());
    }

    /// Make every probe fail with an I/O error.
    pub async fn set_failing(&self, failing: bool) {
        *self.failing.write().await = failing;
    }

    /// Terms probed so far.
    pub async fn calls(&self) -> Vec<String> {
        self.calls.read().await.clone()
    }
}

#[async_trait]
impl InventoryProbe for MockInventory {
    async fn exists(
        &self,
        term: &str,
        _category: Category,
        _filters: &QueryFilters,
    ) -> Result<bool, InventoryError> {
        self.calls.write().await.push(term.to_string());
        if *self.failing.read().await {
            return Err(InventoryError::Io {
                path: "/mock".into(),
                source: std::io::Error::other("mock failure"),
            });
        }
        Ok(self.present.read().await.contains(term))
    }
}

/// Mock implementation of the ConnectivityProbe trait.
#[derive(Debug)]
pub struct MockProbe {
    reachable: Arc<RwLock<bool>>,
    calls: Arc<RwLock<usize>>,
}

impl MockProbe {
    pub fn new(reachable: bool) -> Self {
        Self {
            reachable: Arc::new(RwLock::new(reachable)),
            calls: Arc::new(RwLock::new(0)),
        }
    }

    pub async fn set_reachable(&self, reachable: bool) {
        *self.reachable.write().await = reachable;
    }

    pub async fn call_count(&self) -> usize {
        *self.calls.read().await
    }
}

#[async_trait]
impl ConnectivityProbe for MockProbe {
    async fn is_reachable(&self) -> bool {
        *self.calls.write().await += 1;
        *self.reachable.read().await
    }
}
