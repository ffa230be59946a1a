// 📚 Scheme Registry - process-lifetime holder of the live classification services
//
// Readers clone an `Arc` and keep using that snapshot for the whole request.
// Refreshes build a complete service first and then replace the `Arc` under a
// short write lock, so nobody ever sees a half-built tree.

use super::resolver::FilterResolver;
use super::scheme::Scheme;
use super::service::{short_fingerprint, HierarchyQueryService, SnapshotInfo};
use crate::error::{ClassificationError, Result};
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::info;

/// What `publish` did with a freshly built service
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishOutcome {
    /// First snapshot for the scheme
    Installed,
    /// Replaced an older snapshot with different content
    Replaced,
    /// Same fingerprint as the live snapshot, nothing swapped
    Unchanged,
}

#[derive(Debug, Default)]
pub struct SchemeRegistry {
    services: RwLock<HashMap<Scheme, Arc<HierarchyQueryService>>>,
}

impl SchemeRegistry {
    pub fn new() -> Self {
        SchemeRegistry::default()
    }

    /// Make `service` the live snapshot for its scheme
    pub fn publish(&self, service: HierarchyQueryService) -> PublishOutcome {
        let scheme = service.scheme();
        let mut services = self.services.write().unwrap_or_else(PoisonError::into_inner);

        let outcome = match services.get(&scheme) {
            Some(live) if live.snapshot().fingerprint == service.snapshot().fingerprint => {
                return PublishOutcome::Unchanged;
            }
            Some(_) => PublishOutcome::Replaced,
            None => PublishOutcome::Installed,
        };

        info!(
            scheme = %scheme,
            records = service.snapshot().records,
            fingerprint = %short_fingerprint(&service.snapshot().fingerprint),
            ?outcome,
            "published classification snapshot"
        );

        services.insert(scheme, Arc::new(service));
        outcome
    }

    /// Live service for `scheme`
    pub fn get(&self, scheme: Scheme) -> Result<Arc<HierarchyQueryService>> {
        self.services
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&scheme)
            .cloned()
            .ok_or(ClassificationError::SchemeUnavailable(scheme))
    }

    pub fn is_loaded(&self, scheme: Scheme) -> bool {
        self.get(scheme).is_ok()
    }

    /// Snapshot metadata of every loaded scheme, ordered by scheme
    pub fn snapshots(&self) -> Vec<SnapshotInfo> {
        let services = self.services.read().unwrap_or_else(PoisonError::into_inner);
        let mut snapshots: Vec<SnapshotInfo> =
            services.values().map(|s| s.snapshot().clone()).collect();
        snapshots.sort_by_key(|s| s.scheme);
        snapshots
    }

    /// Resolver pinned to the snapshots that are live right now
    pub fn resolver(&self) -> FilterResolver {
        let services = self.services.read().unwrap_or_else(PoisonError::into_inner);
        services
            .values()
            .cloned()
            .fold(FilterResolver::new(), FilterResolver::with_service)
    }
}
