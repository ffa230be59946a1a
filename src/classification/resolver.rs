// 🎯 Filter Resolver - user identifiers → leaf codes for procurement search
//
// Doffin only matches precise codes. Selecting a county has to become
// "every municipality in that county", so every identifier is resolved to a
// canonical code and then expanded to the leaf codes beneath it.
//
// An empty result means "no filter on this dimension", never "match nothing".

use super::scheme::Scheme;
use super::service::HierarchyQueryService;
use crate::error::{ClassificationError, Result};
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Clone, Default)]
pub struct FilterResolver {
    services: HashMap<Scheme, Arc<HierarchyQueryService>>,
}

impl FilterResolver {
    pub fn new() -> Self {
        FilterResolver::default()
    }

    /// Add (or replace) the service used for its scheme
    pub fn with_service(mut self, service: Arc<HierarchyQueryService>) -> Self {
        self.services.insert(service.scheme(), service);
        self
    }

    /// Union of the leaf codes under every identifier.
    ///
    /// Blank identifiers are skipped. A single unresolvable identifier fails
    /// the whole call so a search is never silently narrowed or widened.
    pub fn resolve<I, S>(&self, scheme: Scheme, identifiers: I) -> Result<BTreeSet<String>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut identifiers = identifiers
            .into_iter()
            .filter(|id| !id.as_ref().trim().is_empty())
            .peekable();

        let mut leaves = BTreeSet::new();
        if identifiers.peek().is_none() {
            return Ok(leaves);
        }

        let service = self
            .services
            .get(&scheme)
            .ok_or(ClassificationError::SchemeUnavailable(scheme))?;

        for identifier in identifiers {
            let code = service.resolve_identifier(identifier.as_ref())?;
            let expanded = service.index().descendant_leaf_codes(&code)?;
            debug!(
                scheme = %scheme,
                identifier = identifier.as_ref(),
                code = %code,
                leaves = expanded.len(),
                "expanded filter identifier"
            );
            leaves.extend(expanded);
        }

        Ok(leaves)
    }
}
