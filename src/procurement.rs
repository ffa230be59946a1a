// 🔎 Procurement Search - filter resolution + Doffin notice search
//
// The HTTP API accepts location filters as codes or names at any level.
// Doffin only matches exact codes, so locations are expanded to their leaf
// codes before the request is forwarded. The Doffin response is passed
// through untouched.

use crate::classification::{FilterResolver, Scheme};
use crate::error::ClassificationError;
use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

pub const DOFFIN_BASE_URL: &str = "https://api.doffin.no/public/v2";

// ============================================================================
// REQUEST TYPES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum NoticeStatus {
    Active,
    Awarded,
    Cancelled,
    Expired,
}

impl NoticeStatus {
    pub const ALL: [NoticeStatus; 4] = [
        NoticeStatus::Active,
        NoticeStatus::Awarded,
        NoticeStatus::Cancelled,
        NoticeStatus::Expired,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            NoticeStatus::Active => "ACTIVE",
            NoticeStatus::Awarded => "AWARDED",
            NoticeStatus::Cancelled => "CANCELLED",
            NoticeStatus::Expired => "EXPIRED",
        }
    }

    pub fn names() -> Vec<&'static str> {
        NoticeStatus::ALL.iter().map(|s| s.as_str()).collect()
    }
}

impl fmt::Display for NoticeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown notice status: {0}")]
pub struct ParseStatusError(pub String);

impl FromStr for NoticeStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        NoticeStatus::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| ParseStatusError(s.to_string()))
    }
}

/// Validated search parameters, as the user gave them
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    pub search_string: Option<String>,
    pub cpv_codes: Vec<String>,
    /// NUTS codes or names, any level
    pub locations: Vec<String>,
    pub statuses: BTreeSet<NoticeStatus>,
    pub page: u32,
    pub hits_per_page: u32,
}

impl Default for SearchRequest {
    fn default() -> Self {
        SearchRequest {
            search_string: None,
            cpv_codes: Vec::new(),
            locations: Vec::new(),
            statuses: BTreeSet::new(),
            page: crate::validation::DEFAULT_PAGE,
            hits_per_page: crate::validation::DEFAULT_HITS_PER_PAGE,
        }
    }
}

/// A search whose location filter has been expanded to leaf codes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedSearch {
    pub request: SearchRequest,
    /// Empty means no location filter
    pub location_codes: BTreeSet<String>,
}

impl ResolvedSearch {
    /// Doffin query parameters, repeated keys for list filters
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let request = &self.request;
        let mut pairs = vec![
            ("numHitsPerPage", request.hits_per_page.to_string()),
            ("page", request.page.to_string()),
        ];

        if let Some(search) = &request.search_string {
            pairs.push(("searchString", search.clone()));
        }
        pairs.extend(request.cpv_codes.iter().map(|c| ("cpvCode", c.clone())));
        pairs.extend(self.location_codes.iter().map(|c| ("location", c.clone())));
        pairs.extend(request.statuses.iter().map(|s| ("status", s.as_str().to_string())));

        pairs
    }
}

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("DOFFIN_API_KEY is not configured")]
    MissingApiKey,

    #[error("Doffin request timed out")]
    Timeout,

    #[error("Doffin request failed: {0}")]
    Transport(String),

    #[error("Doffin returned HTTP {status}")]
    Status { status: u16, body: String },

    #[error("Doffin returned an unreadable response: {0}")]
    InvalidResponse(String),

    #[error(transparent)]
    Classification(#[from] ClassificationError),
}

#[cfg(feature = "server")]
impl From<reqwest::Error> for SearchError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            SearchError::Timeout
        } else if e.is_decode() {
            SearchError::InvalidResponse(e.to_string())
        } else {
            SearchError::Transport(e.to_string())
        }
    }
}

// ============================================================================
// BACKEND
// ============================================================================

/// Something that can run a notice search. Doffin in production, stubs in tests.
#[async_trait]
pub trait NoticeSearch: Send + Sync {
    async fn search(&self, search: &ResolvedSearch) -> Result<Value, SearchError>;
}

/// Results plus the number of hits on this page
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchOutcome {
    pub data: Value,
    pub elements: usize,
}

pub struct ProcurementSearchService {
    backend: Arc<dyn NoticeSearch>,
}

impl ProcurementSearchService {
    pub fn new(backend: Arc<dyn NoticeSearch>) -> Self {
        ProcurementSearchService { backend }
    }

    /// Resolve the request's filters against `resolver` and forward it
    pub fn resolve(
        &self,
        resolver: &FilterResolver,
        request: SearchRequest,
    ) -> Result<ResolvedSearch, SearchError> {
        let location_codes = resolver.resolve(Scheme::Geography, &request.locations)?;
        debug!(
            identifiers = request.locations.len(),
            codes = location_codes.len(),
            "resolved location filter"
        );
        Ok(ResolvedSearch {
            request,
            location_codes,
        })
    }

    pub async fn search(
        &self,
        resolver: &FilterResolver,
        request: SearchRequest,
    ) -> Result<SearchOutcome, SearchError> {
        let resolved = self.resolve(resolver, request)?;
        let data = self.backend.search(&resolved).await?;

        let elements = data
            .get("hits")
            .and_then(Value::as_array)
            .map_or(0, Vec::len);

        info!(
            page = resolved.request.page,
            locations = resolved.location_codes.len(),
            elements,
            "notice search completed"
        );

        Ok(SearchOutcome { data, elements })
    }
}

impl fmt::Debug for ProcurementSearchService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProcurementSearchService").finish_non_exhaustive()
    }
}

// ============================================================================
// DOFFIN CLIENT
// ============================================================================

#[cfg(feature = "server")]
#[derive(Debug, Clone)]
pub struct DoffinClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

#[cfg(feature = "server")]
impl DoffinClient {
    pub fn new(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        timeout: std::time::Duration,
    ) -> Result<Self, SearchError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(SearchError::MissingApiKey);
        }

        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(DoffinClient {
            http,
            base_url: base_url.into(),
            api_key,
        })
    }
}

#[cfg(feature = "server")]
#[async_trait]
impl NoticeSearch for DoffinClient {
    async fn search(&self, search: &ResolvedSearch) -> Result<Value, SearchError> {
        let url = format!("{}/search", self.base_url.trim_end_matches('/'));

        let response = self
            .http
            .get(&url)
            .header("Ocp-Apim-Subscription-Key", &self.api_key)
            .query(&search.query_pairs())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SearchError::Status {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response.json::<Value>().await?)
    }
}
