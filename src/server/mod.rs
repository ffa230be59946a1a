//! JSON API and web page over the live classification registry

pub mod error;
pub mod handlers;
pub mod query;

pub use error::{ApiError, ErrorCode};

use crate::classification::SchemeRegistry;
use crate::procurement::ProcurementSearchService;
use axum::routing::get;
use axum::Router;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Shared application state
#[derive(Clone, Debug)]
pub struct AppState {
    pub registry: Arc<SchemeRegistry>,
    /// `None` when no Doffin key is configured
    pub search: Option<Arc<ProcurementSearchService>>,
}

impl AppState {
    pub fn new(registry: Arc<SchemeRegistry>) -> Self {
        AppState {
            registry,
            search: None,
        }
    }

    pub fn with_search(mut self, search: ProcurementSearchService) -> Self {
        self.search = Some(Arc::new(search));
        self
    }
}

pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/health", get(handlers::health))
        // NUTS
        .route("/nuts/codes/level/:level", get(handlers::nuts_by_level))
        .route("/nuts/codes/:code", get(handlers::nuts_code))
        .route("/nuts/resolve", get(handlers::nuts_resolve))
        // STYRK
        .route("/styrk/codes/level/:level", get(handlers::styrk_by_level))
        .route("/styrk/codes/:code", get(handlers::styrk_code))
        .route("/styrk/resolve", get(handlers::styrk_resolve))
        .route("/styrk/profession-groups", get(handlers::profession_groups))
        .route("/styrk/sub-professions", get(handlers::sub_professions))
        .route("/styrk/roles", get(handlers::roles))
        .route("/styrk/titles", get(handlers::titles))
        // CPV
        .route("/cpv/categories", get(handlers::cpv_categories))
        .route("/cpv/codes", get(handlers::cpv_codes))
        .route("/cpv/codes/:code", get(handlers::cpv_code))
        .route("/cpv/stats", get(handlers::cpv_stats))
        // Doffin
        .route("/doffin/search", get(handlers::doffin_search))
        .with_state(state);

    Router::new()
        .route("/", get(handlers::serve_index))
        .nest("/api", api_routes)
        .fallback(handlers::not_found)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
