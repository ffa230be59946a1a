// API handlers for classifications, CPV and Doffin search

use super::error::ApiError;
use super::query::parse_pairs;
use super::AppState;
use crate::classification::{CodeDetail, CodeEntry, HierarchyQueryService, Scheme, SchemeNode, SnapshotInfo};
use crate::cpv::{self, CategorySummary, CpvEntry, CpvStats};
use crate::procurement::{SearchError, SearchOutcome, SearchRequest};
use crate::validation::{all_values, first_value, parse_level, validate_identifiers, ValidationError};
use axum::extract::{Path, RawQuery, State};
use axum::response::{Html, IntoResponse, Json};
use serde::Serialize;
use std::collections::BTreeSet;
use std::sync::Arc;

type ApiResult<T> = Result<Json<T>, ApiError>;

// ============================================================================
// RESPONSE TYPES
// ============================================================================

/// API Response wrapper
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
}

impl<T> ApiResponse<T> {
    fn ok(data: T) -> Self {
        Self { success: true, data }
    }
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub success: bool,
    pub message: &'static str,
    pub version: &'static str,
    pub classifications: Vec<SnapshotInfo>,
    pub search_enabled: bool,
}

/// Hierarchy truncated at `level`
#[derive(Debug, Serialize)]
pub struct StructureResponse {
    pub success: bool,
    pub level: u32,
    pub structure: Vec<SchemeNode>,
    pub total: usize,
}

#[derive(Debug, Serialize)]
pub struct ProfessionGroupsResponse {
    pub success: bool,
    pub profession_groups: Vec<CodeEntry>,
    pub total: usize,
}

#[derive(Debug, Serialize)]
pub struct Resolution {
    pub scheme: Scheme,
    pub identifiers: Vec<String>,
    pub codes: BTreeSet<String>,
    pub total: usize,
}

#[derive(Debug, Serialize)]
pub struct ListResponse<T> {
    pub success: bool,
    pub data: Vec<T>,
    pub total: usize,
}

impl<T> ListResponse<T> {
    fn ok(data: Vec<T>) -> Self {
        Self {
            success: true,
            total: data.len(),
            data,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CpvFilters {
    pub category: Option<String>,
    pub search: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CpvCodesResponse {
    pub success: bool,
    pub data: Vec<CpvEntry>,
    pub total: usize,
    pub filters: CpvFilters,
}

#[derive(Debug, Serialize)]
pub struct CpvDetail {
    #[serde(flatten)]
    pub entry: CpvEntry,
    pub related_codes: Vec<CpvEntry>,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub success: bool,
    #[serde(flatten)]
    pub outcome: SearchOutcome,
}

// ============================================================================
// HELPERS
// ============================================================================

fn live_service(state: &AppState, scheme: Scheme) -> Result<Arc<HierarchyQueryService>, ApiError> {
    state
        .registry
        .get(scheme)
        .map_err(|e| ApiError::classification(scheme, e))
}

fn structure(state: &AppState, scheme: Scheme, level: u32) -> ApiResult<StructureResponse> {
    let service = live_service(state, scheme)?;
    let structure = service
        .get_hierarchy(level)
        .map_err(|e| ApiError::classification(scheme, e))?;

    Ok(Json(StructureResponse {
        success: true,
        level,
        total: structure.len(),
        structure,
    }))
}

fn detail(state: &AppState, scheme: Scheme, code: &str) -> ApiResult<ApiResponse<CodeDetail>> {
    let service = live_service(state, scheme)?;
    let detail = service
        .detail(code.trim())
        .map_err(|e| ApiError::classification(scheme, e))?;
    Ok(Json(ApiResponse::ok(detail)))
}

fn resolve(state: &AppState, scheme: Scheme, raw_query: Option<&str>) -> ApiResult<ApiResponse<Resolution>> {
    let pairs = parse_pairs(raw_query);
    let identifiers = validate_identifiers(&all_values(&pairs, "identifier"));
    if identifiers.is_empty() {
        return Err(ValidationError::Missing {
            parameter: "identifier",
        }
        .into());
    }

    let codes = state
        .registry
        .resolver()
        .resolve(scheme, &identifiers)
        .map_err(|e| ApiError::classification(scheme, e))?;

    Ok(Json(ApiResponse::ok(Resolution {
        scheme,
        identifiers,
        total: codes.len(),
        codes,
    })))
}

// ============================================================================
// GENERAL
// ============================================================================

/// GET /api/health
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        success: true,
        message: "API is running",
        version: env!("CARGO_PKG_VERSION"),
        classifications: state.registry.snapshots(),
        search_enabled: state.search.is_some(),
    })
}

/// GET / - Serve index.html
pub async fn serve_index() -> impl IntoResponse {
    Html(include_str!("../../web/index.html"))
}

pub async fn not_found() -> ApiError {
    ApiError::not_found("Endpoint not found")
}

// ============================================================================
// NUTS
// ============================================================================

/// GET /api/nuts/codes/level/:level
pub async fn nuts_by_level(
    State(state): State<AppState>,
    Path(level): Path<String>,
) -> ApiResult<StructureResponse> {
    structure(&state, Scheme::Geography, parse_level(&level)?)
}

/// GET /api/nuts/codes/:code
pub async fn nuts_code(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> ApiResult<ApiResponse<CodeDetail>> {
    detail(&state, Scheme::Geography, &code)
}

/// GET /api/nuts/resolve?identifier=..
pub async fn nuts_resolve(
    State(state): State<AppState>,
    RawQuery(query): RawQuery,
) -> ApiResult<ApiResponse<Resolution>> {
    resolve(&state, Scheme::Geography, query.as_deref())
}

// ============================================================================
// STYRK
// ============================================================================

/// GET /api/styrk/codes/level/:level
pub async fn styrk_by_level(
    State(state): State<AppState>,
    Path(level): Path<String>,
) -> ApiResult<StructureResponse> {
    structure(&state, Scheme::Occupation, parse_level(&level)?)
}

/// GET /api/styrk/codes/:code
pub async fn styrk_code(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> ApiResult<ApiResponse<CodeDetail>> {
    detail(&state, Scheme::Occupation, &code)
}

/// GET /api/styrk/resolve?identifier=..
pub async fn styrk_resolve(
    State(state): State<AppState>,
    RawQuery(query): RawQuery,
) -> ApiResult<ApiResponse<Resolution>> {
    resolve(&state, Scheme::Occupation, query.as_deref())
}

/// GET /api/styrk/profession-groups - major groups, flat
pub async fn profession_groups(State(state): State<AppState>) -> ApiResult<ProfessionGroupsResponse> {
    let groups = live_service(&state, Scheme::Occupation)?.at_level(1);
    Ok(Json(ProfessionGroupsResponse {
        success: true,
        total: groups.len(),
        profession_groups: groups,
    }))
}

/// GET /api/styrk/sub-professions
pub async fn sub_professions(State(state): State<AppState>) -> ApiResult<StructureResponse> {
    structure(&state, Scheme::Occupation, 2)
}

/// GET /api/styrk/roles
pub async fn roles(State(state): State<AppState>) -> ApiResult<StructureResponse> {
    structure(&state, Scheme::Occupation, 3)
}

/// GET /api/styrk/titles
pub async fn titles(State(state): State<AppState>) -> ApiResult<StructureResponse> {
    structure(&state, Scheme::Occupation, 4)
}

// ============================================================================
// CPV
// ============================================================================

fn parse_cpv_code(parameter: &'static str, raw: &str) -> Result<u32, ValidationError> {
    raw.trim().parse().map_err(|_| ValidationError::InvalidType {
        parameter,
        expected: "integer",
        received: raw.to_string(),
    })
}

/// GET /api/cpv/categories
pub async fn cpv_categories() -> Json<ListResponse<CategorySummary>> {
    Json(ListResponse::ok(cpv::categories()))
}

/// GET /api/cpv/codes?category=&search= - search wins over category
pub async fn cpv_codes(RawQuery(query): RawQuery) -> ApiResult<CpvCodesResponse> {
    let pairs = parse_pairs(query.as_deref());
    let search = first_value(&pairs, "search")
        .map(str::trim)
        .filter(|s| !s.is_empty());
    let category = first_value(&pairs, "category")
        .map(str::trim)
        .filter(|s| !s.is_empty());

    let data = match (search, category) {
        (Some(search), _) => cpv::search(search),
        (None, Some(category)) => cpv::in_division(parse_cpv_code("category", category)?),
        (None, None) => cpv::all(),
    };

    Ok(Json(CpvCodesResponse {
        success: true,
        total: data.len(),
        data,
        filters: CpvFilters {
            category: category.map(str::to_string),
            search: search.map(str::to_string),
        },
    }))
}

/// GET /api/cpv/codes/:code
pub async fn cpv_code(Path(code): Path<String>) -> ApiResult<ApiResponse<CpvDetail>> {
    let value = parse_cpv_code("code", &code)?;
    let entry = cpv::get(value).ok_or_else(|| ApiError::cpv_not_found(&code))?;

    Ok(Json(ApiResponse::ok(CpvDetail {
        related_codes: cpv::related(value),
        entry,
    })))
}

/// GET /api/cpv/stats
pub async fn cpv_stats() -> Json<ApiResponse<CpvStats>> {
    Json(ApiResponse::ok(cpv::stats()))
}

// ============================================================================
// DOFFIN
// ============================================================================

/// GET /api/doffin/search
pub async fn doffin_search(
    State(state): State<AppState>,
    RawQuery(query): RawQuery,
) -> ApiResult<SearchResponse> {
    let request = SearchRequest::from_query(&parse_pairs(query.as_deref()))?;
    let search = state.search.as_ref().ok_or(SearchError::MissingApiKey)?;

    let outcome = search.search(&state.registry.resolver(), request).await?;
    Ok(Json(SearchResponse {
        success: true,
        outcome,
    }))
}
