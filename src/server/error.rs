//! API error type with HTTP status and numeric error code mapping

use crate::classification::Scheme;
use crate::error::ClassificationError;
use crate::procurement::SearchError;
use crate::validation::ValidationError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{debug, error};

/// Stable numeric codes reported in every error body.
///
/// Ranges: 1xxx validation, 2xxx internal, 3xxx upstream APIs,
/// 4xxx data processing, 5xxx missing resources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    InvalidInput = 1000,
    MissingParameter = 1001,
    InvalidParameterType = 1002,
    InternalServerError = 2000,
    ConfigurationError = 2002,
    ApiTimeout = 3000,
    DoffinApiError = 3001,
    SsbApiError = 3002,
    DataProcessingError = 4000,
    ResourceNotFound = 5000,
    CpvCodeNotFound = 5001,
    NutsCodeNotFound = 5002,
    StyrkCodeNotFound = 5003,
}

impl ErrorCode {
    pub fn value(self) -> u16 {
        self as u16
    }

    pub fn name(self) -> &'static str {
        match self {
            ErrorCode::InvalidInput => "INVALID_INPUT",
            ErrorCode::MissingParameter => "MISSING_PARAMETER",
            ErrorCode::InvalidParameterType => "INVALID_PARAMETER_TYPE",
            ErrorCode::InternalServerError => "INTERNAL_SERVER_ERROR",
            ErrorCode::ConfigurationError => "CONFIGURATION_ERROR",
            ErrorCode::ApiTimeout => "API_TIMEOUT",
            ErrorCode::DoffinApiError => "DOFFIN_API_ERROR",
            ErrorCode::SsbApiError => "SSB_API_ERROR",
            ErrorCode::DataProcessingError => "DATA_PROCESSING_ERROR",
            ErrorCode::ResourceNotFound => "RESOURCE_NOT_FOUND",
            ErrorCode::CpvCodeNotFound => "CPV_CODE_NOT_FOUND",
            ErrorCode::NutsCodeNotFound => "NUTS_CODE_NOT_FOUND",
            ErrorCode::StyrkCodeNotFound => "STYRK_CODE_NOT_FOUND",
        }
    }

    fn not_found_for(scheme: Scheme) -> Self {
        match scheme {
            Scheme::Geography => ErrorCode::NutsCodeNotFound,
            Scheme::Occupation => ErrorCode::StyrkCodeNotFound,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: ErrorCode,
    pub message: String,
    pub details: Option<Value>,
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    success: bool,
    error: &'a str,
    error_code: u16,
    error_name: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<&'a Value>,
}

impl ApiError {
    pub fn new(status: StatusCode, code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            status,
            code,
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::new(StatusCode::NOT_FOUND, ErrorCode::ResourceNotFound, message)
    }

    pub fn cpv_not_found(code: &str) -> Self {
        ApiError::new(StatusCode::NOT_FOUND, ErrorCode::CpvCodeNotFound, "CPV code not found")
            .with_details(json!({ "code": code }))
    }

    /// Map a classification failure, naming the scheme in not-found codes
    pub fn classification(scheme: Scheme, err: ClassificationError) -> Self {
        let message = err.to_string();
        let kind = err.kind();
        match err {
            ClassificationError::CodeNotFound { code } => ApiError::new(
                StatusCode::NOT_FOUND,
                ErrorCode::not_found_for(scheme),
                format!("{} code not found", scheme.classification()),
            )
            .with_details(json!({ "code": code })),

            ClassificationError::InvalidLevel { level, min, max } => {
                ApiError::new(StatusCode::BAD_REQUEST, ErrorCode::InvalidInput, message)
                    .with_details(json!({
                        "field": "level",
                        "received_value": level.to_string(),
                        "valid_range": { "min": min, "max": max },
                    }))
            }

            ClassificationError::UnresolvedIdentifier { input } => {
                ApiError::new(StatusCode::BAD_REQUEST, ErrorCode::InvalidInput, message)
                    .with_details(json!({ "identifier": input, "scheme": scheme.as_str() }))
            }

            ClassificationError::AmbiguousIdentifier { input, candidates } => {
                ApiError::new(StatusCode::BAD_REQUEST, ErrorCode::InvalidInput, message)
                    .with_details(json!({ "identifier": input, "candidates": candidates }))
            }

            ClassificationError::SchemeUnavailable(unavailable) => ApiError::new(
                StatusCode::SERVICE_UNAVAILABLE,
                ErrorCode::SsbApiError,
                message,
            )
            .with_details(json!({ "scheme": unavailable.as_str() })),

            ClassificationError::DuplicateCode { .. }
            | ClassificationError::OrphanedRecord { .. }
            | ClassificationError::LevelMismatch { .. } => ApiError::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorCode::DataProcessingError,
                message,
            )
            .with_details(json!({ "kind": kind, "scheme": scheme.as_str() })),
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        let code = match err {
            ValidationError::Invalid { .. } => ErrorCode::InvalidInput,
            ValidationError::Missing { .. } => ErrorCode::MissingParameter,
            ValidationError::InvalidType { .. } => ErrorCode::InvalidParameterType,
        };
        ApiError::new(StatusCode::BAD_REQUEST, code, err.to_string()).with_details(err.details())
    }
}

impl From<SearchError> for ApiError {
    fn from(err: SearchError) -> Self {
        let message = err.to_string();
        match err {
            SearchError::MissingApiKey => ApiError::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorCode::ConfigurationError,
                message,
            ),
            SearchError::Timeout => {
                ApiError::new(StatusCode::GATEWAY_TIMEOUT, ErrorCode::ApiTimeout, message)
                    .with_details(json!({ "service": "doffin" }))
            }
            SearchError::Status { status, .. } => {
                ApiError::new(StatusCode::BAD_GATEWAY, ErrorCode::DoffinApiError, message)
                    .with_details(json!({ "upstream_status": status }))
            }
            SearchError::Transport(_) | SearchError::InvalidResponse(_) => {
                ApiError::new(StatusCode::BAD_GATEWAY, ErrorCode::DoffinApiError, message)
            }
            SearchError::Classification(err) => ApiError::classification(Scheme::Geography, err),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            error!(status = %self.status, code = self.code.value(), error = %self.message, "request failed");
        } else {
            debug!(status = %self.status, code = self.code.value(), error = %self.message, "request rejected");
        }

        let body = ErrorBody {
            success: false,
            error: &self.message,
            error_code: self.code.value(),
            error_name: self.code.name(),
            details: self.details.as_ref(),
        };

        (self.status, Json(body)).into_response()
    }
}
