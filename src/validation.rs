// ✅ Request Validation - raw query strings → typed, checked parameters
//
// Every check reports the offending field and the value it received so the
// API can echo both back in the error details.

use crate::procurement::{NoticeStatus, SearchRequest};
use serde_json::{json, Map, Value};
use std::collections::BTreeSet;
use thiserror::Error;

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_HITS_PER_PAGE: u32 = 100;
pub const MAX_HITS_PER_PAGE: u32 = 1000;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{message}")]
    Invalid {
        field: &'static str,
        message: String,
        received: Option<String>,
    },

    #[error("Missing required parameter: {parameter}")]
    Missing { parameter: &'static str },

    #[error("Invalid type for parameter '{parameter}'. Expected {expected}")]
    InvalidType {
        parameter: &'static str,
        expected: &'static str,
        received: String,
    },
}

impl ValidationError {
    fn invalid(field: &'static str, message: impl Into<String>, received: impl Into<String>) -> Self {
        ValidationError::Invalid {
            field,
            message: message.into(),
            received: Some(received.into()),
        }
    }

    /// Structured context for the error response body
    pub fn details(&self) -> Value {
        match self {
            ValidationError::Invalid { field, received, .. } => {
                let mut details = Map::new();
                details.insert("field".to_string(), json!(field));
                if let Some(received) = received {
                    details.insert("received_value".to_string(), json!(received));
                }
                Value::Object(details)
            }
            ValidationError::Missing { parameter } => json!({ "missing_parameter": parameter }),
            ValidationError::InvalidType {
                parameter,
                expected,
                received,
            } => json!({
                "parameter": parameter,
                "expected_type": expected,
                "received_value": received,
            }),
        }
    }
}

// ============================================================================
// SCALARS
// ============================================================================

fn parse_integer(parameter: &'static str, raw: &str) -> Result<i64, ValidationError> {
    raw.trim().parse().map_err(|_| ValidationError::InvalidType {
        parameter,
        expected: "integer",
        received: raw.to_string(),
    })
}

/// Hierarchy depth from a path segment. The range check belongs to the
/// scheme service, which knows how deep its tree goes.
pub fn parse_level(raw: &str) -> Result<u32, ValidationError> {
    let level = parse_integer("level", raw)?;
    u32::try_from(level).map_err(|_| {
        ValidationError::invalid("level", "Parameter 'level' must be a positive integer", raw)
    })
}

pub fn validate_page(raw: Option<&str>) -> Result<u32, ValidationError> {
    let Some(raw) = raw else {
        return Ok(DEFAULT_PAGE);
    };

    let page = parse_integer("page", raw)?;
    if page < 1 {
        return Err(ValidationError::invalid(
            "page",
            "Parameter 'page' must be greater than 0",
            page.to_string(),
        ));
    }
    u32::try_from(page).map_err(|_| {
        ValidationError::invalid("page", "Parameter 'page' is too large", page.to_string())
    })
}

pub fn validate_hits_per_page(raw: Option<&str>) -> Result<u32, ValidationError> {
    let Some(raw) = raw else {
        return Ok(DEFAULT_HITS_PER_PAGE);
    };

    let hits = parse_integer("hitsPerPage", raw)?;
    if !(1..=i64::from(MAX_HITS_PER_PAGE)).contains(&hits) {
        return Err(ValidationError::invalid(
            "hitsPerPage",
            format!("Parameter 'hitsPerPage' must be between 1 and {MAX_HITS_PER_PAGE}"),
            hits.to_string(),
        ));
    }
    Ok(hits as u32)
}

/// Trimmed free text; blank means absent
pub fn validate_search_str(raw: Option<&str>) -> Option<String> {
    raw.map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

// ============================================================================
// LISTS
// ============================================================================

fn non_blank<'a>(values: &'a [&'a str]) -> impl Iterator<Item = &'a str> + 'a {
    values.iter().map(|v| v.trim()).filter(|v| !v.is_empty())
}

/// CPV codes must be all digits. Every bad code is reported at once.
pub fn validate_cpv_codes(values: &[&str]) -> Result<Vec<String>, ValidationError> {
    let codes: Vec<String> = non_blank(values).map(str::to_string).collect();

    let invalid: Vec<&str> = codes
        .iter()
        .map(String::as_str)
        .filter(|code| !code.chars().all(|c| c.is_ascii_digit()))
        .collect();

    if !invalid.is_empty() {
        let joined = invalid.join(", ");
        return Err(ValidationError::invalid(
            "cpvCode",
            format!("Invalid CPV code format (must be numeric): {joined}"),
            joined,
        ));
    }

    Ok(codes)
}

/// Location and occupation identifiers: codes or names, trimmed
pub fn validate_identifiers(values: &[&str]) -> Vec<String> {
    non_blank(values).map(str::to_string).collect()
}

pub fn validate_status(values: &[&str]) -> Result<BTreeSet<NoticeStatus>, ValidationError> {
    non_blank(values)
        .map(|raw| {
            raw.parse::<NoticeStatus>().map_err(|_| {
                let upper = raw.to_uppercase();
                ValidationError::invalid(
                    "status",
                    format!(
                        "Invalid status '{upper}'. Must be one of: {}",
                        NoticeStatus::names().join(", ")
                    ),
                    upper,
                )
            })
        })
        .collect()
}

// ============================================================================
// SEARCH PARAMETERS
// ============================================================================

/// Collect every value of `key` in query order
pub fn all_values<'a>(pairs: &'a [(String, String)], key: &str) -> Vec<&'a str> {
    pairs
        .iter()
        .filter(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
        .collect()
}

/// First value of `key`
pub fn first_value<'a>(pairs: &'a [(String, String)], key: &str) -> Option<&'a str> {
    pairs.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
}

impl SearchRequest {
    /// Build a validated search from decoded query pairs.
    ///
    /// Recognised keys: `search`, `cpvCode`, `location`, `status` (the
    /// last three may repeat), `page`, `hitsPerPage`.
    pub fn from_query(pairs: &[(String, String)]) -> Result<Self, ValidationError> {
        Ok(SearchRequest {
            search_string: validate_search_str(first_value(pairs, "search")),
            cpv_codes: validate_cpv_codes(&all_values(pairs, "cpvCode"))?,
            locations: validate_identifiers(&all_values(pairs, "location")),
            statuses: validate_status(&all_values(pairs, "status"))?,
            page: validate_page(first_value(pairs, "page"))?,
            hits_per_page: validate_hits_per_page(first_value(pairs, "hitsPerPage"))?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(raw: &[(&str, &str)]) -> Vec<(String, String)> {
        raw.iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_parse_level() {
        assert_eq!(parse_level("2"), Ok(2));
        assert_eq!(parse_level(" 3 "), Ok(3));
        assert!(matches!(
            parse_level("two"),
            Err(ValidationError::InvalidType { parameter: "level", .. })
        ));
        assert!(matches!(
            parse_level("-1"),
            Err(ValidationError::Invalid { field: "level", .. })
        ));
    }

    #[test]
    fn test_page_defaults_and_bounds() {
        assert_eq!(validate_page(None), Ok(1));
        assert_eq!(validate_page(Some("4")), Ok(4));

        let err = validate_page(Some("0")).unwrap_err();
        assert_eq!(err.to_string(), "Parameter 'page' must be greater than 0");
        assert_eq!(err.details(), json!({ "field": "page", "received_value": "0" }));
    }

    #[test]
    fn test_hits_per_page_bounds() {
        assert_eq!(validate_hits_per_page(None), Ok(100));
        assert_eq!(validate_hits_per_page(Some("1")), Ok(1));
        assert_eq!(validate_hits_per_page(Some("1000")), Ok(1000));
        assert!(validate_hits_per_page(Some("1001")).is_err());
        assert!(validate_hits_per_page(Some("0")).is_err());

        let err = validate_hits_per_page(Some("lots")).unwrap_err();
        assert_eq!(
            err.details(),
            json!({ "parameter": "hitsPerPage", "expected_type": "integer", "received_value": "lots" })
        );
    }

    #[test]
    fn test_search_string_blank_is_absent() {
        assert_eq!(validate_search_str(None), None);
        assert_eq!(validate_search_str(Some("   ")), None);
        assert_eq!(validate_search_str(Some(" Forsvaret ")), Some("Forsvaret".to_string()));
    }

    #[test]
    fn test_cpv_codes_must_be_numeric() {
        assert_eq!(
            validate_cpv_codes(&["72000000", " 48000000 ", ""]),
            Ok(vec!["72000000".to_string(), "48000000".to_string()])
        );

        let err = validate_cpv_codes(&["72000000", "abc", "12x"]).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid CPV code format (must be numeric): abc, 12x"
        );
    }

    #[test]
    fn test_status_is_case_insensitive() {
        let statuses = validate_status(&["active", " AWARDED ", ""]).unwrap();
        assert_eq!(
            statuses.into_iter().collect::<Vec<_>>(),
            vec![NoticeStatus::Active, NoticeStatus::Awarded]
        );

        let err = validate_status(&["open"]).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid status 'OPEN'. Must be one of: ACTIVE, AWARDED, CANCELLED, EXPIRED"
        );
    }

    #[test]
    fn test_search_request_from_query() {
        let query = pairs(&[
            ("search", " skytjenester "),
            ("cpvCode", "72000000"),
            ("location", "NO081"),
            ("location", " Viken "),
            ("location", ""),
            ("status", "active"),
            ("hitsPerPage", "25"),
        ]);

        let request = SearchRequest::from_query(&query).unwrap();

        assert_eq!(request.search_string.as_deref(), Some("skytjenester"));
        assert_eq!(request.cpv_codes, vec!["72000000"]);
        assert_eq!(request.locations, vec!["NO081", "Viken"]);
        assert_eq!(request.page, 1);
        assert_eq!(request.hits_per_page, 25);
    }

    #[test]
    fn test_search_request_reports_first_bad_field() {
        let query = pairs(&[("cpvCode", "software"), ("page", "0")]);
        let err = SearchRequest::from_query(&query).unwrap_err();

        assert!(matches!(err, ValidationError::Invalid { field: "cpvCode", .. }));
    }
}
