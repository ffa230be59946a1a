// 🚨 Classification Errors
// Structured rejections raised by the hierarchy builder and its query layers.
//
// Every variant carries the offending code/level/identifier so callers can
// build their own user-facing message.

use crate::classification::Scheme;
use thiserror::Error;

pub type Result<T, E = ClassificationError> = std::result::Result<T, E>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClassificationError {
    // ========================================================================
    // BUILD ERRORS (upstream data is inconsistent, scheme must not be served)
    // ========================================================================
    /// Two records share the same code
    #[error("duplicate classification code {code}")]
    DuplicateCode { code: String },

    /// A record points at a parent code that is not part of the input
    #[error("record {code} references unknown parent {parent_code}")]
    OrphanedRecord { code: String, parent_code: String },

    /// Declared level does not follow from the parent's level
    /// (`parent_code` is `None` for roots, which must be level 1)
    #[error("record {code} declares level {level}, expected {expected}")]
    LevelMismatch {
        code: String,
        parent_code: Option<String>,
        level: u32,
        expected: u64,
    },

    // ========================================================================
    // QUERY ERRORS (recoverable, caller-correctable)
    // ========================================================================
    #[error("classification code {code} not found")]
    CodeNotFound { code: String },

    #[error("level {level} is outside the valid range {min}..={max}")]
    InvalidLevel { level: u32, min: u32, max: u32 },

    #[error("identifier {input:?} matches no code or name")]
    UnresolvedIdentifier { input: String },

    /// Several nodes on the same level share the requested display name
    #[error("identifier {input:?} matches several codes: {}", candidates.join(", "))]
    AmbiguousIdentifier {
        input: String,
        candidates: Vec<String>,
    },

    /// The scheme has no published index (never loaded, or its load failed)
    #[error("{0} classification is not loaded")]
    SchemeUnavailable(Scheme),
}

impl ClassificationError {
    /// True for the errors only `HierarchyIndex::build` produces
    pub fn is_build_error(&self) -> bool {
        matches!(
            self,
            ClassificationError::DuplicateCode { .. }
                | ClassificationError::OrphanedRecord { .. }
                | ClassificationError::LevelMismatch { .. }
        )
    }

    /// Short machine-readable name of the variant
    pub fn kind(&self) -> &'static str {
        match self {
            ClassificationError::DuplicateCode { .. } => "duplicate_code",
            ClassificationError::OrphanedRecord { .. } => "orphaned_record",
            ClassificationError::LevelMismatch { .. } => "level_mismatch",
            ClassificationError::CodeNotFound { .. } => "code_not_found",
            ClassificationError::InvalidLevel { .. } => "invalid_level",
            ClassificationError::UnresolvedIdentifier { .. } => "unresolved_identifier",
            ClassificationError::AmbiguousIdentifier { .. } => "ambiguous_identifier",
            ClassificationError::SchemeUnavailable(_) => "scheme_unavailable",
        }
    }
}
