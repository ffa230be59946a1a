// 🧭 Hierarchy Query Service - scheme-specific façade over one HierarchyIndex
//
// The index is scheme-agnostic and permissive; this layer:
// - validates requested levels against the scheme's served range
// - renames "children" to the scheme's vocabulary (counties, roles, ...)
// - turns user identifiers (codes or names) into canonical codes

use super::index::{primary_name, HierarchyIndex, NestedNode};
use super::record::{fingerprint, ClassificationRecord};
use super::scheme::{LabeledChildren, Scheme, SchemeNode};
use crate::error::{ClassificationError, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::ops::RangeInclusive;
use tracing::{debug, info};

// ============================================================================
// RESPONSE TYPES
// ============================================================================

/// Metadata about the snapshot a service was built from
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SnapshotInfo {
    pub scheme: Scheme,
    /// KLASS version or file the records came from
    pub source: Option<String>,
    pub fingerprint: String,
    pub records: usize,
    pub max_level: u32,
    pub loaded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CodeEntry {
    pub code: String,
    pub name: String,
}

impl From<&ClassificationRecord> for CodeEntry {
    fn from(record: &ClassificationRecord) -> Self {
        CodeEntry {
            code: record.code.clone(),
            name: record.name.clone(),
        }
    }
}

/// Everything known about a single code
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CodeDetail {
    pub code: String,
    pub name: String,
    pub level: u32,
    pub parent: Option<CodeEntry>,
    pub ancestors: Vec<String>,
    pub children: Vec<CodeEntry>,
}

// ============================================================================
// SERVICE
// ============================================================================

#[derive(Debug)]
pub struct HierarchyQueryService {
    index: HierarchyIndex,
    snapshot: SnapshotInfo,
}

impl HierarchyQueryService {
    /// Build the index for `scheme` from a record snapshot
    pub fn from_records(
        scheme: Scheme,
        records: Vec<ClassificationRecord>,
        source: Option<String>,
    ) -> Result<Self> {
        let fingerprint = fingerprint(&records);
        let index = HierarchyIndex::build(records)?;

        let snapshot = SnapshotInfo {
            scheme,
            source,
            fingerprint,
            records: index.len(),
            max_level: index.max_level(),
            loaded_at: Utc::now(),
        };

        info!(
            scheme = %scheme,
            records = snapshot.records,
            max_level = snapshot.max_level,
            fingerprint = %short_fingerprint(&snapshot.fingerprint),
            "classification snapshot built"
        );

        Ok(HierarchyQueryService { index, snapshot })
    }

    pub fn scheme(&self) -> Scheme {
        self.snapshot.scheme
    }

    pub fn index(&self) -> &HierarchyIndex {
        &self.index
    }

    pub fn snapshot(&self) -> &SnapshotInfo {
        &self.snapshot
    }

    /// Levels accepted by `get_hierarchy`
    pub fn valid_levels(&self) -> RangeInclusive<u32> {
        1..=self.scheme().depth().min(self.index.max_level())
    }

    // ========================================================================
    // HIERARCHY
    // ========================================================================

    /// Scheme-shaped forest truncated at `level`
    pub fn get_hierarchy(&self, level: u32) -> Result<Vec<SchemeNode>> {
        let valid = self.valid_levels();
        if !valid.contains(&level) {
            return Err(ClassificationError::InvalidLevel {
                level,
                min: *valid.start(),
                max: *valid.end(),
            });
        }

        Ok(self
            .index
            .forest(level)
            .into_iter()
            .map(|node| self.shape(node, level))
            .collect())
    }

    fn shape(&self, node: NestedNode, requested: u32) -> SchemeNode {
        let scheme = self.scheme();

        let children = (node.level < requested).then(|| LabeledChildren {
            label: scheme.child_label(node.level),
            nodes: node
                .children
                .into_iter()
                .map(|child| self.shape(child, requested))
                .collect(),
        });

        let name = if scheme.trims_name_at(node.level) {
            primary_name(&node.name).to_string()
        } else {
            node.name
        };

        SchemeNode {
            code: node.code,
            name,
            children,
        }
    }

    // ========================================================================
    // IDENTIFIERS
    // ========================================================================

    /// Canonical code for `input`.
    ///
    /// Strategies, in order:
    /// 1. exact code
    /// 2. exact, case-insensitive display name. When several nodes match,
    ///    the shallowest level wins; a tie on that level is ambiguous.
    pub fn resolve_identifier(&self, input: &str) -> Result<String> {
        let wanted = input.trim();
        let unresolved = || ClassificationError::UnresolvedIdentifier {
            input: wanted.to_string(),
        };

        if wanted.is_empty() {
            return Err(unresolved());
        }

        if let Some(record) = self.index.get(wanted) {
            return Ok(record.code.clone());
        }

        let matches = self.index.find_by_name(wanted);
        let shallowest = matches.iter().map(|r| r.level).min().ok_or_else(unresolved)?;
        let candidates: Vec<&ClassificationRecord> = matches
            .into_iter()
            .filter(|r| r.level == shallowest)
            .collect();

        match candidates.as_slice() {
            [only] => {
                debug!(scheme = %self.scheme(), input = wanted, code = %only.code, "resolved name");
                Ok(only.code.clone())
            }
            _ => Err(ClassificationError::AmbiguousIdentifier {
                input: wanted.to_string(),
                candidates: candidates.iter().map(|r| r.code.clone()).collect(),
            }),
        }
    }

    // ========================================================================
    // CODE LOOKUPS
    // ========================================================================

    pub fn contains(&self, code: &str) -> bool {
        self.index.contains(code)
    }

    /// Display name of `code`
    pub fn describe(&self, code: &str) -> Option<&str> {
        self.index.get(code).map(|r| r.name.as_str())
    }

    pub fn detail(&self, code: &str) -> Result<CodeDetail> {
        let record = self
            .index
            .get(code)
            .ok_or_else(|| ClassificationError::CodeNotFound {
                code: code.to_string(),
            })?;

        Ok(CodeDetail {
            code: record.code.clone(),
            name: record.name.clone(),
            level: record.level,
            parent: self.index.parent(code)?.map(CodeEntry::from),
            ancestors: self
                .index
                .ancestors(code)?
                .into_iter()
                .map(str::to_string)
                .collect(),
            children: self.children(code)?,
        })
    }

    pub fn children(&self, code: &str) -> Result<Vec<CodeEntry>> {
        Ok(self
            .index
            .children(code)?
            .into_iter()
            .map(CodeEntry::from)
            .collect())
    }

    pub fn at_level(&self, level: u32) -> Vec<CodeEntry> {
        self.index.at_level(level).into_iter().map(CodeEntry::from).collect()
    }

    pub fn search(&self, query: &str) -> Vec<CodeEntry> {
        self.index.search(query).into_iter().map(CodeEntry::from).collect()
    }
}

pub(crate) fn short_fingerprint(fingerprint: &str) -> &str {
    fingerprint.get(..12).unwrap_or(fingerprint)
}

// ============================================================================
// TESTS
// ============================================================================
