// 📄 Classification Record - one row of a classification snapshot
//
// Rows arrive from SSB's KLASS CSV export:
//   "code";"parentCode";"level";"name";"shortName";"presentationName";...
// Only the first four columns matter here; everything else is ignored.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// One classification code with its place in the hierarchy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassificationRecord {
    /// Unique within a scheme (e.g. "NO081", "2511")
    pub code: String,

    /// Parent code, `None` for level 1 roots
    #[serde(rename = "parentCode", default)]
    pub parent_code: Option<String>,

    /// 1 = root level
    pub level: u32,

    /// Display name, kept verbatim (Norwegian, sometimes bilingual)
    pub name: String,
}

impl ClassificationRecord {
    pub fn new(code: &str, parent_code: Option<&str>, level: u32, name: &str) -> Self {
        ClassificationRecord {
            code: code.to_string(),
            parent_code: parent_code.map(str::to_string),
            level,
            name: name.to_string(),
        }
    }

    pub fn root(code: &str, name: &str) -> Self {
        Self::new(code, None, 1, name)
    }

    pub fn is_root(&self) -> bool {
        self.parent_code.is_none()
    }
}

/// SHA-256 over every record, in order. Two snapshots with the same
/// fingerprint build identical indices.
pub fn fingerprint(records: &[ClassificationRecord]) -> String {
    let mut hasher = Sha256::new();

    for record in records {
        hasher.update(record.code.as_bytes());
        hasher.update([0x1f]);
        hasher.update(record.parent_code.as_deref().unwrap_or("").as_bytes());
        hasher.update([0x1f]);
        hasher.update(record.level.to_be_bytes());
        hasher.update(record.name.as_bytes());
        hasher.update([0x1e]);
    }

    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_constructors() {
        let root = ClassificationRecord::root("NO08", "Oslo og Viken");
        assert!(root.is_root());
        assert_eq!(root.level, 1);

        let child = ClassificationRecord::new("NO081", Some("NO08"), 2, "Oslo");
        assert!(!child.is_root());
        assert_eq!(child.parent_code.as_deref(), Some("NO08"));
    }

    #[test]
    fn test_fingerprint_is_stable() {
        let records = vec![
            ClassificationRecord::root("A", "Alpha"),
            ClassificationRecord::new("A1", Some("A"), 2, "Alpha one"),
        ];

        assert_eq!(fingerprint(&records), fingerprint(&records.clone()));
        assert_eq!(fingerprint(&records).len(), 64);
    }

    #[test]
    fn test_fingerprint_detects_changes() {
        let before = vec![ClassificationRecord::root("A", "Alpha")];
        let renamed = vec![ClassificationRecord::root("A", "Alfa")];
        assert_ne!(fingerprint(&before), fingerprint(&renamed));

        // Field boundaries matter: "A" + "B1" is not "AB" + "1"
        let left = vec![ClassificationRecord::new("A", Some("B1"), 2, "x")];
        let right = vec![ClassificationRecord::new("AB", Some("1"), 2, "x")];
        assert_ne!(fingerprint(&left), fingerprint(&right));
    }
}
