// 🗂️ Classification Schemes - NUTS geography and STYRK occupations
//
// Each scheme knows its SSB version, how deep it is served, and what the
// children of each level are called in API responses.

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

// ============================================================================
// SCHEME
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scheme {
    /// NUTS regions: landsdel → fylke → kommune
    Geography,

    /// STYRK-08: major group → sub-major group → minor group → unit group
    Occupation,
}

impl Scheme {
    pub const ALL: [Scheme; 2] = [Scheme::Geography, Scheme::Occupation];

    pub fn as_str(&self) -> &'static str {
        match self {
            Scheme::Geography => "geography",
            Scheme::Occupation => "occupation",
        }
    }

    /// Name of the SSB classification backing this scheme
    pub fn classification(&self) -> &'static str {
        match self {
            Scheme::Geography => "NUTS",
            Scheme::Occupation => "STYRK",
        }
    }

    /// KLASS version id fetched when no version is configured
    pub fn default_version(&self) -> u32 {
        match self {
            Scheme::Geography => 2482,
            Scheme::Occupation => 33,
        }
    }

    /// Children key for nodes on each level, index 0 = level 1
    fn child_labels(&self) -> &'static [&'static str] {
        match self {
            Scheme::Geography => &["counties", "municipalities"],
            Scheme::Occupation => &["subgroups", "roles", "titles"],
        }
    }

    /// Deepest level served by `get_hierarchy`
    pub fn depth(&self) -> u32 {
        self.child_labels().len() as u32 + 1
    }

    /// Key under which a level-`level` node lists its children
    pub fn child_label(&self, level: u32) -> &'static str {
        level
            .checked_sub(1)
            .and_then(|i| self.child_labels().get(i as usize))
            .copied()
            .unwrap_or("children")
    }

    /// Geography counties show only the first segment of "Troms/Romsa"
    /// style names; every other node keeps its name as delivered
    pub fn trims_name_at(&self, level: u32) -> bool {
        matches!(self, Scheme::Geography) && level == 2
    }
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.classification())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown classification scheme {0:?} (expected geography/nuts or occupation/styrk)")]
pub struct ParseSchemeError(String);

impl FromStr for Scheme {
    type Err = ParseSchemeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "geography" | "nuts" => Ok(Scheme::Geography),
            "occupation" | "styrk" => Ok(Scheme::Occupation),
            other => Err(ParseSchemeError(other.to_string())),
        }
    }
}

// ============================================================================
// SHAPED OUTPUT
// ============================================================================

/// One node of a scheme-shaped hierarchy. Serializes as
/// `{"code": .., "name": .., "<label>": [..]}` where the children key is
/// omitted on the deepest requested level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemeNode {
    pub code: String,
    pub name: String,
    pub children: Option<LabeledChildren>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabeledChildren {
    pub label: &'static str,
    pub nodes: Vec<SchemeNode>,
}

impl SchemeNode {
    pub fn children(&self) -> &[SchemeNode] {
        self.children.as_ref().map(|c| c.nodes.as_slice()).unwrap_or(&[])
    }
}

impl Serialize for SchemeNode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let len = if self.children.is_some() { 3 } else { 2 };
        let mut map = serializer.serialize_map(Some(len))?;
        map.serialize_entry("code", &self.code)?;
        map.serialize_entry("name", &self.name)?;
        if let Some(children) = &self.children {
            map.serialize_entry(children.label, &children.nodes)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scheme_parsing() {
        assert_eq!("nuts".parse::<Scheme>().unwrap(), Scheme::Geography);
        assert_eq!(" Geography ".parse::<Scheme>().unwrap(), Scheme::Geography);
        assert_eq!("STYRK".parse::<Scheme>().unwrap(), Scheme::Occupation);
        assert!("cpv".parse::<Scheme>().is_err());
    }

    #[test]
    fn test_scheme_depths_and_labels() {
        assert_eq!(Scheme::Geography.depth(), 3);
        assert_eq!(Scheme::Occupation.depth(), 4);

        assert_eq!(Scheme::Geography.child_label(1), "counties");
        assert_eq!(Scheme::Geography.child_label(2), "municipalities");
        assert_eq!(Scheme::Geography.child_label(3), "children");
        assert_eq!(Scheme::Occupation.child_label(3), "titles");
        assert_eq!(Scheme::Occupation.child_label(0), "children");
    }

    #[test]
    fn test_scheme_node_serialization() {
        let leaf = SchemeNode {
            code: "NO081".to_string(),
            name: "Oslo".to_string(),
            children: None,
        };
        let region = SchemeNode {
            code: "NO08".to_string(),
            name: "Oslo og Viken".to_string(),
            children: Some(LabeledChildren {
                label: "counties",
                nodes: vec![leaf.clone()],
            }),
        };

        assert_eq!(
            serde_json::to_value(&leaf).unwrap(),
            serde_json::json!({"code": "NO081", "name": "Oslo"})
        );
        assert_eq!(
            serde_json::to_value(&region).unwrap(),
            serde_json::json!({
                "code": "NO08",
                "name": "Oslo og Viken",
                "counties": [{"code": "NO081", "name": "Oslo"}]
            })
        );
        assert_eq!(region.children().len(), 1);
        assert!(leaf.children().is_empty());
    }
}
