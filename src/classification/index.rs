// 🌳 Hierarchy Index - flat classification rows → navigable tree
//
// Problem solved:
// - SSB delivers classifications as flat rows (code, parentCode, level, name)
// - Consumers need trees ("regions → counties → municipalities")
// - Search filters need every leaf code under a selected node
//
// The index is built once per snapshot and never mutated afterwards.
// Refreshing a scheme means building a new index and swapping it in
// (see `SchemeRegistry`).

use super::record::ClassificationRecord;
use crate::error::{ClassificationError, Result};
use serde::Serialize;
use std::collections::{BTreeSet, HashMap};
use tracing::debug;

/// Separator in SSB's bilingual county names ("Troms/Romsa")
const NAME_SEPARATOR: char = '/';

// ============================================================================
// NODES
// ============================================================================

/// Arena entry: the record plus links expressed as arena positions.
/// Each position appears in exactly one parent's `children`.
#[derive(Debug, Clone)]
pub struct HierarchyNode {
    record: ClassificationRecord,
    parent: Option<usize>,
    children: Vec<usize>,
}

impl HierarchyNode {
    pub fn record(&self) -> &ClassificationRecord {
        &self.record
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

/// Owned, nested view of a (possibly truncated) subtree
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NestedNode {
    pub code: String,
    pub name: String,
    pub level: u32,
    pub children: Vec<NestedNode>,
}

impl NestedNode {
    /// Number of nodes in this view, including self
    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(NestedNode::node_count).sum::<usize>()
    }
}

// ============================================================================
// INDEX
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct HierarchyIndex {
    /// Build order == input order
    nodes: Vec<HierarchyNode>,
    nodes_by_code: HashMap<String, usize>,
    /// Lowercased full name → positions in build order
    names: HashMap<String, Vec<usize>>,
    roots: Vec<usize>,
    max_level: u32,
}

impl HierarchyIndex {
    /// Build an index from a snapshot of records.
    ///
    /// Input order is free (children may precede their parents) but the
    /// relative order of siblings is preserved. Fails on duplicate codes,
    /// unknown parents, and levels that do not follow from the parent.
    pub fn build<I>(records: I) -> Result<Self>
    where
        I: IntoIterator<Item = ClassificationRecord>,
    {
        let mut nodes: Vec<HierarchyNode> = Vec::new();
        let mut nodes_by_code: HashMap<String, usize> = HashMap::new();

        // Pass 1: index every record by code
        for record in records {
            if nodes_by_code.contains_key(&record.code) {
                return Err(ClassificationError::DuplicateCode { code: record.code });
            }
            nodes_by_code.insert(record.code.clone(), nodes.len());
            nodes.push(HierarchyNode {
                record,
                parent: None,
                children: Vec::new(),
            });
        }

        // Pass 2: link children to parents and verify levels
        let mut roots = Vec::new();
        for position in 0..nodes.len() {
            let record = &nodes[position].record;

            let Some(parent_code) = record.parent_code.as_deref() else {
                if record.level != 1 {
                    return Err(ClassificationError::LevelMismatch {
                        code: record.code.clone(),
                        parent_code: None,
                        level: record.level,
                        expected: 1,
                    });
                }
                roots.push(position);
                continue;
            };

            let parent = *nodes_by_code.get(parent_code).ok_or_else(|| {
                ClassificationError::OrphanedRecord {
                    code: record.code.clone(),
                    parent_code: parent_code.to_string(),
                }
            })?;

            // Widened so a parent at u32::MAX cannot accept any child
            let expected = u64::from(nodes[parent].record.level) + 1;
            if u64::from(record.level) != expected {
                return Err(ClassificationError::LevelMismatch {
                    code: record.code.clone(),
                    parent_code: Some(parent_code.to_string()),
                    level: record.level,
                    expected,
                });
            }

            nodes[position].parent = Some(parent);
            nodes[parent].children.push(position);
        }

        let mut names: HashMap<String, Vec<usize>> = HashMap::new();
        for (position, node) in nodes.iter().enumerate() {
            names
                .entry(normalize_name(&node.record.name))
                .or_default()
                .push(position);
        }

        let max_level = nodes.iter().map(|n| n.record.level).max().unwrap_or(0);

        debug!(
            records = nodes.len(),
            roots = roots.len(),
            max_level,
            "built hierarchy index"
        );

        Ok(HierarchyIndex {
            nodes,
            nodes_by_code,
            names,
            roots,
            max_level,
        })
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Highest level present (0 for an empty index)
    pub fn max_level(&self) -> u32 {
        self.max_level
    }

    pub fn roots(&self) -> impl Iterator<Item = &ClassificationRecord> + '_ {
        self.roots.iter().map(move |&p| &self.nodes[p].record)
    }

    /// All records in build order
    pub fn records(&self) -> impl Iterator<Item = &ClassificationRecord> + '_ {
        self.nodes.iter().map(HierarchyNode::record)
    }

    pub fn node(&self, code: &str) -> Option<&HierarchyNode> {
        self.nodes_by_code.get(code).map(|&p| &self.nodes[p])
    }

    pub fn get(&self, code: &str) -> Option<&ClassificationRecord> {
        self.node(code).map(HierarchyNode::record)
    }

    pub fn contains(&self, code: &str) -> bool {
        self.nodes_by_code.contains_key(code)
    }

    fn position(&self, code: &str) -> Result<usize> {
        self.nodes_by_code
            .get(code)
            .copied()
            .ok_or_else(|| ClassificationError::CodeNotFound {
                code: code.to_string(),
            })
    }

    pub fn parent(&self, code: &str) -> Result<Option<&ClassificationRecord>> {
        let position = self.position(code)?;
        Ok(self.nodes[position].parent.map(|p| &self.nodes[p].record))
    }

    /// Direct children in source order
    pub fn children(&self, code: &str) -> Result<Vec<&ClassificationRecord>> {
        let position = self.position(code)?;
        Ok(self.nodes[position]
            .children
            .iter()
            .map(|&c| &self.nodes[c].record)
            .collect())
    }

    /// Every record on `level`, in build order
    pub fn at_level(&self, level: u32) -> Vec<&ClassificationRecord> {
        self.records().filter(|r| r.level == level).collect()
    }

    // ========================================================================
    // NESTED VIEWS
    // ========================================================================

    /// Nested view of `code` expanded down to the absolute level
    /// `max_depth_level`. A node at level L gets children only when
    /// `max_depth_level > L`; out-of-range levels are not an error.
    pub fn subtree(&self, code: &str, max_depth_level: u32) -> Result<NestedNode> {
        let position = self.position(code)?;
        Ok(self.nest(position, max_depth_level))
    }

    /// `subtree` applied to every root, in root order
    pub fn forest(&self, max_depth_level: u32) -> Vec<NestedNode> {
        self.roots
            .iter()
            .map(|&root| self.nest(root, max_depth_level))
            .collect()
    }

    fn nest(&self, position: usize, max_depth_level: u32) -> NestedNode {
        let node = &self.nodes[position];
        let children = if max_depth_level > node.record.level {
            node.children
                .iter()
                .map(|&child| self.nest(child, max_depth_level))
                .collect()
        } else {
            Vec::new()
        };

        NestedNode {
            code: node.record.code.clone(),
            name: node.record.name.clone(),
            level: node.record.level,
            children,
        }
    }

    // ========================================================================
    // PATHS
    // ========================================================================

    /// Codes from the root down to the parent of `code` (empty for roots)
    pub fn ancestors(&self, code: &str) -> Result<Vec<&str>> {
        let mut chain = Vec::new();
        let mut current = self.nodes[self.position(code)?].parent;

        while let Some(position) = current {
            chain.push(self.nodes[position].record.code.as_str());
            current = self.nodes[position].parent;
        }

        chain.reverse();
        Ok(chain)
    }

    /// Codes of every childless node under `code`, or `{code}` itself
    /// when it has no children.
    pub fn descendant_leaf_codes(&self, code: &str) -> Result<BTreeSet<String>> {
        let mut leaves = BTreeSet::new();
        let mut stack = vec![self.position(code)?];

        while let Some(position) = stack.pop() {
            let node = &self.nodes[position];
            if node.is_leaf() {
                leaves.insert(node.record.code.clone());
            } else {
                stack.extend(node.children.iter().copied());
            }
        }

        Ok(leaves)
    }

    // ========================================================================
    // NAME LOOKUPS
    // ========================================================================

    /// Exact, case-insensitive match on the full name, in build order
    pub fn find_by_name(&self, name: &str) -> Vec<&ClassificationRecord> {
        self.names
            .get(&normalize_name(name))
            .map(|positions| positions.iter().map(|&p| &self.nodes[p].record).collect())
            .unwrap_or_default()
    }

    /// Case-insensitive substring search over names
    pub fn search(&self, query: &str) -> Vec<&ClassificationRecord> {
        let needle = normalize_name(query);
        if needle.is_empty() {
            return Vec::new();
        }

        self.records()
            .filter(|r| r.name.to_lowercase().contains(&needle))
            .collect()
    }
}

pub(crate) fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Text before the first '/' ("Troms/Romsa" → "Troms"). Other
/// separators are left alone.
pub fn primary_name(name: &str) -> &str {
    match name.split_once(NAME_SEPARATOR).map(|(head, _)| head.trim()) {
        Some(head) if !head.is_empty() => head,
        _ => name.trim(),
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn record(code: &str, parent: Option<&str>, level: u32, name: &str) -> ClassificationRecord {
        ClassificationRecord::new(code, parent, level, name)
    }

    /// A (1) → A1 (2) → A1a (3)
    fn three_levels() -> HierarchyIndex {
        HierarchyIndex::build(vec![
            record("A", None, 1, "Alpha"),
            record("A1", Some("A"), 2, "Alpha one"),
            record("A1a", Some("A1"), 3, "Alpha one a"),
        ])
        .unwrap()
    }

    fn geography() -> HierarchyIndex {
        HierarchyIndex::build(vec![
            record("NO08", None, 1, "Oslo og Viken"),
            record("NO0A", None, 1, "Vestlandet"),
            record("NO081", Some("NO08"), 2, "Oslo"),
            record("NO082", Some("NO08"), 2, "Viken"),
            record("NO0A2", Some("NO0A"), 2, "Vestland"),
            record("0301", Some("NO081"), 3, "Oslo"),
            record("3001", Some("NO082"), 3, "Halden"),
            record("3002", Some("NO082"), 3, "Moss"),
            record("4601", Some("NO0A2"), 3, "Bergen"),
        ])
        .unwrap()
    }

    #[test]
    fn test_forest_truncates_at_level() {
        let index = three_levels();

        let level1 = index.forest(1);
        assert_eq!(level1.len(), 1);
        assert_eq!(level1[0].code, "A");
        assert!(level1[0].children.is_empty());

        let level2 = index.forest(2);
        assert_eq!(level2[0].children.len(), 1);
        assert_eq!(level2[0].children[0].code, "A1");
        assert!(level2[0].children[0].children.is_empty());

        let level3 = index.forest(3);
        assert_eq!(level3[0].children[0].children[0].code, "A1a");
    }

    #[test]
    fn test_forest_out_of_range_is_permissive() {
        let index = three_levels();

        // Below every level: roots only
        assert_eq!(index.forest(0)[0].node_count(), 1);
        // Beyond max_level: fully expanded
        assert_eq!(index.forest(99)[0].node_count(), 3);
    }

    #[test]
    fn test_descendant_leaf_codes() {
        let index = three_levels();

        let leaves = index.descendant_leaf_codes("A").unwrap();
        assert_eq!(leaves, BTreeSet::from(["A1a".to_string()]));

        let leaves = index.descendant_leaf_codes("A1a").unwrap();
        assert_eq!(leaves, BTreeSet::from(["A1a".to_string()]));
    }

    #[test]
    fn test_descendant_leaf_codes_across_branches() {
        let index = geography();

        let leaves: Vec<String> = index.descendant_leaf_codes("NO08").unwrap().into_iter().collect();
        assert_eq!(leaves, vec!["0301", "3001", "3002"]);

        let err = index.descendant_leaf_codes("NO99").unwrap_err();
        assert_eq!(err, ClassificationError::CodeNotFound { code: "NO99".to_string() });
    }

    #[test]
    fn test_children_keep_input_order() {
        // Children listed before their parent, siblings in a fixed order
        let index = HierarchyIndex::build(vec![
            record("R2", Some("R"), 2, "Second"),
            record("R1", Some("R"), 2, "First"),
            record("R", None, 1, "Root"),
            record("R3", Some("R"), 2, "Third"),
        ])
        .unwrap();

        let codes: Vec<&str> = index
            .children("R")
            .unwrap()
            .iter()
            .map(|r| r.code.as_str())
            .collect();
        assert_eq!(codes, vec!["R2", "R1", "R3"]);
    }

    #[test]
    fn test_roots_keep_input_order() {
        let index = geography();
        let roots: Vec<&str> = index.roots().map(|r| r.code.as_str()).collect();
        assert_eq!(roots, vec!["NO08", "NO0A"]);
        assert_eq!(index.max_level(), 3);
        assert_eq!(index.len(), 9);
    }

    #[test]
    fn test_duplicate_code_is_rejected() {
        let err = HierarchyIndex::build(vec![
            record("A", None, 1, "Alpha"),
            record("A", None, 1, "Alpha again"),
        ])
        .unwrap_err();

        assert_eq!(err, ClassificationError::DuplicateCode { code: "A".to_string() });
    }

    #[test]
    fn test_orphaned_record_is_rejected() {
        let err = HierarchyIndex::build(vec![
            record("A", None, 1, "Alpha"),
            record("B1", Some("B"), 2, "Beta one"),
        ])
        .unwrap_err();

        assert_eq!(
            err,
            ClassificationError::OrphanedRecord {
                code: "B1".to_string(),
                parent_code: "B".to_string(),
            }
        );
    }

    #[test]
    fn test_level_mismatch_is_rejected() {
        let err = HierarchyIndex::build(vec![
            record("A", None, 1, "Alpha"),
            record("A1", Some("A"), 3, "Alpha one"),
        ])
        .unwrap_err();

        assert_eq!(
            err,
            ClassificationError::LevelMismatch {
                code: "A1".to_string(),
                parent_code: Some("A".to_string()),
                level: 3,
                expected: 2,
            }
        );
    }

    #[test]
    fn test_root_must_be_level_one() {
        let err = HierarchyIndex::build(vec![record("A", None, 2, "Alpha")]).unwrap_err();
        assert!(matches!(
            err,
            ClassificationError::LevelMismatch { expected: 1, level: 2, .. }
        ));
    }

    #[test]
    fn test_cycles_cannot_be_built() {
        // Self-reference and two-node loops always break the level rule
        let err = HierarchyIndex::build(vec![record("A", Some("A"), 2, "Loop")]).unwrap_err();
        assert!(matches!(err, ClassificationError::LevelMismatch { .. }));

        let err = HierarchyIndex::build(vec![
            record("A", Some("B"), 2, "A"),
            record("B", Some("A"), 3, "B"),
        ])
        .unwrap_err();
        assert!(matches!(err, ClassificationError::LevelMismatch { .. }));
    }

    #[test]
    fn test_cycles_at_the_level_ceiling_cannot_be_built() {
        let err = HierarchyIndex::build(vec![
            record("A", None, 1, "Alpha"),
            record("X", Some("X"), u32::MAX, "Loop"),
        ])
        .unwrap_err();
        assert_eq!(
            err,
            ClassificationError::LevelMismatch {
                code: "X".to_string(),
                parent_code: Some("X".to_string()),
                level: u32::MAX,
                expected: u64::from(u32::MAX) + 1,
            }
        );

        let err = HierarchyIndex::build(vec![
            record("P", Some("Q"), u32::MAX, "P"),
            record("Q", Some("P"), u32::MAX, "Q"),
        ])
        .unwrap_err();
        assert!(matches!(
            err,
            ClassificationError::LevelMismatch { level: u32::MAX, .. }
        ));
    }

    #[test]
    fn test_ragged_tree_leaves_are_childless_nodes() {
        // Region "R" has a county with municipalities and a county without.
        // Leaves are every childless descendant, so the bare county counts
        // even though it sits above the deepest level.
        let index = HierarchyIndex::build(vec![
            record("R", None, 1, "Region"),
            record("C1", Some("R"), 2, "County with municipalities"),
            record("C2", Some("R"), 2, "County without municipalities"),
            record("M1", Some("C1"), 3, "Municipality"),
        ])
        .unwrap();

        assert_eq!(index.max_level(), 3);
        let leaves = index.descendant_leaf_codes("R").unwrap();
        assert_eq!(leaves, BTreeSet::from(["C2".to_string(), "M1".to_string()]));
        assert_eq!(index.get("C2").unwrap().level, 2);
    }

    #[test]
    fn test_empty_input_builds_empty_index() {
        let index = HierarchyIndex::build(Vec::new()).unwrap();
        assert!(index.is_empty());
        assert_eq!(index.max_level(), 0);
        assert!(index.forest(3).is_empty());
    }

    #[test]
    fn test_subtree_and_not_found() {
        let index = geography();

        let viken = index.subtree("NO082", 3).unwrap();
        assert_eq!(viken.children.len(), 2);
        assert_eq!(viken.node_count(), 3);

        // Level below the node's own level: leaf view
        let leaf_view = index.subtree("NO082", 1).unwrap();
        assert!(leaf_view.children.is_empty());

        assert!(matches!(
            index.subtree("NOPE", 3),
            Err(ClassificationError::CodeNotFound { .. })
        ));
    }

    #[test]
    fn test_ancestors() {
        let index = geography();

        assert_eq!(index.ancestors("3001").unwrap(), vec!["NO08", "NO082"]);
        assert!(index.ancestors("NO08").unwrap().is_empty());
        assert!(index.ancestors("missing").is_err());
    }

    #[test]
    fn test_parent_and_level_lookups() {
        let index = geography();

        assert_eq!(index.parent("4601").unwrap().unwrap().code, "NO0A2");
        assert!(index.parent("NO0A").unwrap().is_none());

        let counties: Vec<&str> = index.at_level(2).iter().map(|r| r.code.as_str()).collect();
        assert_eq!(counties, vec!["NO081", "NO082", "NO0A2"]);
    }

    #[test]
    fn test_find_by_name_is_case_insensitive() {
        let index = geography();

        let matches: Vec<&str> = index.find_by_name("  oSLo ").iter().map(|r| r.code.as_str()).collect();
        assert_eq!(matches, vec!["NO081", "0301"]);
        assert!(index.find_by_name("Osl").is_empty());
    }

    #[test]
    fn test_search_by_substring() {
        let index = geography();

        let hits: Vec<&str> = index.search("vest").iter().map(|r| r.code.as_str()).collect();
        assert_eq!(hits, vec!["NO0A", "NO0A2"]);
        assert!(index.search("   ").is_empty());
    }

    #[test]
    fn test_bilingual_names_match_only_in_full() {
        let index = HierarchyIndex::build(vec![
            record("NO07", None, 1, "Nord-Norge"),
            record("NO074", Some("NO07"), 2, "Troms og Finnmark - Romsa ja Finnmárku"),
            record("5401", Some("NO074"), 3, "Tromsø/Romsa"),
        ])
        .unwrap();

        assert_eq!(
            index.find_by_name("troms og finnmark - ROMSA JA FINNMÁRKU")[0].code,
            "NO074"
        );
        assert_eq!(index.find_by_name("Tromsø/Romsa")[0].code, "5401");

        // No segment of a name is a lookup key on its own
        assert!(index.find_by_name("Troms og Finnmark").is_empty());
        assert!(index.find_by_name("Romsa ja Finnmárku").is_empty());
        assert!(index.find_by_name("Romsa").is_empty());
        assert!(index.find_by_name("Tromsø").is_empty());

        // Substring search still reaches every segment
        let hits: Vec<&str> = index.search("romsa").iter().map(|r| r.code.as_str()).collect();
        assert_eq!(hits, vec!["NO074", "5401"]);
    }

    #[test]
    fn test_primary_name() {
        assert_eq!(primary_name("Tromsø/Romsa"), "Tromsø");
        assert_eq!(primary_name("Troms / Romsa / Tromssa"), "Troms");
        // Only '/' separates
        assert_eq!(
            primary_name("Troms og Finnmark - Romsa ja Finnmárku"),
            "Troms og Finnmark - Romsa ja Finnmárku"
        );
        assert_eq!(primary_name("Nord-Norge"), "Nord-Norge");
        assert_eq!(primary_name("/odd"), "/odd");
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;
    use proptest::sample::Index;

    /// Turn (starts-new-root, parent-pick) pairs into a valid tree where
    /// every node's parent appears earlier in the shape.
    fn tree_records(shape: Vec<(bool, Index)>) -> Vec<ClassificationRecord> {
        let mut levels: Vec<u32> = Vec::with_capacity(shape.len());
        let mut records = Vec::with_capacity(shape.len());

        for (i, (new_root, pick)) in shape.into_iter().enumerate() {
            let parent = if i == 0 || new_root {
                None
            } else {
                Some(pick.index(i))
            };
            let level = parent.map_or(1, |p| levels[p] + 1);
            levels.push(level);

            records.push(ClassificationRecord {
                code: format!("N{i}"),
                parent_code: parent.map(|p| format!("N{p}")),
                level,
                name: format!("Node {i}"),
            });
        }

        records
    }

    fn arb_records() -> impl Strategy<Value = Vec<ClassificationRecord>> {
        prop::collection::vec((prop::bool::weighted(0.15), any::<Index>()), 1..80)
            .prop_map(tree_records)
            .prop_shuffle()
    }

    proptest! {
        #[test]
        fn full_forest_contains_every_record(records in arb_records()) {
            let index = HierarchyIndex::build(records.clone()).unwrap();
            let total: usize = index
                .forest(index.max_level())
                .iter()
                .map(NestedNode::node_count)
                .sum();
            prop_assert_eq!(total, records.len());
        }

        #[test]
        fn max_level_records_never_build(
            records in arb_records(),
            pick in any::<Index>(),
            self_loop in any::<bool>(),
        ) {
            // Re-point one record at the level ceiling, either at itself or
            // at another record that is also moved to the ceiling
            let mut records = records;
            let i = pick.index(records.len());
            let j = if self_loop || records.len() == 1 { i } else { (i + 1) % records.len() };

            records[i].level = u32::MAX;
            records[i].parent_code = Some(records[j].code.clone());
            if j != i {
                records[j].level = u32::MAX;
                records[j].parent_code = Some(records[i].code.clone());
            }

            let err = HierarchyIndex::build(records).unwrap_err();
            let is_level_mismatch = matches!(err, ClassificationError::LevelMismatch { .. });
            prop_assert!(is_level_mismatch);
        }

        #[test]
        fn levels_follow_parents(records in arb_records()) {
            let index = HierarchyIndex::build(records).unwrap();
            for record in index.records() {
                match index.parent(&record.code).unwrap() {
                    Some(parent) => {
                        prop_assert_eq!(record.level, parent.level + 1);
                    }
                    None => {
                        prop_assert_eq!(record.level, 1);
                    }
                }
            }
        }

        #[test]
        fn leaves_descend_from_their_query(records in arb_records()) {
            let index = HierarchyIndex::build(records).unwrap();
            for record in index.records() {
                let leaves = index.descendant_leaf_codes(&record.code).unwrap();
                let node = index.node(&record.code).unwrap();

                if node.is_leaf() {
                    prop_assert_eq!(leaves, BTreeSet::from([record.code.clone()]));
                    continue;
                }

                prop_assert!(!leaves.is_empty());
                for leaf in &leaves {
                    prop_assert!(index.node(leaf).unwrap().is_leaf());
                    prop_assert!(index.ancestors(leaf).unwrap().contains(&record.code.as_str()));
                }
            }
        }

        #[test]
        fn subtree_at_own_level_is_a_leaf_view(records in arb_records()) {
            let index = HierarchyIndex::build(records).unwrap();
            for record in index.records() {
                let view = index.subtree(&record.code, record.level).unwrap();
                prop_assert!(view.children.is_empty());
            }
        }
    }
}
