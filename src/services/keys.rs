//! Composite keys, identifiers and multi-level column hierarchies.
//!
//! Field names produced here end up in the wire contract with the grid, so
//! [`sanitize`] and the path-prefix rules must stay stable.

use std::collections::BTreeMap;

use crate::models::grid::ColumnDef;
use crate::models::pattern::PatternConfig;
use crate::models::source::{SourceRecord, SubGroupKey};

/// Separator between values of a composite key.
pub const KEY_SEPARATOR: &str = "|";
/// Prefix of the synthetic key used for records without a grouping value.
pub const FALLBACK_KEY_PREFIX: &str = "col_";
/// Value code substituted when a record has no value for a hierarchy level.
pub const MISSING_CODE: &str = "missing";
/// Value label substituted when a record has no value for a hierarchy level.
pub const MISSING_LABEL: &str = "N/A";

/// Joins a level's value code and label in hierarchy keys. Not printable, so
/// it cannot collide with real attribute values.
const LEVEL_SEPARATOR: char = '\u{1f}';

fn find_key<'k>(keys: &'k [SubGroupKey], attribute_code: &str) -> Option<&'k SubGroupKey> {
    keys.iter().find(|k| k.attribute_code == attribute_code)
}

fn composite<'k>(
    keys: &'k [SubGroupKey],
    attribute_codes: &[String],
    pick: impl Fn(&'k SubGroupKey) -> &'k str,
) -> String {
    attribute_codes
        .iter()
        .filter_map(|code| find_key(keys, code).map(&pick))
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .collect::<Vec<_>>()
        .join(KEY_SEPARATOR)
}

/// Builds a composite key from value labels.
///
/// Attributes are visited in the given order; missing or empty values are
/// skipped and the survivors joined with `|`. An empty result means the
/// record cannot be grouped and the caller must substitute [`fallback_key`].
///
/// # Examples
///
/// ```
/// use pricegrid::models::SubGroupKey;
/// use pricegrid::services::keys::build_composite_key;
///
/// let keys = vec![
///     SubGroupKey::new("PRODUCT_GROUP4", "T10", "10"),
///     SubGroupKey::new("PRODUCT_GROUP6", "W20", "20"),
/// ];
/// let codes = vec!["PRODUCT_GROUP6".to_string(), "PRODUCT_GROUP4".to_string()];
/// assert_eq!(build_composite_key(&keys, &codes), "20|10");
/// ```
#[must_use]
pub fn build_composite_key(keys: &[SubGroupKey], attribute_codes: &[String]) -> String {
    composite(keys, attribute_codes, |k| k.value_label.as_str())
}

/// Builds a composite key from value codes. Same rules as [`build_composite_key`].
#[must_use]
pub fn build_composite_code(keys: &[SubGroupKey], attribute_codes: &[String]) -> String {
    composite(keys, attribute_codes, |k| k.value_code.as_str())
}

/// Synthetic key for a record that has no grouping value.
#[must_use]
pub fn fallback_key(record_id: &str) -> String {
    format!("{FALLBACK_KEY_PREFIX}{record_id}")
}

/// Column-group identifier for a record that has no column-group value.
///
/// The sanitized form of [`fallback_key`], so it prefixes field names the
/// same way every other group identifier does.
#[must_use]
pub fn fallback_group_id(record_id: &str) -> String {
    sanitize(&fallback_key(record_id))
}

/// Normalizes text into a field-name-safe identifier.
///
/// Lowercases, collapses every run of non-alphanumeric characters into a
/// single `_`, and trims leading and trailing underscores.
///
/// # Examples
///
/// ```
/// use pricegrid::services::keys::sanitize;
///
/// assert_eq!(sanitize("  Zinc 80 / AZ-150 "), "zinc_80_az_150");
/// assert_eq!(sanitize(&sanitize("A|B")), "a_b");
/// assert_eq!(sanitize("---"), "");
/// ```
#[must_use]
pub fn sanitize(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut pending_separator = false;

    // Lowercasing can emit combining marks (e.g. 'İ'); those count as separators.
    for ch in text.chars().flat_map(char::to_lowercase) {
        if ch.is_alphanumeric() {
            if pending_separator && !out.is_empty() {
                out.push('_');
            }
            pending_separator = false;
            out.push(ch);
        } else {
            pending_separator = true;
        }
    }

    out
}

/// Chooses the identifier of a value: its sanitized code, else its sanitized label.
#[must_use]
pub fn group_identifier(code: &str, label: &str) -> String {
    let from_code = sanitize(code);
    if from_code.is_empty() {
        sanitize(label)
    } else {
        from_code
    }
}

/// Identifier of one hierarchy level, never empty.
fn level_identifier(code: &str, label: &str) -> String {
    let id = group_identifier(code, label);
    if id.is_empty() {
        MISSING_CODE.to_string()
    } else {
        id
    }
}

/// Single-level column group of a record as `(identifier, header label)`.
///
/// `None` when none of the column-group attributes has a value.
#[must_use]
pub fn column_group_of(
    keys: &[SubGroupKey],
    attribute_codes: &[String],
) -> Option<(String, String)> {
    let code = build_composite_code(keys, attribute_codes);
    let label = build_composite_key(keys, attribute_codes);
    let id = group_identifier(&code, &label);
    if id.is_empty() {
        return None;
    }
    let header = if label.is_empty() { code } else { label };
    Some((id, header))
}

/// Encodes a record's value for one hierarchy level.
fn level_key(keys: &[SubGroupKey], attribute_code: &str) -> String {
    let (code, label) = find_key(keys, attribute_code)
        .map(|k| (k.value_code.trim(), k.value_label.trim()))
        .filter(|(code, label)| !code.is_empty() || !label.is_empty())
        .unwrap_or((MISSING_CODE, MISSING_LABEL));
    format!("{code}{LEVEL_SEPARATOR}{label}")
}

/// Splits a hierarchy key back into `(value code, value label)`.
#[must_use]
pub fn decode_level_key(key: &str) -> (&str, &str) {
    key.split_once(LEVEL_SEPARATOR).unwrap_or((key, ""))
}

/// Node of a multi-level column hierarchy.
///
/// Children are keyed by encoded level key; a node at the deepest level is
/// marked as a leaf and has no children.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct HierarchyNode {
    children: BTreeMap<String, HierarchyNode>,
    leaf: bool,
}

impl HierarchyNode {
    /// Children in key order.
    pub fn children(&self) -> impl Iterator<Item = (&String, &HierarchyNode)> {
        self.children.iter()
    }

    /// True for a node at the deepest level.
    #[must_use]
    pub fn is_leaf(&self) -> bool {
        self.leaf
    }

    /// Reuses an existing child whose identifier matches `key`'s, so values
    /// that sanitize alike (`A-1`, `A 1`) share one node. First seen wins.
    fn key_for(&self, key: String) -> String {
        let (code, label) = decode_level_key(&key);
        let id = level_identifier(code, label);
        self.children
            .keys()
            .find(|existing| {
                let (code, label) = decode_level_key(existing);
                level_identifier(code, label) == id
            })
            .cloned()
            .unwrap_or(key)
    }

    /// Number of leaves under this node.
    #[must_use]
    pub fn leaf_count(&self) -> usize {
        if self.leaf {
            return 1;
        }
        self.children.values().map(Self::leaf_count).sum()
    }
}

/// Builds the column hierarchy for the given level attributes.
///
/// Every record is represented: a record lacking a level value lands under
/// the `missing` / `N/A` placeholder for that level.
#[must_use]
pub fn build_hierarchy_map(records: &[SourceRecord<'_>], levels: &[String]) -> HierarchyNode {
    let mut root = HierarchyNode::default();
    if levels.is_empty() {
        return root;
    }

    for record in records {
        let mut node = &mut root;
        for attribute_code in levels {
            let key = node.key_for(level_key(record.keys(), attribute_code));
            node = node.children.entry(key).or_default();
        }
        node.leaf = true;
    }

    root
}

/// Column-group key of a record under a multi-level hierarchy.
///
/// Equals the `groupId` of the deepest column group the record falls under,
/// so row fields and column fields always agree.
#[must_use]
pub fn column_path_key(keys: &[SubGroupKey], levels: &[String]) -> String {
    levels
        .iter()
        .map(|attribute_code| {
            let key = level_key(keys, attribute_code);
            let (code, label) = decode_level_key(&key);
            level_identifier(code, label)
        })
        .collect::<Vec<_>>()
        .join("_")
}

/// Emits the column groups of a hierarchy, depth-first in key order.
///
/// # Arguments
///
/// * `node` - Hierarchy node whose children are emitted
/// * `pattern` - Pattern providing leaf columns and level headers
/// * `level` - Depth of `node`'s children (0 for the root's children)
/// * `label_path` - Labels of the ancestors of `node`
/// * `code_path` - Identifiers of the ancestors of `node`
///
/// # Returns
///
/// One group per child. At the deepest level a group holds the pattern's
/// columns with fields prefixed by the identifier path; above it a group
/// wraps the groups of the next level.
#[must_use]
pub fn build_column_groups_recursive(
    node: &HierarchyNode,
    pattern: &PatternConfig,
    level: usize,
    label_path: &[String],
    code_path: &[String],
) -> Vec<ColumnDef> {
    let level_header = pattern
        .column_levels
        .get(level)
        .and_then(|l| l.header_name.as_deref())
        .filter(|h| !h.is_empty());

    node.children()
        .map(|(key, child)| {
            let (code, label) = decode_level_key(key);

            let mut codes = code_path.to_vec();
            codes.push(level_identifier(code, label));
            let mut labels = label_path.to_vec();
            labels.push(label.to_string());

            let prefix = codes.join("_");
            let header = match level_header {
                Some(level_header) => format!("{level_header}: {label}"),
                None => label.to_string(),
            };

            let children = if child.is_leaf() || child.children.is_empty() {
                pattern
                    .columns
                    .iter()
                    .map(|column| ColumnDef::leaf(column, Some(&prefix)))
                    .collect()
            } else {
                build_column_groups_recursive(child, pattern, level + 1, &labels, &codes)
            };

            ColumnDef::group(header, prefix, children)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::pattern::{ColumnConfig, ColumnLevel};
    use crate::models::source::{PriceList, SubGroup};

    fn codes(list: &[&str]) -> Vec<String> {
        list.iter().map(ToString::to_string).collect()
    }

    fn sub_group(id: &str, keys: &[(&str, &str, &str)]) -> SubGroup {
        SubGroup {
            id: id.to_string(),
            keys: keys
                .iter()
                .map(|(attribute, code, label)| SubGroupKey::new(*attribute, *code, *label))
                .collect(),
            ..SubGroup::default()
        }
    }

    fn price_list(sub_groups: Vec<SubGroup>) -> Vec<PriceList> {
        vec![PriceList {
            id: "pl".to_string(),
            sub_groups,
            ..PriceList::default()
        }]
    }

    #[test]
    fn test_composite_key_skips_missing_values() {
        let keys = vec![
            SubGroupKey::new("A", "a1", "Alpha"),
            SubGroupKey::new("B", "", ""),
            SubGroupKey::new("C", "c1", "Gamma"),
        ];
        assert_eq!(build_composite_key(&keys, &codes(&["A", "B", "C"])), "Alpha|Gamma");
        assert_eq!(build_composite_code(&keys, &codes(&["C", "A"])), "c1|a1");
        assert_eq!(build_composite_key(&keys, &codes(&["B", "Z"])), "");
        assert_eq!(build_composite_key(&keys, &[]), "");
    }

    #[test]
    fn test_sanitize_rules() {
        assert_eq!(sanitize("Zinc-80"), "zinc_80");
        assert_eq!(sanitize("__a  b__"), "a_b");
        assert_eq!(sanitize("ÄLU 5"), "älu_5");
        assert_eq!(sanitize(""), "");
    }

    #[test]
    fn test_group_identifier_prefers_code() {
        assert_eq!(group_identifier("Z80", "Zinc 80"), "z80");
        assert_eq!(group_identifier("--", "Zinc 80"), "zinc_80");
        assert_eq!(group_identifier("", ""), "");
    }

    #[test]
    fn test_column_group_of() {
        let keys = vec![SubGroupKey::new("PRODUCT_GROUP2", "Z80", "Zinc 80")];
        assert_eq!(
            column_group_of(&keys, &codes(&["PRODUCT_GROUP2"])),
            Some(("z80".to_string(), "Zinc 80".to_string()))
        );
        assert_eq!(column_group_of(&keys, &codes(&["PRODUCT_GROUP3"])), None);
    }

    #[test]
    fn test_hierarchy_keeps_records_without_deep_values() {
        let price_lists = price_list(vec![
            sub_group("1", &[("L1", "A", "Alpha"), ("L2", "X", "Ex")]),
            sub_group("2", &[("L1", "A", "Alpha")]),
            sub_group("3", &[("L1", "B", "Beta"), ("L2", "X", "Ex")]),
        ]);
        let records = SourceRecord::collect(&price_lists);
        let levels = codes(&["L1", "L2"]);

        let tree = build_hierarchy_map(&records, &levels);
        assert_eq!(tree.leaf_count(), 3);

        let top: Vec<&str> = tree.children().map(|(k, _)| decode_level_key(k).1).collect();
        assert_eq!(top, vec!["Alpha", "Beta"]);

        assert_eq!(column_path_key(records[1].keys(), &levels), "a_missing");
        assert_eq!(column_path_key(records[2].keys(), &levels), "b_x");
    }

    #[test]
    fn test_hierarchy_merges_values_with_the_same_identifier() {
        let price_lists = price_list(vec![
            sub_group("1", &[("L1", "A-1", "A-1"), ("L2", "X", "Ex")]),
            sub_group("2", &[("L1", "A 1", "A 1"), ("L2", "x", "Ex")]),
            sub_group("3", &[("L1", "B", "Beta"), ("L2", "X", "Ex")]),
        ]);
        let records = SourceRecord::collect(&price_lists);
        let levels = codes(&["L1", "L2"]);

        let tree = build_hierarchy_map(&records, &levels);
        let top: Vec<&str> = tree.children().map(|(k, _)| decode_level_key(k).1).collect();
        assert_eq!(top, vec!["A-1", "Beta"]);
        assert_eq!(tree.leaf_count(), 2);

        let groups = build_column_groups_recursive(&tree, &PatternConfig::default(), 0, &[], &[]);
        let ids: Vec<&str> = groups
            .iter()
            .filter_map(|g| match g {
                ColumnDef::Group { group_id, .. } => Some(group_id.as_str()),
                ColumnDef::Leaf { .. } => None,
            })
            .collect();
        assert_eq!(ids, vec!["a_1", "b"]);
        assert_eq!(column_path_key(records[1].keys(), &levels), "a_1_x");
    }

    #[test]
    fn test_fallback_group_id_is_sanitized() {
        assert_eq!(fallback_key("sg-x"), "col_sg-x");
        assert_eq!(fallback_group_id("sg-x"), "col_sg_x");
        assert_eq!(fallback_group_id("4"), "col_4");
    }

    #[test]
    fn test_column_groups_recursive_fields_match_path_keys() {
        let price_lists = price_list(vec![
            sub_group("1", &[("L1", "A", "Alpha"), ("L2", "X", "Ex")]),
            sub_group("2", &[("L1", "A", "Alpha"), ("L2", "Y", "Why")]),
        ]);
        let records = SourceRecord::collect(&price_lists);
        let pattern = PatternConfig {
            id: "multi".to_string(),
            columns: vec![ColumnConfig {
                field: "price".to_string(),
                header_name: "Price".to_string(),
                ..ColumnConfig::default()
            }],
            column_levels: vec![
                ColumnLevel {
                    attribute: "L1".to_string(),
                    header_name: Some("Coating".to_string()),
                },
                ColumnLevel {
                    attribute: "L2".to_string(),
                    header_name: None,
                },
            ],
            ..PatternConfig::default()
        };
        let levels = codes(&["L1", "L2"]);
        let tree = build_hierarchy_map(&records, &levels);

        let groups = build_column_groups_recursive(&tree, &pattern, 0, &[], &[]);
        assert_eq!(groups.len(), 1);
        let ColumnDef::Group { header_name, group_id, children } = &groups[0] else {
            panic!("expected a group");
        };
        assert_eq!(header_name, "Coating: Alpha");
        assert_eq!(group_id, "a");
        assert_eq!(children.len(), 2);
        assert_eq!(groups[0].leaf_fields(), vec!["a_x_price", "a_y_price"]);

        assert_eq!(column_path_key(records[0].keys(), &levels), "a_x");
        assert_eq!(column_path_key(records[1].keys(), &levels), "a_y");
    }
}
