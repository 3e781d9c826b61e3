//! Column tree construction.

use std::collections::{BTreeMap, BTreeSet};

use crate::models::grid::ColumnDef;
use crate::models::pattern::{PatternConfig, StaticColumnGroup};
use crate::models::source::SourceRecord;
use crate::services::keys::{
    build_column_groups_recursive, build_hierarchy_map, column_group_of, column_path_key,
    fallback_group_id, fallback_key, sanitize,
};
use crate::services::mappings::EffectiveMappings;

/// A dynamic column group and the row column-group keys it covers.
#[derive(Debug, Clone, PartialEq)]
pub struct DynamicGroup {
    /// Group id (identifier path prefix)
    pub key: String,
    /// Header text
    pub header: String,
    /// Rendered column node
    pub column: ColumnDef,
    /// Column-group keys of rows whose values render under this group
    pub row_keys: BTreeSet<String>,
}

/// Columns of one tab, split by origin so tabs can be cut per column group.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ColumnLayout {
    /// Fixed columns, emitted once and first
    pub fixed: Vec<ColumnDef>,
    /// Static (non-dynamic) groups of row-level columns
    pub static_groups: Vec<ColumnDef>,
    /// Pattern columns emitted without prefix when there is no column grouping
    pub flat: Vec<ColumnDef>,
    /// Dynamic column groups in display order
    pub dynamic: Vec<DynamicGroup>,
}

impl ColumnLayout {
    /// Produces the final column list.
    ///
    /// With `only_group` set, dynamic groups other than that one are left out.
    #[must_use]
    pub fn assemble(&self, only_group: Option<&str>) -> Vec<ColumnDef> {
        let dynamic = self
            .dynamic
            .iter()
            .filter(|group| only_group.map_or(true, |key| group.key == key))
            .map(|group| group.column.clone());

        self.fixed
            .iter()
            .chain(&self.static_groups)
            .chain(&self.flat)
            .cloned()
            .chain(dynamic)
            .collect()
    }

    /// Finds a dynamic group by key.
    #[must_use]
    pub fn group(&self, key: &str) -> Option<&DynamicGroup> {
        self.dynamic.iter().find(|group| group.key == key)
    }
}

fn static_group(group: &StaticColumnGroup) -> ColumnDef {
    let group_id = group
        .group_id
        .clone()
        .filter(|id| !id.is_empty())
        .unwrap_or_else(|| sanitize(&group.header_name));
    let children = group
        .children
        .iter()
        .map(|column| ColumnDef::leaf(column, None))
        .collect();
    ColumnDef::group(group.header_name.clone(), group_id, children)
}

/// Builds the column layout of a pattern over a set of records.
///
/// Multi-level patterns (`columnLevels`) use the hierarchy builder. Otherwise
/// one group is emitted per distinct column-group value, sorted by header
/// label; records without a value get their own `col_<id>` group. Without
/// any column-group attribute the pattern columns are emitted flat.
#[must_use]
pub fn build_columns(
    pattern: &PatternConfig,
    records: &[SourceRecord<'_>],
    mappings: &EffectiveMappings<'_>,
) -> ColumnLayout {
    let mut layout = ColumnLayout {
        fixed: pattern
            .fixed_columns
            .iter()
            .map(|column| ColumnDef::leaf(column, None))
            .collect(),
        static_groups: pattern.column_groups.iter().map(static_group).collect(),
        ..ColumnLayout::default()
    };

    if pattern.is_multi_level() {
        let levels: Vec<String> = pattern
            .column_levels
            .iter()
            .map(|level| mappings.grouping_code(&level.attribute))
            .collect();
        let tree = build_hierarchy_map(records, &levels);

        // top-level identifier -> full path keys of the records beneath it
        let mut row_keys: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        for record in records {
            let top = column_path_key(record.keys(), &levels[..1]);
            let path = column_path_key(record.keys(), &levels);
            row_keys.entry(top).or_default().insert(path);
        }

        layout.dynamic = build_column_groups_recursive(&tree, pattern, 0, &[], &[])
            .into_iter()
            .filter_map(|column| {
                let ColumnDef::Group { group_id, header_name, .. } = &column else {
                    return None;
                };
                let key = group_id.clone();
                let header = header_name.clone();
                Some(DynamicGroup {
                    row_keys: row_keys.remove(&key).unwrap_or_default(),
                    key,
                    header,
                    column,
                })
            })
            .collect();
        return layout;
    }

    let attributes = mappings.attributes(&pattern.grouping.column_groups);
    if attributes.is_empty() {
        layout.flat = pattern
            .columns
            .iter()
            .map(|column| ColumnDef::leaf(column, None))
            .collect();
        return layout;
    }

    // identifier -> header; first label seen wins
    let mut groups: BTreeMap<String, String> = BTreeMap::new();
    for record in records {
        let (id, header) = column_group_of(record.keys(), &attributes)
            .unwrap_or_else(|| (fallback_group_id(record.id()), fallback_key(record.id())));
        groups.entry(id).or_insert(header);
    }

    let mut ordered: Vec<(String, String)> = groups.into_iter().collect();
    ordered.sort_by(|(a_id, a_label), (b_id, b_label)| {
        a_label.cmp(b_label).then_with(|| a_id.cmp(b_id))
    });

    layout.dynamic = ordered
        .into_iter()
        .map(|(key, header)| {
            let children = pattern
                .columns
                .iter()
                .map(|column| ColumnDef::leaf(column, Some(&key)))
                .collect();
            DynamicGroup {
                column: ColumnDef::group(header.clone(), key.clone(), children),
                row_keys: BTreeSet::from([key.clone()]),
                key,
                header,
            }
        })
        .collect();

    layout
}
