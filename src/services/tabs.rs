//! Tab partitioning, per-tab pattern selection and tab assembly.

use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

use crate::models::grid::{ColumnDef, GridRow, Tab, TableConfig};
use crate::models::pattern::{PatternConfig, PriceTableConfiguration};
use crate::models::source::SourceRecord;
use crate::services::columns::build_columns;
use crate::services::keys::{build_composite_key, sanitize};
use crate::services::mappings::EffectiveMappings;
use crate::services::registry::{BuildPlan, MergeStrategy, RowStrategy, TabSplit};
use crate::services::rows::{build_direct_rows, build_dynamic_rows, RowContext};
use crate::services::summary::{build_summary_field, build_summary_rows};

/// Id used when a tab label sanitizes to nothing.
const FALLBACK_TAB_ID: &str = "tab";

/// Display name of a configuration: its `name`, else the group code.
#[must_use]
pub fn display_name(config: &PriceTableConfiguration, group_code: &str) -> String {
    config
        .name
        .as_deref()
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .unwrap_or(group_code)
        .to_string()
}

/// Whether a pattern's `applicableCategories` cover a tab label.
///
/// Both sides are sanitized (case-insensitive, punctuation-insensitive) and
/// match when equal or when either contains the other.
#[must_use]
pub fn matches_category(pattern: &PatternConfig, tab_label: &str) -> bool {
    let label = sanitize(tab_label);
    if label.is_empty() {
        return false;
    }

    pattern
        .applicable_categories
        .iter()
        .map(|category| sanitize(category))
        .filter(|category| !category.is_empty())
        .any(|category| category == label || label.contains(&category) || category.contains(&label))
}

/// Picks the pattern for a tab: the first enabled pattern whose categories
/// match, else the default pattern.
#[must_use]
pub fn select_pattern<'c>(
    config: &'c PriceTableConfiguration,
    tab_label: &str,
) -> Option<&'c PatternConfig> {
    config
        .enabled_patterns()
        .find(|pattern| matches_category(pattern, tab_label))
        .or_else(|| config.default_pattern())
}

/// Splits records into tabs by tab attribute labels, sorted by label.
///
/// Records without a tab value go to the `fallback_label` tab.
#[must_use]
pub fn partition_by_tab<'r>(
    records: &[SourceRecord<'r>],
    tab_attributes: &[String],
    fallback_label: &str,
) -> Vec<(String, Vec<SourceRecord<'r>>)> {
    let mut tabs: BTreeMap<String, Vec<SourceRecord<'r>>> = BTreeMap::new();
    for record in records {
        let label = build_composite_key(record.keys(), tab_attributes);
        let label = if label.is_empty() {
            fallback_label.to_string()
        } else {
            label
        };
        tabs.entry(label).or_default().push(*record);
    }
    tabs.into_iter().collect()
}

/// Hands out unique tab ids derived from labels.
#[derive(Debug, Default)]
pub struct TabIds {
    used: BTreeSet<String>,
}

impl TabIds {
    /// Returns the sanitized label, suffixed `_2`, `_3`, ... when already taken.
    pub fn allocate(&mut self, label: &str) -> String {
        let base = sanitize(label);
        let base = if base.is_empty() {
            FALLBACK_TAB_ID.to_string()
        } else {
            base
        };

        let mut candidate = base.clone();
        let mut suffix = 2;
        while !self.used.insert(candidate.clone()) {
            candidate = format!("{base}_{suffix}");
            suffix += 1;
        }
        candidate
    }
}

fn non_empty(list: Vec<String>) -> Option<Vec<String>> {
    if list.is_empty() {
        None
    } else {
        Some(list)
    }
}

struct TabAssembler<'a> {
    config: &'a PriceTableConfiguration,
    merge: MergeStrategy,
    ids: TabIds,
    tabs: Vec<Tab>,
}

impl TabAssembler<'_> {
    fn push(
        &mut self,
        pattern: &PatternConfig,
        label: String,
        columns: Vec<ColumnDef>,
        rows: Vec<GridRow>,
    ) {
        let summary_rows = build_summary_rows(pattern, &rows);
        let summary_field = summary_rows.as_deref().and_then(build_summary_field);
        let merged = self.merge.apply(rows);

        self.tabs.push(Tab {
            id: self.ids.allocate(&label),
            table_config: TableConfig::from_chrome(&self.config.table_config, &label, columns),
            table_data: merged.iter().map(GridRow::to_record).collect(),
            summary_rows,
            summary_field,
            editable_suffixes: non_empty(pattern.editable_suffixes()),
            fetchable_suffixes: non_empty(pattern.fetchable_suffixes()),
            label,
        });
    }
}

/// Builds every tab of a response.
///
/// # Arguments
///
/// * `config` - Loaded configuration
/// * `default_pattern` - The configuration's enabled default pattern
/// * `plan` - Handler build plan
/// * `records` - All source records, in input order
/// * `group_code` - Group code, used for the single-tab label fallback
///
/// # Returns
///
/// Tabs in display order. Tabs follow the default pattern's tab grouping
/// unless the plan asks for a single tab; a plan splitting per column group
/// emits one tab per dynamic column group labelled `<tab> - <group>`.
#[must_use]
pub fn build_tabs(
    config: &PriceTableConfiguration,
    default_pattern: &PatternConfig,
    plan: &BuildPlan,
    records: &[SourceRecord<'_>],
    group_code: &str,
) -> Vec<Tab> {
    let default_mappings = EffectiveMappings::new(config, default_pattern);
    let tab_attributes = default_mappings.attributes(&default_pattern.grouping.tabs);
    let single = plan.tab_split == TabSplit::Single || tab_attributes.is_empty();

    let partitions = if single {
        vec![(display_name(config, group_code), records.to_vec())]
    } else {
        partition_by_tab(records, &tab_attributes, &default_mappings.fallback_tab_label())
    };

    let mut assembler = TabAssembler {
        config,
        merge: plan.merge,
        ids: TabIds::default(),
        tabs: Vec::new(),
    };

    for (label, tab_records) in partitions {
        let pattern = if single {
            default_pattern
        } else {
            select_pattern(config, &label).unwrap_or(default_pattern)
        };
        debug!(tab = %label, pattern = %pattern.id, records = tab_records.len(), "Building tab");

        let mappings = EffectiveMappings::new(config, pattern);
        let layout = build_columns(pattern, &tab_records, &mappings);
        let ctx = RowContext::new(config, pattern, plan.item_label);
        let rows = match plan.rows {
            RowStrategy::Dynamic => build_dynamic_rows(&ctx, &tab_records),
            RowStrategy::Direct => build_direct_rows(&ctx, &tab_records),
        };

        if plan.tab_split == TabSplit::PerColumnGroup && !layout.dynamic.is_empty() {
            for group in &layout.dynamic {
                let group_rows: Vec<GridRow> = rows
                    .iter()
                    .filter(|row| {
                        row.column_group
                            .as_ref()
                            .is_some_and(|key| group.row_keys.contains(key))
                    })
                    .cloned()
                    .collect();
                let group_label = format!("{label} - {}", group.header);
                assembler.push(pattern, group_label, layout.assemble(Some(&group.key)), group_rows);
            }
        } else {
            assembler.push(pattern, label, layout.assemble(None), rows);
        }
    }

    assembler.tabs
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pattern(id: &str, categories: &[&str], enabled: bool) -> PatternConfig {
        PatternConfig {
            id: id.to_string(),
            enabled,
            applicable_categories: categories.iter().map(ToString::to_string).collect(),
            ..PatternConfig::default()
        }
    }

    #[test]
    fn test_matches_category_is_case_and_substring_tolerant() {
        let coil = pattern("coil", &["Coil"], true);
        assert!(matches_category(&coil, "coil"));
        assert!(matches_category(&coil, "COIL"));
        assert!(matches_category(&coil, "Coil Zinc"));
        assert!(!matches_category(&coil, "Sheet"));
        assert!(!matches_category(&coil, ""));

        let broad = pattern("broad", &["Galvanized Coil"], true);
        assert!(matches_category(&broad, "coil"));
    }

    #[test]
    fn test_select_pattern_skips_disabled() {
        let config = PriceTableConfiguration {
            default_pattern: "base".to_string(),
            patterns: vec![
                pattern("off", &["Coil"], false),
                pattern("coil", &["coil"], true),
                pattern("base", &[], true),
            ],
            ..PriceTableConfiguration::default()
        };
        assert_eq!(select_pattern(&config, "Coil").map(|p| p.id.as_str()), Some("coil"));
        assert_eq!(select_pattern(&config, "Pipe").map(|p| p.id.as_str()), Some("base"));
    }

    #[test]
    fn test_tab_ids_are_unique() {
        let mut ids = TabIds::default();
        assert_eq!(ids.allocate("Zinc 80"), "zinc_80");
        assert_eq!(ids.allocate("zinc-80"), "zinc_80_2");
        assert_eq!(ids.allocate("ZINC 80"), "zinc_80_3");
        assert_eq!(ids.allocate("???"), "tab");
    }

    #[test]
    fn test_display_name() {
        let mut config = PriceTableConfiguration::default();
        assert_eq!(display_name(&config, "COIL"), "COIL");
        config.name = Some("Coil Prices".to_string());
        assert_eq!(display_name(&config, "COIL"), "Coil Prices");
    }
}
