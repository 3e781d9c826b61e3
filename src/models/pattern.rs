//! Pattern file schema.
//!
//! One `PriceTableConfiguration` document exists per group code. It lists
//! the transformation patterns available for that product family, the id of
//! the default one, the shared grid chrome, and optional value mappings.
//!
//! The file shape is an external contract: every optional field defaults so
//! older files keep loading.

use serde::{Deserialize, Serialize};

use crate::models::mappings::{ItemFormat, ValueMappingsConfig};

/// The file-level pattern document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct PriceTableConfiguration {
    /// Optional display name for the whole table
    #[serde(default)]
    pub name: Option<String>,
    /// Patterns in declaration order
    #[serde(default)]
    pub patterns: Vec<PatternConfig>,
    /// Id of the pattern used when no category matches
    #[serde(default)]
    pub default_pattern: String,
    /// Grid chrome shared by every tab
    #[serde(default)]
    pub table_config: TableChrome,
    /// Root-level value mappings
    #[serde(default)]
    pub value_mappings: Option<ValueMappingsConfig>,
}

impl PriceTableConfiguration {
    /// Returns the enabled pattern whose id matches `defaultPattern`.
    #[must_use]
    pub fn default_pattern(&self) -> Option<&PatternConfig> {
        self.patterns
            .iter()
            .find(|p| p.enabled && p.id == self.default_pattern)
    }

    /// Iterates over enabled patterns in declaration order.
    pub fn enabled_patterns(&self) -> impl Iterator<Item = &PatternConfig> {
        self.patterns.iter().filter(|p| p.enabled)
    }
}

/// Grid chrome copied onto every tab.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct TableChrome {
    /// Title; defaults to the tab label when absent
    #[serde(default)]
    pub title: Option<String>,
    /// Toolbar settings passed through to the grid
    #[serde(default)]
    pub toolbar: serde_json::Value,
    /// Pagination settings passed through to the grid
    #[serde(default)]
    pub pagination: serde_json::Value,
    /// Height of column group header rows in pixels
    #[serde(default)]
    pub group_header_height: Option<u32>,
    /// Height of the leaf header row in pixels
    #[serde(default)]
    pub header_height: Option<u32>,
    /// Free-form grid options
    #[serde(default)]
    pub grid_options: serde_json::Value,
}

/// One named transformation strategy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct PatternConfig {
    /// Unique id within the file
    pub id: String,
    /// Display name
    #[serde(default)]
    pub name: String,
    /// Disabled patterns are never selected automatically
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Attribute lists for tabs, rows and column groups
    #[serde(default)]
    pub grouping: GroupingConfig,
    /// Columns repeated inside every dynamic column group
    #[serde(default)]
    pub columns: Vec<ColumnConfig>,
    /// Columns emitted once per row, before any group
    #[serde(default)]
    pub fixed_columns: Vec<ColumnConfig>,
    /// Static nested groups of row-level columns
    #[serde(default)]
    pub column_groups: Vec<StaticColumnGroup>,
    /// Multi-level column hierarchy (overrides single-level grouping)
    #[serde(default)]
    pub column_levels: Vec<ColumnLevel>,
    /// Tab values that select this pattern
    #[serde(default)]
    pub applicable_categories: Vec<String>,
    /// Item label format override
    #[serde(default)]
    pub item_format: Option<ItemFormat>,
    /// Optional per-row-group numeric summary
    #[serde(default)]
    pub summary: Option<SummaryConfig>,
    /// Pattern-level value mappings (win over root mappings)
    #[serde(default)]
    pub value_mappings: Option<ValueMappingsConfig>,
}

fn default_enabled() -> bool {
    true
}

impl PatternConfig {
    /// True when the pattern builds a multi-level column tree.
    #[must_use]
    pub fn is_multi_level(&self) -> bool {
        !self.column_levels.is_empty()
    }

    /// Fields of all columns flagged editable, in declaration order.
    #[must_use]
    pub fn editable_suffixes(&self) -> Vec<String> {
        self.all_columns()
            .filter(|c| c.editable)
            .map(|c| c.field.clone())
            .collect()
    }

    /// Fields of all columns flagged fetchable, in declaration order.
    #[must_use]
    pub fn fetchable_suffixes(&self) -> Vec<String> {
        self.all_columns()
            .filter(|c| c.fetchable)
            .map(|c| c.field.clone())
            .collect()
    }

    fn all_columns(&self) -> impl Iterator<Item = &ColumnConfig> {
        self.fixed_columns
            .iter()
            .chain(self.column_groups.iter().flat_map(|g| g.children.iter()))
            .chain(self.columns.iter())
    }
}

/// Pipe-delimited attribute lists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct GroupingConfig {
    /// Attributes whose values become tabs
    #[serde(default)]
    pub tabs: String,
    /// Attributes whose values identify a visual row
    #[serde(default)]
    pub rows: String,
    /// Attributes whose values identify a column family
    #[serde(default)]
    pub column_groups: String,
}

/// Splits a pipe-delimited attribute list, trimming and dropping empties.
#[must_use]
pub fn split_attributes(list: &str) -> Vec<String> {
    list.split('|')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
        .collect()
}

/// Column definition as written in a pattern file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ColumnConfig {
    /// Field name (prefixed with the column group key for dynamic columns)
    pub field: String,
    /// Header text
    #[serde(default)]
    pub header_name: String,
    /// Width in pixels
    #[serde(default)]
    pub width: Option<u32>,
    /// Source of the value; defaults to `field`
    #[serde(default)]
    pub data_mapping: Option<String>,
    /// Grid cell renderer id
    #[serde(default)]
    pub cell_renderer: Option<String>,
    /// Grid cell style, passed through
    #[serde(default)]
    pub cell_style: Option<serde_json::Value>,
    /// Pin side ("left" or "right")
    #[serde(default)]
    pub pinned: Option<String>,
    /// Whether the grid may edit this field
    #[serde(default)]
    pub editable: bool,
    /// Whether the grid may lazily fetch this field
    #[serde(default)]
    pub fetchable: bool,
}

impl ColumnConfig {
    /// The effective data mapping: explicit `dataMapping` or the field name.
    #[must_use]
    pub fn mapping(&self) -> &str {
        self.data_mapping
            .as_deref()
            .filter(|m| !m.is_empty())
            .unwrap_or(&self.field)
    }
}

/// A non-dynamic column group declared in the pattern file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct StaticColumnGroup {
    /// Header text
    #[serde(default)]
    pub header_name: String,
    /// Group id; derived from the header when absent
    #[serde(default)]
    pub group_id: Option<String>,
    /// Row-level columns inside the group
    #[serde(default)]
    pub children: Vec<ColumnConfig>,
}

/// One level of a multi-level column hierarchy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ColumnLevel {
    /// Attribute code (or alias) providing this level's values
    pub attribute: String,
    /// Optional header prefix, e.g. "Width" renders "Width: 914"
    #[serde(default)]
    pub header_name: Option<String>,
}

/// Summary configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct SummaryConfig {
    /// Columns to aggregate
    #[serde(default)]
    pub columns: Vec<SummaryColumn>,
}

/// One summarized column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct SummaryColumn {
    /// Field to aggregate
    pub field: String,
    /// Aggregation; only "sum" is defined and anything else is treated as sum
    #[serde(default)]
    pub aggregation: String,
    /// Aggregate `<columnGroupKey>_<field>` instead of the bare field
    #[serde(default)]
    pub apply_to_column_groups: Option<bool>,
}

impl SummaryColumn {
    /// `applyToColumnGroups`, defaulting to true.
    #[must_use]
    pub fn applies_to_column_groups(&self) -> bool {
        self.apply_to_column_groups.unwrap_or(true)
    }
}
