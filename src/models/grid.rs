//! Output model consumed by the data grid.
//!
//! Rows keep column-group-scoped values in a `(column group, field)` map and
//! are flattened into `<columnGroupKey>_<field>` names only when converted to
//! wire records.

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use crate::models::pattern::{ColumnConfig, TableChrome};

/// Field carrying the row identity.
pub const FIELD_ID: &str = "id";
/// Field carrying the row-group value.
pub const FIELD_ROW_GROUP: &str = "row_group_value";

/// Wire form of a grid row: a string-keyed record with no fixed schema.
pub type RowData = Map<String, Value>;

/// A column definition node: either a leaf column or a group of children.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ColumnDef {
    /// Group header with nested children
    #[serde(rename_all = "camelCase")]
    Group {
        /// Header text
        header_name: String,
        /// Stable group id
        group_id: String,
        /// Nested columns or groups
        children: Vec<ColumnDef>,
    },
    /// Leaf column bound to a row field
    #[serde(rename_all = "camelCase")]
    Leaf {
        /// Row field name
        field: String,
        /// Header text
        header_name: String,
        /// Width in pixels
        #[serde(skip_serializing_if = "Option::is_none")]
        width: Option<u32>,
        /// Grid cell renderer id
        #[serde(skip_serializing_if = "Option::is_none")]
        cell_renderer: Option<String>,
        /// Grid cell style
        #[serde(skip_serializing_if = "Option::is_none")]
        cell_style: Option<Value>,
        /// Pin side
        #[serde(skip_serializing_if = "Option::is_none")]
        pinned: Option<String>,
        /// Whether the grid may edit this cell
        #[serde(skip_serializing_if = "std::ops::Not::not")]
        editable: bool,
    },
}

impl ColumnDef {
    /// Builds a leaf from a configured column, optionally prefixing its field.
    #[must_use]
    pub fn leaf(column: &ColumnConfig, prefix: Option<&str>) -> Self {
        let field = match prefix {
            Some(prefix) => grouped_field_name(prefix, &column.field),
            None => column.field.clone(),
        };
        Self::Leaf {
            field,
            header_name: column.header_name.clone(),
            width: column.width,
            cell_renderer: column.cell_renderer.clone(),
            cell_style: column.cell_style.clone(),
            pinned: column.pinned.clone(),
            editable: column.editable,
        }
    }

    /// Builds a group node.
    pub fn group(
        header_name: impl Into<String>,
        group_id: impl Into<String>,
        children: Vec<ColumnDef>,
    ) -> Self {
        Self::Group {
            header_name: header_name.into(),
            group_id: group_id.into(),
            children,
        }
    }

    /// Leaf field names under this node, depth-first.
    #[must_use]
    pub fn leaf_fields(&self) -> Vec<&str> {
        match self {
            Self::Leaf { field, .. } => vec![field.as_str()],
            Self::Group { children, .. } => children.iter().flat_map(Self::leaf_fields).collect(),
        }
    }
}

/// Joins a column group key and a field into the wire field name.
#[must_use]
pub fn grouped_field_name(column_group: &str, field: &str) -> String {
    format!("{column_group}_{field}")
}

/// A row under construction or after merging.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GridRow {
    /// Row identity (source record id of the first contributor)
    pub id: String,
    /// Row-group key
    pub row_group: String,
    /// Column group this row belongs to before merging
    pub column_group: Option<String>,
    /// Per-column-group ordinal used for deterministic zip merging
    pub row_number: usize,
    fields: BTreeMap<String, Value>,
    grouped: BTreeMap<(String, String), Value>,
}

impl GridRow {
    /// Creates an empty row.
    pub fn new(
        id: impl Into<String>,
        row_group: impl Into<String>,
        column_group: Option<String>,
        row_number: usize,
    ) -> Self {
        Self {
            id: id.into(),
            row_group: row_group.into(),
            column_group,
            row_number,
            fields: BTreeMap::new(),
            grouped: BTreeMap::new(),
        }
    }

    /// Sets an unprefixed field.
    pub fn set(&mut self, field: impl Into<String>, value: Value) {
        self.fields.insert(field.into(), value);
    }

    /// Sets an unprefixed field only when absent.
    pub fn set_if_absent(&mut self, field: &str, value: Value) {
        self.fields.entry(field.to_string()).or_insert(value);
    }

    /// Sets a field scoped to a column group.
    pub fn set_grouped(
        &mut self,
        column_group: impl Into<String>,
        field: impl Into<String>,
        value: Value,
    ) {
        self.grouped.insert((column_group.into(), field.into()), value);
    }

    /// Writes a value into this row's own column group, or unprefixed when it has none.
    pub fn set_scoped(&mut self, field: impl Into<String>, value: Value) {
        match self.column_group.clone() {
            Some(column_group) => self.set_grouped(column_group, field, value),
            None => self.set(field, value),
        }
    }

    /// Reads an unprefixed field.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// Reads a column-group-scoped field.
    #[must_use]
    pub fn get_grouped(&self, column_group: &str, field: &str) -> Option<&Value> {
        self.grouped
            .get(&(column_group.to_string(), field.to_string()))
    }

    /// Reads a field from this row's own scope.
    #[must_use]
    pub fn get_scoped(&self, field: &str) -> Option<&Value> {
        match &self.column_group {
            Some(column_group) => self.get_grouped(column_group, field),
            None => self.get(field),
        }
    }

    /// Reads a boolean flag (UDF-derived) from this row's own scope.
    #[must_use]
    pub fn flag(&self, field: &str) -> bool {
        self.get_scoped(field).and_then(Value::as_bool).unwrap_or(false)
    }

    /// Iterates over unprefixed fields.
    pub fn fields(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.fields.iter()
    }

    /// Iterates over grouped fields as `((column group, field), value)`.
    pub fn grouped_fields(&self) -> impl Iterator<Item = (&(String, String), &Value)> {
        self.grouped.iter()
    }

    /// Column groups that contributed values to this row.
    #[must_use]
    pub fn column_groups(&self) -> Vec<&str> {
        let mut groups: Vec<&str> = self.grouped.keys().map(|(g, _)| g.as_str()).collect();
        groups.dedup();
        groups
    }

    /// Copies every field of `other` into this row, overwriting on conflict.
    pub fn overwrite_from(&mut self, other: &GridRow) {
        for (field, value) in &other.fields {
            self.fields.insert(field.clone(), value.clone());
        }
        for (key, value) in &other.grouped {
            self.grouped.insert(key.clone(), value.clone());
        }
    }

    /// Copies grouped fields of `other` and fills unprefixed gaps only.
    pub fn absorb(&mut self, other: &GridRow) {
        for (field, value) in &other.fields {
            self.fields.entry(field.clone()).or_insert_with(|| value.clone());
        }
        for (key, value) in &other.grouped {
            self.grouped.insert(key.clone(), value.clone());
        }
    }

    /// Flattens the row into its wire form.
    ///
    /// `id` and `row_group_value` always come from the row itself; a field
    /// of the same name (from a UDF blob or an attribute code) is dropped.
    #[must_use]
    pub fn to_record(&self) -> RowData {
        let mut record = Map::new();
        for (field, value) in &self.fields {
            record.insert(field.clone(), value.clone());
        }
        for ((column_group, field), value) in &self.grouped {
            record.insert(grouped_field_name(column_group, field), value.clone());
        }
        record.insert(FIELD_ID.to_string(), Value::String(self.id.clone()));
        record.insert(
            FIELD_ROW_GROUP.to_string(),
            Value::String(self.row_group.clone()),
        );
        record
    }
}

/// Per-row-group numeric totals.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SummaryRow {
    /// Row-group value the totals belong to
    pub row_group: String,
    /// Field → total
    pub values: BTreeMap<String, f64>,
    /// True when at least one numeric value was summed
    pub observed: bool,
}

impl Serialize for SummaryRow {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry(FIELD_ROW_GROUP, &self.row_group)?;
        for (field, total) in &self.values {
            if field != FIELD_ROW_GROUP {
                map.serialize_entry(field, total)?;
            }
        }
        map.end()
    }
}

/// Grid configuration of one tab.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TableConfig {
    /// Tab title
    pub title: String,
    /// Toolbar settings
    pub toolbar: Value,
    /// Pagination settings
    pub pagination: Value,
    /// Group header row height
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_header_height: Option<u32>,
    /// Leaf header row height
    #[serde(skip_serializing_if = "Option::is_none")]
    pub header_height: Option<u32>,
    /// Free-form grid options
    pub grid_options: Value,
    /// Column tree
    pub columns: Vec<ColumnDef>,
}

impl TableConfig {
    /// Combines shared chrome with a tab's columns.
    #[must_use]
    pub fn from_chrome(
        chrome: &TableChrome,
        fallback_title: &str,
        columns: Vec<ColumnDef>,
    ) -> Self {
        Self {
            title: chrome
                .title
                .clone()
                .filter(|t| !t.is_empty())
                .unwrap_or_else(|| fallback_title.to_string()),
            toolbar: chrome.toolbar.clone(),
            pagination: chrome.pagination.clone(),
            group_header_height: chrome.group_header_height,
            header_height: chrome.header_height,
            grid_options: chrome.grid_options.clone(),
            columns,
        }
    }
}

/// One tab of the response.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Tab {
    /// Stable tab id
    pub id: String,
    /// Tab label
    pub label: String,
    /// Grid configuration
    pub table_config: TableConfig,
    /// Flattened rows
    pub table_data: Vec<RowData>,
    /// Per-row-group totals
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary_rows: Option<Vec<SummaryRow>>,
    /// Totals across all summary rows
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary_field: Option<BTreeMap<String, f64>>,
    /// Field suffixes the grid may edit
    #[serde(skip_serializing_if = "Option::is_none")]
    pub editable_suffixes: Option<Vec<String>>,
    /// Field suffixes the grid may fetch lazily
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fetchable_suffixes: Option<Vec<String>>,
}

/// Response handed back to the HTTP layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApiResponse {
    /// Group code the table was built for
    pub id: String,
    /// Display name
    pub name: String,
    /// Tabs in display order
    pub tabs: Vec<Tab>,
}
