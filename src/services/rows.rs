//! Row construction.
//!
//! Rows are built per source record. Attribute values are written
//! unprefixed; pattern columns and UDF fields are scoped to the record's
//! column group and only flattened to `<group>_<field>` on output.

use serde_json::Value;
use std::collections::BTreeMap;

use crate::models::grid::GridRow;
use crate::models::mappings::{render_item_label, FormatPart};
use crate::models::pattern::{ColumnConfig, PatternConfig, PriceTableConfiguration};
use crate::models::source::{SourceRecord, SubGroup};
use crate::models::udf::{number_value, UdfFields};
use crate::services::keys::{
    build_composite_key, column_group_of, column_path_key, fallback_group_id, fallback_key,
};
use crate::services::mappings::{resolve_item_format, EffectiveMappings};

/// Row field holding the owning price list id.
pub const FIELD_PRICE_LIST_ID: &str = "price_list_id";

/// Separator of composite `A_x_B` data mappings.
const COMPOSITE_MAPPING_SEPARATOR: &str = "_x_";
/// Separator between labels of a composite data mapping.
const COMPOSITE_LABEL_SEPARATOR: &str = " x ";

/// Everything needed to turn records into rows for one pattern.
#[derive(Debug, Clone)]
pub struct RowContext<'a> {
    pattern: &'a PatternConfig,
    mappings: EffectiveMappings<'a>,
    row_attributes: Vec<String>,
    column_attributes: Vec<String>,
    column_levels: Vec<String>,
    item_format: Vec<FormatPart>,
    item_label_field: Option<String>,
}

impl<'a> RowContext<'a> {
    /// Prepares a context, resolving every alias up front.
    ///
    /// With `with_item_label` the rendered item label is written to every
    /// row under the `itemLabelField` special mapping.
    #[must_use]
    pub fn new(
        config: &'a PriceTableConfiguration,
        pattern: &'a PatternConfig,
        with_item_label: bool,
    ) -> Self {
        let mappings = EffectiveMappings::new(config, pattern);
        let column_levels = pattern
            .column_levels
            .iter()
            .map(|level| mappings.grouping_code(&level.attribute))
            .collect();

        Self {
            pattern,
            row_attributes: mappings.attributes(&pattern.grouping.rows),
            column_attributes: mappings.attributes(&pattern.grouping.column_groups),
            column_levels,
            item_format: resolve_item_format(config.value_mappings.as_ref(), pattern),
            item_label_field: with_item_label.then(|| mappings.item_label_field()),
            mappings,
        }
    }

    /// Column-group key of a record; `None` when the pattern has no column grouping.
    #[must_use]
    pub fn column_group(&self, record: &SourceRecord<'_>) -> Option<String> {
        if !self.column_levels.is_empty() {
            return Some(column_path_key(record.keys(), &self.column_levels));
        }
        if self.column_attributes.is_empty() {
            return None;
        }
        let key = column_group_of(record.keys(), &self.column_attributes)
            .map_or_else(|| fallback_group_id(record.id()), |(id, _)| id);
        Some(key)
    }

    /// Row-group key of a record, `col_<id>` when it has no grouping value.
    #[must_use]
    pub fn row_group(&self, record: &SourceRecord<'_>) -> String {
        let key = build_composite_key(record.keys(), &self.row_attributes);
        if key.is_empty() {
            fallback_key(record.id())
        } else {
            key
        }
    }

    /// Renders the item label of a record.
    #[must_use]
    pub fn item_label(&self, record: &SourceRecord<'_>) -> String {
        let sub_group = record.sub_group;
        render_item_label(&self.item_format, |code| sub_group.label(code))
    }

    fn row_columns(&self) -> impl Iterator<Item = &'a ColumnConfig> {
        let pattern = self.pattern;
        pattern.fixed_columns.iter().chain(
            pattern
                .column_groups
                .iter()
                .flat_map(|group| group.children.iter()),
        )
    }

    /// Writes a record's values onto a row.
    fn fill(&self, row: &mut GridRow, record: &SourceRecord<'_>) {
        for key in record.keys() {
            row.set(key.attribute_code.clone(), Value::String(key.value_label.clone()));
        }
        row.set(FIELD_PRICE_LIST_ID, Value::String(record.price_list.id.clone()));

        if let Some(field) = &self.item_label_field {
            row.set(field.clone(), Value::String(self.item_label(record)));
        }

        for (key, value) in UdfFields::parse(record.sub_group.udf.as_ref(), record.id()).entries() {
            row.set_scoped(key, value);
        }

        for column in self.row_columns() {
            match self.resolve_mapping(record, row, column.mapping()) {
                Some(value) => row.set(column.field.clone(), value),
                None => row.set_if_absent(&column.field, Value::String(String::new())),
            }
        }

        for column in &self.pattern.columns {
            match self.resolve_mapping(record, row, column.mapping()) {
                Some(value) => row.set_scoped(column.field.clone(), value),
                None if row.get_scoped(&column.field).is_none() => {
                    row.set_scoped(column.field.clone(), Value::String(String::new()));
                }
                None => {}
            }
        }
    }

    /// Resolves a column's `dataMapping` for a record.
    ///
    /// Dispatch order: row-field alias, attribute code, composite `A_x_B` or
    /// adjacent `AB` attributes, computed field. `None` means no source
    /// produced a value and the caller writes `""`.
    #[must_use]
    pub fn resolve_mapping(
        &self,
        record: &SourceRecord<'_>,
        row: &GridRow,
        mapping: &str,
    ) -> Option<Value> {
        self.row_alias(record, row, mapping)
            .or_else(|| self.attribute_value(record, mapping))
            .or_else(|| self.composite_value(record, mapping))
            .or_else(|| computed_field(record.sub_group, mapping))
    }

    fn row_alias(&self, record: &SourceRecord<'_>, row: &GridRow, mapping: &str) -> Option<Value> {
        let text = match mapping {
            "id" => row.id.clone(),
            "rowGroupValue" => row.row_group.clone(),
            "columnGroup" => row.column_group.clone().unwrap_or_default(),
            "itemLabel" => self.item_label(record),
            "priceListId" => record.price_list.id.clone(),
            "priceListName" => record.price_list.name.clone(),
            _ => return None,
        };
        Some(Value::String(text))
    }

    fn attribute_value(&self, record: &SourceRecord<'_>, mapping: &str) -> Option<Value> {
        let code = self.mappings.attribute_code(mapping);
        record
            .sub_group
            .key(&code)
            .map(|key| Value::String(key.value_label.clone()))
    }

    fn composite_value(&self, record: &SourceRecord<'_>, mapping: &str) -> Option<Value> {
        let sub_group = record.sub_group;

        if mapping.contains(COMPOSITE_MAPPING_SEPARATOR) {
            let labels: Vec<&str> = mapping
                .split(COMPOSITE_MAPPING_SEPARATOR)
                .map(|part| sub_group.label(&self.mappings.attribute_code(part)))
                .filter(|label| !label.is_empty())
                .collect();
            if labels.is_empty() {
                return None;
            }
            return Some(Value::String(labels.join(COMPOSITE_LABEL_SEPARATOR)));
        }

        // Adjacency: "PRODUCT_GROUP4PRODUCT_GROUP6" names two attributes back to back.
        for key in &sub_group.keys {
            let Some(rest) = mapping.strip_prefix(key.attribute_code.as_str()) else {
                continue;
            };
            if rest.is_empty() {
                continue;
            }
            if let Some(other) = sub_group.key(&self.mappings.attribute_code(rest)) {
                return Some(Value::String(format!("{}{}", key.value_label, other.value_label)));
            }
        }
        None
    }
}

fn round_amount(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

/// Fields derived from the subgroup's own price, weight and date data.
fn computed_field(sub_group: &SubGroup, name: &str) -> Option<Value> {
    let has_inventory = !sub_group.inventory.is_empty();
    match name {
        "price" => sub_group.price.map(number_value),
        "previous_price" => sub_group.previous_price.map(number_value),
        "price_change" => sub_group
            .price
            .zip(sub_group.previous_price)
            .map(|(price, previous)| number_value(round_amount(price - previous))),
        "cost" => sub_group.cost.map(number_value),
        "margin" => sub_group
            .price
            .zip(sub_group.cost)
            .map(|(price, cost)| number_value(round_amount(price - cost))),
        "weight" => sub_group.weight.map(number_value),
        "avg_weight" => sub_group
            .average_inventory_weight()
            .map(|avg| number_value(round_amount(avg))),
        "total_weight" => has_inventory.then(|| number_value(sub_group.total_inventory_weight())),
        "stock_quantity" => {
            has_inventory.then(|| number_value(sub_group.total_inventory_quantity()))
        }
        "effective_date" => sub_group
            .effective_date
            .map(|date| Value::String(date.format("%Y-%m-%d").to_string())),
        "updated_at" => sub_group
            .updated_at
            .map(|at| Value::String(at.to_rfc3339())),
        "remark" => sub_group.remark.clone().map(Value::String),
        _ => None,
    }
}

/// Builds one row per `(column group, row group, record)`.
///
/// Each column group keeps a running row number in input order; zip
/// merging relies on it for deterministic ordering.
#[must_use]
pub fn build_dynamic_rows(ctx: &RowContext<'_>, records: &[SourceRecord<'_>]) -> Vec<GridRow> {
    let mut index: BTreeMap<(String, String, String), usize> = BTreeMap::new();
    let mut counters: BTreeMap<String, usize> = BTreeMap::new();
    let mut rows: Vec<GridRow> = Vec::with_capacity(records.len());

    for record in records {
        let column_group = ctx.column_group(record);
        let row_group = ctx.row_group(record);
        let key = (
            column_group.clone().unwrap_or_default(),
            row_group.clone(),
            record.id().to_string(),
        );

        if let Some(&existing) = index.get(&key) {
            ctx.fill(&mut rows[existing], record);
            continue;
        }

        let counter = counters.entry(key.0.clone()).or_insert(0);
        let mut row = GridRow::new(record.id(), row_group, column_group, *counter);
        *counter += 1;

        ctx.fill(&mut row, record);
        index.insert(key, rows.len());
        rows.push(row);
    }

    rows
}

/// Builds exactly one row per record, in input order.
#[must_use]
pub fn build_direct_rows(ctx: &RowContext<'_>, records: &[SourceRecord<'_>]) -> Vec<GridRow> {
    records
        .iter()
        .enumerate()
        .map(|(position, record)| {
            let mut row = GridRow::new(
                record.id(),
                ctx.row_group(record),
                ctx.column_group(record),
                position,
            );
            ctx.fill(&mut row, record);
            row
        })
        .collect()
}
