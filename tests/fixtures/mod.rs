//! Shared test fixtures for price table and CLI tests.
#![allow(dead_code)] // Not every test binary uses every fixture

use pricegrid::models::{PriceList, SubGroup, SubGroupKey, Tab};
use pricegrid::{MemoryStore, PriceTableBuilder};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Attribute code of the category (tab) attribute used by the fixtures.
pub const CATEGORY: &str = "PRODUCT_GROUP1";
/// Attribute code of the coating (column group) attribute.
pub const COATING: &str = "PRODUCT_GROUP2";
/// Attribute code of the thickness attribute.
pub const THICKNESS: &str = "PRODUCT_GROUP4";
/// Attribute code of the width attribute.
pub const WIDTH: &str = "PRODUCT_GROUP6";

/// Creates a subgroup key whose value code doubles as its label.
pub fn key(attribute_code: &str, value: &str) -> SubGroupKey {
    SubGroupKey::new(attribute_code, value, value)
}

/// Creates a priced subgroup.
///
/// # Arguments
/// * `id` - Subgroup id
/// * `keys` - Attribute keys, in data-layer order
/// * `price` - Current price
///
/// # Returns
/// A `SubGroup` with no UDF blob, inventory or dates.
pub fn sub_group(id: &str, keys: Vec<SubGroupKey>, price: f64) -> SubGroup {
    SubGroup {
        id: id.to_string(),
        keys,
        price: Some(price),
        ..SubGroup::default()
    }
}

/// Wraps subgroups into a price list.
pub fn price_list(id: &str, group_key: &str, sub_groups: Vec<SubGroup>) -> PriceList {
    PriceList {
        id: id.to_string(),
        name: format!("Price list {id}"),
        group_key: group_key.to_string(),
        sub_groups,
    }
}

/// Deterministic coil data matching `configs/COIL_PATTERN.json`.
///
/// # Returns
/// One price list with four subgroups:
/// - `sg-1`: Coil, AZ150, 0.50 x 914, price 120, stock 5
/// - `sg-2`: Coil, Z275, 0.50 x 914, price 110, stock 3
/// - `sg-3`: Coil, AZ150, 0.60 x 1219, price 140
/// - `sg-4`: Prepainted, AZ150, 0.50 x 914, price 150
pub fn coil_price_lists() -> Vec<PriceList> {
    let coil = |id: &str, coating: (&str, &str), thickness: &str, width: &str, price: f64| {
        sub_group(
            id,
            vec![
                key(CATEGORY, "Coil"),
                SubGroupKey::new(COATING, coating.0, coating.1),
                key(THICKNESS, thickness),
                key(WIDTH, width),
            ],
            price,
        )
    };

    let mut sg1 = coil("sg-1", ("AZ150", "AZ 150"), "0.50", "914", 120.0);
    sg1.udf = Some(serde_json::json!({"stock": 5, "is_highlight": true}));
    let mut sg2 = coil("sg-2", ("Z275", "Z 275"), "0.50", "914", 110.0);
    sg2.udf = Some(Value::String(r#"{"stock": 3}"#.to_string()));
    let sg3 = coil("sg-3", ("AZ150", "AZ 150"), "0.60", "1219", 140.0);
    let mut sg4 = coil("sg-4", ("AZ150", "AZ 150"), "0.50", "914", 150.0);
    sg4.keys[0] = key(CATEGORY, "Prepainted");

    vec![price_list("pl-1", "COIL", vec![sg1, sg2, sg3, sg4])]
}

/// Creates a builder over a single in-memory pattern file.
pub fn memory_builder(group_code: &str, json: &str) -> PriceTableBuilder {
    PriceTableBuilder::new(MemoryStore::new().with_pattern(group_code, json))
}

/// Finds a tab by label.
///
/// # Panics
/// Panics when no tab has that label.
pub fn tab<'a>(tabs: &'a [Tab], label: &str) -> &'a Tab {
    tabs.iter()
        .find(|t| t.label == label)
        .unwrap_or_else(|| panic!("no tab labelled {label}, have {:?}", tab_labels(tabs)))
}

/// Labels of all tabs, in order.
pub fn tab_labels(tabs: &[Tab]) -> Vec<&str> {
    tabs.iter().map(|t| t.label.as_str()).collect()
}

/// Finds the row of a tab with the given row-group value.
pub fn row<'a>(tab: &'a Tab, row_group: &str) -> &'a serde_json::Map<String, Value> {
    tab.table_data
        .iter()
        .find(|r| r.get("row_group_value").and_then(Value::as_str) == Some(row_group))
        .unwrap_or_else(|| panic!("no row with row_group_value {row_group}"))
}

/// Leaf field names of a tab's column tree, depth-first.
pub fn leaf_fields(tab: &Tab) -> Vec<String> {
    tab.table_config
        .columns
        .iter()
        .flat_map(|c| c.leaf_fields())
        .map(ToString::to_string)
        .collect()
}

/// Creates a temporary directory holding the given pattern files.
///
/// # Arguments
/// * `files` - `(group code, JSON content)` pairs, written as `<CODE>_PATTERN.json`
pub fn temp_patterns_dir(files: &[(&str, &str)]) -> TempDir {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    for (group_code, content) in files {
        fs::write(
            temp_dir.path().join(format!("{group_code}_PATTERN.json")),
            content,
        )
        .expect("Failed to write pattern file");
    }
    temp_dir
}

/// Writes price lists as JSON into `dir` and returns the file path.
pub fn write_price_lists(dir: &Path, price_lists: &[PriceList]) -> PathBuf {
    let path = dir.join("price_lists.json");
    let json = serde_json::to_string_pretty(price_lists).expect("Failed to serialize price lists");
    fs::write(&path, json).expect("Failed to write price lists");
    path
}
