//! End-to-end tests for building price tables through `PriceTableBuilder`.

use pricegrid::models::{InventoryWeight, SubGroup, SubGroupKey};
use pricegrid::{EmbeddedStore, LayeredStore, MemoryStore, PriceTableBuilder, PriceTableError};
use serde_json::{json, Value};

mod fixtures;
use fixtures::*;

const GRID_PATTERN: &str = r#"{
    "defaultPattern": "grid",
    "patterns": [
        {
            "id": "grid",
            "grouping": {"tabs": "", "rows": "PRODUCT_GROUP4", "columnGroups": "PRODUCT_GROUP2"},
            "columns": [{"field": "price", "headerName": "Price"}]
        }
    ]
}"#;

// ============================================================================
// Zip merge across column groups
// ============================================================================

#[test]
fn test_rows_sharing_row_group_merge_across_column_groups() {
    let builder = memory_builder("STANDARD", GRID_PATTERN);
    let lists = vec![price_list(
        "pl-1",
        "STANDARD",
        vec![
            sub_group("sg-a", vec![key(THICKNESS, "10x20"), key(COATING, "A")], 1.5),
            sub_group("sg-b", vec![key(THICKNESS, "10x20"), key(COATING, "B")], 2.5),
        ],
    )];

    let response = builder.build("STANDARD", &lists).unwrap();
    assert_eq!(response.tabs.len(), 1);

    let tab = &response.tabs[0];
    assert_eq!(tab.table_data.len(), 1, "both records should merge into one row");
    let merged = row(tab, "10x20");
    assert_eq!(merged["a_price"], json!(1.5));
    assert_eq!(merged["b_price"], json!(2.5));
    assert_eq!(merged["id"], json!("sg-a"));

    assert_eq!(leaf_fields(tab), vec!["a_price".to_string(), "b_price".to_string()]);
}

#[test]
fn test_zip_merge_pairs_rows_by_position() {
    let builder = memory_builder("STANDARD", GRID_PATTERN);
    let lists = vec![price_list(
        "pl-1",
        "STANDARD",
        vec![
            sub_group("a1", vec![key(THICKNESS, "10"), key(COATING, "A")], 1.0),
            sub_group("a2", vec![key(THICKNESS, "10"), key(COATING, "A")], 2.0),
            sub_group("b1", vec![key(THICKNESS, "10"), key(COATING, "B")], 3.0),
        ],
    )];

    let response = builder.build("STANDARD", &lists).unwrap();
    let data = &response.tabs[0].table_data;
    assert_eq!(data.len(), 2, "row count is the largest per-group contribution");
    assert_eq!(data[0]["a_price"], json!(1.0));
    assert_eq!(data[0]["b_price"], json!(3.0));
    assert_eq!(data[1]["a_price"], json!(2.0));
    assert!(data[1].get("b_price").is_none());
}

#[test]
fn test_record_without_row_value_gets_synthetic_key() {
    let builder = memory_builder("STANDARD", GRID_PATTERN);
    let lists = vec![price_list(
        "pl-1",
        "STANDARD",
        vec![
            sub_group("sg-a", vec![key(THICKNESS, "10x20"), key(COATING, "A")], 1.5),
            sub_group("sg-lonely", vec![key(COATING, "A")], 9.0),
        ],
    )];

    let response = builder.build("STANDARD", &lists).unwrap();
    let tab = &response.tabs[0];
    assert_eq!(tab.table_data.len(), 2);
    let lonely = row(tab, "col_sg-lonely");
    assert_eq!(lonely["a_price"], json!(9.0));
}

#[test]
fn test_record_without_column_value_gets_its_own_group() {
    let builder = memory_builder("STANDARD", GRID_PATTERN);
    let lists = vec![price_list(
        "pl-1",
        "STANDARD",
        vec![sub_group("sg-x", vec![key(THICKNESS, "10")], 4.0)],
    )];

    let response = builder.build("STANDARD", &lists).unwrap();
    let tab = &response.tabs[0];
    assert_eq!(leaf_fields(tab), vec!["col_sg_x_price".to_string()]);
    assert_eq!(row(tab, "10")["col_sg_x_price"], json!(4.0));
}

// ============================================================================
// Bundled coil configuration
// ============================================================================

#[test]
fn test_coil_bundle_builds_tabs_per_category() {
    let builder = PriceTableBuilder::new(EmbeddedStore);
    let response = builder.build("COIL", &coil_price_lists()).unwrap();

    assert_eq!(response.id, "COIL");
    assert_eq!(response.name, "Coil Price List");
    assert_eq!(tab_labels(&response.tabs), vec!["Coil", "Prepainted"]);

    let coil = tab(&response.tabs, "Coil");
    assert_eq!(coil.id, "coil");
    assert_eq!(coil.table_config.title, "Coil Prices");
    assert_eq!(coil.table_config.group_header_height, Some(32));
    assert_eq!(
        leaf_fields(coil),
        vec![
            "item_label",
            "thickness",
            "width",
            "az150_price",
            "az150_price_change",
            "az150_stock",
            "z275_price",
            "z275_price_change",
            "z275_stock",
        ]
    );
    assert_eq!(coil.table_data.len(), 2);
    assert_eq!(coil.editable_suffixes, Some(vec!["price".to_string()]));
    assert_eq!(coil.fetchable_suffixes, Some(vec!["stock".to_string()]));

    let first = row(coil, "0.50|914");
    assert_eq!(first["item_label"], json!("0.50 x 914"));
    assert_eq!(first["thickness"], json!("0.50"));
    assert_eq!(first["az150_price"], json!(120.0));
    assert_eq!(first["z275_price"], json!(110.0));
    assert_eq!(first["az150_price_change"], json!(""));
    assert_eq!(first["az150_is_highlight"], json!(true));
    assert_eq!(first["z275_is_highlight"], json!(false));
    assert_eq!(first["price_list_id"], json!("pl-1"));

    let second = row(coil, "0.60|1219");
    assert_eq!(second["az150_price"], json!(140.0));
    assert!(second.get("z275_price").is_none());
}

#[test]
fn test_coil_bundle_summaries() {
    let builder = PriceTableBuilder::new(EmbeddedStore);
    let response = builder.build("COIL", &coil_price_lists()).unwrap();
    let coil = tab(&response.tabs, "Coil");

    let summary_rows = coil.summary_rows.as_ref().expect("coil pattern has a summary");
    assert_eq!(summary_rows.len(), 2);
    assert_eq!(summary_rows[0].row_group, "0.50|914");
    assert_eq!(summary_rows[0].values["az150_stock"], 5.0);
    assert_eq!(summary_rows[0].values["z275_stock"], 3.0);

    let summary_field = coil.summary_field.as_ref().expect("stock values were observed");
    assert_eq!(summary_field["az150_stock"], 5.0);
    assert_eq!(summary_field["z275_stock"], 3.0);

    let serialized = serde_json::to_value(&summary_rows[0]).unwrap();
    assert_eq!(serialized["row_group_value"], json!("0.50|914"));
}

#[test]
fn test_coil_bundle_selects_pattern_by_category() {
    let builder = PriceTableBuilder::new(EmbeddedStore);
    let response = builder.build("COIL", &coil_price_lists()).unwrap();

    let prepainted = tab(&response.tabs, "Prepainted");
    assert_eq!(
        leaf_fields(prepainted),
        vec!["item_label", "coating", "price", "effective_date"]
    );
    assert!(prepainted.summary_rows.is_none());

    let only = row(prepainted, "0.50|914|AZ 150");
    assert_eq!(only["price"], json!(150.0));
    assert_eq!(only["coating"], json!("AZ 150"));
    assert_eq!(only["effective_date"], json!(""));
    // no itemFormat anywhere: legacy format, missing length skipped
    assert_eq!(only["item_label"], json!("0.50 x 914"));
}

#[test]
fn test_category_match_ignores_case() {
    let config = r#"{
        "defaultPattern": "base",
        "patterns": [
            {
                "id": "base",
                "grouping": {"tabs": "PRODUCT_GROUP1", "rows": "PRODUCT_GROUP4"},
                "columns": [{"field": "price"}]
            },
            {
                "id": "coil-only",
                "applicableCategories": ["Coil"],
                "grouping": {"tabs": "PRODUCT_GROUP1", "rows": "PRODUCT_GROUP4"},
                "columns": [{"field": "special", "dataMapping": "price"}]
            }
        ]
    }"#;
    let builder = memory_builder("STANDARD", config);
    let lists = vec![price_list(
        "pl-1",
        "STANDARD",
        vec![
            sub_group("sg-1", vec![key(CATEGORY, "coil"), key(THICKNESS, "1")], 7.0),
            sub_group("sg-2", vec![key(CATEGORY, "Bar"), key(THICKNESS, "1")], 8.0),
        ],
    )];

    let response = builder.build("STANDARD", &lists).unwrap();
    assert_eq!(leaf_fields(tab(&response.tabs, "coil")), vec!["special"]);
    assert_eq!(row(tab(&response.tabs, "coil"), "1")["special"], json!(7.0));
    assert_eq!(leaf_fields(tab(&response.tabs, "Bar")), vec!["price"]);
}

// ============================================================================
// Multi-level columns and row-group merging
// ============================================================================

fn sheet(id: &str, finish: &str, price: f64, weight: f64) -> SubGroup {
    let mut record = sub_group(
        id,
        vec![
            key(CATEGORY, "Stainless"),
            key("PRODUCT_GROUP2", "304"),
            key("PRODUCT_GROUP3", finish),
            key(THICKNESS, "1.0"),
            key(WIDTH, "1219"),
            key("PRODUCT_GROUP7", "2438"),
        ],
        price,
    );
    record.weight = Some(weight);
    record
}

#[test]
fn test_sheet_bundle_nests_column_levels() {
    let builder = PriceTableBuilder::new(EmbeddedStore);
    let lists = vec![price_list(
        "pl-s",
        "SHEET",
        vec![sheet("s-1", "2B", 30.0, 25.0), sheet("s-2", "BA", 34.0, 24.0)],
    )];

    let response = builder.build("SHEET", &lists).unwrap();
    let stainless = tab(&response.tabs, "Stainless");

    let columns = serde_json::to_value(&stainless.table_config.columns).unwrap();
    assert_eq!(columns[0]["field"], json!("item_label"));
    assert_eq!(columns[1]["groupId"], json!("weight"));
    assert_eq!(columns[2]["headerName"], json!("Grade: 304"));
    assert_eq!(columns[2]["groupId"], json!("304"));
    assert_eq!(columns[2]["children"][0]["headerName"], json!("2B"));
    assert_eq!(columns[2]["children"][1]["groupId"], json!("304_ba"));

    assert_eq!(stainless.table_data.len(), 1, "sheet handler merges per row group");
    let merged = row(stainless, "1.0|1219|2438");
    assert_eq!(merged["304_2b_price"], json!(30.0));
    assert_eq!(merged["304_ba_price"], json!(34.0));
    assert_eq!(merged["item_label"], json!("1.0 x 1219 x 2438"));

    let summary = stainless.summary_rows.as_ref().unwrap();
    assert_eq!(summary[0].values["unit_weight"], 49.0);
}

// ============================================================================
// Direct rows and tab splitting
// ============================================================================

#[test]
fn test_pipe_bundle_emits_one_row_per_record() {
    let builder = PriceTableBuilder::new(EmbeddedStore);
    let mut first = sub_group(
        "p-1",
        vec![key(CATEGORY, "Pipe"), key(THICKNESS, "100"), key("PRODUCT_GROUP5", "4")],
        50.0,
    );
    first.cost = Some(42.5);
    first.inventory = vec![
        InventoryWeight { weight: 30.0, quantity: 2.0 },
        InventoryWeight { weight: 10.0, quantity: 2.0 },
    ];
    let second = sub_group(
        "p-2",
        vec![key(CATEGORY, "Pipe"), key(THICKNESS, "100"), key("PRODUCT_GROUP5", "4")],
        55.0,
    );
    let lists = vec![price_list("pl-p", "PIPE", vec![first, second])];

    let response = builder.build("PIPE", &lists).unwrap();
    let pipe = tab(&response.tabs, "Pipe");
    assert_eq!(pipe.table_data.len(), 2);
    assert_eq!(pipe.table_data[0]["id"], json!("p-1"));
    assert_eq!(pipe.table_data[0]["size"], json!("100 x 4"));
    assert_eq!(pipe.table_data[0]["margin"], json!(7.5));
    assert_eq!(pipe.table_data[0]["avg_weight"], json!(10.0));
    assert_eq!(pipe.table_data[1]["id"], json!("p-2"));
    assert_eq!(pipe.table_data[1]["cost"], json!(""));
}

#[test]
fn test_udf_keys_cannot_replace_row_identity() {
    let config = r#"{
        "defaultPattern": "direct",
        "patterns": [
            {
                "id": "direct",
                "grouping": {"rows": "PRODUCT_GROUP4"},
                "columns": [{"field": "price"}]
            }
        ]
    }"#;
    let builder = memory_builder("PIPE", config);
    let mut record = sub_group("sg-1", vec![key(THICKNESS, "10"), key("id", "attr")], 5.0);
    record.udf = Some(json!({"id": "evil", "row_group_value": "zz", "note": "kept"}));
    let lists = vec![price_list("pl-1", "PIPE", vec![record])];

    let response = builder.build("PIPE", &lists).unwrap();
    let data = &response.tabs[0].table_data;
    assert_eq!(data.len(), 1);
    assert_eq!(data[0]["id"], json!("sg-1"));
    assert_eq!(data[0]["row_group_value"], json!("10"));
    assert_eq!(data[0]["note"], json!("kept"));
    assert_eq!(data[0]["price"], json!(5.0));
}

#[test]
fn test_per_column_group_handler_splits_tabs() {
    let config = r#"{
        "defaultPattern": "grid",
        "patterns": [
            {
                "id": "grid",
                "grouping": {
                    "tabs": "PRODUCT_GROUP1",
                    "rows": "PRODUCT_GROUP4",
                    "columnGroups": "PRODUCT_GROUP2"
                },
                "columns": [{"field": "price"}]
            }
        ]
    }"#;
    let builder = memory_builder("BAR", config);
    let lists = vec![price_list(
        "pl-1",
        "BAR",
        vec![
            sub_group(
                "b-1",
                vec![key(CATEGORY, "Round"), key(THICKNESS, "10"), key(COATING, "A")],
                1.0,
            ),
            sub_group(
                "b-2",
                vec![key(CATEGORY, "Round"), key(THICKNESS, "10"), key(COATING, "B")],
                2.0,
            ),
        ],
    )];

    let response = builder.build("BAR", &lists).unwrap();
    assert_eq!(tab_labels(&response.tabs), vec!["Round - A", "Round - B"]);

    let a = tab(&response.tabs, "Round - A");
    assert_eq!(leaf_fields(a), vec!["a_price"]);
    assert_eq!(a.table_data.len(), 1);
    assert!(a.table_data[0].get("b_price").is_none());
    assert_eq!(a.id, "round_a");
}

#[test]
fn test_single_tab_handler_ignores_tab_grouping() {
    let config = r#"{
        "name": "Roofing Sheets",
        "defaultPattern": "grid",
        "patterns": [
            {
                "id": "grid",
                "grouping": {
                    "tabs": "PRODUCT_GROUP1",
                    "rows": "PRODUCT_GROUP4",
                    "columnGroups": "PRODUCT_GROUP2"
                },
                "columns": [{"field": "price"}]
            }
        ]
    }"#;
    let builder = memory_builder("ROOFING", config);
    let lists = vec![price_list(
        "pl-1",
        "ROOFING",
        vec![
            sub_group(
                "r-1",
                vec![key(CATEGORY, "Trapezoid"), key(THICKNESS, "0.4"), key(COATING, "A")],
                1.0,
            ),
            sub_group(
                "r-2",
                vec![key(CATEGORY, "Corrugated"), key(THICKNESS, "0.4"), key(COATING, "A")],
                2.0,
            ),
        ],
    )];

    let response = builder.build("ROOFING", &lists).unwrap();
    assert_eq!(tab_labels(&response.tabs), vec!["Roofing Sheets"]);
    assert_eq!(response.tabs[0].id, "roofing_sheets");
}

#[test]
fn test_configured_handler_wins_over_static_table() {
    let config = r#"{
        "defaultPattern": "grid",
        "valueMappings": {"handlerMappings": {"PLATE": "pipe"}},
        "patterns": [
            {
                "id": "grid",
                "grouping": {"rows": "PRODUCT_GROUP4"},
                "columns": [{"field": "price"}]
            }
        ]
    }"#;
    let builder = memory_builder("PLATE", config);
    let (_, handler) = builder.prepare("PLATE").unwrap();
    assert_eq!(handler.id, "pipe");

    let lists = vec![price_list(
        "pl-1",
        "PLATE",
        vec![
            sub_group("x-1", vec![key(THICKNESS, "5")], 1.0),
            sub_group("x-2", vec![key(THICKNESS, "5")], 2.0),
        ],
    )];
    let response = builder.build("PLATE", &lists).unwrap();
    assert_eq!(response.tabs[0].table_data.len(), 2, "direct rows are never merged");
}

// ============================================================================
// Value mapping precedence
// ============================================================================

#[test]
fn test_pattern_mappings_override_root_mappings() {
    let config = r#"{
        "defaultPattern": "grid",
        "valueMappings": {"groupCodeMappings": {"size": "PRODUCT_GROUP4"}},
        "patterns": [
            {
                "id": "grid",
                "valueMappings": {"groupCodeMappings": {"size": "PRODUCT_GROUP6"}},
                "grouping": {"rows": "size"},
                "columns": [{"field": "price"}]
            }
        ]
    }"#;
    let builder = memory_builder("STANDARD", config);
    let lists = vec![price_list(
        "pl-1",
        "STANDARD",
        vec![sub_group("sg-1", vec![key(THICKNESS, "0.5"), key(WIDTH, "1250")], 1.0)],
    )];

    let response = builder.build("STANDARD", &lists).unwrap();
    assert_eq!(response.tabs[0].table_data[0]["row_group_value"], json!("1250"));
}

#[test]
fn test_unrecognized_item_format_part_falls_back_to_next_format() {
    let config = r#"{
        "defaultPattern": "coil",
        "patterns": [
            {
                "id": "coil",
                "grouping": {"rows": "PRODUCT_GROUP4 | PRODUCT_GROUP6"},
                "itemFormat": [
                    {"type": "attribute", "value": "PRODUCT_GROUP4"},
                    {"type": "separator", "value": " x "}
                ],
                "columns": [{"field": "price"}]
            }
        ]
    }"#;
    let builder = memory_builder("COIL", config);
    let lists = vec![price_list(
        "pl-1",
        "COIL",
        vec![sub_group("sg-1", vec![key(THICKNESS, "0.50"), key(WIDTH, "914")], 1.0)],
    )];

    let response = builder.build("COIL", &lists).unwrap();
    let data = &response.tabs[0].table_data[0];
    assert_eq!(data["item_label"], json!("0.50 x 914"), "legacy format applies");
    assert_eq!(data["price"], json!(1.0));
}

#[test]
fn test_unmapped_alias_is_used_as_attribute_code() {
    let builder = memory_builder("STANDARD", GRID_PATTERN);
    let lists = vec![price_list(
        "pl-1",
        "STANDARD",
        vec![sub_group(
            "sg-1",
            vec![SubGroupKey::new(THICKNESS, "T05", "0.5"), key(COATING, "A")],
            1.0,
        )],
    )];

    let response = builder.build("STANDARD", &lists).unwrap();
    let data = &response.tabs[0].table_data[0];
    assert_eq!(data["row_group_value"], json!("0.5"));
    assert_eq!(data[THICKNESS], json!("0.5"));
}

// ============================================================================
// Errors and empty input
// ============================================================================

#[test]
fn test_empty_input_yields_empty_tabs() {
    let builder = PriceTableBuilder::new(EmbeddedStore);
    let response = builder.build("COIL", &[]).unwrap();
    assert!(response.tabs.is_empty());

    let empty_list = vec![price_list("pl-1", "COIL", Vec::new())];
    assert!(builder.build("COIL", &empty_list).unwrap().tabs.is_empty());
}

#[test]
fn test_unknown_group_code_is_config_not_found() {
    let builder = PriceTableBuilder::new(MemoryStore::new());
    let err = builder.build("NOPE", &coil_price_lists()).unwrap_err();
    assert!(matches!(
        err,
        PriceTableError::ConfigNotFound { ref group_code, .. } if group_code == "NOPE"
    ));
}

#[test]
fn test_path_like_group_code_is_rejected() {
    let builder = PriceTableBuilder::new(EmbeddedStore);
    let err = builder.build("../COIL", &coil_price_lists()).unwrap_err();
    assert!(matches!(err, PriceTableError::InvalidGroupCode(_)));
}

#[test]
fn test_malformed_configuration_is_parse_error() {
    let builder = memory_builder("BROKEN", "{ not json");
    let err = builder.build("BROKEN", &coil_price_lists()).unwrap_err();
    assert!(matches!(err, PriceTableError::ConfigParse { .. }));
}

#[test]
fn test_disabled_default_pattern_is_no_enabled_pattern() {
    let config = r#"{
        "defaultPattern": "off",
        "patterns": [
            {"id": "off", "enabled": false, "grouping": {"rows": "PRODUCT_GROUP4"}}
        ]
    }"#;
    let builder = memory_builder("STANDARD", config);

    let err = builder.build("STANDARD", &coil_price_lists()).unwrap_err();
    assert!(matches!(
        err,
        PriceTableError::NoEnabledPattern { ref default_pattern, .. } if default_pattern == "off"
    ));

    // no records: not an error
    assert!(builder.build("STANDARD", &[]).unwrap().tabs.is_empty());
}

#[test]
fn test_layered_store_prefers_first_layer() {
    let override_store = MemoryStore::new().with_pattern("COIL", GRID_PATTERN);
    let store = LayeredStore::new().with_layer(override_store).with_layer(EmbeddedStore);
    let builder = PriceTableBuilder::new(store);

    let response = builder.build("COIL", &coil_price_lists()).unwrap();
    assert_eq!(response.name, "COIL", "override file has no name");
    assert_eq!(response.tabs.len(), 1);
}

#[test]
fn test_response_serializes_to_grid_contract() {
    let builder = PriceTableBuilder::new(EmbeddedStore);
    let response = builder.build("COIL", &coil_price_lists()).unwrap();
    let value: Value = serde_json::to_value(&response).unwrap();

    assert_eq!(value["id"], json!("COIL"));
    let first_tab = &value["tabs"][0];
    assert!(first_tab["tableConfig"]["columns"].is_array());
    assert!(first_tab["tableData"].is_array());
    assert!(first_tab["summaryRows"].is_array());
    assert_eq!(first_tab["editableSuffixes"], json!(["price"]));
}
