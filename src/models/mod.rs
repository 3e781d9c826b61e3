//! Data models for pattern files, source records, and grid output.
//!
//! Models are plain data: loading lives in `parser`, transformation logic in
//! `services`.

pub mod grid;
pub mod mappings;
pub mod pattern;
pub mod source;
pub mod udf;

// Re-export all model types
pub use grid::{ApiResponse, ColumnDef, GridRow, RowData, SummaryRow, Tab, TableConfig};
pub use mappings::{FormatPart, FormatPartKind, ItemFormat, ValueMappingsConfig};
pub use pattern::{
    ColumnConfig, ColumnLevel, GroupingConfig, PatternConfig, PriceTableConfiguration,
    StaticColumnGroup, SummaryColumn, SummaryConfig, TableChrome,
};
pub use source::{InventoryWeight, PriceList, SourceRecord, SubGroup, SubGroupKey};
pub use udf::UdfFields;
