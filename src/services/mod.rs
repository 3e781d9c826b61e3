//! Service layer for price table construction.
//!
//! Each module covers one stage of the pipeline: mapping resolution,
//! composite keys, columns, rows, merging, summaries, tab assembly, and the
//! handler registry that ties them together.

pub mod columns;
pub mod keys;
pub mod mappings;
pub mod merge;
pub mod registry;
pub mod rows;
pub mod summary;
pub mod tabs;

// Re-export commonly used types and functions
pub use mappings::EffectiveMappings;
pub use registry::{
    BuildPlan, HandlerRegistry, MergeStrategy, PatternHandler, PriceTableBuilder, RowStrategy,
    TabSplit,
};
