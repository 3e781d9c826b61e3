//! PriceGrid Library
//!
//! This library turns price list data into pivot-style grid tables. Each
//! product group code has a JSON pattern file describing how subgroup
//! attributes become tabs, rows, nested column groups, and summaries.
//!
//! ```no_run
//! use pricegrid::{EmbeddedStore, PriceTableBuilder};
//!
//! let builder = PriceTableBuilder::new(EmbeddedStore);
//! let response = builder.build("COIL", &[]).unwrap();
//! assert!(response.tabs.is_empty());
//! ```

// Module declarations
pub mod cli;
pub mod config;
pub mod constants;
pub mod error;
pub mod models;
pub mod parser;
pub mod services;

pub use error::{PriceTableError, Result};
pub use models::{ApiResponse, PriceList, SubGroup, SubGroupKey, Tab};
pub use parser::{DirectoryStore, EmbeddedStore, LayeredStore, MemoryStore, PatternStore};
pub use services::{HandlerRegistry, PriceTableBuilder};
