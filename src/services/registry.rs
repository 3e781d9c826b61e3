//! Handler dispatch.
//!
//! A handler is a named build plan: how rows are built, how they are merged,
//! and how the result is split into tabs. The registry is an ordinary value
//! constructed by the caller, so tests can use their own.

use std::collections::BTreeMap;
use std::fmt;
use tracing::{debug, info};

use crate::error::{PriceTableError, Result};
use crate::models::grid::{ApiResponse, GridRow};
use crate::models::pattern::PriceTableConfiguration;
use crate::models::source::{PriceList, SourceRecord};
use crate::parser::pattern_file::{load_configuration, validate_group_code};
use crate::parser::store::PatternStore;
use crate::services::mappings::resolve_handler;
use crate::services::merge::{merge_by_row_group, no_merge, zip_merge};
use crate::services::tabs::{build_tabs, display_name};

/// Handler used when neither configuration nor the static table names one.
pub const FALLBACK_HANDLER: &str = "standard";

/// How source records become rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowStrategy {
    /// One row per (column group, row group, record)
    Dynamic,
    /// One row per record, no grouping
    Direct,
}

/// How raw rows are reduced into display rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeStrategy {
    /// Positional merge across column groups
    Zip,
    /// One row per row group, last write wins
    RowGroup,
    /// Pass-through
    None,
}

impl MergeStrategy {
    /// Applies the strategy.
    #[must_use]
    pub fn apply(self, rows: Vec<GridRow>) -> Vec<GridRow> {
        match self {
            Self::Zip => zip_merge(rows),
            Self::RowGroup => merge_by_row_group(rows),
            Self::None => no_merge(rows),
        }
    }
}

/// How the response is split into tabs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TabSplit {
    /// One tab per tab-attribute value
    PerTab,
    /// One tab per tab-attribute value and dynamic column group
    PerColumnGroup,
    /// Everything in one tab
    Single,
}

impl fmt::Display for RowStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Dynamic => "dynamic",
            Self::Direct => "direct",
        })
    }
}

impl fmt::Display for MergeStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Zip => "zip",
            Self::RowGroup => "row-group",
            Self::None => "none",
        })
    }
}

impl fmt::Display for TabSplit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::PerTab => "per-tab",
            Self::PerColumnGroup => "per-column-group",
            Self::Single => "single",
        })
    }
}

/// The strategies a handler combines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildPlan {
    /// Row building
    pub rows: RowStrategy,
    /// Row merging
    pub merge: MergeStrategy,
    /// Tab splitting
    pub tab_split: TabSplit,
    /// Whether rows carry the rendered item label
    pub item_label: bool,
}

impl BuildPlan {
    /// Creates a plan.
    #[must_use]
    pub const fn new(
        rows: RowStrategy,
        merge: MergeStrategy,
        tab_split: TabSplit,
        item_label: bool,
    ) -> Self {
        Self {
            rows,
            merge,
            tab_split,
            item_label,
        }
    }
}

/// A registered price table builder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternHandler {
    /// Handler id referenced by `handlerMappings`
    pub id: &'static str,
    /// Short human description
    pub description: &'static str,
    /// Strategies used
    pub plan: BuildPlan,
}

impl PatternHandler {
    const fn new(id: &'static str, description: &'static str, plan: BuildPlan) -> Self {
        Self { id, description, plan }
    }

    /// Builds the response for a group code.
    ///
    /// # Errors
    ///
    /// Returns `NoEnabledPattern` when there are records but the
    /// configuration's default pattern is missing or disabled. An empty
    /// record set yields an empty tab list.
    pub fn build(
        &self,
        config: &PriceTableConfiguration,
        price_lists: &[PriceList],
        group_code: &str,
    ) -> Result<ApiResponse> {
        let records = SourceRecord::collect(price_lists);
        let name = display_name(config, group_code);

        if records.is_empty() {
            debug!(group_code, handler = self.id, "No source records, returning empty tabs");
            return Ok(ApiResponse {
                id: group_code.to_string(),
                name,
                tabs: Vec::new(),
            });
        }

        let default_pattern = config
            .default_pattern()
            .ok_or_else(|| PriceTableError::NoEnabledPattern {
                group_code: group_code.to_string(),
                default_pattern: config.default_pattern.clone(),
            })?;

        let tabs = build_tabs(config, default_pattern, &self.plan, &records, group_code);
        debug!(
            group_code,
            handler = self.id,
            records = records.len(),
            tabs = tabs.len(),
            "Built price table"
        );

        Ok(ApiResponse {
            id: group_code.to_string(),
            name,
            tabs,
        })
    }
}

const BUILTIN_HANDLERS: [PatternHandler; 13] = [
    PatternHandler::new(
        "standard",
        "Dynamic rows zip-merged across column groups",
        BuildPlan::new(RowStrategy::Dynamic, MergeStrategy::Zip, TabSplit::PerTab, false),
    ),
    PatternHandler::new(
        "coil",
        "Coil widths by coating, with item labels",
        BuildPlan::new(RowStrategy::Dynamic, MergeStrategy::Zip, TabSplit::PerTab, true),
    ),
    PatternHandler::new(
        "sheet",
        "Sheets merged per size, with item labels",
        BuildPlan::new(RowStrategy::Dynamic, MergeStrategy::RowGroup, TabSplit::PerTab, true),
    ),
    PatternHandler::new(
        "plate",
        "Plates merged per size",
        BuildPlan::new(RowStrategy::Dynamic, MergeStrategy::RowGroup, TabSplit::PerTab, false),
    ),
    PatternHandler::new(
        "pipe",
        "One row per pipe record",
        BuildPlan::new(RowStrategy::Direct, MergeStrategy::None, TabSplit::PerTab, false),
    ),
    PatternHandler::new(
        "tube",
        "One row per tube record, with item labels",
        BuildPlan::new(RowStrategy::Direct, MergeStrategy::None, TabSplit::PerTab, true),
    ),
    PatternHandler::new(
        "bar",
        "One tab per column group",
        BuildPlan::new(RowStrategy::Dynamic, MergeStrategy::Zip, TabSplit::PerColumnGroup, false),
    ),
    PatternHandler::new(
        "mesh",
        "One tab per column group, with item labels",
        BuildPlan::new(RowStrategy::Dynamic, MergeStrategy::Zip, TabSplit::PerColumnGroup, true),
    ),
    PatternHandler::new(
        "wire",
        "One tab per column group, merged per size",
        BuildPlan::new(
            RowStrategy::Dynamic,
            MergeStrategy::RowGroup,
            TabSplit::PerColumnGroup,
            false,
        ),
    ),
    PatternHandler::new(
        "profile",
        "One row per record, one tab per column group",
        BuildPlan::new(RowStrategy::Direct, MergeStrategy::None, TabSplit::PerColumnGroup, false),
    ),
    PatternHandler::new(
        "roofing",
        "Single tab, zip-merged, with item labels",
        BuildPlan::new(RowStrategy::Dynamic, MergeStrategy::Zip, TabSplit::Single, true),
    ),
    PatternHandler::new(
        "fastener",
        "Single tab merged per size",
        BuildPlan::new(RowStrategy::Dynamic, MergeStrategy::RowGroup, TabSplit::Single, false),
    ),
    PatternHandler::new(
        "accessory",
        "Single tab, one row per record",
        BuildPlan::new(RowStrategy::Direct, MergeStrategy::None, TabSplit::Single, false),
    ),
];

const BUILTIN_GROUP_CODES: [(&str, &str); 16] = [
    ("STANDARD", "standard"),
    ("COIL", "coil"),
    ("SLIT_COIL", "coil"),
    ("SHEET", "sheet"),
    ("PLATE", "plate"),
    ("PIPE", "pipe"),
    ("TUBE", "tube"),
    ("BAR", "bar"),
    ("MESH", "mesh"),
    ("WIRE", "wire"),
    ("PROFILE", "profile"),
    ("CHANNEL", "profile"),
    ("ROOFING", "roofing"),
    ("FASTENER", "fastener"),
    ("BOLT", "fastener"),
    ("ACCESSORY", "accessory"),
];

/// Handler lookup: id → handler, plus a static group code → handler id table.
#[derive(Debug, Clone, Default)]
pub struct HandlerRegistry {
    handlers: BTreeMap<String, PatternHandler>,
    group_codes: BTreeMap<String, String>,
}

impl HandlerRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry with the 13 built-in handlers and group code table.
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        for handler in BUILTIN_HANDLERS {
            registry.register(handler);
        }
        for (group_code, handler_id) in BUILTIN_GROUP_CODES {
            registry.map_group_code(group_code, handler_id);
        }
        registry
    }

    /// Registers (or replaces) a handler.
    pub fn register(&mut self, handler: PatternHandler) {
        self.handlers.insert(handler.id.to_string(), handler);
    }

    /// Adds a static group code → handler id entry. Codes match case-insensitively.
    pub fn map_group_code(&mut self, group_code: &str, handler_id: &str) {
        self.group_codes
            .insert(group_code.trim().to_uppercase(), handler_id.to_string());
    }

    /// Looks up a handler by id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&PatternHandler> {
        self.handlers.get(id.trim())
    }

    /// Registered handlers in id order.
    pub fn handlers(&self) -> impl Iterator<Item = &PatternHandler> {
        self.handlers.values()
    }

    /// Static group code table in code order.
    pub fn group_codes(&self) -> impl Iterator<Item = (&str, &str)> {
        self.group_codes
            .iter()
            .map(|(code, id)| (code.as_str(), id.as_str()))
    }

    /// Handler named by the static table for a group code.
    #[must_use]
    pub fn static_handler(&self, group_code: &str) -> Option<&PatternHandler> {
        self.group_codes
            .get(&group_code.trim().to_uppercase())
            .and_then(|id| self.get(id))
    }

    /// Chooses the handler for a group code.
    ///
    /// Configuration `handlerMappings` first, then the static table, then
    /// the `standard` handler.
    #[must_use]
    pub fn resolve(
        &self,
        config: &PriceTableConfiguration,
        group_code: &str,
    ) -> Option<&PatternHandler> {
        if let Some(handler) = resolve_handler(config, group_code, self) {
            debug!(group_code, handler = handler.id, "Handler chosen by configuration");
            return Some(handler);
        }
        if let Some(handler) = self.static_handler(group_code) {
            debug!(group_code, handler = handler.id, "Handler chosen by static table");
            return Some(handler);
        }
        debug!(group_code, "Falling back to the standard handler");
        self.get(FALLBACK_HANDLER)
    }
}

/// Entry point: loads the configuration for a group code and dispatches to
/// its handler.
pub struct PriceTableBuilder {
    store: Box<dyn PatternStore>,
    registry: HandlerRegistry,
}

impl PriceTableBuilder {
    /// Creates a builder with the built-in handlers.
    pub fn new(store: impl PatternStore + 'static) -> Self {
        Self::with_registry(store, HandlerRegistry::with_defaults())
    }

    /// Creates a builder with a custom registry.
    pub fn with_registry(store: impl PatternStore + 'static, registry: HandlerRegistry) -> Self {
        Self {
            store: Box::new(store),
            registry,
        }
    }

    /// Store configurations are read from.
    #[must_use]
    pub fn store(&self) -> &dyn PatternStore {
        self.store.as_ref()
    }

    /// Handler registry.
    #[must_use]
    pub fn registry(&self) -> &HandlerRegistry {
        &self.registry
    }

    /// Loads the configuration and picks the handler for a group code.
    ///
    /// # Errors
    ///
    /// Any configuration loading error, or `HandlerNotFound` when the
    /// registry cannot serve the group code.
    pub fn prepare(&self, group_code: &str) -> Result<(PriceTableConfiguration, &PatternHandler)> {
        let group_code = validate_group_code(group_code)?;
        let config = load_configuration(self.store.as_ref(), group_code)?;
        let handler = self
            .registry
            .resolve(&config, group_code)
            .ok_or_else(|| PriceTableError::HandlerNotFound(group_code.to_string()))?;
        Ok((config, handler))
    }

    /// Builds the price table for a group code.
    ///
    /// The configuration is loaded fresh on every call.
    ///
    /// # Errors
    ///
    /// - `InvalidGroupCode`, `ConfigNotFound`, `ConfigParse` or `Store` from loading
    /// - `HandlerNotFound` when the registry cannot serve the group code
    /// - `NoEnabledPattern` when records exist but the default pattern is unusable
    pub fn build(&self, group_code: &str, price_lists: &[PriceList]) -> Result<ApiResponse> {
        let (config, handler) = self.prepare(group_code)?;
        let group_code = group_code.trim();
        info!(group_code, handler = handler.id, "Building price table");
        handler.build(&config, price_lists, group_code)
    }
}
