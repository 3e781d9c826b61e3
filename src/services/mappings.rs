//! Value-mapping resolution.
//!
//! Every lookup here is total: a miss falls back to the caller-supplied value
//! (or a hardcoded legacy default) and is logged, never returned as an error.
//! Pattern-level mappings take precedence over root-level ones.

use std::collections::BTreeMap;
use tracing::{debug, warn};

use crate::models::mappings::{FormatPart, ItemFormat, ValueMappingsConfig};
use crate::models::pattern::{split_attributes, PatternConfig, PriceTableConfiguration};
use crate::services::registry::{HandlerRegistry, PatternHandler};

/// Special mapping naming the row field that receives the item label.
pub const ITEM_LABEL_FIELD_KEY: &str = "itemLabelField";
/// Row field used for the item label when no special mapping overrides it.
pub const DEFAULT_ITEM_LABEL_FIELD: &str = "item_label";
/// Special mapping naming the tab that collects records without a tab value.
pub const FALLBACK_TAB_LABEL_KEY: &str = "fallbackTabLabel";
/// Label of the catch-all tab when no special mapping overrides it.
pub const DEFAULT_FALLBACK_TAB_LABEL: &str = "N/A";

fn lookup<'m>(dictionary: Option<&'m BTreeMap<String, String>>, key: &str) -> Option<&'m str> {
    dictionary?
        .get(key)
        .map(|value| value.trim())
        .filter(|value| !value.is_empty())
}

fn has_dictionary(
    mappings: Option<&ValueMappingsConfig>,
    dictionary: impl Fn(&ValueMappingsConfig) -> Option<&BTreeMap<String, String>>,
) -> bool {
    mappings.and_then(dictionary).is_some()
}

/// True for names spelled like attribute codes: uppercase ASCII, digits and `_`.
fn is_attribute_code(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_')
}

/// Resolves a semantic alias (e.g. `productGroup2`) to an attribute code.
///
/// # Arguments
///
/// * `mappings` - Mapping block to consult, if any
/// * `alias` - Alias to resolve
/// * `fallback` - Value returned on a miss
///
/// # Returns
///
/// The mapped attribute code, or `fallback`. A warning is logged only when a
/// `groupCodeMappings` dictionary exists but lacks the alias.
#[must_use]
pub fn resolve_group_code(
    mappings: Option<&ValueMappingsConfig>,
    alias: &str,
    fallback: &str,
) -> String {
    let dictionary = mappings.and_then(|m| m.group_code_mappings.as_ref());
    if let Some(code) = lookup(dictionary, alias) {
        return code.to_string();
    }
    if dictionary.is_some() {
        warn!(alias, fallback, "groupCodeMappings has no entry for alias, using fallback");
    }
    fallback.to_string()
}

/// Resolves a key of the free-form `specialMappings` bag.
///
/// Same contract as [`resolve_group_code`].
#[must_use]
pub fn resolve_special_mapping(
    mappings: Option<&ValueMappingsConfig>,
    key: &str,
    fallback: &str,
) -> String {
    let dictionary = mappings.and_then(|m| m.special_mappings.as_ref());
    if let Some(value) = lookup(dictionary, key) {
        return value.to_string();
    }
    if dictionary.is_some() {
        warn!(key, fallback, "specialMappings has no entry for key, using fallback");
    }
    fallback.to_string()
}

/// Resolves the item label format for a pattern.
///
/// Precedence: the pattern's own `itemFormat`, then `defaultItemFormat` from
/// the pattern mappings, then from the root mappings, then the legacy
/// `PRODUCT_GROUP4 x PRODUCT_GROUP6 x PRODUCT_GROUP7` format. A malformed
/// format is skipped in favour of the next one.
#[must_use]
pub fn resolve_item_format(
    root: Option<&ValueMappingsConfig>,
    pattern: &PatternConfig,
) -> Vec<FormatPart> {
    let candidates = [
        pattern.item_format.as_ref(),
        pattern
            .value_mappings
            .as_ref()
            .and_then(|m| m.default_item_format.as_ref()),
        root.and_then(|m| m.default_item_format.as_ref()),
    ];

    candidates
        .into_iter()
        .flatten()
        .find_map(ItemFormat::usable_parts)
        .unwrap_or_else(ItemFormat::legacy)
}

/// Finds the handler configured for a group code.
///
/// Root `handlerMappings` are consulted first, then each pattern's in
/// declaration order. The first non-empty id that names a registered handler
/// wins. Unregistered ids are logged and skipped.
#[must_use]
pub fn resolve_handler<'r>(
    config: &PriceTableConfiguration,
    group_code: &str,
    registry: &'r HandlerRegistry,
) -> Option<&'r PatternHandler> {
    let sources = std::iter::once(config.value_mappings.as_ref())
        .chain(config.patterns.iter().map(|p| p.value_mappings.as_ref()))
        .flatten();

    for mappings in sources {
        let Some(handler_id) = lookup(mappings.handler_mappings.as_ref(), group_code) else {
            continue;
        };
        match registry.get(handler_id) {
            Some(handler) => return Some(handler),
            None => warn!(group_code, handler_id, "handlerMappings names an unregistered handler"),
        }
    }
    None
}

/// Mapping blocks in effect for one pattern: pattern first, then root.
#[derive(Debug, Clone, Copy, Default)]
pub struct EffectiveMappings<'a> {
    /// Pattern-level mappings
    pub pattern: Option<&'a ValueMappingsConfig>,
    /// Root-level mappings
    pub root: Option<&'a ValueMappingsConfig>,
}

impl<'a> EffectiveMappings<'a> {
    /// Mappings in effect for `pattern` inside `config`.
    #[must_use]
    pub fn new(config: &'a PriceTableConfiguration, pattern: &'a PatternConfig) -> Self {
        Self {
            pattern: pattern.value_mappings.as_ref(),
            root: config.value_mappings.as_ref(),
        }
    }

    fn layers(&self) -> impl Iterator<Item = &'a ValueMappingsConfig> {
        [self.pattern, self.root].into_iter().flatten()
    }

    /// Resolves an alias with pattern → root → `fallback` precedence.
    ///
    /// A miss is logged as a warning when any layer declares
    /// `groupCodeMappings`.
    #[must_use]
    pub fn group_code(&self, alias: &str, fallback: &str) -> String {
        let from_pattern = self
            .pattern
            .and_then(|m| lookup(m.group_code_mappings.as_ref(), alias));
        match from_pattern {
            Some(code) => code.to_string(),
            None if has_dictionary(self.root, |m| m.group_code_mappings.as_ref()) => {
                resolve_group_code(self.root, alias, fallback)
            }
            None => resolve_group_code(self.pattern, alias, fallback),
        }
    }

    /// Resolves a `grouping` or `columnLevels` entry.
    ///
    /// Entries spelled like attribute codes (`PRODUCT_GROUP4`) are used
    /// verbatim when no mapping renames them. Anything else is an alias and
    /// goes through [`EffectiveMappings::group_code`], so a missing mapping
    /// is warned about.
    #[must_use]
    pub fn grouping_code(&self, name: &str) -> String {
        if is_attribute_code(name) {
            self.attribute_code(name)
        } else {
            self.group_code(name, name)
        }
    }

    /// Looks a name up in `groupCodeMappings`, returning it verbatim on a miss.
    ///
    /// Column `dataMapping` probing calls this for every column, and most
    /// of those names are computed fields rather than aliases, so a miss is
    /// logged at debug level only.
    #[must_use]
    pub fn attribute_code(&self, name: &str) -> String {
        match self
            .layers()
            .find_map(|m| lookup(m.group_code_mappings.as_ref(), name))
        {
            Some(code) => code.to_string(),
            None => {
                debug!(name, "no groupCodeMappings entry, using name as attribute code");
                name.to_string()
            }
        }
    }

    /// Splits a pipe-delimited attribute list and resolves each entry.
    #[must_use]
    pub fn attributes(&self, list: &str) -> Vec<String> {
        split_attributes(list)
            .iter()
            .map(|name| self.grouping_code(name))
            .collect()
    }

    /// Resolves a special mapping with pattern → root → `fallback` precedence.
    #[must_use]
    pub fn special(&self, key: &str, fallback: &str) -> String {
        let from_pattern = self
            .pattern
            .and_then(|m| lookup(m.special_mappings.as_ref(), key));
        match from_pattern {
            Some(value) => value.to_string(),
            None if has_dictionary(self.root, |m| m.special_mappings.as_ref()) => {
                resolve_special_mapping(self.root, key, fallback)
            }
            None => resolve_special_mapping(self.pattern, key, fallback),
        }
    }

    /// Row field receiving the item label.
    #[must_use]
    pub fn item_label_field(&self) -> String {
        self.special(ITEM_LABEL_FIELD_KEY, DEFAULT_ITEM_LABEL_FIELD)
    }

    /// Label of the tab collecting records without a tab value.
    #[must_use]
    pub fn fallback_tab_label(&self) -> String {
        self.special(FALLBACK_TAB_LABEL_KEY, DEFAULT_FALLBACK_TAB_LABEL)
    }
}
