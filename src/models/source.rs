//! Source records handed over by the data-access layer.
//!
//! These types mirror what the ORM produces for a price list: an aggregate
//! owning subgroups, each described by an ordered list of attribute keys.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// A price list aggregate with its subgroups.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct PriceList {
    /// Price list identifier
    pub id: String,
    /// Display name of the price list
    #[serde(default)]
    pub name: String,
    /// Group code used to locate the pattern file (e.g. "COIL")
    #[serde(default)]
    pub group_key: String,
    /// Subgroups in data-layer order
    #[serde(default)]
    pub sub_groups: Vec<SubGroup>,
}

/// One attribute value attached to a subgroup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct SubGroupKey {
    /// Attribute code (e.g. "PRODUCT_GROUP4")
    pub attribute_code: String,
    /// Machine value code (e.g. "T050")
    #[serde(default)]
    pub value_code: String,
    /// Human-readable value label (e.g. "0.50")
    #[serde(default)]
    pub value_label: String,
}

impl SubGroupKey {
    /// Creates a key from its three parts.
    pub fn new(
        attribute_code: impl Into<String>,
        value_code: impl Into<String>,
        value_label: impl Into<String>,
    ) -> Self {
        Self {
            attribute_code: attribute_code.into(),
            value_code: value_code.into(),
            value_label: value_label.into(),
        }
    }
}

/// Inventory weight record used for stock-derived averages.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct InventoryWeight {
    /// Total weight on hand for this lot
    #[serde(default)]
    pub weight: f64,
    /// Number of pieces in this lot
    #[serde(default)]
    pub quantity: f64,
}

/// A priced subgroup: the unit that becomes (part of) a grid row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct SubGroup {
    /// Subgroup identifier
    pub id: String,
    /// Attribute keys, at most one per attribute code
    #[serde(default)]
    pub keys: Vec<SubGroupKey>,
    /// Current price
    #[serde(default)]
    pub price: Option<f64>,
    /// Price before the last change
    #[serde(default)]
    pub previous_price: Option<f64>,
    /// Unit cost
    #[serde(default)]
    pub cost: Option<f64>,
    /// Nominal unit weight
    #[serde(default)]
    pub weight: Option<f64>,
    /// Date the current price takes effect
    #[serde(default)]
    pub effective_date: Option<NaiveDate>,
    /// Last modification time
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    /// Free-text remark
    #[serde(default)]
    pub remark: Option<String>,
    /// Inventory lots backing this subgroup
    #[serde(default)]
    pub inventory: Vec<InventoryWeight>,
    /// Opaque user-defined fields: a JSON object or a JSON-encoded string
    #[serde(default)]
    pub udf: Option<serde_json::Value>,
}

impl SubGroup {
    /// Finds the key for an attribute code.
    #[must_use]
    pub fn key(&self, attribute_code: &str) -> Option<&SubGroupKey> {
        self.keys.iter().find(|k| k.attribute_code == attribute_code)
    }

    /// Returns the value label for an attribute, or "" when absent.
    #[must_use]
    pub fn label(&self, attribute_code: &str) -> &str {
        self.key(attribute_code)
            .map_or("", |k| k.value_label.as_str())
    }

    /// Sum of inventory weight across all lots.
    #[must_use]
    pub fn total_inventory_weight(&self) -> f64 {
        self.inventory.iter().map(|lot| lot.weight).sum()
    }

    /// Sum of inventory quantity across all lots.
    #[must_use]
    pub fn total_inventory_quantity(&self) -> f64 {
        self.inventory.iter().map(|lot| lot.quantity).sum()
    }

    /// Average weight per piece from inventory, if any pieces are on hand.
    #[must_use]
    pub fn average_inventory_weight(&self) -> Option<f64> {
        let quantity = self.total_inventory_quantity();
        if quantity > 0.0 {
            Some(self.total_inventory_weight() / quantity)
        } else {
            None
        }
    }
}

/// A subgroup paired with the price list that owns it.
#[derive(Debug, Clone, Copy)]
pub struct SourceRecord<'a> {
    /// Owning price list
    pub price_list: &'a PriceList,
    /// The subgroup itself
    pub sub_group: &'a SubGroup,
}

impl<'a> SourceRecord<'a> {
    /// Flattens price lists into records, preserving input order.
    #[must_use]
    pub fn collect(price_lists: &'a [PriceList]) -> Vec<Self> {
        price_lists
            .iter()
            .flat_map(|price_list| {
                price_list
                    .sub_groups
                    .iter()
                    .map(move |sub_group| SourceRecord { price_list, sub_group })
            })
            .collect()
    }

    /// Record identifier (the subgroup id).
    #[must_use]
    pub fn id(&self) -> &'a str {
        &self.sub_group.id
    }

    /// Attribute keys of the subgroup.
    #[must_use]
    pub fn keys(&self) -> &'a [SubGroupKey] {
        &self.sub_group.keys
    }
}
