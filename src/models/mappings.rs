//! Value-mapping dictionaries and the item label format.

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::OnceLock;

/// Optional mapping dictionaries, declared at root or pattern level.
///
/// Every dictionary is optional; resolution always falls back to a legacy
/// default, so an absent or incomplete mapping is never an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ValueMappingsConfig {
    /// Semantic alias → attribute code (e.g. "productGroup2" → "PRODUCT_GROUP2")
    #[serde(default)]
    pub group_code_mappings: Option<BTreeMap<String, String>>,
    /// Group code → handler id (e.g. "COIL" → "coil")
    #[serde(default)]
    pub handler_mappings: Option<BTreeMap<String, String>>,
    /// Item label format used when a pattern declares none
    #[serde(default)]
    pub default_item_format: Option<ItemFormat>,
    /// Free-form string settings
    #[serde(default)]
    pub special_mappings: Option<BTreeMap<String, String>>,
}

/// Kind of a single item format part.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FormatPartKind {
    /// Value label of an attribute code
    Attribute,
    /// Literal text placed between attributes
    Literal,
    /// Missing or unrecognized `type`; such a part makes its format unusable
    #[default]
    #[serde(other)]
    Unknown,
}

/// One element of an item label format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormatPart {
    /// Attribute reference or literal text
    #[serde(rename = "type", default)]
    pub kind: FormatPartKind,
    /// Attribute code or literal string
    #[serde(default)]
    pub value: String,
}

impl FormatPart {
    /// Creates an attribute part.
    pub fn attribute(code: impl Into<String>) -> Self {
        Self {
            kind: FormatPartKind::Attribute,
            value: code.into(),
        }
    }

    /// Creates a literal part.
    pub fn literal(text: impl Into<String>) -> Self {
        Self {
            kind: FormatPartKind::Literal,
            value: text.into(),
        }
    }
}

/// Item label format as written in a pattern file.
///
/// Accepts either an explicit part list or a template string such as
/// `"{PRODUCT_GROUP4} x {PRODUCT_GROUP6}"`. Anything else is kept as
/// [`ItemFormat::Unrecognized`] so a bad format never fails the document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ItemFormat {
    /// Explicit list of parts
    Parts(Vec<FormatPart>),
    /// Template with `{ATTRIBUTE}` placeholders
    Template(String),
    /// A value of neither shape
    Unrecognized(Value),
}

/// Why an item format cannot be used.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatProblem {
    /// Index of the offending part (0 for whole-format problems)
    pub index: usize,
    /// Human-readable reason
    pub reason: &'static str,
}

fn placeholder_regex() -> &'static Regex {
    static PLACEHOLDER: OnceLock<Regex> = OnceLock::new();
    PLACEHOLDER.get_or_init(|| {
        Regex::new(r"\{([A-Za-z0-9_]+)\}").expect("placeholder pattern is a valid regex")
    })
}

impl ItemFormat {
    /// Normalizes the format into a part list.
    #[must_use]
    pub fn parts(&self) -> Vec<FormatPart> {
        match self {
            Self::Parts(parts) => parts.clone(),
            Self::Unrecognized(_) => Vec::new(),
            Self::Template(template) => {
                let mut parts = Vec::new();
                let mut last = 0;
                for captures in placeholder_regex().captures_iter(template) {
                    let (Some(whole), Some(code)) = (captures.get(0), captures.get(1)) else {
                        continue;
                    };
                    if whole.start() > last {
                        parts.push(FormatPart::literal(&template[last..whole.start()]));
                    }
                    parts.push(FormatPart::attribute(code.as_str()));
                    last = whole.end();
                }
                if last < template.len() {
                    parts.push(FormatPart::literal(&template[last..]));
                }
                parts
            }
        }
    }

    /// Lists everything that keeps this format from rendering a label.
    #[must_use]
    pub fn problems(&self) -> Vec<FormatProblem> {
        let problem = |index, reason| FormatProblem { index, reason };
        if matches!(self, Self::Unrecognized(_)) {
            return vec![problem(0, "neither a part list nor a template string")];
        }

        let parts = self.parts();
        if parts.is_empty() {
            return vec![problem(0, "format has no parts")];
        }

        let mut problems = Vec::new();
        for (index, part) in parts.iter().enumerate() {
            match part.kind {
                FormatPartKind::Unknown => {
                    problems.push(problem(index, "part type is missing or unrecognized"));
                }
                FormatPartKind::Attribute if part.value.trim().is_empty() => {
                    problems.push(problem(index, "attribute part without attribute code"));
                }
                _ => {}
            }
        }
        if !parts.iter().any(|p| p.kind == FormatPartKind::Attribute) {
            problems.push(problem(0, "format references no attribute"));
        }
        problems
    }

    /// Parts of a well-formed format; `None` when [`ItemFormat::problems`] finds any.
    #[must_use]
    pub fn usable_parts(&self) -> Option<Vec<FormatPart>> {
        if self.problems().is_empty() {
            Some(self.parts())
        } else {
            None
        }
    }

    /// The hardcoded legacy format: `PRODUCT_GROUP4 x PRODUCT_GROUP6 x PRODUCT_GROUP7`.
    #[must_use]
    pub fn legacy() -> Vec<FormatPart> {
        vec![
            FormatPart::attribute("PRODUCT_GROUP4"),
            FormatPart::literal(" x "),
            FormatPart::attribute("PRODUCT_GROUP6"),
            FormatPart::literal(" x "),
            FormatPart::attribute("PRODUCT_GROUP7"),
        ]
    }
}

/// Renders an item label from format parts.
///
/// Attributes without a value are skipped together with the literal that
/// would have joined them, so a missing middle attribute never leaves a
/// dangling separator.
#[must_use]
pub fn render_item_label<'a>(parts: &[FormatPart], lookup: impl Fn(&str) -> &'a str) -> String {
    let mut label = String::new();
    let mut pending_literal: Option<&str> = None;
    let mut seen_attribute = false;

    for part in parts {
        match part.kind {
            FormatPartKind::Unknown => {}
            FormatPartKind::Literal => {
                pending_literal = Some(part.value.as_str());
            }
            FormatPartKind::Attribute => {
                let leading = !seen_attribute;
                seen_attribute = true;
                let value = lookup(&part.value);
                if value.is_empty() {
                    continue;
                }
                if let Some(literal) = pending_literal.take() {
                    if !label.is_empty() || leading {
                        label.push_str(literal);
                    }
                }
                label.push_str(value);
            }
        }
    }

    if !label.is_empty() {
        if let (Some(literal), Some(last)) = (pending_literal, parts.last()) {
            if last.kind == FormatPartKind::Literal {
                label.push_str(literal);
            }
        }
    }

    label
}
