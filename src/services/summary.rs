//! Summary aggregation.
//!
//! Only `sum` is defined. Totals are computed over rows before merging, and
//! values are sorted before summation so totals do not depend on row order.

use std::collections::BTreeMap;
use tracing::debug;

use crate::models::grid::{grouped_field_name, GridRow, SummaryRow};
use crate::models::pattern::PatternConfig;
use crate::models::udf::as_number;

const SUM: &str = "sum";

fn stable_sum(values: &mut [f64]) -> f64 {
    values.sort_by(f64::total_cmp);
    values.iter().sum()
}

#[derive(Default)]
struct Accumulator {
    values: BTreeMap<String, Vec<f64>>,
    observed: bool,
}

impl Accumulator {
    fn push(&mut self, field: String, value: f64) {
        self.values.entry(field).or_default().push(value);
        self.observed = true;
    }

    fn ensure(&mut self, field: &str) {
        self.values.entry(field.to_string()).or_default();
    }

    fn finish(self, row_group: String) -> SummaryRow {
        let values = self
            .values
            .into_iter()
            .map(|(field, mut values)| (field, stable_sum(&mut values)))
            .collect();
        SummaryRow {
            row_group,
            values,
            observed: self.observed,
        }
    }
}

/// Builds per-row-group totals for a pattern's summary columns.
///
/// Returns `None` when the pattern has no summary configured. For columns
/// applied to column groups the target is `<row column group>_<field>`; a
/// column group without a numeric value for the field contributes nothing.
/// Other columns read the bare field and are always present, defaulting to 0.
#[must_use]
pub fn build_summary_rows(pattern: &PatternConfig, rows: &[GridRow]) -> Option<Vec<SummaryRow>> {
    let summary = pattern.summary.as_ref()?;

    for column in &summary.columns {
        let aggregation = column.aggregation.trim();
        if !aggregation.is_empty() && !aggregation.eq_ignore_ascii_case(SUM) {
            debug!(
                field = %column.field,
                aggregation,
                "unsupported aggregation, summing instead"
            );
        }
    }

    let mut groups: BTreeMap<String, Accumulator> = BTreeMap::new();
    for row in rows {
        let accumulator = groups.entry(row.row_group.clone()).or_default();
        for column in &summary.columns {
            let field = column.field.as_str();
            let scope = (column.applies_to_column_groups(), row.column_group.as_deref());
            let (target, value) = match scope {
                (true, Some(column_group)) => (
                    grouped_field_name(column_group, field),
                    row.get_grouped(column_group, field),
                ),
                (true, None) => (field.to_string(), row.get(field)),
                (false, _) => {
                    accumulator.ensure(field);
                    (field.to_string(), row.get(field).or_else(|| row.get_scoped(field)))
                }
            };

            if let Some(number) = value.and_then(as_number) {
                accumulator.push(target, number);
            }
        }
    }

    Some(
        groups
            .into_iter()
            .map(|(row_group, accumulator)| accumulator.finish(row_group))
            .collect(),
    )
}

/// Totals every field across summary rows.
///
/// `None` when no numeric value was observed in any row.
#[must_use]
pub fn build_summary_field(rows: &[SummaryRow]) -> Option<BTreeMap<String, f64>> {
    if !rows.iter().any(|row| row.observed) {
        return None;
    }

    let mut values: BTreeMap<String, Vec<f64>> = BTreeMap::new();
    for row in rows {
        for (field, total) in &row.values {
            values.entry(field.clone()).or_default().push(*total);
        }
    }

    Some(
        values
            .into_iter()
            .map(|(field, mut totals)| (field, stable_sum(&mut totals)))
            .collect(),
    )
}
