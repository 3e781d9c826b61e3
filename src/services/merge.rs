//! Row merge strategies.
//!
//! Merging always produces new rows; the input rows are consumed, never
//! handed back after mutation. Output is ordered by row-group key.

use std::collections::BTreeMap;

use crate::models::grid::GridRow;

/// Zip-merges rows across column groups.
///
/// Rows are partitioned by row group and then by column group, and each
/// partition is ordered by row number. For a row group whose column groups
/// hold `k_1..k_n` rows, `max(k_i)` merged rows are emitted; the i-th takes
/// the i-th row of every column group that has one. Unprefixed fields come
/// from the first contributor, later contributors only fill gaps. A column
/// group running out of rows is simply absent from the remaining merged rows.
#[must_use]
pub fn zip_merge(rows: Vec<GridRow>) -> Vec<GridRow> {
    let mut partitions: BTreeMap<String, BTreeMap<String, Vec<GridRow>>> = BTreeMap::new();
    for row in rows {
        partitions
            .entry(row.row_group.clone())
            .or_default()
            .entry(row.column_group.clone().unwrap_or_default())
            .or_default()
            .push(row);
    }

    let mut merged = Vec::new();
    for column_groups in partitions.into_values() {
        let mut columns: Vec<std::vec::IntoIter<GridRow>> = column_groups
            .into_values()
            .map(|mut group| {
                group.sort_by_key(|row| row.row_number);
                group.into_iter()
            })
            .collect();
        let max_count = columns.iter().map(ExactSizeIterator::len).max().unwrap_or(0);

        for position in 0..max_count {
            let mut current: Option<GridRow> = None;
            for column in &mut columns {
                let Some(row) = column.next() else {
                    continue;
                };
                match current.as_mut() {
                    Some(target) => target.absorb(&row),
                    None => current = Some(row),
                }
            }
            if let Some(mut row) = current {
                row.column_group = None;
                row.row_number = position;
                merged.push(row);
            }
        }
    }

    merged
}

/// Merges all rows sharing a row group into one, later rows overwriting
/// earlier values. The `id` of the first occurrence is kept.
#[must_use]
pub fn merge_by_row_group(rows: Vec<GridRow>) -> Vec<GridRow> {
    let mut merged: BTreeMap<String, GridRow> = BTreeMap::new();
    for row in rows {
        match merged.get_mut(&row.row_group) {
            Some(existing) => existing.overwrite_from(&row),
            None => {
                merged.insert(row.row_group.clone(), row);
            }
        }
    }
    merged.into_values().collect()
}

/// Identity pass-through used by direct-row handlers.
#[must_use]
pub fn no_merge(rows: Vec<GridRow>) -> Vec<GridRow> {
    rows
}
