use std::collections::BTreeMap;

use super::model::{ColumnType, Dataset, Value};

// ---------------------------------------------------------------------------
// Frequency counts
// ---------------------------------------------------------------------------

/// Publications per year, sorted by year.
pub fn year_counts(rows: &[(usize, i32)]) -> BTreeMap<i32, usize> {
    let mut counts = BTreeMap::new();
    for &(_, year) in rows {
        *counts.entry(year).or_insert(0) += 1;
    }
    counts
}

/// Count distinct non-null values of `column` over the given rows.
///
/// Sorted by count descending, ties by value. `None` when the column does
/// not exist.
pub fn value_counts(
    dataset: &Dataset,
    column: &str,
    rows: impl IntoIterator<Item = usize>,
) -> Option<Vec<(Value, usize)>> {
    let col = dataset.column_index(column)?;
    let mut counts: BTreeMap<&Value, usize> = BTreeMap::new();
    for row in rows {
        let Some(record) = dataset.records.get(row) else {
            continue;
        };
        let value = record.get(col);
        if !value.is_null() {
            *counts.entry(value).or_insert(0) += 1;
        }
    }

    let mut sorted: Vec<(Value, usize)> = counts.into_iter().map(|(v, n)| (v.clone(), n)).collect();
    sorted.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    Some(sorted)
}

/// The `n` most frequent values of `column` over the given rows.
pub fn top_counts(
    dataset: &Dataset,
    column: &str,
    rows: impl IntoIterator<Item = usize>,
    n: usize,
) -> Option<Vec<(Value, usize)>> {
    let mut counts = value_counts(dataset, column, rows)?;
    counts.truncate(n);
    Some(counts)
}

// ---------------------------------------------------------------------------
// Column information and dataset metrics
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct ColumnInfo {
    pub name: String,
    pub dtype: ColumnType,
    pub non_null: usize,
    pub null: usize,
    /// Estimated in-memory size of the column in KiB.
    pub memory_kb: f64,
}

pub fn column_info(dataset: &Dataset) -> Vec<ColumnInfo> {
    dataset
        .columns
        .iter()
        .enumerate()
        .map(|(idx, column)| {
            let mut non_null = 0;
            let mut bytes = 0;
            for value in dataset.column_values(idx) {
                if !value.is_null() {
                    non_null += 1;
                }
                bytes += value.footprint();
            }
            ColumnInfo {
                name: column.name.clone(),
                dtype: column.dtype,
                non_null,
                null: dataset.len() - non_null,
                memory_kb: bytes as f64 / 1024.0,
            }
        })
        .collect()
}

/// Headline numbers shown above the charts.
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetMetrics {
    pub rows: usize,
    pub columns: usize,
    pub memory_mb: f64,
}

pub fn metrics(dataset: &Dataset, columns: &[ColumnInfo]) -> DatasetMetrics {
    let kb: f64 = columns.iter().map(|c| c.memory_kb).sum();
    DatasetMetrics {
        rows: dataset.len(),
        columns: dataset.columns.len(),
        memory_mb: kb / 1024.0,
    }
}
