use std::collections::BTreeMap;
use std::sync::Arc;

use crate::config::ViewConfig;
use crate::data::derive::YearView;
use crate::data::filter::{filtered_rows, YearRange};
use crate::data::model::{Dataset, Notice, Severity, Value};
use crate::data::stats::{self, ColumnInfo, DatasetMetrics};

// ---------------------------------------------------------------------------
// Derived, render-ready views of one loaded dataset
// ---------------------------------------------------------------------------

/// Everything the dashboard shows that depends only on the dataset.
#[derive(Debug, Clone)]
pub struct DashboardView {
    pub dataset: Arc<Dataset>,
    pub years: YearView,
    pub year_bounds: Option<(i32, i32)>,
    pub columns: Vec<ColumnInfo>,
    pub metrics: DatasetMetrics,
}

/// Views recomputed whenever the year range changes.
#[derive(Debug, Clone, Default)]
pub struct FilteredView {
    /// `(row, year)` pairs inside the active range.
    pub rows: Vec<(usize, i32)>,
    pub year_counts: BTreeMap<i32, usize>,
    /// `None` when the category column does not exist.
    pub top_categories: Option<Vec<(Value, usize)>>,
}

impl DashboardView {
    pub fn build(dataset: Arc<Dataset>, config: &ViewConfig) -> Self {
        let years = YearView::derive(&dataset, &config.date_column, config.default_year);
        let year_bounds = years.bounds();
        let columns = stats::column_info(&dataset);
        let metrics = stats::metrics(&dataset, &columns);
        DashboardView {
            dataset,
            years,
            year_bounds,
            columns,
            metrics,
        }
    }

    /// Starting year range: the configured default clamped to the data, or
    /// `None` when there is no year data to filter on.
    pub fn initial_range(&self, config: &ViewConfig) -> Option<YearRange> {
        self.year_bounds
            .map(|bounds| YearRange::clamped(config.default_range(), bounds))
    }

    pub fn filter(&self, range: Option<&YearRange>, config: &ViewConfig) -> FilteredView {
        let rows = filtered_rows(&self.years, range);
        let year_counts = stats::year_counts(&rows);
        let top_categories = stats::top_counts(
            &self.dataset,
            &config.category_column,
            rows.iter().map(|&(row, _)| row),
            config.top_n,
        );
        FilteredView {
            rows,
            year_counts,
            top_categories,
        }
    }

    pub fn notices(&self, config: &ViewConfig) -> Vec<Notice> {
        let mut notices = self.years.notices();
        if self.dataset.column(&config.category_column).is_none() {
            notices.push(Notice::new(
                Severity::Info,
                format!("No {} data available", config.category_column),
            ));
        }
        notices
    }
}

#[cfg(test)]
mod tests {
    use csv::StringRecord;

    use super::*;

    fn dataset(rows: &[[&str; 2]]) -> Arc<Dataset> {
        let headers = StringRecord::from(vec!["publish_time", "journal"]);
        let rows: Vec<StringRecord> = rows.iter().map(|r| StringRecord::from(r.to_vec())).collect();
        Arc::new(Dataset::from_records(&headers, &rows))
    }

    #[test]
    fn filters_and_counts_within_range() {
        let config = ViewConfig::default();
        let view = DashboardView::build(
            dataset(&[
                ["2019-02-01", "Cell"],
                ["2020-03-01", "Nature"],
                ["2020-07-09", "Nature"],
                ["2021-01-01", "Cell"],
                ["2022-05-05", "Lancet"],
                ["bad", "Lancet"],
            ]),
            &config,
        );

        assert_eq!(view.year_bounds, Some((2019, 2022)));
        let range = view.initial_range(&config);
        assert_eq!(range, Some(YearRange::new(2020, 2021)));

        let filtered = view.filter(range.as_ref(), &config);
        assert_eq!(filtered.rows.len(), 3);
        assert_eq!(filtered.year_counts.get(&2020), Some(&2));
        assert_eq!(filtered.year_counts.get(&2021), Some(&1));
        assert_eq!(
            filtered.top_categories.unwrap(),
            vec![(Value::String("Nature".into()), 2), (Value::String("Cell".into()), 1)]
        );
        assert!(view.notices(&config).is_empty());
    }

    #[test]
    fn missing_columns_degrade_to_defaults() {
        let config = ViewConfig {
            date_column: "published".into(),
            category_column: "venue".into(),
            ..ViewConfig::default()
        };
        let view = DashboardView::build(dataset(&[["2019-02-01", "Cell"]]), &config);

        assert_eq!(view.year_bounds, Some((2020, 2020)));
        let filtered = view.filter(view.initial_range(&config).as_ref(), &config);
        assert_eq!(filtered.rows, vec![(0, 2020)]);
        assert!(filtered.top_categories.is_none());
        assert_eq!(view.notices(&config).len(), 2);
    }
}
