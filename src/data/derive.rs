use chrono::{Datelike, NaiveDateTime};

use super::model::{parse_date, Dataset, Notice, Severity, Value};

// ---------------------------------------------------------------------------
// Year view: one derived year per usable row
// ---------------------------------------------------------------------------

/// Where the years of a [`YearView`] came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum YearSource {
    /// Coerced from this date column.
    Column(String),
    /// The date column was missing; every row got this year.
    Default { column: String, year: i32 },
}

/// `(row index, year)` pairs derived from a dataset.
///
/// Rows whose date cannot be coerced are left out of the view; the base
/// dataset is never touched.
#[derive(Debug, Clone, PartialEq)]
pub struct YearView {
    pub rows: Vec<(usize, i32)>,
    pub source: YearSource,
    /// Rows dropped because their date did not parse.
    pub dropped: usize,
}

impl YearView {
    pub fn derive(dataset: &Dataset, date_column: &str, default_year: i32) -> Self {
        let Some(col) = dataset.column_index(date_column) else {
            log::warn!("'{date_column}' column not found, using default year {default_year}");
            return YearView {
                rows: (0..dataset.len()).map(|row| (row, default_year)).collect(),
                source: YearSource::Default {
                    column: date_column.to_string(),
                    year: default_year,
                },
                dropped: 0,
            };
        };

        let rows: Vec<(usize, i32)> = dataset
            .column_values(col)
            .enumerate()
            .filter_map(|(row, value)| coerce_year(value).map(|year| (row, year)))
            .collect();
        let dropped = dataset.len() - rows.len();
        log::debug!("Derived {} years from '{date_column}', dropped {dropped}", rows.len());

        YearView {
            rows,
            source: YearSource::Column(date_column.to_string()),
            dropped,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Smallest and largest year in the view.
    pub fn bounds(&self) -> Option<(i32, i32)> {
        let min = self.rows.iter().map(|&(_, y)| y).min()?;
        let max = self.rows.iter().map(|&(_, y)| y).max()?;
        Some((min, max))
    }

    pub fn notices(&self) -> Vec<Notice> {
        match &self.source {
            YearSource::Default { column, year } => vec![Notice::new(
                Severity::Warning,
                format!("'{column}' column not found. Using default year {year}."),
            )],
            YearSource::Column(_) if self.is_empty() => vec![Notice::new(
                Severity::Info,
                "No year data available for filtering",
            )],
            YearSource::Column(_) => Vec::new(),
        }
    }
}

/// Coerce a cell to a calendar year, or `None` if it is not a date.
///
/// Accepts typed dates, bare years (`2020`), ISO dates with or without a
/// time part, and year-month strings (`2020-03`).
pub fn coerce_year(value: &Value) -> Option<i32> {
    match value {
        Value::Date(d) => Some(d.year()),
        Value::Integer(y) if (1000..=9999).contains(y) => Some(*y as i32),
        Value::String(s) => coerce_year_str(s.trim()),
        _ => None,
    }
}

fn coerce_year_str(s: &str) -> Option<i32> {
    if let Some(d) = parse_date(s) {
        return Some(d.year());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Some(dt.year());
    }
    if let Some(d) = parse_date(&format!("{s}-01")) {
        return Some(d.year());
    }
    if s.len() == 4 && s.bytes().all(|b| b.is_ascii_digit()) {
        return s.parse().ok();
    }
    None
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use csv::StringRecord;

    use super::*;

    fn dataset(headers: &[&str], rows: &[&[&str]]) -> Dataset {
        let headers = StringRecord::from(headers.to_vec());
        let rows: Vec<StringRecord> = rows.iter().map(|r| StringRecord::from(r.to_vec())).collect();
        Dataset::from_records(&headers, &rows)
    }

    #[test]
    fn coerces_common_date_shapes() {
        let date = NaiveDate::from_ymd_opt(2019, 12, 1).unwrap();
        assert_eq!(coerce_year(&Value::Date(date)), Some(2019));
        assert_eq!(coerce_year(&Value::Integer(2021)), Some(2021));
        assert_eq!(coerce_year(&Value::Integer(7)), None);
        assert_eq!(coerce_year(&Value::String("2020".into())), Some(2020));
        assert_eq!(coerce_year(&Value::String("2020-03".into())), Some(2020));
        assert_eq!(coerce_year(&Value::String("2018-05-04 10:00:00".into())), Some(2018));
        assert_eq!(coerce_year(&Value::String("Spring 2020".into())), None);
        assert_eq!(coerce_year(&Value::Null), None);
    }

    #[test]
    fn unparseable_dates_are_dropped_from_view_only() {
        let ds = dataset(
            &["title", "publish_time"],
            &[&["a", "2020-01-05"], &["b", "unknown"], &["c", ""], &["d", "2021"]],
        );
        let view = YearView::derive(&ds, "publish_time", 2020);

        assert_eq!(view.rows, vec![(0, 2020), (3, 2021)]);
        assert_eq!(view.dropped, 2);
        assert_eq!(view.bounds(), Some((2020, 2021)));
        assert_eq!(ds.len(), 4);
        assert!(view.notices().is_empty());
    }

    #[test]
    fn missing_date_column_uses_default_year() {
        let ds = dataset(&["title"], &[&["a"], &["b"]]);
        let view = YearView::derive(&ds, "publish_time", 2020);

        assert_eq!(view.rows, vec![(0, 2020), (1, 2020)]);
        assert_eq!(
            view.source,
            YearSource::Default {
                column: "publish_time".into(),
                year: 2020
            }
        );
        let notices = view.notices();
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].severity, Severity::Warning);
        assert!(notices[0].message.contains("publish_time"));
    }

    #[test]
    fn column_without_any_dates_reports_no_year_data() {
        let ds = dataset(&["publish_time"], &[&["n/a"], &[""]]);
        let view = YearView::derive(&ds, "publish_time", 2020);
        assert!(view.is_empty());
        assert_eq!(view.bounds(), None);
        assert_eq!(view.notices()[0].message, "No year data available for filtering");
    }
}
