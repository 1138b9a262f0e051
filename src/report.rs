use std::fmt::Write;

use crate::config::ViewConfig;
use crate::dashboard::{DashboardView, FilteredView};
use crate::data::loader::{LoadResult, LoaderConfig};
use crate::data::model::{format_count, Severity};

/// Plain-text summary of a load, printed by `--summary`.
pub fn render(result: &LoadResult, loader: &LoaderConfig, view_config: &ViewConfig) -> String {
    let mut out = String::new();

    for notice in result.notices(loader) {
        let _ = writeln!(out, "{} {}", severity_tag(notice.severity), notice.message);
    }

    let Some(dataset) = result.dataset() else {
        return out;
    };
    let view = DashboardView::build(dataset.clone(), view_config);
    for notice in view.notices(view_config) {
        let _ = writeln!(out, "{} {}", severity_tag(notice.severity), notice.message);
    }

    let m = &view.metrics;
    let _ = writeln!(out);
    let _ = writeln!(out, "Total rows:   {}", format_count(m.rows));
    let _ = writeln!(out, "Columns:      {}", m.columns);
    let _ = writeln!(out, "Memory usage: {:.1} MB", m.memory_mb);

    let range = view.initial_range(view_config);
    let filtered = view.filter(range.as_ref(), view_config);
    if let Some(range) = range {
        let _ = writeln!(
            out,
            "Year range:   {}-{} ({} rows)",
            range.start,
            range.end,
            format_count(filtered.rows.len())
        );
    }

    write_year_counts(&mut out, &filtered);
    write_top_categories(&mut out, &filtered, view_config);

    let _ = writeln!(out, "\nColumn information:");
    let _ = writeln!(
        out,
        "  {:<24} {:<10} {:>10} {:>10} {:>12}",
        "Column", "Data Type", "Non-Null", "Null", "Memory (KB)"
    );
    for col in &view.columns {
        let _ = writeln!(
            out,
            "  {:<24} {:<10} {:>10} {:>10} {:>12.1}",
            col.name, col.dtype, col.non_null, col.null, col.memory_kb
        );
    }
    out
}

fn write_year_counts(out: &mut String, filtered: &FilteredView) {
    let _ = writeln!(out, "\nPublications by year:");
    if filtered.year_counts.is_empty() {
        let _ = writeln!(out, "  No year data available for chart");
    }
    for (year, count) in &filtered.year_counts {
        let _ = writeln!(out, "  {year}: {}", format_count(*count));
    }
}

fn write_top_categories(out: &mut String, filtered: &FilteredView, config: &ViewConfig) {
    let _ = writeln!(out, "\nTop {} {} values:", config.top_n, config.category_column);
    match &filtered.top_categories {
        None => {
            let _ = writeln!(out, "  No {} data available", config.category_column);
        }
        Some(top) => {
            for (value, count) in top {
                let _ = writeln!(out, "  {value}: {}", format_count(*count));
            }
        }
    }
}

fn severity_tag(severity: Severity) -> &'static str {
    match severity {
        Severity::Info => "[info]",
        Severity::Success => "[ok]",
        Severity::Warning => "[warn]",
        Severity::Error => "[error]",
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write as _;
    use std::path::Path;

    use tempfile::NamedTempFile;

    use super::*;
    use crate::data::loader::{load, LoadMode};

    #[test]
    fn summarises_a_successful_load() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "title,publish_time,journal").unwrap();
        writeln!(file, "a,2020-01-01,Nature\nb,2021-05-05,Nature\nc,2019-01-01,Cell").unwrap();
        file.flush().unwrap();

        let loader = LoaderConfig::default();
        let result = load(LoadMode::SampleSmall, file.path(), &loader, |_| {});
        let text = render(&result, &loader, &ViewConfig::default());

        assert!(text.contains("[ok] Loaded 3 rows successfully!"));
        assert!(text.contains("Year range:   2020-2021 (2 rows)"));
        assert!(text.contains("  Nature: 2"));
        assert!(!text.contains("  Cell: 1"));
        assert!(text.contains("publish_time"));
    }

    #[test]
    fn failed_load_prints_only_the_error() {
        let loader = LoaderConfig::default();
        let result = load(LoadMode::SampleSmall, Path::new("/nonexistent.csv"), &loader, |_| {});
        let text = render(&result, &loader, &ViewConfig::default());
        assert!(text.starts_with("[error] Failed to load dataset"));
        assert!(!text.contains("Total rows"));
    }
}
