use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use csv::{Reader, ReaderBuilder, StringRecord};
use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::model::{format_count, Dataset, Notice, Severity};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Row limits and chunking parameters for [`load`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    /// Rows read by [`LoadMode::SampleSmall`].
    pub sample_small_rows: usize,
    /// Rows read by [`LoadMode::SampleMedium`].
    pub sample_medium_rows: usize,
    /// Rows per chunk in [`LoadMode::Full`].
    pub chunk_size: usize,
    /// Hard upper bound on rows held by a full load.
    pub row_cap: usize,
    /// Denominator of the full-load progress fraction.
    ///
    /// This is an estimate of the source size, not a known row count: the
    /// fraction is clamped to 1.0 and will stall there for larger files.
    pub progress_assumed_max_rows: usize,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            sample_small_rows: 10_000,
            sample_medium_rows: 50_000,
            chunk_size: 50_000,
            row_cap: 500_000,
            progress_assumed_max_rows: 1_000_000,
        }
    }
}

// ---------------------------------------------------------------------------
// Modes, progress and results
// ---------------------------------------------------------------------------

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
pub enum LoadMode {
    /// Head of the file, `sample_small_rows` rows.
    #[value(name = "small")]
    SampleSmall,
    /// Head of the file, `sample_medium_rows` rows.
    #[value(name = "medium")]
    SampleMedium,
    /// Whole file in chunks, up to `row_cap` rows.
    #[value(name = "full")]
    Full,
}

impl LoadMode {
    pub const ALL: [LoadMode; 3] = [LoadMode::SampleSmall, LoadMode::SampleMedium, LoadMode::Full];

    /// Rows to read from the head of the file, or `None` for a chunked full scan.
    pub fn row_limit(self, config: &LoaderConfig) -> Option<usize> {
        match self {
            LoadMode::SampleSmall => Some(config.sample_small_rows),
            LoadMode::SampleMedium => Some(config.sample_medium_rows),
            LoadMode::Full => None,
        }
    }

    pub fn label(self, config: &LoaderConfig) -> String {
        match self {
            LoadMode::SampleSmall => {
                format!("Sample ({} rows) - Fast", format_count(config.sample_small_rows))
            }
            LoadMode::SampleMedium => {
                format!("Sample ({} rows) - Medium", format_count(config.sample_medium_rows))
            }
            LoadMode::Full => "Full dataset - Slow".to_string(),
        }
    }
}

/// Cumulative progress of a full load.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Progress {
    pub rows_loaded: usize,
    /// `rows_loaded / progress_assumed_max_rows`, clamped to 1.0.
    pub fraction: f32,
}

impl Progress {
    fn estimate(rows_loaded: usize, config: &LoaderConfig) -> Self {
        let max = config.progress_assumed_max_rows.max(1) as f64;
        Progress {
            rows_loaded,
            fraction: (rows_loaded as f64 / max).min(1.0) as f32,
        }
    }

    fn complete(rows_loaded: usize) -> Self {
        Progress {
            rows_loaded,
            fraction: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum LoadError {
    #[error("cannot read {}: {reason}", .path.display())]
    SourceUnavailable { path: PathBuf, reason: String },

    #[error("malformed CSV{}: {message}", line_suffix(.line))]
    Parse { line: Option<u64>, message: String },

    #[error("{} has no header row", .path.display())]
    MissingHeader { path: PathBuf },

    #[error("{primary}; sample fallback also failed: {retry}")]
    FallbackFailed {
        primary: Box<LoadError>,
        retry: Box<LoadError>,
    },
}

fn line_suffix(line: &Option<u64>) -> String {
    line.map(|l| format!(" at line {l}")).unwrap_or_default()
}

impl LoadError {
    fn from_io(path: &Path, err: std::io::Error) -> Self {
        LoadError::SourceUnavailable {
            path: path.to_path_buf(),
            reason: err.to_string(),
        }
    }

    fn from_csv(path: &Path, err: csv::Error) -> Self {
        if err.is_io_error() {
            return LoadError::SourceUnavailable {
                path: path.to_path_buf(),
                reason: err.to_string(),
            };
        }
        LoadError::Parse {
            line: err.position().map(|p| p.line()),
            message: err.to_string(),
        }
    }
}

/// Outcome of [`load`]. Loader failures never escape as `Err`.
#[derive(Debug, Clone)]
pub enum LoadResult {
    Success {
        dataset: Arc<Dataset>,
        /// The row cap was reached with input remaining.
        truncated: bool,
    },
    Failure {
        reason: LoadError,
        /// Sample loaded after a failed full load, if that retry worked.
        fallback: Option<Arc<Dataset>>,
    },
}

impl LoadResult {
    fn success(dataset: Dataset, truncated: bool) -> Self {
        LoadResult::Success {
            dataset: Arc::new(dataset),
            truncated,
        }
    }

    fn failure(reason: LoadError) -> Self {
        LoadResult::Failure {
            reason,
            fallback: None,
        }
    }

    /// The dataset to display: the loaded one or the fallback sample.
    pub fn dataset(&self) -> Option<&Arc<Dataset>> {
        match self {
            LoadResult::Success { dataset, .. } => Some(dataset),
            LoadResult::Failure { fallback, .. } => fallback.as_ref(),
        }
    }

    pub fn row_count(&self) -> usize {
        self.dataset().map_or(0, |ds| ds.len())
    }

    pub fn is_success(&self) -> bool {
        matches!(self, LoadResult::Success { .. })
    }

    pub fn is_truncated(&self) -> bool {
        matches!(self, LoadResult::Success { truncated: true, .. })
    }

    /// User-facing messages describing this result.
    pub fn notices(&self, config: &LoaderConfig) -> Vec<Notice> {
        let mut notices = Vec::new();
        match self {
            LoadResult::Success { dataset, truncated } => {
                if *truncated {
                    notices.push(Notice::new(
                        Severity::Warning,
                        format!(
                            "Limited to {} rows to prevent memory issues",
                            format_count(config.row_cap)
                        ),
                    ));
                }
                if dataset.is_empty() {
                    notices.push(Notice::new(Severity::Warning, "No data loaded"));
                } else {
                    notices.push(loaded_notice(dataset));
                }
            }
            LoadResult::Failure {
                reason,
                fallback: Some(sample),
            } => {
                notices.push(Notice::new(
                    Severity::Error,
                    format!("Error loading full dataset: {reason}"),
                ));
                notices.push(Notice::new(Severity::Info, "Falling back to sample data..."));
                notices.push(loaded_notice(sample));
            }
            LoadResult::Failure {
                reason,
                fallback: None,
            } => {
                notices.push(Notice::new(
                    Severity::Error,
                    format!("Failed to load dataset: {reason}"),
                ));
            }
        }
        notices
    }
}

fn loaded_notice(dataset: &Dataset) -> Notice {
    Notice::new(
        Severity::Success,
        format!("Loaded {} rows successfully!", format_count(dataset.len())),
    )
}

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Load `source` according to `mode`.
///
/// Sample modes read the head of the file. [`LoadMode::Full`] reads chunk by
/// chunk, calling `on_progress` after each one, and stops at
/// `config.row_cap`. A failed full load is retried once as
/// [`LoadMode::SampleSmall`].
pub fn load<P>(mode: LoadMode, source: &Path, config: &LoaderConfig, on_progress: P) -> LoadResult
where
    P: FnMut(Progress),
{
    load_with_sample(mode, source, config, None, on_progress)
}

/// [`load`], with a previously loaded [`LoadMode::SampleSmall`] dataset of
/// the same source. A failed full load falls back to `cached_sample` instead
/// of reading the source again.
pub fn load_with_sample<P>(
    mode: LoadMode,
    source: &Path,
    config: &LoaderConfig,
    cached_sample: Option<Arc<Dataset>>,
    mut on_progress: P,
) -> LoadResult
where
    P: FnMut(Progress),
{
    info!("Loading {} in {mode:?} mode", source.display());

    match mode.row_limit(config) {
        Some(limit) => match read_head(source, limit) {
            Ok(dataset) => {
                info!("Loaded {} rows from {}", dataset.len(), source.display());
                LoadResult::success(dataset, false)
            }
            Err(e) => {
                error!("Failed to load {}: {e}", source.display());
                LoadResult::failure(e)
            }
        },
        None => load_full(source, config, cached_sample, &mut on_progress),
    }
}

/// Cheap facts about a source, read without loading its rows.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceInfo {
    pub path: PathBuf,
    pub size_bytes: u64,
    pub columns: Vec<String>,
}

impl SourceInfo {
    pub fn size_gb(&self) -> f64 {
        self.size_bytes as f64 / (1024.0 * 1024.0 * 1024.0)
    }
}

/// Read the size and header of `source`.
pub fn probe_source(source: &Path) -> Result<SourceInfo, LoadError> {
    let size_bytes = std::fs::metadata(source)
        .map_err(|e| LoadError::from_io(source, e))?
        .len();
    let mut reader = open_source(source)?;
    let headers = read_headers(&mut reader, source)?;

    Ok(SourceInfo {
        path: source.to_path_buf(),
        size_bytes,
        columns: headers.iter().map(|h| h.trim().to_string()).collect(),
    })
}

// ---------------------------------------------------------------------------
// Sample loader
// ---------------------------------------------------------------------------

fn read_head(source: &Path, limit: usize) -> Result<Dataset, LoadError> {
    let mut reader = open_source(source)?;
    let headers = read_headers(&mut reader, source)?;

    let rows = reader
        .records()
        .take(limit)
        .collect::<Result<Vec<StringRecord>, _>>()
        .map_err(|e| LoadError::from_csv(source, e))?;

    Ok(Dataset::from_records(&headers, &rows))
}

// ---------------------------------------------------------------------------
// Full loader
// ---------------------------------------------------------------------------

/// Terminal states of a chunked read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ChunkedEnd {
    Exhausted,
    CappedAtLimit,
}

fn load_full(
    source: &Path,
    config: &LoaderConfig,
    cached_sample: Option<Arc<Dataset>>,
    on_progress: &mut dyn FnMut(Progress),
) -> LoadResult {
    let primary = match read_chunked(source, config, on_progress) {
        Ok((dataset, end)) => {
            let truncated = end == ChunkedEnd::CappedAtLimit;
            if truncated {
                warn!(
                    "Stopped {} at the {}-row cap",
                    source.display(),
                    config.row_cap
                );
            }
            info!("Loaded {} rows from {}", dataset.len(), source.display());
            return LoadResult::success(dataset, truncated);
        }
        Err(e) => e,
    };

    if let Some(sample) = cached_sample {
        warn!(
            "Full load of {} failed ({primary}), using the cached {}-row sample",
            source.display(),
            sample.len()
        );
        return LoadResult::Failure {
            reason: primary,
            fallback: Some(sample),
        };
    }

    warn!(
        "Full load of {} failed ({primary}), retrying with a {}-row sample",
        source.display(),
        config.sample_small_rows
    );

    match read_head(source, config.sample_small_rows) {
        Ok(sample) => {
            info!("Fallback sample loaded {} rows", sample.len());
            LoadResult::Failure {
                reason: primary,
                fallback: Some(Arc::new(sample)),
            }
        }
        Err(retry) => {
            error!("Sample fallback for {} failed: {retry}", source.display());
            LoadResult::failure(LoadError::FallbackFailed {
                primary: Box::new(primary),
                retry: Box::new(retry),
            })
        }
    }
}

/// Read `source` in chunks of `config.chunk_size` rows until it is exhausted
/// or `config.row_cap` rows are held. On error every chunk read so far is
/// dropped with the partial result.
fn read_chunked(
    source: &Path,
    config: &LoaderConfig,
    on_progress: &mut dyn FnMut(Progress),
) -> Result<(Dataset, ChunkedEnd), LoadError> {
    let mut reader = open_source(source)?;
    let headers = read_headers(&mut reader, source)?;
    let mut records = reader.into_records();

    let mut chunks: Vec<Vec<StringRecord>> = Vec::new();
    let mut total = 0usize;

    // A zero chunk size would never make progress.
    let chunk_size = config.chunk_size.max(1);

    let end = loop {
        let want = chunk_size.min(config.row_cap - total);
        let chunk = records
            .by_ref()
            .take(want)
            .collect::<Result<Vec<StringRecord>, _>>()
            .map_err(|e| LoadError::from_csv(source, e))?;

        let got = chunk.len();
        if got > 0 {
            total += got;
            chunks.push(chunk);
            debug!("Chunk {}: {total} rows so far", chunks.len());
            on_progress(Progress::estimate(total, config));
        }

        if got < want {
            break ChunkedEnd::Exhausted;
        }
        if total >= config.row_cap {
            // Remaining input is left unread; one record is enough to tell.
            break match records.next() {
                None => ChunkedEnd::Exhausted,
                Some(_) => ChunkedEnd::CappedAtLimit,
            };
        }
    };

    match end {
        ChunkedEnd::Exhausted => on_progress(Progress::estimate(total, config)),
        ChunkedEnd::CappedAtLimit => on_progress(Progress::complete(total)),
    }

    let dataset = Dataset::from_chunks(&headers, chunks);
    Ok((dataset, end))
}

// ---------------------------------------------------------------------------
// CSV helpers
// ---------------------------------------------------------------------------

fn open_source(source: &Path) -> Result<Reader<File>, LoadError> {
    let file = File::open(source).map_err(|e| LoadError::from_io(source, e))?;
    Ok(ReaderBuilder::new().has_headers(true).from_reader(file))
}

fn read_headers(reader: &mut Reader<File>, source: &Path) -> Result<StringRecord, LoadError> {
    let headers = reader
        .headers()
        .map_err(|e| LoadError::from_csv(source, e))?
        .clone();
    if headers.is_empty() {
        return Err(LoadError::MissingHeader {
            path: source.to_path_buf(),
        });
    }
    Ok(headers)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use tempfile::NamedTempFile;

    use super::*;
    use crate::data::model::Value;

    fn write_csv(rows: usize) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "cord_uid,publish_time,journal").unwrap();
        for i in 0..rows {
            writeln!(file, "id{i},2020-0{}-15,Journal {}", i % 9 + 1, i % 4).unwrap();
        }
        file.flush().unwrap();
        file
    }

    fn small_config() -> LoaderConfig {
        LoaderConfig {
            sample_small_rows: 10,
            sample_medium_rows: 50,
            chunk_size: 40,
            row_cap: 200,
            progress_assumed_max_rows: 400,
        }
    }

    fn load_quiet(mode: LoadMode, source: &Path, config: &LoaderConfig) -> LoadResult {
        load(mode, source, config, |_| {})
    }

    #[test]
    fn sample_modes_return_min_of_limit_and_rows() {
        let config = small_config();
        for rows in [0, 5, 10, 30, 50, 120] {
            let file = write_csv(rows);
            let small = load_quiet(LoadMode::SampleSmall, file.path(), &config);
            let medium = load_quiet(LoadMode::SampleMedium, file.path(), &config);
            assert_eq!(small.row_count(), rows.min(10), "small, {rows} rows");
            assert_eq!(medium.row_count(), rows.min(50), "medium, {rows} rows");
            assert!(small.is_success() && !small.is_truncated());
            assert!(medium.is_success() && !medium.is_truncated());
        }
    }

    #[test]
    fn full_load_below_cap_is_complete() {
        let config = small_config();
        for rows in [1, 40, 79, 199, 200] {
            let file = write_csv(rows);
            let result = load_quiet(LoadMode::Full, file.path(), &config);
            assert!(result.is_success());
            assert_eq!(result.row_count(), rows);
            assert!(!result.is_truncated(), "{rows} rows should not be truncated");
        }
    }

    #[test]
    fn full_load_above_cap_is_truncated() {
        let config = small_config();
        let file = write_csv(240);
        let result = load_quiet(LoadMode::Full, file.path(), &config);
        assert!(result.is_success());
        assert_eq!(result.row_count(), 200);
        assert!(result.is_truncated());
    }

    #[test]
    fn full_load_caps_at_default_limits() {
        let mut body = String::from("n\n");
        for i in 0..600_000 {
            body.push_str(&format!("{i}\n"));
        }
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(body.as_bytes()).unwrap();
        file.flush().unwrap();

        let config = LoaderConfig::default();
        let mut last = None;
        let result = load(LoadMode::Full, file.path(), &config, |p| last = Some(p));

        assert_eq!(result.row_count(), 500_000);
        assert!(result.is_truncated());
        let dataset = result.dataset().unwrap();
        assert_eq!(dataset.records.last().unwrap().get(0), &Value::Integer(499_999));
        assert_eq!(last.unwrap().fraction, 1.0);
    }

    #[test]
    fn progress_is_monotonic_and_ends_at_row_fraction() {
        let config = small_config();
        let file = write_csv(130);
        let mut seen = Vec::new();
        load(LoadMode::Full, file.path(), &config, |p| seen.push(p));

        assert!(seen.windows(2).all(|w| w[0].fraction <= w[1].fraction));
        let rows: Vec<usize> = seen.iter().map(|p| p.rows_loaded).collect();
        assert_eq!(rows, vec![40, 80, 120, 130, 130]);
        assert!((seen.last().unwrap().fraction - 0.325).abs() < 1e-6);
    }

    #[test]
    fn progress_reports_complete_when_capped() {
        let config = small_config();
        let file = write_csv(1000);
        let mut seen = Vec::new();
        load(LoadMode::Full, file.path(), &config, |p| seen.push(p));

        assert!(seen.windows(2).all(|w| w[0].fraction <= w[1].fraction));
        assert!(seen.iter().all(|p| p.rows_loaded <= 200));
        assert_eq!(seen.last().unwrap().fraction, 1.0);
    }

    #[test]
    fn sample_loads_are_idempotent() {
        let config = small_config();
        let file = write_csv(25);
        let a = load_quiet(LoadMode::SampleSmall, file.path(), &config);
        let b = load_quiet(LoadMode::SampleSmall, file.path(), &config);
        assert_eq!(a.dataset().unwrap().as_ref(), b.dataset().unwrap().as_ref());
    }

    #[test]
    fn missing_source_never_raises() {
        let config = small_config();
        let file = write_csv(10);
        let path = file.path().to_path_buf();
        drop(file);

        match load_quiet(LoadMode::Full, &path, &config) {
            LoadResult::Failure {
                reason: LoadError::FallbackFailed { primary, retry },
                fallback: None,
            } => {
                assert!(matches!(*primary, LoadError::SourceUnavailable { .. }));
                assert!(matches!(*retry, LoadError::SourceUnavailable { .. }));
            }
            other => panic!("unexpected result: {other:?}"),
        }

        let sample = load_quiet(LoadMode::SampleSmall, &path, &config);
        assert!(matches!(
            sample,
            LoadResult::Failure {
                reason: LoadError::SourceUnavailable { .. },
                fallback: None
            }
        ));
    }

    #[test]
    fn deleted_source_in_full_mode_uses_cached_sample() {
        let config = small_config();
        let file = write_csv(30);
        let path = file.path().to_path_buf();
        let sample = load_quiet(LoadMode::SampleSmall, &path, &config)
            .dataset()
            .cloned()
            .unwrap();
        drop(file);

        let result = load_with_sample(LoadMode::Full, &path, &config, Some(sample.clone()), |_| {});
        match &result {
            LoadResult::Failure {
                reason: LoadError::SourceUnavailable { .. },
                fallback: Some(fallback),
            } => assert!(Arc::ptr_eq(fallback, &sample)),
            other => panic!("unexpected result: {other:?}"),
        }
        assert_eq!(result.row_count(), 10);
    }

    #[test]
    fn zero_chunk_size_still_terminates() {
        let config = LoaderConfig {
            chunk_size: 0,
            ..small_config()
        };
        let file = write_csv(25);
        let result = load_quiet(LoadMode::Full, file.path(), &config);
        assert!(result.is_success());
        assert_eq!(result.row_count(), 25);
    }

    #[test]
    fn mode_labels_show_exact_row_counts() {
        let config = LoaderConfig {
            sample_small_rows: 500,
            ..LoaderConfig::default()
        };
        assert_eq!(LoadMode::SampleSmall.label(&config), "Sample (500 rows) - Fast");
        assert_eq!(LoadMode::SampleMedium.label(&config), "Sample (50,000 rows) - Medium");
        assert_eq!(LoadMode::Full.label(&config), "Full dataset - Slow");
    }

    #[test]
    fn malformed_row_in_full_mode_falls_back_to_sample() {
        let config = small_config();
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "a,b").unwrap();
        for i in 0..60 {
            writeln!(file, "{i},x").unwrap();
        }
        writeln!(file, "1,2,3").unwrap();
        file.flush().unwrap();

        let result = load_quiet(LoadMode::Full, file.path(), &config);
        match &result {
            LoadResult::Failure {
                reason: LoadError::Parse { line, .. },
                fallback: Some(sample),
            } => {
                assert!(line.is_some());
                assert_eq!(sample.len(), 10);
            }
            other => panic!("unexpected result: {other:?}"),
        }
        assert_eq!(result.row_count(), 10);
        let notices = result.notices(&config);
        assert_eq!(notices[0].severity, Severity::Error);
        assert_eq!(notices[1].message, "Falling back to sample data...");
    }

    #[test]
    fn malformed_row_in_sample_mode_fails_directly() {
        let config = small_config();
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "a,b\n1,2\n3").unwrap();
        file.flush().unwrap();

        let result = load_quiet(LoadMode::SampleSmall, file.path(), &config);
        assert!(matches!(
            result,
            LoadResult::Failure {
                reason: LoadError::Parse { .. },
                fallback: None
            }
        ));
    }

    #[test]
    fn empty_file_has_no_header() {
        let file = NamedTempFile::new().unwrap();
        let result = load_quiet(LoadMode::SampleSmall, file.path(), &small_config());
        assert!(matches!(
            result,
            LoadResult::Failure {
                reason: LoadError::MissingHeader { .. },
                ..
            }
        ));
    }

    #[test]
    fn truncated_result_warns_user() {
        let config = small_config();
        let file = write_csv(300);
        let notices = load_quiet(LoadMode::Full, file.path(), &config).notices(&config);
        assert_eq!(notices[0].severity, Severity::Warning);
        assert_eq!(notices[0].message, "Limited to 200 rows to prevent memory issues");
        assert_eq!(notices[1].message, "Loaded 200 rows successfully!");
    }

    #[test]
    fn probe_reads_header_only() {
        let file = write_csv(3);
        let info = probe_source(file.path()).unwrap();
        assert_eq!(info.columns, vec!["cord_uid", "publish_time", "journal"]);
        assert!(info.size_bytes > 0);
    }
}
