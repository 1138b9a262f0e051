use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::sync::Arc;

use crate::config::AppConfig;
use crate::dashboard::{DashboardView, FilteredView};
use crate::data::cache::{CacheKey, LoadCache};
use crate::data::filter::YearRange;
use crate::data::loader::{self, LoadMode, LoadResult, Progress, SourceInfo};
use crate::data::model::{Dataset, Notice, Severity};

// ---------------------------------------------------------------------------
// Background load plumbing
// ---------------------------------------------------------------------------

/// Messages sent from a loader thread to the UI.
#[derive(Debug)]
pub enum LoadEvent {
    Progress(Progress),
    Finished(LoadResult),
}

/// A load running on a worker thread.
pub struct PendingLoad {
    pub key: CacheKey,
    pub progress: Option<Progress>,
    events: Receiver<LoadEvent>,
}

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
pub struct AppState {
    pub config: AppConfig,

    /// CSV file currently being explored.
    pub source: PathBuf,

    /// Size and header of `source`, if it could be read.
    pub source_info: Option<SourceInfo>,

    /// Selected loading mode.
    pub mode: LoadMode,

    /// Load in flight, if any. Replacing it abandons the previous load.
    pub pending: Option<PendingLoad>,

    /// Latest finished load.
    pub result: Option<LoadResult>,

    /// Derived views of the displayed dataset.
    pub view: Option<DashboardView>,

    /// Active year range (None when there is no year data).
    pub year_range: Option<YearRange>,

    /// Views of the rows inside `year_range` (cached).
    pub filtered: FilteredView,

    /// Status messages shown above the dashboard.
    pub notices: Vec<Notice>,

    cache: LoadCache,
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        let source = config.source.clone();
        let mode = config.mode;
        let mut state = Self {
            config,
            source: PathBuf::new(),
            source_info: None,
            mode,
            pending: None,
            result: None,
            view: None,
            year_range: None,
            filtered: FilteredView::default(),
            notices: Vec::new(),
            cache: LoadCache::default(),
        };
        state.set_source(source);
        state
    }

    /// Switch to another CSV file and probe it. Cached loads of the file are
    /// dropped so a re-opened file is read again.
    pub fn set_source(&mut self, source: PathBuf) {
        self.cache.invalidate(&source);
        self.source_info = match loader::probe_source(&source) {
            Ok(info) => Some(info),
            Err(e) => {
                log::warn!("Could not probe {}: {e}", source.display());
                None
            }
        };
        self.source = source;
    }

    pub fn is_loading(&self) -> bool {
        self.pending.is_some()
    }

    /// Start loading `self.source` in `self.mode`.
    ///
    /// A cached success is applied immediately. Otherwise the load runs on a
    /// worker thread and `repaint` is called whenever it has news for
    /// [`AppState::poll`].
    pub fn request_load<F>(&mut self, repaint: F)
    where
        F: Fn() + Send + 'static,
    {
        let key = CacheKey::new(self.mode, &self.source, &self.config.loader);
        if let Some(result) = self.cache.get(&key) {
            log::debug!("Cache hit for {key:?}");
            self.pending = None;
            self.apply_result(result);
            return;
        }

        let (tx, rx) = mpsc::channel();
        let mode = self.mode;
        let source = self.source.clone();
        let loader_config = self.config.loader.clone();
        let cached_sample = match mode {
            LoadMode::Full => self.cached_sample(),
            _ => None,
        };

        let spawned = std::thread::Builder::new()
            .name("dataset-loader".into())
            .spawn(move || {
                let on_progress = |progress| {
                    // The receiver is gone when a newer load replaced this one.
                    let _ = tx.send(LoadEvent::Progress(progress));
                    repaint();
                };
                let result =
                    loader::load_with_sample(mode, &source, &loader_config, cached_sample, on_progress);
                let _ = tx.send(LoadEvent::Finished(result));
                repaint();
            });

        match spawned {
            Ok(_) => {
                self.pending = Some(PendingLoad {
                    key,
                    progress: None,
                    events: rx,
                });
            }
            Err(e) => {
                log::error!("Failed to start loader thread: {e}");
                self.pending = None;
                self.notices = vec![Notice::new(
                    Severity::Error,
                    format!("Failed to load dataset: {e}"),
                )];
            }
        }
    }

    /// Drain events from the running load. Returns true once a result has
    /// been applied.
    pub fn poll(&mut self) -> bool {
        let Some(pending) = self.pending.as_mut() else {
            return false;
        };

        let finished = loop {
            match pending.events.try_recv() {
                Ok(LoadEvent::Progress(p)) => pending.progress = Some(p),
                Ok(LoadEvent::Finished(result)) => break Some(result),
                Err(TryRecvError::Empty) => break None,
                Err(TryRecvError::Disconnected) => {
                    break Some(LoadResult::Failure {
                        reason: loader::LoadError::SourceUnavailable {
                            path: self.source.clone(),
                            reason: "loader thread exited without a result".into(),
                        },
                        fallback: None,
                    });
                }
            }
        };

        let Some(result) = finished else {
            return false;
        };
        if let Some(pending) = self.pending.take() {
            self.remember(pending.key, &result);
        }
        self.apply_result(result);
        true
    }

    fn sample_key(&self) -> CacheKey {
        CacheKey::new(LoadMode::SampleSmall, &self.source, &self.config.loader)
    }

    /// The cached small sample of the current source, used when a full load
    /// of it fails.
    fn cached_sample(&self) -> Option<Arc<Dataset>> {
        self.cache
            .get(&self.sample_key())
            .and_then(|result| result.dataset().cloned())
    }

    /// Cache a finished load. The sample a failed full load fell back to is
    /// stored as that source's small sample.
    fn remember(&mut self, key: CacheKey, result: &LoadResult) {
        if let LoadResult::Failure {
            fallback: Some(sample),
            ..
        } = result
        {
            if key.mode == LoadMode::Full && key.source == self.source {
                let sample_key = self.sample_key();
                let sample = LoadResult::Success {
                    dataset: sample.clone(),
                    truncated: false,
                };
                self.cache.insert(sample_key, &sample);
            }
        }
        self.cache.insert(key, result);
    }

    /// Show a finished load and rebuild the derived views.
    pub fn apply_result(&mut self, result: LoadResult) {
        let mut notices = result.notices(&self.config.loader);

        self.view = result
            .dataset()
            .map(|ds| DashboardView::build(ds.clone(), &self.config.view));
        if let Some(view) = &self.view {
            notices.extend(view.notices(&self.config.view));
        }
        self.year_range = self
            .view
            .as_ref()
            .and_then(|v| v.initial_range(&self.config.view));

        self.notices = notices;
        self.result = Some(result);
        self.refilter();
    }

    /// Recompute `filtered` after a year-range change.
    pub fn refilter(&mut self) {
        self.filtered = match &self.view {
            Some(view) => view.filter(self.year_range.as_ref(), &self.config.view),
            None => FilteredView::default(),
        };
    }

    pub fn set_year_range(&mut self, range: YearRange) {
        if self.year_range != Some(range) {
            self.year_range = Some(range);
            self.refilter();
        }
    }
}
