use std::collections::HashMap;
use std::path::{Path, PathBuf};

use super::loader::{LoadMode, LoadResult, LoaderConfig};

/// Identity of a load request: identical keys produce identical datasets
/// while the source file is unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub mode: LoadMode,
    pub source: PathBuf,
    /// Head-of-file limit for sample modes, row cap for full loads.
    pub row_limit: usize,
}

impl CacheKey {
    pub fn new(mode: LoadMode, source: &Path, config: &LoaderConfig) -> Self {
        CacheKey {
            mode,
            source: source.to_path_buf(),
            row_limit: mode.row_limit(config).unwrap_or(config.row_cap),
        }
    }
}

/// Session-scoped memo of successful loads.
///
/// Callers look a key up before calling [`super::loader::load`] and insert
/// the result afterwards. Failures are not stored, so a later request
/// retries the read.
#[derive(Debug, Default)]
pub struct LoadCache {
    entries: HashMap<CacheKey, LoadResult>,
}

impl LoadCache {
    pub fn get(&self, key: &CacheKey) -> Option<LoadResult> {
        self.entries.get(key).cloned()
    }

    /// Store `result` if it is a success. Returns whether it was stored.
    pub fn insert(&mut self, key: CacheKey, result: &LoadResult) -> bool {
        if !result.is_success() {
            return false;
        }
        self.entries.insert(key, result.clone());
        true
    }

    /// Forget every entry for `source`.
    pub fn invalidate(&mut self, source: &Path) {
        self.entries.retain(|key, _| key.source != source);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::sync::Arc;

    use tempfile::NamedTempFile;

    use super::*;
    use crate::data::loader::load;

    fn csv_file() -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "a\n1\n2\n3").unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn caches_successes_by_mode_and_limit() {
        let file = csv_file();
        let config = LoaderConfig::default();
        let mut cache = LoadCache::default();

        let key = CacheKey::new(LoadMode::SampleSmall, file.path(), &config);
        assert!(cache.get(&key).is_none());

        let result = load(LoadMode::SampleSmall, file.path(), &config, |_| {});
        assert!(cache.insert(key.clone(), &result));

        let hit = cache.get(&key).unwrap();
        assert!(Arc::ptr_eq(hit.dataset().unwrap(), result.dataset().unwrap()));

        let medium = CacheKey::new(LoadMode::SampleMedium, file.path(), &config);
        assert!(cache.get(&medium).is_none());

        let smaller = LoaderConfig {
            sample_small_rows: 2,
            ..LoaderConfig::default()
        };
        assert!(cache.get(&CacheKey::new(LoadMode::SampleSmall, file.path(), &smaller)).is_none());
    }

    #[test]
    fn failures_are_not_cached() {
        let config = LoaderConfig::default();
        let missing = Path::new("/nonexistent/metadata.csv");
        let mut cache = LoadCache::default();

        let result = load(LoadMode::SampleSmall, missing, &config, |_| {});
        let key = CacheKey::new(LoadMode::SampleSmall, missing, &config);
        assert!(!cache.insert(key.clone(), &result));
        assert!(cache.get(&key).is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn invalidate_drops_only_that_source() {
        let a = csv_file();
        let b = csv_file();
        let config = LoaderConfig::default();
        let mut cache = LoadCache::default();

        for path in [a.path(), b.path()] {
            let result = load(LoadMode::SampleSmall, path, &config, |_| {});
            cache.insert(CacheKey::new(LoadMode::SampleSmall, path, &config), &result);
        }
        assert_eq!(cache.len(), 2);

        cache.invalidate(a.path());
        assert_eq!(cache.len(), 1);
        assert!(cache
            .get(&CacheKey::new(LoadMode::SampleSmall, b.path(), &config))
            .is_some());
    }
}
