/// Data layer: core types, loading, caching and derived views.
///
/// Architecture:
/// ```text
///   metadata.csv
///        │
///        ▼
///   ┌──────────┐     ┌─────────┐
///   │  loader   │◄───│  cache   │  (mode, source, limit) → LoadResult
///   └──────────┘     └─────────┘
///        │  LoadResult { Arc<Dataset> | failure + fallback }
///        ▼
///   ┌──────────┐
///   │  derive   │  date column → (row, year) view
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐     ┌─────────┐
///   │  filter   │───►│  stats   │  year counts, top values, column info
///   └──────────┘     └─────────┘
/// ```

pub mod cache;
pub mod derive;
pub mod filter;
pub mod loader;
pub mod model;
pub mod stats;
