/// Data layer: core types, loading, caching and filtering.
///
/// Architecture:
/// ```text
///  .csv / .json / .parquet
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → Table         (DataLoadError on failure)
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  cache    │  path → Arc<Table>, explicit reload
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  city ∧ product line → filtered Table
///   └──────────┘
/// ```

pub mod cache;
pub mod error;
pub mod filter;
pub mod loader;
pub mod model;
