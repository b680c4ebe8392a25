pub mod fetch_cache;

pub use fetch_cache::{CacheStats, FetchCache, DEFAULT_CAPACITY, DEFAULT_FRESHNESS};
