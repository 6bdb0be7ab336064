pub mod cache;
pub mod l1;
pub mod sqlite_tier;
pub mod stats;
pub mod tier;
pub mod ttl;

pub use cache::MultiTierCache;
pub use sqlite_tier::SqliteCacheTier;
pub use stats::CacheStats;
pub use tier::CacheTier;
pub use ttl::TtlTable;
