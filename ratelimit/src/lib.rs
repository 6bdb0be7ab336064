pub mod bucket;
pub mod class;
pub mod limiter;

pub use bucket::TokenBucket;
pub use class::{RequestClass, classify};
pub use limiter::{RateLimitConfig, RateLimitCounters, RateLimiter};
