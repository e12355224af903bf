//! Caching of surface resources shared by every renderer.

mod cache;

pub use cache::{CacheStats, ResourceCache, DEFAULT_KEY_PRECISION, MAX_GRADIENT_ENTRIES};
