//! 存储模块
//!
//! 提供键值存储适配器、资源缓存和语言偏好存储。

pub mod adapter;
pub mod cache;
pub mod preference;
pub mod redb_store;

pub use adapter::{estimate_size, KeyValueStore, MemoryStore};
pub use cache::{CacheOptions, CacheStats, ResourceCache, CACHE_VERSION};
pub use preference::{LanguagePreferenceStore, PreferenceSync};
pub use redb_store::RedbStore;
