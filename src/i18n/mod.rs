//! 多语言资源缓存与回退解析
//!
//! 结构：
//! - `storage`：键值存储适配器、资源缓存、语言偏好
//! - `core`：翻译引擎上下文、回退解析、命名空间载入、语言切换
//! - `config`：默认值与配置加载

pub mod bundle;
pub mod clock;
pub mod config;
pub mod core;
pub mod error;
pub mod fetcher;
pub mod language;
pub mod storage;

pub use bundle::{Bundle, BulkResource};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{ConfigManager, I18nConfig};
pub use self::core::{
    fallback_chain, AvailabilityReport, FallbackResolver, LanguageSwitcher, MissingKeyEvent,
    MissingKeyReporter, NamespaceLoader, SwitchOutcome, TranslationEngine,
};
pub use error::{I18nError, I18nResult};
pub use fetcher::{ResourceFetcher, StaticFetcher};
pub use language::Language;
pub use storage::{
    CacheOptions, CacheStats, KeyValueStore, LanguagePreferenceStore, MemoryStore, PreferenceSync,
    RedbStore, ResourceCache,
};
