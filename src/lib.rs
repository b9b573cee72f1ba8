//! # i18n-cache
//!
//! 多语言前端的翻译资源缓存、语言回退与命名空间按需载入。
//!
//! ## 模块组织
//!
//! - `i18n` - 资源缓存、回退解析、命名空间载入、语言偏好与切换
//! - `env` - 类型安全的环境变量
//! - `network` - 语言资源接口的HTTP实现（可选）

pub mod env;
pub mod i18n;
#[cfg(feature = "remote")]
pub mod network;

// Re-export commonly used items for convenience
pub use i18n::{
    fallback_chain, AvailabilityReport, Bundle, BulkResource, CacheOptions, CacheStats, Clock,
    ConfigManager, FallbackResolver, I18nConfig, I18nError, I18nResult, KeyValueStore, Language,
    LanguagePreferenceStore, LanguageSwitcher, ManualClock, MemoryStore, MissingKeyEvent,
    MissingKeyReporter, NamespaceLoader, PreferenceSync, RedbStore, ResourceCache,
    ResourceFetcher, StaticFetcher, SwitchOutcome, SystemClock, TranslationEngine,
};
