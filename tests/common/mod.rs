// 集成测试公共模块
//
// 提供测试辅助工具和共享功能

use std::sync::Arc;

use i18n_cache::i18n::config::constants;
use i18n_cache::{
    Bundle, CacheOptions, Language, LanguagePreferenceStore, LanguageSwitcher, ManualClock,
    MemoryStore, NamespaceLoader, ResourceCache, StaticFetcher, TranslationEngine,
};

/// 固定起始时间：2024-01-01T00:00:00Z
pub const START_MILLIS: i64 = 1_704_067_200_000;

/// 共享同一个内存存储与手动时钟的测试环境
#[allow(dead_code)]
pub struct TestEnvironment {
    pub store: Arc<MemoryStore>,
    pub clock: Arc<ManualClock>,
    pub fetcher: Arc<StaticFetcher>,
    pub engine: Arc<TranslationEngine>,
    pub cache: Arc<ResourceCache>,
    pub loader: Arc<NamespaceLoader>,
    pub preferences: Arc<LanguagePreferenceStore>,
}

#[allow(dead_code)]
impl TestEnvironment {
    pub fn new(options: CacheOptions) -> Self {
        let store = Arc::new(MemoryStore::new());
        let clock = Arc::new(ManualClock::new(START_MILLIS));
        let fetcher = Arc::new(StaticFetcher::new());
        let engine = Arc::new(TranslationEngine::new(Language::Ja));
        let cache = Arc::new(ResourceCache::new(store.clone(), clock.clone(), options));
        let loader = Arc::new(NamespaceLoader::new(
            engine.clone(),
            cache.clone(),
            fetcher.clone(),
        ));
        let preferences = Arc::new(LanguagePreferenceStore::new(store.clone(), clock.clone()));

        Self {
            store,
            clock,
            fetcher,
            engine,
            cache,
            loader,
            preferences,
        }
    }

    pub fn default() -> Self {
        Self::new(CacheOptions::default())
    }

    pub fn switcher(&self) -> LanguageSwitcher {
        LanguageSwitcher::new(self.loader.clone(), self.preferences.clone())
    }
}

/// 测试数据生成器
#[allow(dead_code)]
pub struct TestDataGenerator;

#[allow(dead_code)]
impl TestDataGenerator {
    pub fn bundle(pairs: &[(&str, &str)]) -> Bundle {
        pairs.iter().copied().collect()
    }

    /// 生成约 `bytes` 字节的资源包
    pub fn bundle_of_size(bytes: usize) -> Bundle {
        let overhead = r#"{"k":""}"#.len();
        let filler = "x".repeat(bytes.saturating_sub(overhead));
        Self::bundle(&[("k", filler.as_str())])
    }

    /// 为所有语言的常用命名空间准备资源
    pub fn seed_common(fetcher: &StaticFetcher) {
        for language in Language::ALL {
            for namespace in constants::COMMON_NAMESPACES {
                let key = format!("{}.title", namespace);
                let value = format!("{}:{}", language, namespace);
                let bundle = Self::bundle(&[(key.as_str(), value.as_str())]);
                fetcher.insert(language, namespace, bundle);
            }
        }
    }
}
