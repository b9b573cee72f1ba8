//! 缓存系统集成测试
//!
//! 测试过期、容量淘汰、版本隔离和持久化

use std::sync::Arc;
use std::time::Duration;

use i18n_cache::i18n::storage::cache::{CACHE_PREFIX, CACHE_SIZE_PREFIX, CACHE_TIMESTAMP_PREFIX};
use i18n_cache::i18n::storage::preference::LANGUAGE_PREFERENCE_KEY;
use i18n_cache::{
    CacheOptions, I18nError, KeyValueStore, Language, ManualClock, RedbStore, ResourceCache,
};

mod common {
    include!("common/mod.rs");
}

use common::{TestDataGenerator, TestEnvironment, START_MILLIS};

fn small_cache_options(max_bytes: u64) -> CacheOptions {
    CacheOptions {
        ttl: Duration::from_secs(3600),
        max_bytes,
        touch_on_read: false,
    }
}

/// 测试写入后在有效期内可读，过期后被清除
#[tokio::test]
async fn test_entry_expires_after_ttl() {
    let env = TestEnvironment::default();
    let bundle = TestDataGenerator::bundle(&[("hello", "你好")]);

    env.cache.set(Language::Zh, "common", &bundle).unwrap();
    env.clock.advance(Duration::from_secs(23 * 3600));
    assert_eq!(env.cache.get(Language::Zh, "common"), Some(bundle));

    env.clock.advance(Duration::from_secs(2 * 3600));
    assert_eq!(env.cache.get(Language::Zh, "common"), None);
    assert!(env.store.is_empty(), "expired entry should be purged with its metadata");
}

/// 测试超出容量时按写入时间从旧到新淘汰
#[tokio::test]
async fn test_oldest_entries_are_evicted_first() {
    let env = TestEnvironment::new(small_cache_options(100));
    let bundle = TestDataGenerator::bundle_of_size(40);

    env.cache.set(Language::En, "a", &bundle).unwrap();
    env.clock.advance(Duration::from_secs(1));
    env.cache.set(Language::En, "b", &bundle).unwrap();
    env.clock.advance(Duration::from_secs(1));
    env.cache.set(Language::En, "c", &bundle).unwrap();

    assert!(!env.cache.is_valid(Language::En, "a"));
    assert!(env.cache.is_valid(Language::En, "b"));
    assert!(env.cache.is_valid(Language::En, "c"));

    let stats = env.cache.stats();
    assert_eq!(stats.total_entries, 2);
    assert_eq!(stats.total_bytes, 80);
    assert!(stats.total_bytes <= stats.max_bytes);
}

/// 测试读取刷新时间戳后淘汰顺序随之改变
#[tokio::test]
async fn test_touch_on_read_protects_recently_read_entries() {
    let env = TestEnvironment::new(CacheOptions {
        touch_on_read: true,
        ..small_cache_options(100)
    });
    let bundle = TestDataGenerator::bundle_of_size(40);

    env.cache.set(Language::Ja, "a", &bundle).unwrap();
    env.clock.advance(Duration::from_secs(1));
    env.cache.set(Language::Ja, "b", &bundle).unwrap();
    env.clock.advance(Duration::from_secs(1));
    assert!(env.cache.get(Language::Ja, "a").is_some());
    env.clock.advance(Duration::from_secs(1));
    env.cache.set(Language::Ja, "c", &bundle).unwrap();

    assert!(env.cache.is_valid(Language::Ja, "a"));
    assert!(!env.cache.is_valid(Language::Ja, "b"));
}

/// 测试空命名空间的条目同样计入容量上限
#[tokio::test]
async fn test_empty_namespace_counts_toward_budget() {
    let env = TestEnvironment::new(small_cache_options(100));
    let bundle = TestDataGenerator::bundle_of_size(80);

    for language in Language::ALL {
        env.cache.set(language, "", &bundle).unwrap();
        env.clock.advance(Duration::from_secs(1));
    }
    env.cache
        .set(Language::En, "common", &TestDataGenerator::bundle_of_size(20))
        .unwrap();

    let stats = env.cache.stats();
    assert_eq!(stats.total_entries, 2);
    assert_eq!(stats.total_bytes, 100);
    assert_eq!(stats.by_language[&Language::En], vec![String::new(), "common".to_string()]);

    let stored: u64 = env
        .store
        .keys()
        .unwrap()
        .iter()
        .filter(|key| {
            key.starts_with(CACHE_PREFIX)
                && !key.starts_with(CACHE_TIMESTAMP_PREFIX)
                && !key.starts_with(CACHE_SIZE_PREFIX)
        })
        .map(|key| env.store.get(key).unwrap().map_or(0, |value| value.len() as u64))
        .sum();
    assert!(stored <= 100, "stored {} bytes", stored);
    assert_eq!(env.cache.get(Language::En, ""), Some(bundle));
}

/// 测试单个资源包超过上限时拒绝写入且不改动已有条目
#[tokio::test]
async fn test_oversized_bundle_is_rejected_without_side_effects() {
    let env = TestEnvironment::new(small_cache_options(100));
    env.cache
        .set(Language::En, "small", &TestDataGenerator::bundle_of_size(40))
        .unwrap();
    let keys_before = env.store.keys().unwrap().len();

    let result = env
        .cache
        .set(Language::En, "huge", &TestDataGenerator::bundle_of_size(101));

    match result {
        Err(I18nError::CacheWriteRejected { size, max, .. }) => {
            assert_eq!(size, 101);
            assert_eq!(max, 100);
        }
        other => panic!("expected rejection, got {:?}", other),
    }
    assert_eq!(env.store.keys().unwrap().len(), keys_before);
    assert!(env.cache.is_valid(Language::En, "small"));
}

/// 测试整体清除只影响当前版本的缓存条目
#[tokio::test]
async fn test_invalidate_all_leaves_other_data() {
    let env = TestEnvironment::default();
    env.cache
        .set(Language::En, "common", &TestDataGenerator::bundle(&[("a", "b")]))
        .unwrap();
    env.cache
        .set(Language::Ja, "header", &TestDataGenerator::bundle(&[("c", "d")]))
        .unwrap();
    env.preferences.store("en").unwrap();
    env.store.set("unrelated", "keep").unwrap();
    env.store
        .set(&format!("{}en_common_v1.0", CACHE_PREFIX), "{}")
        .unwrap();

    assert_eq!(env.cache.invalidate_all(), 2);

    assert_eq!(env.cache.stats().total_entries, 0);
    assert_eq!(env.store.get("unrelated").unwrap().as_deref(), Some("keep"));
    assert_eq!(
        env.store.get(LANGUAGE_PREFERENCE_KEY).unwrap().as_deref(),
        Some("en")
    );
    assert!(env
        .store
        .get(&format!("{}en_common_v1.0", CACHE_PREFIX))
        .unwrap()
        .is_some());
    assert_eq!(env.preferences.read(), Some(Language::En));
}

/// 测试只有资源包没有时间戳的条目被视为不存在
#[tokio::test]
async fn test_partial_write_reads_as_absent() {
    let env = TestEnvironment::default();
    env.cache
        .set(Language::Zh, "common", &TestDataGenerator::bundle(&[("a", "b")]))
        .unwrap();
    env.store
        .remove(&format!("{}zh_common_v1.1", CACHE_TIMESTAMP_PREFIX))
        .unwrap();

    assert_eq!(env.cache.get(Language::Zh, "common"), None);
    assert!(env.store.is_empty());
}

/// 测试存储不可用时读取降级为未命中
#[tokio::test]
async fn test_unavailable_store_degrades_gracefully() {
    let env = TestEnvironment::default();
    env.cache
        .set(Language::En, "common", &TestDataGenerator::bundle(&[("a", "b")]))
        .unwrap();
    env.store.set_available(false);

    assert_eq!(env.cache.get(Language::En, "common"), None);
    assert!(matches!(
        env.cache
            .set(Language::En, "header", &TestDataGenerator::bundle(&[("c", "d")])),
        Err(I18nError::StorageUnavailable(_))
    ));
    env.cache.invalidate(Language::En, "common");
    assert_eq!(env.cache.stats().total_entries, 0);

    env.store.set_available(true);
    assert!(env.cache.get(Language::En, "common").is_some());
}

/// 测试磁盘存储在重新打开后保留缓存
#[tokio::test]
async fn test_redb_backed_cache_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("store.redb");
    let clock = Arc::new(ManualClock::new(START_MILLIS));
    let bundle = TestDataGenerator::bundle(&[("menu.home", "ホーム")]);

    {
        let store = Arc::new(RedbStore::open(&path).unwrap());
        let cache = ResourceCache::new(store, clock.clone(), CacheOptions::default());
        cache.set(Language::Ja, "navigation", &bundle).unwrap();
    }

    let store = Arc::new(RedbStore::open(&path).unwrap());
    let cache = ResourceCache::new(store, clock.clone(), CacheOptions::default());
    assert_eq!(cache.get(Language::Ja, "navigation"), Some(bundle));

    let stats = cache.stats();
    assert_eq!(stats.by_language[&Language::Ja], vec!["navigation".to_string()]);

    clock.advance(Duration::from_secs(25 * 3600));
    assert_eq!(cache.cleanup_expired(), 1);
    assert_eq!(cache.stats().total_entries, 0);
}
