//! 语言资源缓存
//!
//! 以（语言，命名空间）为键，把资源包连同写入时间和大小保存在键值存储中。
//!
//! 每个条目占用三个键，按以下顺序写入：
//!
//! - `lang_cache_{lang}_{ns}_{version}`：资源包JSON
//! - `lang_cache_timestamp_{lang}_{ns}_{version}`：写入时间（Unix毫秒）
//! - `lang_cache_size_{lang}_{ns}_{version}`：JSON字节数
//!
//! 只写入了资源包而没有时间戳的条目被视为不存在。
//! 版本号变化后旧条目不再被识别，相当于整体失效。

use std::collections::BTreeMap;
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use regex::Regex;
use serde::Serialize;

use super::adapter::{estimate_size, KeyValueStore};
use crate::i18n::bundle::Bundle;
use crate::i18n::clock::Clock;
use crate::i18n::config::constants;
use crate::i18n::error::{helpers, I18nError, I18nResult};
use crate::i18n::fetcher::ResourceFetcher;
use crate::i18n::language::Language;

pub const CACHE_PREFIX: &str = "lang_cache_";
pub const CACHE_TIMESTAMP_PREFIX: &str = "lang_cache_timestamp_";
pub const CACHE_SIZE_PREFIX: &str = "lang_cache_size_";
pub const CACHE_VERSION: &str = "v1.1";

/// 缓存配置，构造后不再变化
#[derive(Debug, Clone, PartialEq)]
pub struct CacheOptions {
    pub ttl: Duration,
    pub max_bytes: u64,
    /// 命中时刷新写入时间，使淘汰顺序变为最近使用
    pub touch_on_read: bool,
}

impl Default for CacheOptions {
    fn default() -> Self {
        Self {
            ttl: constants::DEFAULT_CACHE_TTL,
            max_bytes: constants::DEFAULT_MAX_CACHE_BYTES,
            touch_on_read: false,
        }
    }
}

/// 缓存统计信息
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CacheStats {
    pub total_entries: usize,
    pub total_bytes: u64,
    pub by_language: BTreeMap<Language, Vec<String>>,
    pub max_bytes: u64,
    pub usage_percent: f64,
}

/// 存储中某个条目的元数据
#[derive(Debug, Clone)]
struct EntryMeta {
    language: Language,
    namespace: String,
    stored_at: Option<i64>,
    size: u64,
}

/// 语言资源缓存
pub struct ResourceCache {
    store: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
    options: CacheOptions,
}

fn payload_key(language: Language, namespace: &str) -> String {
    format!("{}{}_{}_{}", CACHE_PREFIX, language, namespace, CACHE_VERSION)
}

fn timestamp_key(language: Language, namespace: &str) -> String {
    format!("{}{}_{}_{}", CACHE_TIMESTAMP_PREFIX, language, namespace, CACHE_VERSION)
}

fn size_key(language: Language, namespace: &str) -> String {
    format!("{}{}_{}_{}", CACHE_SIZE_PREFIX, language, namespace, CACHE_VERSION)
}

fn payload_key_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| {
            let pattern = format!(
                r"^{}(zh|ja|en)_(.*)_{}$",
                regex::escape(CACHE_PREFIX),
                regex::escape(CACHE_VERSION)
            );
            Regex::new(&pattern).ok()
        })
        .as_ref()
}

/// 从资源包键中解析出语言和命名空间
fn parse_payload_key(key: &str) -> Option<(Language, String)> {
    let captures = payload_key_pattern()?.captures(key)?;
    let language = Language::from_code(captures.get(1)?.as_str())?;
    Some((language, captures.get(2)?.as_str().to_string()))
}

fn is_current_version_key(key: &str) -> bool {
    let suffix = format!("_{}", CACHE_VERSION);
    key.starts_with(CACHE_PREFIX) && key.ends_with(&suffix)
}

impl ResourceCache {
    pub fn new(store: Arc<dyn KeyValueStore>, clock: Arc<dyn Clock>, options: CacheOptions) -> Self {
        Self {
            store,
            clock,
            options,
        }
    }

    /// 获取缓存的资源包，过期、不完整或损坏的条目被清除并视为不存在
    pub fn get(&self, language: Language, namespace: &str) -> Option<Bundle> {
        match self.try_get(language, namespace) {
            Ok(bundle) => bundle,
            Err(error) => {
                helpers::log_error(&error.with_context(format!("读取 {}/{}", language, namespace)));
                None
            }
        }
    }

    fn try_get(&self, language: Language, namespace: &str) -> I18nResult<Option<Bundle>> {
        let stored_at = match self.read_timestamp(language, namespace)? {
            Some(stored_at) => stored_at,
            None => {
                // 没有时间戳：从未写入，或写入在资源包之后中断
                if self.store.get(&payload_key(language, namespace))?.is_some() {
                    tracing::warn!("发现不完整的缓存条目，已清除: {}/{}", language, namespace);
                    self.remove_entry(language, namespace)?;
                }
                tracing::debug!("缓存未命中: {}/{}", language, namespace);
                return Ok(None);
            }
        };

        if !self.is_fresh(stored_at) {
            tracing::debug!("缓存已过期，已清除: {}/{}", language, namespace);
            self.remove_entry(language, namespace)?;
            return Ok(None);
        }

        let Some(payload) = self.store.get(&payload_key(language, namespace))? else {
            self.remove_entry(language, namespace)?;
            return Ok(None);
        };

        let bundle = match Bundle::from_json(&payload) {
            Ok(bundle) => bundle,
            Err(error) => {
                tracing::warn!("缓存内容损坏，已清除: {}/{}: {}", language, namespace, error);
                self.remove_entry(language, namespace)?;
                return Ok(None);
            }
        };

        if self.options.touch_on_read {
            let now = self.clock.now_millis();
            self.store
                .set(&timestamp_key(language, namespace), &now.to_string())?;
        }

        tracing::debug!("缓存命中: {}/{} ({} 项)", language, namespace, bundle.len());
        Ok(Some(bundle))
    }

    /// 写入资源包
    ///
    /// 总大小将超出上限时，先清除过期条目，再按写入时间从旧到新淘汰。
    /// 单个资源包超过上限时不做任何修改，返回 `CacheWriteRejected`。
    pub fn set(&self, language: Language, namespace: &str, bundle: &Bundle) -> I18nResult<()> {
        let payload = bundle.to_json()?;
        let size = estimate_size(&payload);

        if size > self.options.max_bytes {
            tracing::warn!(
                "存储空间不足，无法缓存资源: {}/{} ({} > {} bytes)",
                language,
                namespace,
                size,
                self.options.max_bytes
            );
            return Err(I18nError::CacheWriteRejected {
                language: language.code().to_string(),
                namespace: namespace.to_string(),
                size,
                max: self.options.max_bytes,
            });
        }

        let others: Vec<EntryMeta> = self
            .entries()?
            .into_iter()
            .filter(|meta| !(meta.language == language && meta.namespace == namespace))
            .collect();
        self.make_room(others, size)?;

        // 顺序：资源包 -> 时间戳 -> 大小
        let now = self.clock.now_millis();
        self.store.set(&payload_key(language, namespace), &payload)?;
        self.store
            .set(&timestamp_key(language, namespace), &now.to_string())?;
        self.store
            .set(&size_key(language, namespace), &size.to_string())?;

        tracing::info!("语言资源已缓存: {}/{}, 大小: {} bytes", language, namespace, size);
        Ok(())
    }

    fn make_room(&self, mut others: Vec<EntryMeta>, incoming: u64) -> I18nResult<()> {
        let max = self.options.max_bytes;
        let mut total = others
            .iter()
            .fold(0u64, |sum, meta| sum.saturating_add(meta.size));
        if total.saturating_add(incoming) <= max {
            return Ok(());
        }

        // 先清除过期和不完整的条目
        let mut kept = Vec::with_capacity(others.len());
        for meta in others.drain(..) {
            let stale = meta.stored_at.map_or(true, |stored_at| !self.is_fresh(stored_at));
            if stale {
                self.remove_entry(meta.language, &meta.namespace)?;
                total = total.saturating_sub(meta.size);
            } else {
                kept.push(meta);
            }
        }

        kept.sort_by_key(|meta| meta.stored_at.unwrap_or(i64::MIN));

        let mut evicted = 0usize;
        for meta in kept {
            if total.saturating_add(incoming) <= max {
                break;
            }
            self.remove_entry(meta.language, &meta.namespace)?;
            total = total.saturating_sub(meta.size);
            evicted += 1;
            tracing::info!(
                "淘汰缓存条目: {}/{} ({} bytes)",
                meta.language,
                meta.namespace,
                meta.size
            );
        }

        if evicted > 0 {
            tracing::info!("为新条目腾出空间，共淘汰 {} 个条目", evicted);
        }
        Ok(())
    }

    /// 清除指定条目，条目不存在也视为成功
    pub fn invalidate(&self, language: Language, namespace: &str) {
        match self.remove_entry(language, namespace) {
            Ok(()) => tracing::info!("缓存已清除: {}/{}", language, namespace),
            Err(error) => helpers::log_error(&error),
        }
    }

    /// 清除当前版本的全部缓存条目，不影响其他持久化数据
    pub fn invalidate_all(&self) -> usize {
        let result = (|| -> I18nResult<usize> {
            let mut removed = 0;
            for key in self.store.keys()? {
                if !is_current_version_key(&key) {
                    continue;
                }
                if parse_payload_key(&key).is_some() {
                    removed += 1;
                }
                self.store.remove(&key)?;
            }
            Ok(removed)
        })();

        match result {
            Ok(removed) => {
                tracing::info!("所有语言缓存已清除: {} 个条目", removed);
                removed
            }
            Err(error) => {
                helpers::log_error(&error);
                0
            }
        }
    }

    /// 清除所有过期或不完整的条目，返回清除数量
    pub fn cleanup_expired(&self) -> usize {
        let result = (|| -> I18nResult<usize> {
            let mut removed = 0;
            for meta in self.entries()? {
                let stale = meta.stored_at.map_or(true, |stored_at| !self.is_fresh(stored_at));
                if stale {
                    self.remove_entry(meta.language, &meta.namespace)?;
                    removed += 1;
                }
            }
            Ok(removed)
        })();

        match result {
            Ok(removed) => {
                tracing::info!("清理了 {} 个过期缓存", removed);
                removed
            }
            Err(error) => {
                helpers::log_error(&error);
                0
            }
        }
    }

    /// 检查条目是否存在且未过期（不会清除任何内容）
    pub fn is_valid(&self, language: Language, namespace: &str) -> bool {
        match self.read_timestamp(language, namespace) {
            Ok(Some(stored_at)) => self.is_fresh(stored_at),
            Ok(None) => false,
            Err(error) => {
                helpers::log_error(&error);
                false
            }
        }
    }

    /// 统计信息
    pub fn stats(&self) -> CacheStats {
        let entries = helpers::contain(self.entries()).unwrap_or_default();

        let mut by_language: BTreeMap<Language, Vec<String>> = BTreeMap::new();
        let mut total_bytes: u64 = 0;
        for meta in &entries {
            total_bytes = total_bytes.saturating_add(meta.size);
            let namespaces = by_language.entry(meta.language).or_default();
            if !namespaces.contains(&meta.namespace) {
                namespaces.push(meta.namespace.clone());
            }
        }
        for namespaces in by_language.values_mut() {
            namespaces.sort();
        }

        let usage_percent = if self.options.max_bytes == 0 {
            0.0
        } else {
            total_bytes as f64 / self.options.max_bytes as f64 * 100.0
        };

        CacheStats {
            total_entries: entries.len(),
            total_bytes,
            by_language,
            max_bytes: self.options.max_bytes,
            usage_percent,
        }
    }

    /// 预载入：已有有效条目时直接返回，否则获取后写入缓存
    pub async fn preload(
        &self,
        language: Language,
        namespace: &str,
        fetcher: &dyn ResourceFetcher,
    ) -> bool {
        if self.is_valid(language, namespace) {
            tracing::debug!("语言资源已存在有效缓存: {}/{}", language, namespace);
            return true;
        }

        let stored = async {
            let bundle = fetcher.fetch(language, namespace).await?;
            self.set(language, namespace, &bundle)
        };
        helpers::contain(stored.await).is_some()
    }

    /// 时间戳无法计算年龄时视为过期
    fn is_fresh(&self, stored_at: i64) -> bool {
        let ttl = i64::try_from(self.options.ttl.as_millis()).unwrap_or(i64::MAX);
        match self.clock.now_millis().checked_sub(stored_at) {
            Some(age) => age < ttl,
            None => false,
        }
    }

    fn read_timestamp(&self, language: Language, namespace: &str) -> I18nResult<Option<i64>> {
        let raw = self.store.get(&timestamp_key(language, namespace))?;
        Ok(raw.and_then(|value| value.trim().parse::<i64>().ok()))
    }

    fn remove_entry(&self, language: Language, namespace: &str) -> I18nResult<()> {
        self.store.remove(&payload_key(language, namespace))?;
        self.store.remove(&timestamp_key(language, namespace))?;
        self.store.remove(&size_key(language, namespace))?;
        Ok(())
    }

    fn payload_size(&self, key: &str) -> I18nResult<u64> {
        Ok(self
            .store
            .get(key)?
            .map(|payload| estimate_size(&payload))
            .unwrap_or(0))
    }

    /// 扫描存储中当前版本的全部条目
    fn entries(&self) -> I18nResult<Vec<EntryMeta>> {
        let mut entries = Vec::new();
        for key in self.store.keys()? {
            let Some((language, namespace)) = parse_payload_key(&key) else {
                continue;
            };

            let mut stored_at = self.read_timestamp(language, &namespace)?;
            let recorded = match self.store.get(&size_key(language, &namespace))? {
                Some(raw) => Some(raw.trim().parse::<u64>().ok()),
                None => None,
            };
            // 大小无法解析或超过上限时不可能来自正常写入，按不完整条目处理
            let size = match recorded {
                Some(Some(size)) if size <= self.options.max_bytes => size,
                Some(_) => {
                    stored_at = None;
                    self.payload_size(&key)?
                }
                None => self.payload_size(&key)?,
            };

            entries.push(EntryMeta {
                language,
                namespace,
                stored_at,
                size,
            });
        }
        Ok(entries)
    }
}
