//! 远程资源获取接口
//!
//! 加载器和缓存预载入只依赖这个接口，HTTP实现位于 `network` 模块。

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::RwLock;

use futures::future::{self, BoxFuture};

use super::bundle::Bundle;
use super::error::{I18nError, I18nResult};
use super::language::Language;

/// 按（语言，命名空间）获取资源包
pub trait ResourceFetcher: Send + Sync {
    fn fetch<'a>(&'a self, language: Language, namespace: &'a str)
        -> BoxFuture<'a, I18nResult<Bundle>>;
}

/// 内存中的固定资源，可从本地目录载入
///
/// 目录结构为 `{dir}/{lang}/{namespace}.json`。
#[derive(Debug, Default)]
pub struct StaticFetcher {
    bundles: RwLock<HashMap<(Language, String), Bundle>>,
    failures: RwLock<HashSet<(Language, String)>>,
    calls: AtomicUsize,
}

impl StaticFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// 从本地目录载入全部资源包
    pub fn from_dir(dir: impl AsRef<Path>) -> I18nResult<Self> {
        let fetcher = Self::new();
        let dir = dir.as_ref();

        for language in Language::ALL {
            let lang_dir = dir.join(language.code());
            if !lang_dir.is_dir() {
                continue;
            }

            for entry in std::fs::read_dir(&lang_dir)? {
                let path = entry?.path();
                if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
                    continue;
                }
                let Some(namespace) = path.file_stem().and_then(|stem| stem.to_str()) else {
                    continue;
                };

                let content = std::fs::read_to_string(&path)?;
                let bundle = Bundle::from_json(&content)
                    .map_err(|e| e.with_context(path.display()))?;
                tracing::debug!("载入本地资源: {}/{} ({} 项)", language, namespace, bundle.len());
                fetcher.insert(language, namespace, bundle);
            }
        }

        Ok(fetcher)
    }

    pub fn insert(&self, language: Language, namespace: &str, bundle: Bundle) {
        if let Ok(mut bundles) = self.bundles.write() {
            bundles.insert((language, namespace.to_string()), bundle);
        }
    }

    /// 让指定命名空间的获取总是失败
    pub fn fail(&self, language: Language, namespace: &str) {
        if let Ok(mut failures) = self.failures.write() {
            failures.insert((language, namespace.to_string()));
        }
    }

    /// 已发生的获取次数
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn lookup(&self, language: Language, namespace: &str) -> I18nResult<Bundle> {
        let key = (language, namespace.to_string());
        let failed = self
            .failures
            .read()
            .map(|failures| failures.contains(&key))
            .unwrap_or(false);
        if failed {
            return Err(I18nError::FetchFailed {
                language: language.code().to_string(),
                namespace: namespace.to_string(),
                reason: "模拟失败".to_string(),
            });
        }

        self.bundles
            .read()
            .ok()
            .and_then(|bundles| bundles.get(&key).cloned())
            .ok_or_else(|| I18nError::FetchFailed {
                language: language.code().to_string(),
                namespace: namespace.to_string(),
                reason: "资源不存在".to_string(),
            })
    }
}

impl ResourceFetcher for StaticFetcher {
    fn fetch<'a>(
        &'a self,
        language: Language,
        namespace: &'a str,
    ) -> BoxFuture<'a, I18nResult<Bundle>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Box::pin(future::ready(self.lookup(language, namespace)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_static_fetcher_serves_and_fails() {
        let fetcher = StaticFetcher::new();
        fetcher.insert(Language::En, "common", [("hello", "Hello")].into_iter().collect());
        fetcher.fail(Language::Zh, "common");

        let bundle = fetcher.fetch(Language::En, "common").await.unwrap();
        assert_eq!(bundle.get("hello"), Some("Hello"));

        assert!(matches!(
            fetcher.fetch(Language::Zh, "common").await,
            Err(I18nError::FetchFailed { .. })
        ));
        assert!(fetcher.fetch(Language::Ja, "common").await.is_err());
        assert_eq!(fetcher.call_count(), 3);
    }

    #[tokio::test]
    async fn test_from_dir_reads_nested_json() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("ja")).unwrap();
        std::fs::write(
            dir.path().join("ja").join("common.json"),
            r#"{"greeting": {"hello": "こんにちは"}}"#,
        )
        .unwrap();
        std::fs::write(dir.path().join("ja").join("notes.txt"), "ignored").unwrap();

        let fetcher = StaticFetcher::from_dir(dir.path()).unwrap();
        let bundle = fetcher.fetch(Language::Ja, "common").await.unwrap();
        assert_eq!(bundle.get("greeting.hello"), Some("こんにちは"));
    }
}
