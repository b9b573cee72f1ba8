//! 命名空间按需载入
//!
//! 记录哪些（语言，命名空间）已进入翻译引擎，缺失的先查缓存，再远程获取。

use std::sync::Arc;

use futures::future::join_all;
use serde::Serialize;

use super::engine::TranslationEngine;
use crate::i18n::config::{constants, predict_next_pages, role_namespaces};
use crate::i18n::error::{helpers, I18nError, I18nResult};
use crate::i18n::fetcher::ResourceFetcher;
use crate::i18n::language::Language;
use crate::i18n::storage::ResourceCache;

/// 命名空间可用性检查结果
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AvailabilityReport {
    /// 缓存中或引擎中已有
    pub available: Vec<String>,
    pub missing: Vec<String>,
    /// 缓存中有有效条目
    pub from_cache: Vec<String>,
    /// 只在引擎中，缓存里没有或已过期
    pub needs_load: Vec<String>,
}

/// 命名空间载入器
pub struct NamespaceLoader {
    engine: Arc<TranslationEngine>,
    cache: Arc<ResourceCache>,
    fetcher: Arc<dyn ResourceFetcher>,
}

impl NamespaceLoader {
    pub fn new(
        engine: Arc<TranslationEngine>,
        cache: Arc<ResourceCache>,
        fetcher: Arc<dyn ResourceFetcher>,
    ) -> Self {
        Self {
            engine,
            cache,
            fetcher,
        }
    }

    pub fn engine(&self) -> &Arc<TranslationEngine> {
        &self.engine
    }

    pub fn cache(&self) -> &Arc<ResourceCache> {
        &self.cache
    }

    /// 确保命名空间已载入
    ///
    /// 所有获取并发进行且全部完成后才返回；成功的部分保留在引擎中。
    pub async fn ensure_loaded(&self, language: Language, namespaces: &[&str]) -> I18nResult<()> {
        let mut pending: Vec<&str> = Vec::new();
        for &namespace in namespaces {
            if !self.engine.has_bundle(language, namespace) && !pending.contains(&namespace) {
                pending.push(namespace);
            }
        }

        if pending.is_empty() {
            return Ok(());
        }

        tracing::debug!("载入命名空间: {} {:?}", language, pending);

        let results = join_all(
            pending
                .iter()
                .map(|namespace| async move { (*namespace, self.load_one(language, namespace).await) }),
        )
        .await;

        let failed: Vec<(String, String)> = results
            .into_iter()
            .filter_map(|(namespace, result)| {
                result
                    .err()
                    .map(|error| (namespace.to_string(), error.to_string()))
            })
            .collect();

        if failed.is_empty() {
            Ok(())
        } else {
            let error = I18nError::LoadFailed {
                language: language.code().to_string(),
                failed,
            };
            tracing::warn!("{}", error);
            Err(error)
        }
    }

    async fn load_one(&self, language: Language, namespace: &str) -> I18nResult<()> {
        if let Some(bundle) = self.cache.get(language, namespace) {
            self.engine.add_bundle(language, namespace, &bundle);
            return Ok(());
        }

        let bundle = self.fetcher.fetch(language, namespace).await?;

        // 写缓存失败不影响本次使用
        if let Err(error) = self.cache.set(language, namespace, &bundle) {
            helpers::log_error(&error);
        }

        self.engine.add_bundle(language, namespace, &bundle);
        tracing::debug!("命名空间已载入: {}/{} ({} 项)", language, namespace, bundle.len());
        Ok(())
    }

    /// 载入常用命名空间
    pub async fn preload_common(&self, language: Language) -> I18nResult<()> {
        self.ensure_loaded(language, constants::COMMON_NAMESPACES).await
    }

    /// 为多种语言载入常用命名空间，返回全部成功的语言
    pub async fn preload_languages(&self, languages: &[Language]) -> Vec<Language> {
        let results = join_all(languages.iter().map(|language| async move {
            (*language, self.preload_common(*language).await)
        }))
        .await;

        results
            .into_iter()
            .filter_map(|(language, result)| match result {
                Ok(()) => Some(language),
                Err(error) => {
                    tracing::warn!("预载入语言失败 {}: {}", language, error);
                    None
                }
            })
            .collect()
    }

    /// 按角色载入命名空间
    pub async fn preload_role(&self, language: Language, role: &str) -> I18nResult<()> {
        self.ensure_loaded(language, role_namespaces(role)).await
    }

    /// 根据当前页面预测下一步并提前载入
    ///
    /// 常用命名空间总会载入；预测到的页面只有属于预载入页面集合时才载入。
    pub async fn smart_preload(&self, language: Language, page: &str) -> I18nResult<()> {
        let predicted = predict_next_pages(page);
        let mut namespaces: Vec<&str> = constants::COMMON_NAMESPACES.to_vec();
        namespaces.extend(
            predicted
                .iter()
                .copied()
                .filter(|next| constants::ANTICIPATED_NAMESPACES.contains(next)),
        );

        tracing::info!("智能预载入 - 当前页面: {}, 预测页面: {:?}", page, predicted);
        self.ensure_loaded(language, &namespaces).await
    }

    /// 检查命名空间是否已在缓存或引擎中，不触发任何载入
    pub fn check_availability(
        &self,
        language: Language,
        namespaces: &[&str],
    ) -> AvailabilityReport {
        let mut report = AvailabilityReport::default();
        for &namespace in namespaces {
            if self.cache.is_valid(language, namespace) {
                report.available.push(namespace.to_string());
                report.from_cache.push(namespace.to_string());
            } else if self.engine.has_bundle(language, namespace) {
                report.available.push(namespace.to_string());
                report.needs_load.push(namespace.to_string());
            } else {
                report.missing.push(namespace.to_string());
            }
        }
        report
    }

    pub fn is_namespace_loaded(&self, language: Language, namespace: &str) -> bool {
        self.engine.has_bundle(language, namespace)
    }
}
