//! 语言切换
//!
//! 先载入常用命名空间再提交切换；多个切换交错时以最后开始的为准。

use std::sync::Arc;

use super::engine::TranslationEngine;
use super::loader::NamespaceLoader;
use crate::i18n::error::{I18nError, I18nResult};
use crate::i18n::language::Language;
use crate::i18n::storage::{LanguagePreferenceStore, PreferenceSync};

/// 切换结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwitchOutcome {
    /// 已切换到该语言
    Applied(Language),
    /// 期间有更新的切换开始，本次结果被丢弃
    Superseded { requested: Language, active: Language },
}

/// 语言切换器
pub struct LanguageSwitcher {
    engine: Arc<TranslationEngine>,
    loader: Arc<NamespaceLoader>,
    preferences: Arc<LanguagePreferenceStore>,
    sync: Option<Arc<dyn PreferenceSync>>,
}

impl LanguageSwitcher {
    pub fn new(loader: Arc<NamespaceLoader>, preferences: Arc<LanguagePreferenceStore>) -> Self {
        Self {
            engine: loader.engine().clone(),
            loader,
            preferences,
            sync: None,
        }
    }

    /// 切换成功后把偏好同步到服务器
    pub fn with_sync(mut self, sync: Arc<dyn PreferenceSync>) -> Self {
        self.sync = Some(sync);
        self
    }

    pub async fn switch_language(&self, code: &str) -> I18nResult<SwitchOutcome> {
        let Some(language) = Language::from_tag(code) else {
            tracing::warn!("不支持的语言代码: {}", code);
            return Err(I18nError::UnsupportedLanguage(code.to_string()));
        };

        let ticket = self.engine.begin_switch();

        // 载入失败时仍然切换，查找会走回退链
        if let Err(error) = self.loader.preload_common(language).await {
            tracing::warn!("切换语言时载入资源失败: {}", error);
        }

        if !self.engine.commit_switch(ticket, language) {
            let active = self.engine.active();
            tracing::debug!("语言切换被后续请求取代: {} (当前 {})", language, active);
            return Ok(SwitchOutcome::Superseded {
                requested: language,
                active,
            });
        }

        self.preferences
            .update(language.code(), self.sync.as_deref())
            .await;

        tracing::info!("语言已切换: {}", language);
        Ok(SwitchOutcome::Applied(language))
    }

    /// 启动时恢复保存的语言偏好，没有时使用 `fallback`
    pub async fn restore(&self, fallback: Language) -> Language {
        let language = self.preferences.read().unwrap_or(fallback);

        let ticket = self.engine.begin_switch();
        if let Err(error) = self.loader.preload_common(language).await {
            tracing::warn!("恢复语言时载入资源失败: {}", error);
        }
        self.engine.commit_switch(ticket, language);

        self.engine.active()
    }

    pub fn current_language(&self) -> Language {
        self.engine.active()
    }

    pub fn supported_languages(&self) -> &'static [Language] {
        &Language::ALL
    }
}
