//! 语言偏好存储
//!
//! 保存用户最后一次明确选择的语言及其过期时间，与资源缓存互不影响。

use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;

use super::adapter::KeyValueStore;
use crate::i18n::clock::Clock;
use crate::i18n::config::constants;
use crate::i18n::error::{helpers, I18nError, I18nResult};
use crate::i18n::language::Language;

pub const LANGUAGE_PREFERENCE_KEY: &str = "selectedLanguage";
pub const LANGUAGE_PREFERENCE_EXPIRY_KEY: &str = "selectedLanguageExpiry";

/// 把语言偏好同步到服务器
pub trait PreferenceSync: Send + Sync {
    fn sync(&self, language: Language) -> BoxFuture<'_, I18nResult<()>>;
}

/// 语言偏好存储
pub struct LanguagePreferenceStore {
    store: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
    expiry: Duration,
}

impl LanguagePreferenceStore {
    pub fn new(store: Arc<dyn KeyValueStore>, clock: Arc<dyn Clock>) -> Self {
        Self::with_expiry(store, clock, constants::DEFAULT_PREFERENCE_EXPIRY)
    }

    pub fn with_expiry(store: Arc<dyn KeyValueStore>, clock: Arc<dyn Clock>, expiry: Duration) -> Self {
        Self {
            store,
            clock,
            expiry,
        }
    }

    /// 保存语言偏好，不支持的语言代码不会写入
    pub fn store(&self, code: &str) -> I18nResult<Language> {
        let Some(language) = Language::from_code(code) else {
            tracing::warn!("不支持的语言代码: {}", code);
            return Err(I18nError::UnsupportedLanguage(code.to_string()));
        };

        let expires_at = self.clock.now_millis() + self.expiry.as_millis() as i64;
        self.store.set(LANGUAGE_PREFERENCE_KEY, language.code())?;
        self.store
            .set(LANGUAGE_PREFERENCE_EXPIRY_KEY, &expires_at.to_string())?;

        tracing::info!("语言偏好已存储: {}", language);
        Ok(language)
    }

    /// 读取语言偏好，过期时清除并返回 `None`
    pub fn read(&self) -> Option<Language> {
        match self.try_read() {
            Ok(language) => language,
            Err(error) => {
                helpers::log_error(&error);
                None
            }
        }
    }

    fn try_read(&self) -> I18nResult<Option<Language>> {
        if let Some(raw) = self.store.get(LANGUAGE_PREFERENCE_EXPIRY_KEY)? {
            let expired = match raw.trim().parse::<i64>() {
                Ok(expires_at) => self.clock.now_millis() > expires_at,
                Err(_) => true,
            };
            if expired {
                tracing::debug!("语言偏好已过期");
                self.clear();
                return Ok(None);
            }
        }

        let stored = self.store.get(LANGUAGE_PREFERENCE_KEY)?;
        Ok(stored.as_deref().and_then(Language::from_code))
    }

    /// 清除语言偏好
    pub fn clear(&self) {
        let result = self
            .store
            .remove(LANGUAGE_PREFERENCE_KEY)
            .and_then(|_| self.store.remove(LANGUAGE_PREFERENCE_EXPIRY_KEY));

        match result {
            Ok(()) => tracing::debug!("语言偏好已清除"),
            Err(error) => helpers::log_error(&error),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.read().is_some()
    }

    /// 更新语言偏好：先写本地，再尝试同步到服务器
    ///
    /// 同步失败只记录日志，不影响返回值。
    pub async fn update(&self, code: &str, sync: Option<&dyn PreferenceSync>) -> bool {
        let language = match self.store(code) {
            Ok(language) => language,
            Err(I18nError::UnsupportedLanguage(_)) => return false,
            Err(error) => {
                // 本地存储不可用时仍然尝试远程同步
                helpers::log_error(&error);
                match Language::from_code(code) {
                    Some(language) => language,
                    None => return false,
                }
            }
        };

        if let Some(sync) = sync {
            if let Err(error) = sync.sync(language).await {
                tracing::warn!("语言偏好同步到服务器失败: {}", error);
            }
        }

        true
    }
}
