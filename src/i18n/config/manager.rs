//! 配置管理器
//!
//! 合并默认值、配置文件与环境变量，最后统一校验。

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::constants;
use crate::i18n::error::{I18nError, I18nResult};
use crate::i18n::language::Language;
use crate::i18n::storage::CacheOptions;

/// 运行配置
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct I18nConfig {
    // 远程接口
    pub api_base_url: String,
    pub request_timeout_secs: u64,
    pub report_missing: bool,

    // 缓存
    pub cache_ttl_secs: u64,
    pub max_cache_bytes: u64,
    pub touch_on_read: bool,

    // 语言偏好
    pub default_language: Language,
    pub preference_expiry_hours: u64,

    // 本地存储
    pub storage_path: String,
}

impl Default for I18nConfig {
    fn default() -> Self {
        Self {
            api_base_url: constants::DEFAULT_API_URL.to_string(),
            request_timeout_secs: constants::DEFAULT_REQUEST_TIMEOUT.as_secs(),
            report_missing: true,

            cache_ttl_secs: constants::DEFAULT_CACHE_TTL.as_secs(),
            max_cache_bytes: constants::DEFAULT_MAX_CACHE_BYTES,
            touch_on_read: false,

            default_language: Language::DEFAULT,
            preference_expiry_hours: constants::DEFAULT_PREFERENCE_EXPIRY.as_secs() / 3600,

            storage_path: constants::DEFAULT_STORAGE_PATH.to_string(),
        }
    }
}

impl I18nConfig {
    /// 验证配置
    pub fn validate(&self) -> I18nResult<()> {
        if self.cache_ttl_secs == 0 {
            return Err(I18nError::ConfigError("缓存TTL不能为0".to_string()));
        }

        if self.max_cache_bytes == 0 {
            return Err(I18nError::ConfigError("缓存容量上限不能为0".to_string()));
        }

        if self.preference_expiry_hours == 0 {
            return Err(I18nError::ConfigError("语言偏好有效期不能为0".to_string()));
        }

        if self.request_timeout_secs == 0 {
            return Err(I18nError::ConfigError("请求超时不能为0".to_string()));
        }

        url::Url::parse(&self.api_base_url).map_err(|e| {
            I18nError::ConfigError(format!("无效的API地址 {}: {}", self.api_base_url, e))
        })?;

        if self.storage_path.trim().is_empty() {
            return Err(I18nError::ConfigError("存储路径不能为空".to_string()));
        }

        Ok(())
    }

    /// 应用环境变量覆盖，只处理显式设置的变量
    pub fn apply_env_overrides(&mut self) {
        use crate::env::{cache, core, remote, EnvVar};

        fn take<T>(name: &str, value: Option<crate::env::EnvResult<T>>) -> Option<T> {
            match value? {
                Ok(value) => Some(value),
                Err(e) => {
                    tracing::warn!("忽略无效的环境变量 {}: {}", name, e);
                    None
                }
            }
        }

        if let Some(url) = take(remote::ApiUrl::NAME, remote::ApiUrl::get_explicit()) {
            self.api_base_url = url;
            tracing::info!("环境变量覆盖 API URL: {}", self.api_base_url);
        }

        if let Some(timeout) = take(
            remote::RequestTimeout::NAME,
            remote::RequestTimeout::get_explicit(),
        ) {
            self.request_timeout_secs = timeout.as_secs();
        }

        if let Some(report) = take(
            remote::ReportMissing::NAME,
            remote::ReportMissing::get_explicit(),
        ) {
            self.report_missing = report;
        }

        if let Some(ttl) = take(cache::Ttl::NAME, cache::Ttl::get_explicit()) {
            self.cache_ttl_secs = ttl.as_secs();
        }

        if let Some(max) = take(cache::MaxBytes::NAME, cache::MaxBytes::get_explicit()) {
            self.max_cache_bytes = max;
        }

        if let Some(touch) = take(cache::TouchOnRead::NAME, cache::TouchOnRead::get_explicit()) {
            self.touch_on_read = touch;
        }

        if let Some(hours) = take(
            cache::PreferenceExpiryHours::NAME,
            cache::PreferenceExpiryHours::get_explicit(),
        ) {
            self.preference_expiry_hours = hours;
        }

        if let Some(code) = take(core::DefaultLang::NAME, core::DefaultLang::get_explicit()) {
            if let Some(language) = Language::from_code(&code) {
                self.default_language = language;
            }
        }

        if let Some(path) = take(core::StoragePath::NAME, core::StoragePath::get_explicit()) {
            self.storage_path = path;
        }
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn preference_expiry(&self) -> Duration {
        Duration::from_secs(self.preference_expiry_hours * 3600)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// 展开 `~` 后的存储路径
    pub fn resolved_storage_path(&self) -> String {
        shellexpand::tilde(&self.storage_path).into_owned()
    }

    pub fn cache_options(&self) -> CacheOptions {
        CacheOptions {
            ttl: self.cache_ttl(),
            max_bytes: self.max_cache_bytes,
            touch_on_read: self.touch_on_read,
        }
    }
}

/// 配置管理器
pub struct ConfigManager {
    config: I18nConfig,
}

impl ConfigManager {
    /// 按搜索路径加载配置
    pub fn new() -> I18nResult<Self> {
        Self::load_dotenv();
        let config = Self::load_config()?;
        Self::finish(config)
    }

    /// 从指定文件加载配置
    pub fn from_path(path: &str) -> I18nResult<Self> {
        Self::load_dotenv();
        let expanded = shellexpand::tilde(path);
        tracing::info!("加载配置文件: {}", expanded);
        let config = Self::load_from_file(&expanded)?;
        Self::finish(config)
    }

    fn finish(mut config: I18nConfig) -> I18nResult<Self> {
        config.apply_env_overrides();
        config.validate()?;
        Ok(Self { config })
    }

    /// 获取配置
    pub fn get_config(&self) -> &I18nConfig {
        &self.config
    }

    pub fn into_config(self) -> I18nConfig {
        self.config
    }

    fn load_config() -> I18nResult<I18nConfig> {
        for path in constants::CONFIG_PATHS {
            let expanded_path = shellexpand::tilde(path);
            if Path::new(expanded_path.as_ref()).exists() {
                tracing::info!("加载配置文件: {}", expanded_path);
                return Self::load_from_file(&expanded_path);
            }
        }

        tracing::info!("未找到配置文件，使用默认配置");
        Ok(I18nConfig::default())
    }

    fn load_from_file(path: &str) -> I18nResult<I18nConfig> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| I18nError::ConfigError(format!("读取配置文件失败: {}", e)))?;

        if path.ends_with(".json") {
            serde_json::from_str(&content)
                .map_err(|e| I18nError::ConfigError(format!("解析JSON配置失败: {}", e)))
        } else {
            toml::from_str(&content)
                .map_err(|e| I18nError::ConfigError(format!("解析TOML配置失败: {}", e)))
        }
    }

    /// 加载 .env 文件
    /// 加载第一个存在的环境变量文件，已设置的变量不会被覆盖
    pub fn load_dotenv() -> Option<&'static str> {
        const ENV_FILES: [&str; 4] = [".env.local", ".env.development", ".env.production", ".env"];

        let loaded = ENV_FILES
            .into_iter()
            .find(|env_file| Path::new(env_file).exists() && dotenv::from_filename(env_file).is_ok());
        if let Some(env_file) = loaded {
            tracing::info!("已加载环境变量文件: {}", env_file);
        }
        loaded
    }

    /// 生成示例配置文件
    pub fn generate_example_config(path: &str) -> I18nResult<()> {
        let config = I18nConfig::default();
        let content = toml::to_string_pretty(&config)
            .map_err(|e| I18nError::ConfigError(format!("序列化配置失败: {}", e)))?;

        std::fs::write(path, content)
            .map_err(|e| I18nError::ConfigError(format!("写入配置文件失败: {}", e)))?;

        Ok(())
    }
}
