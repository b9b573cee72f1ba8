//! 语言资源接口的HTTP客户端

use std::time::Duration;

use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::i18n::bundle::{BulkResource, Bundle};
use crate::i18n::config::I18nConfig;
use crate::i18n::core::MissingKeyEvent;
use crate::i18n::error::{I18nError, I18nResult};
use crate::i18n::fetcher::ResourceFetcher;
use crate::i18n::language::Language;
use crate::i18n::storage::PreferenceSync;

pub const RESOURCES_PATH: &str = "/api/languages/resources";
pub const SETTINGS_PATH: &str = "/api/languages/settings";
pub const BULK_IMPORT_PATH: &str = "/api/admin/languages/resources/bulk";
pub const MISSING_PATH: &str = "/api/languages/missing";

#[derive(Debug, Serialize)]
struct SettingsRequest<'a> {
    language_code: &'a str,
}

#[derive(Debug, Deserialize)]
struct BulkImportResponse {
    created_count: usize,
}

/// 语言资源接口客户端
#[derive(Debug, Clone)]
pub struct HttpResourceClient {
    client: reqwest::Client,
    base_url: String,
}

impl HttpResourceClient {
    pub fn new(base_url: &str, timeout: Duration) -> I18nResult<Self> {
        let parsed = url::Url::parse(base_url)
            .map_err(|e| I18nError::ConfigError(format!("无效的API地址 {}: {}", base_url, e)))?;

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| I18nError::ConfigError(format!("创建HTTP客户端失败: {}", e)))?;

        Ok(Self {
            client,
            base_url: parsed.as_str().trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &I18nConfig) -> I18nResult<Self> {
        Self::new(&config.api_base_url, config.request_timeout())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// 获取某语言某命名空间的资源
    pub async fn fetch_resources(&self, language: Language, namespace: &str) -> I18nResult<Bundle> {
        let response = self
            .client
            .get(self.endpoint(RESOURCES_PATH))
            .query(&[("lang", language.code()), ("namespace", namespace)])
            .send()
            .await?
            .error_for_status()?;

        let body: Value = response.json().await?;
        parse_resources(&body)
    }

    /// 把语言偏好保存到服务器
    pub async fn update_settings(&self, language: Language) -> I18nResult<()> {
        self.client
            .put(self.endpoint(SETTINGS_PATH))
            .json(&SettingsRequest {
                language_code: language.code(),
            })
            .send()
            .await?
            .error_for_status()?;

        tracing::debug!("语言偏好已同步到服务器: {}", language);
        Ok(())
    }

    /// 批量导入资源，返回服务器创建的条数
    pub async fn bulk_import(&self, resources: &[BulkResource]) -> I18nResult<usize> {
        if resources.is_empty() {
            return Ok(0);
        }

        let response = self
            .client
            .post(self.endpoint(BULK_IMPORT_PATH))
            .json(resources)
            .send()
            .await?
            .error_for_status()?;

        let body: BulkImportResponse = response.json().await?;
        tracing::info!("批量导入完成: 提交 {} 条, 创建 {} 条", resources.len(), body.created_count);
        Ok(body.created_count)
    }

    /// 上报缺失翻译
    pub async fn report_missing(&self, event: &MissingKeyEvent) -> I18nResult<()> {
        self.client
            .post(self.endpoint(MISSING_PATH))
            .json(event)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}

/// 解析资源响应，同时接受裸键值对象和 `{lang, namespace, resources}` 信封
pub fn parse_resources(body: &Value) -> I18nResult<Bundle> {
    if let Some(object) = body.as_object() {
        let is_envelope = object.get("resources").is_some_and(Value::is_object)
            && (object.contains_key("lang") || object.contains_key("namespace"));
        if is_envelope {
            return Bundle::from_value(&object["resources"]);
        }
    }
    Bundle::from_value(body)
}

impl ResourceFetcher for HttpResourceClient {
    fn fetch<'a>(
        &'a self,
        language: Language,
        namespace: &'a str,
    ) -> BoxFuture<'a, I18nResult<Bundle>> {
        Box::pin(async move {
            self.fetch_resources(language, namespace)
                .await
                .map_err(|error| I18nError::FetchFailed {
                    language: language.code().to_string(),
                    namespace: namespace.to_string(),
                    reason: error.to_string(),
                })
        })
    }
}

impl PreferenceSync for HttpResourceClient {
    fn sync(&self, language: Language) -> BoxFuture<'_, I18nResult<()>> {
        Box::pin(self.update_settings(language))
    }
}
