//! 统一的环境变量管理系统
//!
//! 提供类型安全、可验证的环境变量读取，所有变量以 `I18N_CACHE_` 开头。

use std::env;
use std::fmt;
use std::time::Duration;

/// 环境变量解析错误
#[derive(Debug, Clone)]
pub struct EnvError {
    pub variable: String,
    pub message: String,
}

impl fmt::Display for EnvError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Environment variable '{}': {}", self.variable, self.message)
    }
}

impl std::error::Error for EnvError {}

pub type EnvResult<T> = Result<T, EnvError>;

/// 环境变量访问器特性
pub trait EnvVar<T> {
    const NAME: &'static str;
    const DEFAULT: Option<T>;
    const DESCRIPTION: &'static str;

    fn parse(value: &str) -> EnvResult<T>;

    fn get() -> EnvResult<T> {
        match env::var(Self::NAME) {
            Ok(value) => Self::parse(&value),
            Err(_) => {
                if let Some(default) = Self::DEFAULT {
                    Ok(default)
                } else {
                    Err(EnvError {
                        variable: Self::NAME.to_string(),
                        message: "Required environment variable not set".to_string(),
                    })
                }
            }
        }
    }

    /// 只在变量被显式设置时返回值，用于覆盖配置文件
    fn get_explicit() -> Option<EnvResult<T>> {
        env::var(Self::NAME).ok().map(|value| Self::parse(&value))
    }
}

/// 核心环境变量定义
pub mod core {
    use super::*;

    /// 日志级别
    pub struct LogLevel;
    impl EnvVar<String> for LogLevel {
        const NAME: &'static str = "I18N_CACHE_LOG_LEVEL";
        const DEFAULT: Option<String> = None;
        const DESCRIPTION: &'static str = "Log level: trace, debug, info, warn, error";

        fn get() -> EnvResult<String> {
            match env::var(Self::NAME) {
                Ok(value) => Self::parse(&value),
                Err(_) => Ok("info".to_string()),
            }
        }

        fn parse(value: &str) -> EnvResult<String> {
            match value.to_lowercase().as_str() {
                "trace" | "debug" | "info" | "warn" | "error" => Ok(value.to_lowercase()),
                _ => Err(EnvError {
                    variable: Self::NAME.to_string(),
                    message: format!(
                        "Invalid log level '{}'. Use: trace, debug, info, warn, error",
                        value
                    ),
                }),
            }
        }
    }

    /// 默认语言
    pub struct DefaultLang;
    impl EnvVar<String> for DefaultLang {
        const NAME: &'static str = "I18N_CACHE_DEFAULT_LANG";
        const DEFAULT: Option<String> = None;
        const DESCRIPTION: &'static str = "Default language code (zh, ja, en)";

        fn get() -> EnvResult<String> {
            match env::var(Self::NAME) {
                Ok(value) => Self::parse(&value),
                Err(_) => Ok("ja".to_string()),
            }
        }

        fn parse(value: &str) -> EnvResult<String> {
            let lang = value.trim().to_lowercase();
            match lang.as_str() {
                "zh" | "ja" | "en" => Ok(lang),
                _ => Err(EnvError {
                    variable: Self::NAME.to_string(),
                    message: format!("Unsupported language '{}'. Use: zh, ja, en", value),
                }),
            }
        }
    }

    /// 本地存储文件路径
    pub struct StoragePath;
    impl EnvVar<String> for StoragePath {
        const NAME: &'static str = "I18N_CACHE_STORAGE_PATH";
        const DEFAULT: Option<String> = None;
        const DESCRIPTION: &'static str = "Path of the on-disk store (supports ~)";

        fn get() -> EnvResult<String> {
            match env::var(Self::NAME) {
                Ok(value) => Self::parse(&value),
                Err(_) => Ok("~/.cache/i18n-cache/store.redb".to_string()),
            }
        }

        fn parse(value: &str) -> EnvResult<String> {
            let path = value.trim();
            if path.is_empty() {
                return Err(EnvError {
                    variable: Self::NAME.to_string(),
                    message: "Path cannot be empty".to_string(),
                });
            }
            Ok(path.to_string())
        }
    }
}

/// 远程接口相关环境变量
pub mod remote {
    use super::*;

    /// API 基础地址
    pub struct ApiUrl;
    impl EnvVar<String> for ApiUrl {
        const NAME: &'static str = "I18N_CACHE_API_URL";
        const DEFAULT: Option<String> = None;
        const DESCRIPTION: &'static str = "Base URL of the language resource API";

        fn get() -> EnvResult<String> {
            match env::var(Self::NAME) {
                Ok(value) => Self::parse(&value),
                Err(_) => Ok("http://localhost:8000".to_string()),
            }
        }

        fn parse(value: &str) -> EnvResult<String> {
            let url = value.trim();
            if url.starts_with("http://") || url.starts_with("https://") {
                Ok(url.trim_end_matches('/').to_string())
            } else {
                Err(EnvError {
                    variable: Self::NAME.to_string(),
                    message: "API URL must start with http:// or https://".to_string(),
                })
            }
        }
    }

    /// 请求超时
    pub struct RequestTimeout;
    impl EnvVar<Duration> for RequestTimeout {
        const NAME: &'static str = "I18N_CACHE_REQUEST_TIMEOUT";
        const DEFAULT: Option<Duration> = Some(Duration::from_secs(10));
        const DESCRIPTION: &'static str = "HTTP request timeout in seconds";

        fn parse(value: &str) -> EnvResult<Duration> {
            let seconds = parse_positive_u64(value, Self::NAME, 1, 300)?;
            Ok(Duration::from_secs(seconds))
        }
    }

    /// 缺失翻译上报
    pub struct ReportMissing;
    impl EnvVar<bool> for ReportMissing {
        const NAME: &'static str = "I18N_CACHE_REPORT_MISSING";
        const DEFAULT: Option<bool> = Some(true);
        const DESCRIPTION: &'static str = "Send missing-translation beacons";

        fn parse(value: &str) -> EnvResult<bool> {
            parse_bool(value, Self::NAME)
        }
    }
}

/// 缓存相关环境变量
pub mod cache {
    use super::*;

    /// 缓存TTL
    pub struct Ttl;
    impl EnvVar<Duration> for Ttl {
        const NAME: &'static str = "I18N_CACHE_TTL";
        const DEFAULT: Option<Duration> = Some(Duration::from_secs(24 * 3600));
        const DESCRIPTION: &'static str = "Cache TTL in seconds";

        fn parse(value: &str) -> EnvResult<Duration> {
            let seconds: u64 = value.parse().map_err(|_| EnvError {
                variable: Self::NAME.to_string(),
                message: "Must be a valid number of seconds".to_string(),
            })?;

            if seconds < 60 {
                return Err(EnvError {
                    variable: Self::NAME.to_string(),
                    message: "TTL too short (minimum 60 seconds)".to_string(),
                });
            }

            if seconds > 86400 * 30 {
                return Err(EnvError {
                    variable: Self::NAME.to_string(),
                    message: "TTL too long (maximum 30 days)".to_string(),
                });
            }

            Ok(Duration::from_secs(seconds))
        }
    }

    /// 缓存容量上限
    pub struct MaxBytes;
    impl EnvVar<u64> for MaxBytes {
        const NAME: &'static str = "I18N_CACHE_MAX_BYTES";
        const DEFAULT: Option<u64> = Some(10 * 1024 * 1024);
        const DESCRIPTION: &'static str = "Cache size budget in bytes";

        fn parse(value: &str) -> EnvResult<u64> {
            parse_positive_u64(value, Self::NAME, 1024, 1024 * 1024 * 1024)
        }
    }

    /// 读取时刷新时间戳
    pub struct TouchOnRead;
    impl EnvVar<bool> for TouchOnRead {
        const NAME: &'static str = "I18N_CACHE_TOUCH_ON_READ";
        const DEFAULT: Option<bool> = Some(false);
        const DESCRIPTION: &'static str = "Refresh an entry's timestamp on every cache hit";

        fn parse(value: &str) -> EnvResult<bool> {
            parse_bool(value, Self::NAME)
        }
    }

    /// 语言偏好有效期
    pub struct PreferenceExpiryHours;
    impl EnvVar<u64> for PreferenceExpiryHours {
        const NAME: &'static str = "I18N_CACHE_PREFERENCE_EXPIRY_HOURS";
        const DEFAULT: Option<u64> = Some(720);
        const DESCRIPTION: &'static str = "Language preference lifetime in hours";

        fn parse(value: &str) -> EnvResult<u64> {
            parse_positive_u64(value, Self::NAME, 1, 24 * 365)
        }
    }
}

/// 辅助函数
fn parse_bool(value: &str, var_name: &str) -> EnvResult<bool> {
    match value.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" | "enabled" => Ok(true),
        "false" | "0" | "no" | "off" | "disabled" => Ok(false),
        _ => Err(EnvError {
            variable: var_name.to_string(),
            message: format!(
                "Invalid boolean value '{}'. Use: true/false, 1/0, yes/no, on/off, enabled/disabled",
                value
            ),
        }),
    }
}

fn parse_positive_u64(value: &str, var_name: &str, min: u64, max: u64) -> EnvResult<u64> {
    let num: u64 = value.trim().parse().map_err(|_| EnvError {
        variable: var_name.to_string(),
        message: "Must be a valid positive number".to_string(),
    })?;

    if num < min {
        return Err(EnvError {
            variable: var_name.to_string(),
            message: format!("Value {} is below minimum {}", num, min),
        });
    }

    if num > max {
        return Err(EnvError {
            variable: var_name.to_string(),
            message: format!("Value {} exceeds maximum {}", num, max),
        });
    }

    Ok(num)
}

/// 生成环境变量文档
pub fn generate_env_docs() -> String {
    let mut docs = String::new();
    docs.push_str("# Environment Variables\n\n");

    docs.push_str("## Core Configuration\n\n");
    docs.push_str(&format!(
        "- `{}`: {} (default: info)\n",
        core::LogLevel::NAME,
        core::LogLevel::DESCRIPTION
    ));
    docs.push_str(&format!(
        "- `{}`: {} (default: ja)\n",
        core::DefaultLang::NAME,
        core::DefaultLang::DESCRIPTION
    ));
    docs.push_str(&format!(
        "- `{}`: {} (default: ~/.cache/i18n-cache/store.redb)\n",
        core::StoragePath::NAME,
        core::StoragePath::DESCRIPTION
    ));

    docs.push_str("\n## Remote API Configuration\n\n");
    docs.push_str(&format!(
        "- `{}`: {} (default: http://localhost:8000)\n",
        remote::ApiUrl::NAME,
        remote::ApiUrl::DESCRIPTION
    ));
    docs.push_str(&format!(
        "- `{}`: {} (default: {:?})\n",
        remote::RequestTimeout::NAME,
        remote::RequestTimeout::DESCRIPTION,
        remote::RequestTimeout::DEFAULT
    ));
    docs.push_str(&format!(
        "- `{}`: {} (default: {:?})\n",
        remote::ReportMissing::NAME,
        remote::ReportMissing::DESCRIPTION,
        remote::ReportMissing::DEFAULT
    ));

    docs.push_str("\n## Cache Configuration\n\n");
    docs.push_str(&format!(
        "- `{}`: {} (default: {:?})\n",
        cache::Ttl::NAME,
        cache::Ttl::DESCRIPTION,
        cache::Ttl::DEFAULT
    ));
    docs.push_str(&format!(
        "- `{}`: {} (default: {:?})\n",
        cache::MaxBytes::NAME,
        cache::MaxBytes::DESCRIPTION,
        cache::MaxBytes::DEFAULT
    ));
    docs.push_str(&format!(
        "- `{}`: {} (default: {:?})\n",
        cache::TouchOnRead::NAME,
        cache::TouchOnRead::DESCRIPTION,
        cache::TouchOnRead::DEFAULT
    ));
    docs.push_str(&format!(
        "- `{}`: {} (default: {:?})\n",
        cache::PreferenceExpiryHours::NAME,
        cache::PreferenceExpiryHours::DESCRIPTION,
        cache::PreferenceExpiryHours::DEFAULT
    ));

    docs
}
