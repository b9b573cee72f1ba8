//! 多语言模块统一错误处理
//!
//! 缓存和存储层的错误在本地消化（记录日志后降级），
//! 只有加载、切换语言和远程调用会把类型化的错误返回给调用方。

use std::fmt;

use thiserror::Error;

/// 多语言错误类型
#[derive(Error, Debug, Clone, PartialEq)]
pub enum I18nError {
    /// 淘汰后仍然没有足够空间，写入被放弃
    #[error("缓存写入被拒绝: {language}/{namespace} 需要 {size} 字节, 上限 {max} 字节")]
    CacheWriteRejected {
        language: String,
        namespace: String,
        size: u64,
        max: u64,
    },

    /// 底层持久化存储不可用（配额、隐私模式等）
    #[error("存储不可用: {0}")]
    StorageUnavailable(String),

    /// 远程资源获取失败
    #[error("获取资源失败: {language}/{namespace}: {reason}")]
    FetchFailed {
        language: String,
        namespace: String,
        reason: String,
    },

    /// 不支持的语言代码
    #[error("不支持的语言代码: {0}")]
    UnsupportedLanguage(String),

    /// 缓存或远程返回的JSON无法解析
    #[error("解析错误: {0}")]
    ParseError(String),

    /// 部分命名空间加载失败
    #[error("命名空间加载失败 ({language}): {}", format_failures(.failed))]
    LoadFailed {
        language: String,
        failed: Vec<(String, String)>,
    },

    /// 配置错误
    #[error("配置错误: {0}")]
    ConfigError(String),

    /// 网络错误
    #[error("网络错误: {0}")]
    NetworkError(String),
}

fn format_failures(failed: &[(String, String)]) -> String {
    failed
        .iter()
        .map(|(ns, reason)| format!("{}: {}", ns, reason))
        .collect::<Vec<_>>()
        .join("; ")
}

impl I18nError {
    /// 检查错误是否可重试
    pub fn is_retryable(&self) -> bool {
        match self {
            I18nError::FetchFailed { .. } => true,
            I18nError::NetworkError(_) => true,
            I18nError::StorageUnavailable(_) => true,
            I18nError::LoadFailed { .. } => true,
            I18nError::CacheWriteRejected { .. } => false,
            I18nError::UnsupportedLanguage(_) => false,
            I18nError::ParseError(_) => false,
            I18nError::ConfigError(_) => false,
        }
    }

    /// 获取错误的严重程度
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            I18nError::CacheWriteRejected { .. } => ErrorSeverity::Warning,
            I18nError::StorageUnavailable(_) => ErrorSeverity::Warning,
            I18nError::FetchFailed { .. } => ErrorSeverity::Error,
            I18nError::UnsupportedLanguage(_) => ErrorSeverity::Info,
            I18nError::ParseError(_) => ErrorSeverity::Error,
            I18nError::LoadFailed { .. } => ErrorSeverity::Error,
            I18nError::ConfigError(_) => ErrorSeverity::Critical,
            I18nError::NetworkError(_) => ErrorSeverity::Warning,
        }
    }

    /// 创建带上下文的错误
    pub fn with_context<T: fmt::Display>(self, context: T) -> Self {
        match self {
            I18nError::StorageUnavailable(msg) => {
                I18nError::StorageUnavailable(format!("{} (上下文: {})", msg, context))
            }
            I18nError::ParseError(msg) => {
                I18nError::ParseError(format!("{} (上下文: {})", msg, context))
            }
            I18nError::ConfigError(msg) => {
                I18nError::ConfigError(format!("{} (上下文: {})", msg, context))
            }
            I18nError::NetworkError(msg) => {
                I18nError::NetworkError(format!("{} (上下文: {})", msg, context))
            }
            other => other,
        }
    }
}

/// 错误严重程度
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ErrorSeverity {
    Info,
    Warning,
    Error,
    Critical,
}

impl From<serde_json::Error> for I18nError {
    fn from(error: serde_json::Error) -> Self {
        I18nError::ParseError(format!("JSON解析错误: {}", error))
    }
}

impl From<toml::de::Error> for I18nError {
    fn from(error: toml::de::Error) -> Self {
        I18nError::ConfigError(format!("TOML解析错误: {}", error))
    }
}

impl From<std::io::Error> for I18nError {
    fn from(error: std::io::Error) -> Self {
        I18nError::StorageUnavailable(format!("IO错误: {}", error))
    }
}

impl From<redb::Error> for I18nError {
    fn from(error: redb::Error) -> Self {
        I18nError::StorageUnavailable(format!("redb错误: {}", error))
    }
}

impl From<redb::DatabaseError> for I18nError {
    fn from(error: redb::DatabaseError) -> Self {
        I18nError::StorageUnavailable(format!("redb数据库错误: {}", error))
    }
}

impl From<redb::TransactionError> for I18nError {
    fn from(error: redb::TransactionError) -> Self {
        I18nError::StorageUnavailable(format!("redb事务错误: {}", error))
    }
}

impl From<redb::TableError> for I18nError {
    fn from(error: redb::TableError) -> Self {
        I18nError::StorageUnavailable(format!("redb表错误: {}", error))
    }
}

impl From<redb::StorageError> for I18nError {
    fn from(error: redb::StorageError) -> Self {
        I18nError::StorageUnavailable(format!("redb存储错误: {}", error))
    }
}

impl From<redb::CommitError> for I18nError {
    fn from(error: redb::CommitError) -> Self {
        I18nError::StorageUnavailable(format!("redb提交错误: {}", error))
    }
}

#[cfg(feature = "remote")]
impl From<reqwest::Error> for I18nError {
    fn from(error: reqwest::Error) -> Self {
        I18nError::NetworkError(format!("HTTP请求错误: {}", error))
    }
}

/// 错误结果类型别名
pub type I18nResult<T> = Result<T, I18nError>;

/// 错误处理助手函数
pub mod helpers {
    use super::*;

    /// 按严重程度记录错误，不改变错误本身
    pub fn log_error(error: &I18nError) {
        match error.severity() {
            ErrorSeverity::Info => tracing::info!("多语言信息: {}", error),
            ErrorSeverity::Warning => tracing::warn!("多语言警告: {}", error),
            ErrorSeverity::Error => tracing::error!("多语言错误: {}", error),
            ErrorSeverity::Critical => tracing::error!("多语言严重错误: {}", error),
        }
    }

    /// 记录错误并丢弃，用于需要降级而不是失败的路径
    pub fn contain<T>(result: I18nResult<T>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(error) => {
                log_error(&error);
                None
            }
        }
    }
}
