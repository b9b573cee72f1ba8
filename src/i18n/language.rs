//! 支持的语言集合
//!
//! 系统只支持固定的三种语言，根语言为日文。

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::{I18nError, I18nResult};

/// 支持的语言
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Zh,
    Ja,
    En,
}

impl Language {
    /// 全部支持的语言
    pub const ALL: [Language; 3] = [Language::Zh, Language::Ja, Language::En];

    /// 默认（根）语言
    pub const DEFAULT: Language = Language::Ja;

    /// 语言代码
    pub fn code(self) -> &'static str {
        match self {
            Language::Zh => "zh",
            Language::Ja => "ja",
            Language::En => "en",
        }
    }

    /// 语言的本地名称
    pub fn name(self) -> &'static str {
        match self {
            Language::Zh => "中文",
            Language::Ja => "日本語",
            Language::En => "English",
        }
    }

    /// 按精确代码查找
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "zh" => Some(Language::Zh),
            "ja" => Some(Language::Ja),
            "en" => Some(Language::En),
            _ => None,
        }
    }

    /// 按地区标签查找，例如 `zh-TW`、`ja_JP`、`EN-gb`
    pub fn from_tag(tag: &str) -> Option<Self> {
        let normalized = tag.trim().to_lowercase();
        if let Some(lang) = Self::from_code(&normalized) {
            return Some(lang);
        }

        let primary = normalized.split(['-', '_']).next().unwrap_or_default();
        Self::from_code(primary)
    }

    /// 解析语言代码，不支持时返回 `UnsupportedLanguage`
    pub fn parse(code: &str) -> I18nResult<Self> {
        Self::from_tag(code).ok_or_else(|| I18nError::UnsupportedLanguage(code.to_string()))
    }

    /// 检查语言代码是否受支持
    pub fn is_supported(code: &str) -> bool {
        Self::from_code(code).is_some()
    }
}

impl Default for Language {
    fn default() -> Self {
        Language::DEFAULT
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Language {
    type Err = I18nError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
