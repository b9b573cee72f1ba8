//! 翻译资源包
//!
//! 一个资源包对应一个（语言，命名空间）组合，内部以点号分隔的扁平键保存。
//! 远程返回的嵌套JSON在进入缓存前统一展开。

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::error::{I18nError, I18nResult};
use super::language::Language;

/// 扁平化后的翻译资源包
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Bundle {
    entries: BTreeMap<String, String>,
}

/// 管理端批量导入的单条资源
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkResource {
    pub language_code: String,
    pub resource_key: String,
    pub resource_value: String,
    pub namespace: String,
}

impl Bundle {
    pub fn new() -> Self {
        Self::default()
    }

    /// 从嵌套JSON构建，非字符串叶子（数字、布尔、null、数组）被忽略
    pub fn from_value(value: &Value) -> I18nResult<Self> {
        let object = value
            .as_object()
            .ok_or_else(|| I18nError::ParseError("资源包必须是JSON对象".to_string()))?;

        let mut entries = BTreeMap::new();
        flatten_into(object, "", &mut entries);
        Ok(Self { entries })
    }

    /// 从JSON文本构建
    pub fn from_json(text: &str) -> I18nResult<Self> {
        let value: Value = serde_json::from_str(text)?;
        Self::from_value(&value)
    }

    /// 序列化为缓存中保存的JSON文本
    pub fn to_json(&self) -> I18nResult<String> {
        Ok(serde_json::to_string(&self.entries)?)
    }

    /// 还原为嵌套结构（与服务端返回格式一致）
    pub fn to_nested(&self) -> Value {
        let mut root = Map::new();
        for (key, value) in &self.entries {
            let mut current = &mut root;
            let mut parts = key.split('.').peekable();
            while let Some(part) = parts.next() {
                if parts.peek().is_none() {
                    current.insert(part.to_string(), Value::String(value.clone()));
                    break;
                }
                let child = current
                    .entry(part.to_string())
                    .or_insert_with(|| Value::Object(Map::new()));
                if !child.is_object() {
                    // 同名叶子与分支冲突时分支优先
                    *child = Value::Object(Map::new());
                }
                current = match child {
                    Value::Object(map) => map,
                    _ => break,
                };
            }
        }
        Value::Object(root)
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(key.into(), value.into());
    }

    /// 合并另一个资源包，已有键被覆盖
    pub fn merge(&mut self, other: &Bundle) {
        for (key, value) in &other.entries {
            self.entries.insert(key.clone(), value.clone());
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// 生成批量导入请求体
    pub fn to_bulk_resources(&self, language: Language, namespace: &str) -> Vec<BulkResource> {
        self.entries
            .iter()
            .map(|(key, value)| BulkResource {
                language_code: language.code().to_string(),
                resource_key: key.clone(),
                resource_value: value.clone(),
                namespace: namespace.to_string(),
            })
            .collect()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Bundle {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

fn flatten_into(object: &Map<String, Value>, prefix: &str, out: &mut BTreeMap<String, String>) {
    for (key, value) in object {
        let full_key = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{}.{}", prefix, key)
        };

        match value {
            Value::String(text) => {
                out.insert(full_key, text.clone());
            }
            Value::Object(child) => flatten_into(child, &full_key, out),
            _ => {}
        }
    }
}
