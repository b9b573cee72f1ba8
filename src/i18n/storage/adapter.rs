//! 键值存储适配器
//!
//! 缓存和语言偏好都建立在一个简单的字符串键值存储之上，
//! 对应浏览器 localStorage 的语义：单键写入原子，没有事务。

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;

use crate::i18n::error::{I18nError, I18nResult};

/// 持久化键值存储
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> I18nResult<Option<String>>;

    fn set(&self, key: &str, value: &str) -> I18nResult<()>;

    /// 删除键，键不存在时也视为成功
    fn remove(&self, key: &str) -> I18nResult<()>;

    fn keys(&self) -> I18nResult<Vec<String>>;
}

/// 估算字符串占用的字节数（UTF-8编码长度）
pub fn estimate_size(value: &str) -> u64 {
    value.len() as u64
}

/// 内存存储
#[derive(Debug)]
pub struct MemoryStore {
    data: RwLock<HashMap<String, String>>,
    available: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            data: RwLock::new(HashMap::new()),
            available: AtomicBool::new(true),
        }
    }

    /// 模拟存储不可用（配额耗尽、隐私模式）
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    pub fn len(&self) -> usize {
        self.data.read().map(|data| data.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn check_available(&self) -> I18nResult<()> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(I18nError::StorageUnavailable("存储已被禁用".to_string()))
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn poisoned<T>(_: T) -> I18nError {
    I18nError::StorageUnavailable("存储锁已损坏".to_string())
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> I18nResult<Option<String>> {
        self.check_available()?;
        let data = self.data.read().map_err(poisoned)?;
        Ok(data.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> I18nResult<()> {
        self.check_available()?;
        let mut data = self.data.write().map_err(poisoned)?;
        data.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> I18nResult<()> {
        self.check_available()?;
        let mut data = self.data.write().map_err(poisoned)?;
        data.remove(key);
        Ok(())
    }

    fn keys(&self) -> I18nResult<Vec<String>> {
        self.check_available()?;
        let data = self.data.read().map_err(poisoned)?;
        Ok(data.keys().cloned().collect())
    }
}
