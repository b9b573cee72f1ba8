//! 基于 redb 的磁盘键值存储

use std::path::Path;

use redb::{Database, ReadableTable, TableDefinition};

use super::adapter::KeyValueStore;
use crate::i18n::error::I18nResult;

const TABLE: TableDefinition<&str, &str> = TableDefinition::new("i18n_store");

/// 磁盘持久化存储，每次写入一个独立事务
pub struct RedbStore {
    db: Database,
}

impl RedbStore {
    /// 打开或创建数据库文件
    pub fn open(path: impl AsRef<Path>) -> I18nResult<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let db = Database::create(path)?;

        // 先建表，之后的只读事务才能打开它
        let txn = db.begin_write()?;
        txn.open_table(TABLE)?;
        txn.commit()?;

        tracing::debug!("已打开存储文件: {}", path.display());
        Ok(Self { db })
    }
}

impl KeyValueStore for RedbStore {
    fn get(&self, key: &str) -> I18nResult<Option<String>> {
        let txn = self.db.begin_read()?;
        let table = txn.open_table(TABLE)?;
        let value = table.get(key)?.map(|guard| guard.value().to_string());
        Ok(value)
    }

    fn set(&self, key: &str, value: &str) -> I18nResult<()> {
        let txn = self.db.begin_write()?;
        {
            let mut table = txn.open_table(TABLE)?;
            table.insert(key, value)?;
        }
        txn.commit()?;
        Ok(())
    }

    fn remove(&self, key: &str) -> I18nResult<()> {
        let txn = self.db.begin_write()?;
        {
            let mut table = txn.open_table(TABLE)?;
            table.remove(key)?;
        }
        txn.commit()?;
        Ok(())
    }

    fn keys(&self) -> I18nResult<Vec<String>> {
        let txn = self.db.begin_read()?;
        let table = txn.open_table(TABLE)?;
        let mut keys = Vec::new();
        for item in table.iter()? {
            let (key, _) = item?;
            keys.push(key.value().to_string());
        }
        Ok(keys)
    }
}
