//! 翻译引擎上下文
//!
//! 保存当前语言和已载入的资源包，由应用根部创建后以 `Arc` 传给各组件。

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;

use crate::i18n::bundle::Bundle;
use crate::i18n::config::constants;
use crate::i18n::language::Language;

/// 语言切换凭证，只有最后一次开始的切换可以提交
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwitchTicket(u64);

/// 翻译引擎
#[derive(Debug)]
pub struct TranslationEngine {
    active: RwLock<Language>,
    generation: AtomicU64,
    bundles: RwLock<HashMap<Language, BTreeMap<String, Bundle>>>,
}

impl TranslationEngine {
    pub fn new(initial: Language) -> Self {
        Self {
            active: RwLock::new(initial),
            generation: AtomicU64::new(0),
            bundles: RwLock::new(HashMap::new()),
        }
    }

    /// 当前语言
    pub fn active(&self) -> Language {
        self.active
            .read()
            .map(|active| *active)
            .unwrap_or(Language::DEFAULT)
    }

    /// 直接设置当前语言，同时使进行中的切换失效
    pub fn set_active(&self, language: Language) {
        if let Ok(mut active) = self.active.write() {
            self.generation.fetch_add(1, Ordering::SeqCst);
            *active = language;
        }
    }

    pub fn begin_switch(&self) -> SwitchTicket {
        SwitchTicket(self.generation.fetch_add(1, Ordering::SeqCst) + 1)
    }

    /// 提交切换；期间有更新的切换开始时返回 `false`
    pub fn commit_switch(&self, ticket: SwitchTicket, language: Language) -> bool {
        let Ok(mut active) = self.active.write() else {
            return false;
        };
        if self.generation.load(Ordering::SeqCst) != ticket.0 {
            return false;
        }
        *active = language;
        true
    }

    /// 合并资源包，已有的键被覆盖
    pub fn add_bundle(&self, language: Language, namespace: &str, bundle: &Bundle) {
        if let Ok(mut bundles) = self.bundles.write() {
            bundles
                .entry(language)
                .or_default()
                .entry(namespace.to_string())
                .or_default()
                .merge(bundle);
        }
    }

    pub fn has_bundle(&self, language: Language, namespace: &str) -> bool {
        self.bundles
            .read()
            .map(|bundles| {
                bundles
                    .get(&language)
                    .is_some_and(|namespaces| namespaces.contains_key(namespace))
            })
            .unwrap_or(false)
    }

    /// 查找翻译
    ///
    /// 指定命名空间时只查该命名空间；否则先查 `common`，再按名称顺序查其余命名空间。
    pub fn lookup(&self, language: Language, namespace: Option<&str>, key: &str) -> Option<String> {
        let bundles = self.bundles.read().ok()?;
        let namespaces = bundles.get(&language)?;

        if let Some(namespace) = namespace {
            return namespaces.get(namespace)?.get(key).map(str::to_string);
        }

        if let Some(value) = namespaces
            .get(constants::DEFAULT_NAMESPACE)
            .and_then(|bundle| bundle.get(key))
        {
            return Some(value.to_string());
        }

        namespaces
            .iter()
            .filter(|(name, _)| name.as_str() != constants::DEFAULT_NAMESPACE)
            .find_map(|(_, bundle)| bundle.get(key))
            .map(str::to_string)
    }

    /// 某语言已载入的命名空间（按名称排序）
    pub fn loaded_namespaces(&self, language: Language) -> Vec<String> {
        self.bundles
            .read()
            .ok()
            .and_then(|bundles| {
                bundles
                    .get(&language)
                    .map(|namespaces| namespaces.keys().cloned().collect())
            })
            .unwrap_or_default()
    }

    pub fn loaded_languages(&self) -> Vec<Language> {
        let Ok(bundles) = self.bundles.read() else {
            return Vec::new();
        };
        let mut languages: Vec<Language> = bundles
            .iter()
            .filter(|(_, namespaces)| !namespaces.is_empty())
            .map(|(language, _)| *language)
            .collect();
        languages.sort();
        languages
    }
}

impl Default for TranslationEngine {
    fn default() -> Self {
        Self::new(Language::DEFAULT)
    }
}
