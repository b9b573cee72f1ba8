//! 回退解析
//!
//! 当前语言缺少某个键时，按固定的回退链依次查找其他语言，
//! 全部缺失时上报事件并返回默认值或键本身。

use std::sync::{Arc, OnceLock};

use regex::{Captures, Regex};
use serde::Serialize;
use tokio::sync::mpsc;

use super::engine::TranslationEngine;
use crate::i18n::clock::Clock;
use crate::i18n::config::constants;
use crate::i18n::language::Language;

/// 无法识别的语言使用的回退链
pub const DEFAULT_CHAIN: [Language; 3] = [Language::Ja, Language::En, Language::Zh];

/// 某语言的回退链，首元素总是该语言本身
pub fn chain_for(language: Language) -> [Language; 3] {
    match language {
        Language::Zh => [Language::Zh, Language::Ja, Language::En],
        Language::Ja => [Language::Ja, Language::Zh, Language::En],
        Language::En => [Language::En, Language::Ja, Language::Zh],
    }
}

/// 按语言代码求回退链
pub fn fallback_chain(code: &str) -> [Language; 3] {
    Language::from_code(code)
        .map(chain_for)
        .unwrap_or(DEFAULT_CHAIN)
}

/// 缺失翻译事件
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MissingKeyEvent {
    pub language: String,
    pub namespace: String,
    pub key: String,
    pub timestamp: String,
}

/// 缺失翻译上报器
///
/// 发送不会阻塞调用方，通道已满或已关闭时事件被丢弃。
#[derive(Clone)]
pub struct MissingKeyReporter {
    sender: mpsc::Sender<MissingKeyEvent>,
    clock: Arc<dyn Clock>,
}

impl MissingKeyReporter {
    pub fn new(sender: mpsc::Sender<MissingKeyEvent>, clock: Arc<dyn Clock>) -> Self {
        Self { sender, clock }
    }

    /// 创建上报器及其接收端
    pub fn channel(
        capacity: usize,
        clock: Arc<dyn Clock>,
    ) -> (Self, mpsc::Receiver<MissingKeyEvent>) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        (Self::new(sender, clock), receiver)
    }

    pub fn report(&self, language: Language, namespace: &str, key: &str) {
        let timestamp = chrono::DateTime::from_timestamp_millis(self.clock.now_millis())
            .map(|time| time.to_rfc3339())
            .unwrap_or_default();

        let event = MissingKeyEvent {
            language: language.code().to_string(),
            namespace: namespace.to_string(),
            key: key.to_string(),
            timestamp,
        };

        if let Err(e) = self.sender.try_send(event) {
            tracing::debug!("缺失翻译事件被丢弃: {}", e);
        }
    }
}

/// 回退解析器
pub struct FallbackResolver {
    engine: Arc<TranslationEngine>,
    reporter: Option<MissingKeyReporter>,
}

impl FallbackResolver {
    pub fn new(engine: Arc<TranslationEngine>) -> Self {
        Self {
            engine,
            reporter: None,
        }
    }

    pub fn with_reporter(engine: Arc<TranslationEngine>, reporter: MissingKeyReporter) -> Self {
        Self {
            engine,
            reporter: Some(reporter),
        }
    }

    pub fn engine(&self) -> &Arc<TranslationEngine> {
        &self.engine
    }

    /// 解析翻译
    ///
    /// `explicit` 优先于 `requested`。回退链总是完整遍历；
    /// 所有语言都缺失时返回非空的 `default`，否则返回键本身。
    pub fn resolve(
        &self,
        key: &str,
        requested: Language,
        default: &str,
        explicit: Option<Language>,
        params: &[(&str, &str)],
    ) -> String {
        let language = explicit.unwrap_or(requested);

        for candidate in chain_for(language) {
            if let Some(value) = self.lookup(candidate, key) {
                if candidate != language {
                    tracing::debug!("翻译回退: {} {} -> {}", key, language, candidate);
                }
                return interpolate(&value, params);
            }
        }

        let (namespace, bare_key) = match split_namespace(key) {
            Some((namespace, rest)) => (namespace, rest),
            None => (constants::DEFAULT_NAMESPACE, key),
        };
        tracing::debug!("缺失翻译: {}/{}/{}", language, namespace, bare_key);
        if let Some(reporter) = &self.reporter {
            reporter.report(language, namespace, bare_key);
        }

        if default.is_empty() {
            key.to_string()
        } else {
            interpolate(default, params)
        }
    }

    /// 用当前语言解析，无默认值
    pub fn t(&self, key: &str, params: &[(&str, &str)]) -> String {
        self.resolve(key, self.engine.active(), "", None, params)
    }

    /// 是否存在翻译；不指定语言时检查所有已载入的语言
    pub fn has_translation(&self, key: &str, language: Option<Language>) -> bool {
        match language {
            Some(language) => self.lookup(language, key).is_some(),
            None => self
                .engine
                .loaded_languages()
                .into_iter()
                .any(|language| self.lookup(language, key).is_some()),
        }
    }

    fn lookup(&self, language: Language, key: &str) -> Option<String> {
        if let Some((namespace, rest)) = split_namespace(key) {
            if self.engine.has_bundle(language, namespace) {
                return self.engine.lookup(language, Some(namespace), rest);
            }
        }
        self.engine.lookup(language, None, key)
    }
}

/// `ns:key` 形式拆出命名空间
fn split_namespace(key: &str) -> Option<(&str, &str)> {
    let (namespace, rest) = key.split_once(':')?;
    if namespace.is_empty() || rest.is_empty() {
        return None;
    }
    Some((namespace, rest))
}

/// 替换 `{{name}}` 占位符，未提供的参数保持原样
pub fn interpolate(template: &str, params: &[(&str, &str)]) -> String {
    if params.is_empty() || !template.contains("{{") {
        return template.to_string();
    }

    let Some(pattern) = placeholder_regex() else {
        return template.to_string();
    };

    pattern
        .replace_all(template, |caps: &Captures| {
            let name = &caps[1];
            params
                .iter()
                .find(|(param, _)| *param == name)
                .map(|(_, value)| value.to_string())
                .unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

fn placeholder_regex() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"\{\{\s*(\w+)\s*\}\}").ok())
        .as_ref()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::i18n::bundle::Bundle;
    use crate::i18n::clock::ManualClock;

    fn engine_with(entries: &[(Language, &str, &str, &str)]) -> Arc<TranslationEngine> {
        let engine = Arc::new(TranslationEngine::new(Language::Ja));
        for (language, namespace, key, value) in entries {
            let bundle: Bundle = [(*key, *value)].into_iter().collect();
            engine.add_bundle(*language, namespace, &bundle);
        }
        engine
    }

    #[test]
    fn test_chains_are_permutations_starting_with_requested() {
        for language in Language::ALL {
            let chain = chain_for(language);
            assert_eq!(chain[0], language);
            let mut sorted = chain.to_vec();
            sorted.sort();
            assert_eq!(sorted, vec![Language::Zh, Language::Ja, Language::En]);
        }
        assert_eq!(fallback_chain("zh"), [Language::Zh, Language::Ja, Language::En]);
        assert_eq!(fallback_chain("en"), [Language::En, Language::Ja, Language::Zh]);
        assert_eq!(fallback_chain("fr"), DEFAULT_CHAIN);
    }

    #[test]
    fn test_resolve_falls_through_the_chain() {
        let engine = engine_with(&[(Language::En, "common", "only_en", "English")]);
        let resolver = FallbackResolver::new(engine);

        assert_eq!(resolver.resolve("only_en", Language::Zh, "", None, &[]), "English");
    }

    #[test]
    fn test_resolve_prefers_earlier_chain_member() {
        let engine = engine_with(&[
            (Language::Ja, "common", "k", "日本語"),
            (Language::En, "common", "k", "English"),
        ]);
        let resolver = FallbackResolver::new(engine);

        assert_eq!(resolver.resolve("k", Language::Zh, "", None, &[]), "日本語");
    }

    #[test]
    fn test_explicit_language_overrides_requested() {
        let engine = engine_with(&[
            (Language::Zh, "common", "k", "中文"),
            (Language::En, "common", "k", "English"),
        ]);
        let resolver = FallbackResolver::new(engine);

        assert_eq!(resolver.resolve("k", Language::Zh, "", Some(Language::En), &[]), "English");
    }

    #[test]
    fn test_missing_key_returns_default_or_key_and_reports() {
        let engine = engine_with(&[]);
        let clock = Arc::new(ManualClock::new(1_704_067_200_000));
        let (reporter, mut receiver) = MissingKeyReporter::channel(8, clock);
        let resolver = FallbackResolver::with_reporter(engine, reporter);

        assert_eq!(resolver.resolve("absent", Language::En, "Fallback", None, &[]), "Fallback");
        assert_eq!(resolver.resolve("admin:absent", Language::Zh, "", None, &[]), "admin:absent");

        let first = receiver.try_recv().unwrap();
        assert_eq!(first.language, "en");
        assert_eq!(first.namespace, "common");
        assert_eq!(first.key, "absent");
        assert!(first.timestamp.starts_with("2024-01-01T00:00:00"));

        let second = receiver.try_recv().unwrap();
        assert_eq!(second.namespace, "admin");
        assert_eq!(second.key, "absent");
    }

    #[test]
    fn test_full_channel_does_not_block_resolution() {
        let engine = engine_with(&[]);
        let (reporter, receiver) = MissingKeyReporter::channel(1, Arc::new(ManualClock::new(0)));
        let resolver = FallbackResolver::with_reporter(engine, reporter);

        for _ in 0..5 {
            assert_eq!(resolver.resolve("x", Language::Ja, "", None, &[]), "x");
        }
        drop(receiver);
        assert_eq!(resolver.resolve("x", Language::Ja, "", None, &[]), "x");
    }

    #[test]
    fn test_namespaced_keys() {
        let engine = engine_with(&[
            (Language::En, "common", "title", "Common title"),
            (Language::En, "admin", "title", "Admin title"),
        ]);
        let resolver = FallbackResolver::new(engine);

        assert_eq!(resolver.resolve("admin:title", Language::En, "", None, &[]), "Admin title");
        assert_eq!(resolver.resolve("title", Language::En, "", None, &[]), "Common title");
    }

    #[test]
    fn test_interpolation() {
        let engine = engine_with(&[(Language::En, "common", "greet", "Hello, {{name}}! {{ other }}")]);
        let resolver = FallbackResolver::new(engine);

        assert_eq!(
            resolver.resolve("greet", Language::En, "", None, &[("name", "Aki")]),
            "Hello, Aki! {{ other }}"
        );
        assert_eq!(interpolate("{{ n }} items", &[("n", "3")]), "3 items");
        assert_eq!(interpolate("plain", &[("n", "3")]), "plain");
    }

    #[test]
    fn test_has_translation() {
        let engine = engine_with(&[(Language::Ja, "common", "k", "v")]);
        let resolver = FallbackResolver::new(engine);

        assert!(resolver.has_translation("k", Some(Language::Ja)));
        assert!(!resolver.has_translation("k", Some(Language::En)));
        assert!(resolver.has_translation("k", None));
        assert!(!resolver.has_translation("nope", None));
    }
}
