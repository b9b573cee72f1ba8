//! 翻译核心：引擎上下文、回退解析、命名空间载入与语言切换

pub mod engine;
pub mod fallback;
pub mod loader;
pub mod switcher;

pub use engine::{SwitchTicket, TranslationEngine};
pub use fallback::{
    chain_for, fallback_chain, interpolate, FallbackResolver, MissingKeyEvent, MissingKeyReporter,
};
pub use loader::{AvailabilityReport, NamespaceLoader};
pub use switcher::{LanguageSwitcher, SwitchOutcome};
