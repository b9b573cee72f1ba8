//! 配置模块
//!
//! 默认值集中在 `constants`，文件与环境变量的合并由 `manager` 负责。

pub mod manager;

pub use manager::{ConfigManager, I18nConfig};

/// 常量定义
pub mod constants {
    use std::time::Duration;

    // 缓存相关
    pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(24 * 3600); // 24小时
    pub const DEFAULT_MAX_CACHE_BYTES: u64 = 10 * 1024 * 1024; // 10MB

    // 语言偏好有效期
    pub const DEFAULT_PREFERENCE_EXPIRY: Duration = Duration::from_secs(720 * 3600); // 30天

    // 命名空间
    pub const DEFAULT_NAMESPACE: &str = "common";
    pub const COMMON_NAMESPACES: &[&str] = &["common", "header", "navigation", "errors"];

    // 按角色预载入的命名空间
    pub const ADMIN_NAMESPACES: &[&str] = &["admin", "management", "users", "system"];
    pub const MANAGER_NAMESPACES: &[&str] = &["management", "reports", "analytics"];
    pub const USER_NAMESPACES: &[&str] = &["common", "user", "profile"];
    pub const GUEST_NAMESPACES: &[&str] = &["common", "user"];

    // 页面资源，预测到相应页面时提前载入
    pub const ANTICIPATED_NAMESPACES: &[&str] = &["login", "dashboard", "reports", "settings"];

    // 远程接口
    pub const DEFAULT_API_URL: &str = "http://localhost:8000";
    pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
    pub const MISSING_KEY_CHANNEL_CAPACITY: usize = 256;

    // 本地存储
    pub const DEFAULT_STORAGE_PATH: &str = "~/.cache/i18n-cache/store.redb";

    // 配置文件搜索路径
    pub const CONFIG_PATHS: &[&str] = &[
        "i18n-cache.toml",
        ".i18n-cache.toml",
        "i18n-cache.json",
        "~/.config/i18n-cache/config.toml",
        "/etc/i18n-cache/config.toml",
    ];
}

/// 角色对应的命名空间集合，未知角色按访客处理
pub fn role_namespaces(role: &str) -> &'static [&'static str] {
    match role {
        "admin" => constants::ADMIN_NAMESPACES,
        "manager" => constants::MANAGER_NAMESPACES,
        "user" => constants::USER_NAMESPACES,
        _ => constants::GUEST_NAMESPACES,
    }
}

/// 根据当前页面预测接下来可能访问的页面
pub fn predict_next_pages(page: &str) -> &'static [&'static str] {
    match page {
        "login" => &["dashboard", "home"],
        "home" => &["dashboard", "reports", "settings"],
        "dashboard" => &["reports", "settings", "profile"],
        "reports" => &["dashboard", "export", "filter"],
        "settings" => &["profile", "dashboard", "account"],
        "profile" => &["settings", "dashboard"],
        _ => &["home", "dashboard", "reports"],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_namespaces() {
        assert_eq!(role_namespaces("admin"), &["admin", "management", "users", "system"]);
        assert_eq!(role_namespaces("manager").len(), 3);
        assert_eq!(role_namespaces("nobody"), &["common", "user"]);
    }

    #[test]
    fn test_predict_next_pages() {
        assert_eq!(predict_next_pages("login"), &["dashboard", "home"]);
        assert_eq!(predict_next_pages("profile"), &["settings", "dashboard"]);
        assert_eq!(predict_next_pages("unknown"), &["home", "dashboard", "reports"]);
    }

    #[test]
    fn test_common_namespaces_start_with_default() {
        assert_eq!(constants::COMMON_NAMESPACES[0], constants::DEFAULT_NAMESPACE);
    }
}
