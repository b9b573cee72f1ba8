//! # 网络模块
//!
//! 语言资源接口的HTTP实现：
//!
//! - `client` - 资源获取、偏好同步、批量导入
//! - `beacon` - 缺失翻译的后台上报

pub mod beacon;
pub mod client;

pub use beacon::MissingKeyBeacon;
pub use client::{parse_resources, HttpResourceClient};
