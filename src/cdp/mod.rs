//! # Chrome DevTools Protocol (CDP) 层
//!
//! 提供 Chrome/Chromium 浏览器的 WebSocket 通信接口，是页面驱动层的底层传输。
//!
//! ## 主要功能
//! - **WebSocket 连接管理**: 建立和维护与浏览器的 CDP WebSocket 连接
//! - **协议通信**: 发送 CDP 命令并接收响应，每条命令带超时
//! - **脚本执行**: 在页面上下文中执行 JavaScript
//! - **截图功能**: 整页或按区域裁剪的 PNG 截图
//!
//! ## 模块结构
//! - `traits`: CDP 操作的核心 trait 定义
//! - `types`: CDP 协议相关的数据类型
//! - `connection`: WebSocket 连接实现
//! - `client`: CDP 客户端实现
//! - `browser`: DevTools HTTP 端点操作
//! - `mock`: 用于测试的 Mock 实现
//!
//! ## 使用示例
//! ```rust,no_run
//! use autotest::cdp::{CdpBrowser, CdpBrowserImpl, CdpClient, CdpTimeoutConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let browser = CdpBrowserImpl::new("http://127.0.0.1:9222", CdpTimeoutConfig::default());
//! let target = browser.create_target("about:blank").await?;
//! let client = browser.create_client(&target).await?;
//! client.navigate("https://example.com").await?;
//! # Ok(())
//! # }
//! ```

pub mod traits;
pub mod types;
pub mod connection;
pub mod client;
pub mod browser;
pub mod mock;

#[cfg(test)]
mod tests;

pub use traits::{
    BrowserVersion, CdpBrowser, CdpClient, CdpConnection, CdpError, CdpResponse,
    EvaluationResult, NavigationResult,
};
pub use types::Clip;

// Re-export implementation structs
pub use browser::CdpBrowserImpl;
pub use client::CdpClientImpl;
pub use connection::{CdpTimeoutConfig, CdpWebSocketConnection};

// Re-export mock for testing
pub use mock::MockCdpConnection;
