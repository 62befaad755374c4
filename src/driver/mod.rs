//! # 页面驱动层
//!
//! 为选择器解析、表单、表格和菜单引擎提供统一的页面能力抽象。
//!
//! ## 主要功能
//! - **结构化查询**: 以 `Query` 描述 CSS、XPath、文本、标签关系等查找方式
//! - **元素操作**: 点击、悬停、填写、勾选、原生下拉选择、截图
//! - **加载等待**: 导航后等待 load / DOMContentLoaded / 网络空闲
//! - **会话管理**: 启动或连接 Chrome，并打开单个页面
//! - **测试替身**: `MockPage` 在内存 DOM 上执行同样的查询语义
//!
//! ## 模块结构
//! - `traits`: `PageDriver` 与 `ElementHandle` trait 定义
//! - `query`: 结构化查询与文本匹配
//! - `scripts`: 注入页面的 JavaScript 运行时
//! - `page`: 基于 CDP 的页面实现
//! - `element`: 基于 CDP 的元素句柄
//! - `launcher`: 浏览器会话启动与关闭
//! - `mock`: 内存页面实现（测试用）
//!
//! ## 使用示例
//! ```rust,no_run
//! use autotest::config::Config;
//! use autotest::driver::{LoadState, Query, Root, Session};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let session = Session::start(&Config::default()).await?;
//! let page = session.page();
//! page.goto("https://example.com", LoadState::NetworkIdle).await?;
//! let links = page.query_all(&Root::Document, &Query::css("a")).await?;
//! println!("{} links", links.len());
//! session.stop().await?;
//! # Ok(())
//! # }
//! ```

pub mod traits;
pub mod query;
pub mod scripts;
pub mod page;
pub mod element;
pub mod launcher;
pub mod mock;
mod mock_css;


pub use traits::{
    BoundingBox, ClickOptions, ElementHandle, LoadState, Modifier, OptionMatch, PageDriver, Root,
};
pub use query::{normalize_whitespace, LabelRelation, Query, TextMatch};

// Re-export implementation structs
pub use element::CdpElement;
pub use launcher::Session;
pub use page::CdpPage;

// Re-export mock for testing
pub use mock::{El, MockElement, MockEvent, MockPage};
