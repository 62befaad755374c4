//! # 元素定位层
//!
//! 将测试用例中的人类可读描述（"标签为 用户名 的输入框"、"新建 按钮"）解析为页面上唯一的元素。
//!
//! ## 主要功能
//! - **作用域解析**: 整页、可见对话框或主内容区域
//! - **策略级联**: 按 `text` / `field` / `button` 类型依次尝试有序的启发式查询
//! - **可见优先**: 同一策略多处匹配时优先返回第一个可见元素
//! - **原始选择器**: `css` / `xpath` / `id` 直接查询并在超时内轮询
//!
//! ## 模块结构
//! - `descriptor`: 选择器描述 `{type, value, scope}`
//! - `scope`: 作用域解析
//! - `strategies`: 各类型的策略表（纯数据）
//! - `cascade`: "首个成功策略 + 可见优先" 组合器
//! - `engine`: `ElementLocator` 解析入口
//!
//! ## 使用示例
//! ```rust,no_run
//! use autotest::driver::PageDriver;
//! use autotest::locator::{ElementLocator, Scope, SelectorDescriptor};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! # async fn example(page: Arc<dyn PageDriver>) -> Result<(), Box<dyn std::error::Error>> {
//! let locator = ElementLocator::new(page, Duration::from_secs(5));
//! let input = locator
//!     .locate(&SelectorDescriptor::field("用户名").within(Scope::Dialog))
//!     .await?;
//! input.fill("admin").await?;
//! # Ok(())
//! # }
//! ```

pub mod descriptor;
pub mod scope;
pub mod strategies;
pub mod cascade;
pub mod engine;


pub use cascade::{Candidates, Cascade, Outcome};
pub use descriptor::{Scope, SelectorDescriptor, SelectorKind};
pub use engine::ElementLocator;
pub use strategies::{Pick, Strategy};
