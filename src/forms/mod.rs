//! # 表单控件层
//!
//! 在元素定位层之上实现下拉框、复选框与单选框的复合操作。
//!
//! ## 主要功能
//! - **下拉选择**: 原生 `<select>` 先按选项文本、再按选项值选择；自定义下拉框点击展开后逐项点击
//! - **多选**: 多选控件在后续选项点击期间按住 Control
//! - **复选框**: 切换、强制设置以及批量设置
//! - **单选框**: 单个与批量选择
//! - **状态读取**: 当前值、选项列表、勾选状态
//!
//! ## 使用示例
//! ```rust,no_run
//! use autotest::config::Pacing;
//! use autotest::forms::FormEngine;
//! use autotest::locator::{ElementLocator, SelectorDescriptor};
//! use std::sync::Arc;
//!
//! # async fn example(locator: Arc<ElementLocator>) -> Result<(), Box<dyn std::error::Error>> {
//! let forms = FormEngine::new(locator, Pacing::default());
//! forms.select_option(&SelectorDescriptor::text("城市"), "上海").await?;
//! forms.set_checkbox(&SelectorDescriptor::text("同意协议"), true).await?;
//! # Ok(())
//! # }
//! ```

pub mod engine;

#[cfg(test)]
mod tests;

pub use engine::FormEngine;
