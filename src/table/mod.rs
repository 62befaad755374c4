//! # 表格引擎
//!
//! 在页面中定位表格、行与列，提供单元格读取、断言和行内操作按钮点击。
//!
//! ## 主要功能
//! - **表格定位**: 显式选择器，或选择器为空时使用页面中的第一个 `<table>`
//! - **行定位**: 按序号（从 1 开始）、完整文本或包含文本
//! - **列定位**: 按序号或表头文本
//! - **断言**: `equals` / `contains` / `not_equals` / `not_contains`
//! - **行操作**: 在行内查找并点击 "编辑"、"删除" 等按钮
//!
//! 行文本重复时取文档顺序中的第一行，并输出警告日志。
//!
//! ## 使用示例
//! ```rust,no_run
//! use autotest::table::{ColumnLocator, RowLocator, TableAssertMode, TableEngine, TableLocator};
//!
//! # async fn example(tables: TableEngine) -> Result<(), Box<dyn std::error::Error>> {
//! let target = TableLocator::first(RowLocator::text("Bob|25")).column(ColumnLocator::index(1));
//! tables.assert_cell(&target, "Bob", TableAssertMode::Equals).await?;
//! tables.click_row_action(&target, "编辑").await?;
//! # Ok(())
//! # }
//! ```

pub mod types;
pub mod engine;


pub use engine::{RowMatch, TableEngine, CELL_SEPARATOR};
pub use types::{ColumnKind, ColumnLocator, RowKind, RowLocator, TableAssertMode, TableLocator};
