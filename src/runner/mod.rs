//! # 用例执行层
//!
//! 读取 JSON 测试文件，按顺序执行每个用例的步骤，并汇总执行结果。
//!
//! ## 主要功能
//! - **步骤模型**: `TestStep` 对应测试文件中的原始记录，执行前校验为强类型的 `Step`
//! - **动作分派**: 17 种动作分派到元素定位、表单、表格、菜单与验证码模块
//! - **失败处理**: 首个失败步骤截图保存到 `<artifacts>/errors/`，并中止当前用例与后续用例
//! - **执行报告**: 每个用例的通过、失败或未执行状态及耗时
//!
//! ## 模块结构
//! - `step`: 动作词表、测试文件结构与步骤校验
//! - `interpreter`: `Runner`，逐步执行用例
//! - `report`: 用例与测试集报告
//!
//! ## 使用示例
//! ```rust,no_run
//! use autotest::captcha::solver_from_config;
//! use autotest::config::Config;
//! use autotest::driver::Session;
//! use autotest::runner::Runner;
//! use std::path::Path;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::load(None)?;
//! let session = Session::start(&config).await?;
//! let runner = Runner::new(session.page(), &config, solver_from_config(&config));
//!
//! let report = runner.run_suite_file(Path::new("testcase/login_example.json")).await?;
//! println!("{}", report);
//! session.stop().await?;
//! # Ok(())
//! # }
//! ```

pub mod step;
pub mod interpreter;
pub mod report;

#[cfg(test)]
mod tests;

// Re-export implementation structs
pub use interpreter::Runner;
pub use report::{CaseReport, CaseStatus, SuiteReport};
pub use step::{
    Action, AssertMode, CaptchaTarget, Expectation, Step, TestCase, TestStep, TestSuite,
    DEFAULT_DELETE_LABEL, DEFAULT_EDIT_LABEL,
};
