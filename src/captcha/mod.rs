//! # 验证码模块
//!
//! 截取验证码图片、通过可插拔的 OCR 后端识别，并填写到输入框。
//!
//! ## 主要功能
//! - **可插拔识别**: `CaptchaSolver` trait，按配置选择 Tesseract 或禁用实现
//! - **手动模式**: 指定图片与输入框选择器
//! - **自动模式**: 依次尝试常见的图片与输入框模式，取第一个可见元素
//! - **重试**: 识别失败或结果为空时按 `retry_captcha` 重试
//!
//! ## 模块结构
//! - `traits`: `CaptchaSolver` trait 定义
//! - `solver`: Tesseract 与禁用实现
//! - `flow`: 截图、识别、填写流程
//! - `mock`: 脚本化识别结果（测试用）

pub mod traits;
pub mod solver;
pub mod flow;
pub mod mock;

#[cfg(test)]
mod tests;

pub use traits::CaptchaSolver;

// Re-export implementation structs
pub use flow::{image_candidates, input_candidates, CaptchaFlow};
pub use solver::{solver_from_config, DisabledSolver, TesseractSolver};

// Re-export mock for testing
pub use mock::MockSolver;
