//! Autotest: declarative UI test runner
//!
//! Test cases are JSON lists of steps that name elements the way a person
//! would ("the field labelled 用户名", "the 登录 button"). The runner resolves
//! those descriptions against a live Chrome page over the DevTools Protocol.

pub mod error;
pub mod config;

pub mod cdp;
pub mod driver;
pub mod locator;
pub mod forms;
pub mod table;
pub mod menu;
pub mod captcha;
pub mod runner;

// Re-exports
pub use error::{Error, Result};

/// Autotest library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
