//! Captcha flow tests

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use super::*;
use crate::config::{Config, Pacing};
use crate::driver::mock::MOCK_PNG;
use crate::driver::{El, MockPage};
use crate::locator::{ElementLocator, SelectorDescriptor};
use crate::Error;

fn login_page() -> MockPage {
    MockPage::new(El::new("form").children([
        El::input("text").id("captcha-input").attr("placeholder", "请输入验证码"),
        El::new("img").id("captcha-img").attr("src", "/api/captcha?t=1"),
    ]))
}

fn flow(page: &MockPage, solver: MockSolver, artifacts: &Path, retries: u32) -> CaptchaFlow {
    let config = Config {
        artifacts_dir: artifacts.to_path_buf(),
        retry_captcha: retries,
        pacing: Pacing::none(),
        ..Config::default()
    };
    let locator = ElementLocator::new(Arc::new(page.clone()), Duration::ZERO);
    CaptchaFlow::new(Arc::new(locator), Arc::new(solver), &config)
}

#[tokio::test]
async fn test_auto_finds_image_and_input() {
    let dir = tempfile::tempdir().unwrap();
    let page = login_page();
    let solver = MockSolver::answering("ab12");

    let text = flow(&page, solver.clone(), dir.path(), 3).auto().await.unwrap();
    assert_eq!(text, "ab12");
    assert_eq!(page.value_of("captcha-input").as_deref(), Some("ab12"));

    let seen = solver.seen();
    assert_eq!(seen.len(), 1);
    assert!(seen[0].starts_with(dir.path().join("captcha")));
    assert_eq!(std::fs::read(&seen[0]).unwrap(), MOCK_PNG);
}

#[tokio::test]
async fn test_manual_selectors() {
    let dir = tempfile::tempdir().unwrap();
    let page = login_page();
    let text = flow(&page, MockSolver::answering(" 7xk2 "), dir.path(), 1)
        .solve_and_input(&SelectorDescriptor::id("captcha-img"), &SelectorDescriptor::field("验证码"))
        .await
        .unwrap();
    assert_eq!(text, "7xk2");
    assert_eq!(page.value_of("captcha-input").as_deref(), Some("7xk2"));
}

#[tokio::test]
async fn test_retries_failed_and_empty_recognition() {
    let dir = tempfile::tempdir().unwrap();
    let page = login_page();
    let solver = MockSolver::new([None, Some(""), Some("x9y8")]);

    let text = flow(&page, solver.clone(), dir.path(), 3).auto().await.unwrap();
    assert_eq!(text, "x9y8");
    assert_eq!(solver.seen().len(), 3);
}

#[tokio::test]
async fn test_gives_up_after_configured_attempts() {
    let dir = tempfile::tempdir().unwrap();
    let page = login_page();
    let solver = MockSolver::new([None::<String>, None, None]);

    let err = flow(&page, solver.clone(), dir.path(), 2).auto().await.unwrap_err();
    assert!(matches!(err, Error::Captcha(_)));
    assert_eq!(solver.seen().len(), 2);
    assert_eq!(page.value_of("captcha-input").as_deref(), Some(""));
}

#[tokio::test]
async fn test_auto_without_captcha_image() {
    let dir = tempfile::tempdir().unwrap();
    let page = MockPage::new(El::new("form").child(El::input("text").attr("placeholder", "验证码")));
    let err = flow(&page, MockSolver::answering("x"), dir.path(), 1)
        .auto()
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Captcha(msg) if msg.contains("image")));
}

#[tokio::test]
async fn test_disabled_solver_always_fails() {
    let err = DisabledSolver.solve(Path::new("captcha.png")).await.unwrap_err();
    assert!(matches!(err, Error::Captcha(_)));
}

#[tokio::test]
async fn test_tesseract_missing_binary() {
    let solver = TesseractSolver::new("autotest-no-such-tesseract");
    let err = solver.solve(Path::new("captcha.png")).await.unwrap_err();
    assert!(matches!(err, Error::Captcha(msg) if msg.contains("failed to run")));
}

#[test]
fn test_solver_from_config() {
    let mut config = Config::default();
    assert_eq!(solver_from_config(&config).name(), "tesseract");
    config.captcha_engine = crate::config::CaptchaEngine::Disabled;
    assert_eq!(solver_from_config(&config).name(), "disabled");
}
