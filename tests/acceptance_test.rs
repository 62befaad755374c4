//! 测试文件与配置验收测试
//!
//! Suite files and configuration files as a user would write them.

mod common;

use autotest::config::{CaptchaEngine, Config};
use autotest::driver::MockPage;
use autotest::runner::{Action, TestSuite};
use autotest::Error;
use common::{login_form, mock_runner, write_suite};

const LOGIN_SUITE: &str = r#"[
  {
    "name": "登录成功",
    "steps": [
      { "action": "input", "selector": { "type": "field", "value": "用户名" }, "text": "admin" },
      { "action": "input", "selector": { "type": "field", "value": "密码" }, "text": "123456" },
      { "action": "click", "selector": { "type": "button", "value": "登录" } }
    ]
  }
]"#;

#[tokio::test]
async fn test_suite_file_runs() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_suite(dir.path(), LOGIN_SUITE);
    let page = MockPage::new(login_form());

    let report = mock_runner(&page, dir.path()).run_suite_file(&path).await.unwrap();

    assert!(report.is_success());
    assert_eq!(report.cases[0].name, "登录成功");
    assert_eq!(page.value_of("password").as_deref(), Some("123456"));
    assert_eq!(page.clicked(), vec!["button#login"]);
}

#[tokio::test]
async fn test_malformed_suite_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_suite(dir.path(), r#"{"name":"not a list"}"#);

    let err = TestSuite::from_file(&path).await.unwrap_err();
    assert!(matches!(err, Error::Configuration(msg) if msg.contains("Failed to parse")));
}

#[test]
fn test_suite_keeps_unvalidated_steps() {
    let suite = TestSuite::from_json(r#"[{"name":"x","steps":[{"action":"frobnicate","whatever":1}]}]"#).unwrap();
    assert_eq!(suite.len(), 1);
    assert_eq!(suite.cases[0].steps[0].action, "frobnicate");
}

#[test]
fn test_action_vocabulary_is_complete() {
    let names: Vec<_> = Action::ALL.iter().map(Action::as_str).collect();
    assert_eq!(
        names,
        vec![
            "goto",
            "input",
            "click",
            "assert",
            "menu_click",
            "captcha_input",
            "select_option",
            "select_options",
            "checkbox_toggle",
            "checkbox_set",
            "checkboxes_set",
            "radio_select",
            "radios_select",
            "table_edit",
            "table_delete",
            "table_assert",
            "search",
        ]
    );
}

#[test]
fn test_yaml_config_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.yaml");
    std::fs::write(
        &path,
        "browser: chromium\nheadless: true\ntimeout: 8000\ncaptcha_engine: disabled\npacing:\n  step_ms: 0\n",
    )
    .unwrap();

    let config = Config::from_file(&path).unwrap();
    assert!(config.headless);
    assert_eq!(config.timeout, 8000);
    assert_eq!(config.captcha_engine, CaptchaEngine::Disabled);
    assert_eq!(config.pacing.step_ms, 0);
    assert_eq!(config.pacing.click_ms, 500);
    assert_eq!(config.retry_captcha, 3);
}

#[test]
fn test_missing_config_file() {
    let dir = tempfile::tempdir().unwrap();
    assert!(matches!(
        Config::from_file(&dir.path().join("absent.yaml")),
        Err(Error::Configuration(_))
    ));
}
