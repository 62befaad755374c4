//! End-to-end integration tests
//!
//! Whole suites run through the runner against the in-memory page.

mod common;

use autotest::driver::{El, MockPage};
use autotest::runner::{CaseStatus, TestSuite};
use autotest::Error;
use common::{login_form, mock_runner, people_table};

/// Input into a labelled field, then assert its value
#[tokio::test]
async fn test_field_input_and_assert() {
    let dir = tempfile::tempdir().unwrap();
    let page = MockPage::new(login_form());
    let suite = TestSuite::from_json(
        r#"[{"name":"登录","steps":[
            {"action":"input","selector":{"kind":"field","value":"用户名"},"text":"admin"},
            {"action":"assert","selector":{"kind":"field","value":"用户名"},
             "expect":{"type":"field","value":"用户名","mode":"value_equals","text":"admin"}}
        ]}]"#,
    )
    .unwrap();

    let report = mock_runner(&page, dir.path()).run_suite(&suite).await;

    assert!(report.is_success(), "{report}");
    assert_eq!(page.value_of("username").as_deref(), Some("admin"));
    assert_eq!(page.value_of("password").as_deref(), Some(""));
}

/// Equals passes and not_equals fails on the same cell
#[tokio::test]
async fn test_table_assert_by_row_text() {
    let dir = tempfile::tempdir().unwrap();
    let page = MockPage::new(people_table());
    let runner = mock_runner(&page, dir.path());
    let step = |mode: &str| {
        format!(
            r#"[{{"name":"表格","steps":[{{"action":"table_assert","table":{{
                "row":{{"kind":"text","value":"Bob|25"}},
                "column":{{"kind":"index","value":"1"}},
                "value":"Bob","mode":"{mode}"}}}}]}}]"#
        )
    };

    let equals = TestSuite::from_json(&step("equals")).unwrap();
    assert!(runner.run_suite(&equals).await.is_success());

    let not_equals = TestSuite::from_json(&step("not_equals")).unwrap();
    let report = runner.run_suite(&not_equals).await;
    assert_eq!(report.failed(), 1);
    let err = report.into_result().unwrap_err();
    assert!(matches!(err.root_cause(), Error::AssertionFailed(_)));
}

/// An unknown action fails its case and stops the suite
#[tokio::test]
async fn test_unknown_action_stops_suite() {
    let dir = tempfile::tempdir().unwrap();
    let page = MockPage::new(login_form()).route("https://example.test/", El::new("div"));
    let suite = TestSuite::from_json(
        r#"[
            {"name":"第一个","steps":[
                {"action":"input","selector":{"type":"field","value":"用户名"},"text":"admin"},
                {"action":"frobnicate"},
                {"action":"input","selector":{"type":"field","value":"密码"},"text":"secret"}
            ]},
            {"name":"第二个","steps":[{"action":"goto","url":"https://example.test/"}]}
        ]"#,
    )
    .unwrap();

    let report = mock_runner(&page, dir.path()).run_suite(&suite).await;

    match &report.cases[0].status {
        CaseStatus::Failed { step, action, error } => {
            assert_eq!(*step, 2);
            assert_eq!(action, "frobnicate");
            assert!(matches!(error, Error::UnknownAction(_)));
        }
        other => panic!("unexpected status: {other:?}"),
    }
    assert!(matches!(report.cases[1].status, CaseStatus::NotRun));
    assert_eq!(page.value_of("username").as_deref(), Some("admin"));
    assert_eq!(page.value_of("password").as_deref(), Some(""));
    assert!(page.visited().is_empty());
}

/// A failing step leaves an error screenshot behind
#[tokio::test]
async fn test_failure_writes_error_screenshot() {
    let dir = tempfile::tempdir().unwrap();
    let page = MockPage::new(login_form());
    let suite = TestSuite::from_json(
        r#"[{"name":"点击","steps":[{"action":"click","selector":{"type":"button","value":"注册"}}]}]"#,
    )
    .unwrap();

    let report = mock_runner(&page, dir.path()).run_suite(&suite).await;
    assert!(!report.is_success());

    let shots: Vec<_> = std::fs::read_dir(dir.path().join("errors"))
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(shots.len(), 1);
    assert!(shots[0].starts_with("error_") && shots[0].ends_with(".png"));
}
