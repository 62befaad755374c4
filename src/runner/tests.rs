//! Runner tests against the in-memory page

use std::path::Path;
use std::sync::Arc;

use super::*;
use crate::captcha::MockSolver;
use crate::config::{Config, Pacing};
use crate::driver::{El, MockEvent, MockPage};
use crate::locator::{SelectorDescriptor, SelectorKind};
use crate::table::TableAssertMode;
use crate::Error;

const LOGIN_URL: &str = "https://example.test/login";

fn config(artifacts: &Path) -> Config {
    Config {
        timeout: 0,
        retry_captcha: 1,
        artifacts_dir: artifacts.to_path_buf(),
        pacing: Pacing::none(),
        ..Config::default()
    }
}

fn runner(page: &MockPage, artifacts: &Path) -> Runner {
    runner_with(page, artifacts, MockSolver::answering("ab12"))
}

fn runner_with(page: &MockPage, artifacts: &Path, solver: MockSolver) -> Runner {
    Runner::new(Arc::new(page.clone()), &config(artifacts), Arc::new(solver))
}

fn login_page() -> El {
    El::new("form").children([
        El::input("text").id("username").attr("placeholder", "用户名"),
        El::input("password").id("password").attr("placeholder", "密码"),
        El::input("text").id("captcha").attr("placeholder", "请输入验证码"),
        El::new("img").id("captcha-img").attr("src", "/api/captcha"),
        El::new("button").id("login-btn").text("登录").reveals("welcome"),
        El::new("div").id("welcome").text("欢迎, admin").hidden(),
    ])
}

fn row(cells: &[&str]) -> El {
    El::new("tr").children(cells.iter().map(|c| El::new("td").text(c)))
}

fn people() -> El {
    El::new("div").children([
        El::new("label").text("关键字"),
        El::input("text").id("keyword"),
        El::new("button").id("search-btn").text("搜索"),
        El::new("table").id("people").children([
            El::new("thead").child(
                El::new("tr").children([El::new("th").text("Name"), El::new("th").text("Age")]),
            ),
            El::new("tbody").children([row(&["Alice", "30"]), row(&["Bob", "25"])]),
        ]),
    ])
}

fn accounts() -> El {
    El::new("table").children((1..=2).map(|i| {
        let name = format!("user{i}");
        let edit = El::new("button").id(&format!("edit-{i}")).text("编辑");
        row(&[name.as_str()]).child(El::new("td").child(edit))
    }))
}

fn case(json: &str) -> TestCase {
    serde_json::from_str(json).unwrap()
}

#[test]
fn test_action_vocabulary() {
    for action in Action::ALL {
        assert_eq!(action.as_str().parse::<Action>().unwrap(), action);
    }
    assert!(matches!("frobnicate".parse::<Action>(), Err(Error::UnknownAction(a)) if a == "frobnicate"));
    assert!(matches!("Click".parse::<Action>(), Err(Error::UnknownAction(_))));
}

#[test]
fn test_step_requires_action_fields() {
    let err = Step::try_from(&TestStep::new("click")).unwrap_err();
    assert!(matches!(err, Error::InvalidStep(msg) if msg == "click requires selector"));

    let mut input = TestStep::new("input");
    input.selector = Some(SelectorDescriptor::field("用户名"));
    input.text = Some("  ".to_string());
    assert!(matches!(Step::try_from(&input), Err(Error::InvalidStep(_))));

    let mut options = TestStep::new("select_options");
    options.selector = Some(SelectorDescriptor::id("tags"));
    assert!(matches!(Step::try_from(&options), Err(Error::InvalidStep(msg)) if msg.contains("options")));
}

#[test]
fn test_unknown_expect_mode_is_invalid() {
    let step: TestStep = serde_json::from_str(
        r#"{"action":"assert","selector":{"type":"id","value":"welcome"},
            "expect":{"type":"id","value":"welcome","mode":"shouts","text":"x"}}"#,
    )
    .unwrap();
    assert!(matches!(Step::try_from(&step), Err(Error::InvalidStep(msg)) if msg.contains("shouts")));
}

#[test]
fn test_table_steps_parse() {
    let step: TestStep = serde_json::from_str(
        r#"{"action":"table_assert","table":{
              "row":{"type":"text","value":"Bob|25"},
              "column":{"type":"header","value":"Age"},
              "value":"25","mode":"not_equals"}}"#,
    )
    .unwrap();
    match Step::try_from(&step).unwrap() {
        Step::TableAssert { table, expected, mode } => {
            assert!(table.selector.is_empty());
            assert_eq!(table.row.value, "Bob|25");
            assert_eq!(expected, "25");
            assert_eq!(mode, TableAssertMode::NotEquals);
        }
        other => panic!("unexpected step: {other:?}"),
    }

    let edit: TestStep =
        serde_json::from_str(r#"{"action":"table_edit","table":{"row":{"type":"index","value":2}}}"#).unwrap();
    assert!(matches!(Step::try_from(&edit).unwrap(), Step::TableEdit { label, .. } if label == DEFAULT_EDIT_LABEL));

    let delete: TestStep = serde_json::from_str(
        r#"{"action":"table_delete","table":{"row":{"type":"index","value":"1"},"action":"移除"}}"#,
    )
    .unwrap();
    assert!(matches!(Step::try_from(&delete).unwrap(), Step::TableDelete { label, .. } if label == "移除"));

    let no_column: TestStep = serde_json::from_str(
        r#"{"action":"table_assert","table":{"row":{"type":"index","value":1},"value":"x"}}"#,
    )
    .unwrap();
    assert!(matches!(Step::try_from(&no_column), Err(Error::InvalidStep(msg)) if msg.contains("table.column")));
}

#[test]
fn test_unknown_selector_kind_falls_back_to_text() {
    let step: TestStep =
        serde_json::from_str(r#"{"action":"click","selector":{"type":"label","value":"登录","scope":"popup"}}"#)
            .unwrap();
    match Step::try_from(&step).unwrap() {
        Step::Click { target } => {
            assert_eq!(target.kind, SelectorKind::Text);
            assert_eq!(target, SelectorDescriptor::text("登录"));
        }
        other => panic!("unexpected step: {other:?}"),
    }
}

#[tokio::test]
async fn test_login_case_passes() {
    let dir = tempfile::tempdir().unwrap();
    let page = MockPage::new(El::new("div")).route(LOGIN_URL, login_page());
    let login = case(
        r#"{"name":"登录","steps":[
            {"action":"goto","url":"https://example.test/login"},
            {"action":"input","selector":{"type":"field","value":"用户名"},"text":"admin",
             "expect":{"type":"field","value":"用户名","mode":"value_equals","text":"admin"}},
            {"action":"input","selector":{"type":"field","value":"密码"},"text":"secret"},
            {"action":"captcha_input","captcha":{"auto":true}},
            {"action":"click","selector":{"type":"button","value":"登录"}},
            {"action":"assert","selector":{"type":"id","value":"welcome"},
             "expect":{"type":"id","value":"welcome","mode":"text_contains","text":"admin"}}
        ]}"#,
    );

    runner(&page, dir.path()).run_case(&login).await.unwrap();

    assert_eq!(page.visited(), vec![LOGIN_URL]);
    assert_eq!(page.value_of("username").as_deref(), Some("admin"));
    assert_eq!(page.value_of("password").as_deref(), Some("secret"));
    assert_eq!(page.value_of("captcha").as_deref(), Some("ab12"));
    assert_eq!(page.clicked(), vec!["button#login-btn"]);
    assert!(page.is_shown("welcome"));
}

#[tokio::test]
async fn test_failing_expectation_reports_step_and_screenshot() {
    let dir = tempfile::tempdir().unwrap();
    let page = MockPage::new(login_page());
    let login = case(
        r#"{"name":"登录","steps":[
            {"action":"input","selector":{"type":"field","value":"用户名"},"text":"admin"},
            {"action":"assert","selector":{"type":"field","value":"用户名"},
             "expect":{"type":"field","value":"用户名","mode":"value_equals","text":"root"}}
        ]}"#,
    );

    let err = runner(&page, dir.path()).run_case(&login).await.unwrap_err();
    match err {
        Error::StepFailed { index, action, source } => {
            assert_eq!((index, action.as_str()), (2, "assert"));
            assert!(matches!(*source, Error::AssertionFailed(msg) if msg.contains("'root'")));
        }
        other => panic!("unexpected error: {other}"),
    }

    assert!(page.events().contains(&MockEvent::Screenshot));
    let shots: Vec<_> = std::fs::read_dir(dir.path().join("errors")).unwrap().collect();
    assert_eq!(shots.len(), 1);
}

#[tokio::test]
async fn test_assert_hidden_element_fails() {
    let dir = tempfile::tempdir().unwrap();
    let page = MockPage::new(login_page());
    let step = Step::Assert {
        target: SelectorDescriptor::id("welcome"),
        expect: None,
    };
    let err = runner(&page, dir.path()).execute(&step).await.unwrap_err();
    assert!(matches!(err, Error::AssertionFailed(msg) if msg.contains("not visible")));
}

#[tokio::test]
async fn test_text_equals_trims() {
    let dir = tempfile::tempdir().unwrap();
    let page = MockPage::new(El::new("div").child(El::new("span").id("status").text("  已启用 ")));
    let step = Step::Assert {
        target: SelectorDescriptor::id("status"),
        expect: Some(Expectation {
            target: SelectorDescriptor::id("status"),
            mode: AssertMode::TextEquals,
            text: "已启用".to_string(),
        }),
    };
    runner(&page, dir.path()).execute(&step).await.unwrap();
}

#[tokio::test]
async fn test_table_assert_modes() {
    let dir = tempfile::tempdir().unwrap();
    let page = MockPage::new(people());
    let runner = runner(&page, dir.path());

    let equals = case(
        r#"{"name":"年龄","steps":[{"action":"table_assert","table":{
            "selector":{"type":"id","value":"people"},
            "row":{"type":"text","value":"Bob|25"},
            "column":{"type":"header","value":"Age"},
            "value":"25"}}]}"#,
    );
    runner.run_case(&equals).await.unwrap();

    let not_equals = case(
        r#"{"name":"年龄","steps":[{"action":"table_assert","table":{
            "row":{"type":"text","value":"Bob|25"},
            "column":{"type":"header","value":"Age"},
            "value":"25","mode":"not_equals"}}]}"#,
    );
    let err = runner.run_case(&not_equals).await.unwrap_err();
    assert!(matches!(err.root_cause(), Error::AssertionFailed(_)));
}

#[tokio::test]
async fn test_table_edit_clicks_row_action() {
    let dir = tempfile::tempdir().unwrap();
    let page = MockPage::new(accounts());
    let edit = case(r#"{"name":"编辑","steps":[{"action":"table_edit","table":{"row":{"type":"index","value":2}}}]}"#);
    runner(&page, dir.path()).run_case(&edit).await.unwrap();
    assert_eq!(page.clicked(), vec!["button#edit-2"]);
}

#[tokio::test]
async fn test_search_fills_inputs_then_clicks() {
    let dir = tempfile::tempdir().unwrap();
    let page = MockPage::new(people());
    let search = case(
        r#"{"name":"搜索","steps":[{"action":"search","search":{
            "inputs":[{"selector":{"type":"field","value":"关键字"},"text":"Bob"}],
            "button":{"type":"button","value":"搜索"}}}]}"#,
    );
    runner(&page, dir.path()).run_case(&search).await.unwrap();
    assert_eq!(page.value_of("keyword").as_deref(), Some("Bob"));
    assert_eq!(page.clicked(), vec!["button#search-btn"]);
}

#[tokio::test]
async fn test_form_actions() {
    let dir = tempfile::tempdir().unwrap();
    let page = MockPage::new(El::new("form").children([
        El::new("label").text("城市"),
        El::new("select")
            .id("city")
            .children([El::option("bj", "北京"), El::option("sh", "上海")]),
        El::new("select")
            .id("tags")
            .attr("multiple", "")
            .children([El::option("a", "Alpha"), El::option("b", "Beta"), El::option("c", "Gamma")]),
        El::new("label").text("同意协议"),
        El::input("checkbox").id("agree"),
        El::input("checkbox").id("newsletter").checked(),
        El::input("radio").id("male").attr("name", "gender").checked(),
        El::input("radio").id("female").attr("name", "gender"),
    ]));
    let form = case(
        r#"{"name":"表单","steps":[
            {"action":"select_option","selector":{"type":"text","value":"城市"},"text":"上海"},
            {"action":"select_options","selector":{"type":"id","value":"tags"},"options":["Alpha","Gamma"]},
            {"action":"checkbox_toggle","selector":{"type":"text","value":"同意协议"}},
            {"action":"checkboxes_set","selectors":[{"type":"id","value":"agree"},{"type":"id","value":"newsletter"}],"checked":false},
            {"action":"checkbox_set","selector":{"type":"id","value":"agree"},"checked":true},
            {"action":"radio_select","selector":{"type":"id","value":"female"}}
        ]}"#,
    );

    runner(&page, dir.path()).run_case(&form).await.unwrap();

    assert_eq!(page.selected_labels("city"), vec!["上海"]);
    assert_eq!(page.selected_labels("tags"), vec!["Alpha", "Gamma"]);
    assert_eq!(page.is_checked("agree"), Some(true));
    assert_eq!(page.is_checked("newsletter"), Some(false));
    assert_eq!(page.is_checked("male"), Some(false));
    assert_eq!(page.is_checked("female"), Some(true));
}

#[tokio::test]
async fn test_menu_click() {
    let dir = tempfile::tempdir().unwrap();
    let page = MockPage::new(El::new("ul").children([
        El::new("li").id("system").text("系统管理").reveals("system-sub"),
        El::new("ul")
            .id("system-sub")
            .hidden()
            .child(El::new("li").id("users").text("用户管理")),
    ]));
    let step = Step::MenuClick {
        path: "系统管理 > 用户管理".to_string(),
    };
    runner(&page, dir.path()).execute(&step).await.unwrap();
    assert_eq!(page.clicked(), vec!["li#system", "li#users"]);
}

#[tokio::test]
async fn test_manual_captcha_uses_given_selectors() {
    let dir = tempfile::tempdir().unwrap();
    let page = MockPage::new(login_page());
    let solver = MockSolver::answering("x9y8");
    let step = Step::CaptchaInput(CaptchaTarget::Manual {
        image: SelectorDescriptor::id("captcha-img"),
        input: SelectorDescriptor::id("captcha"),
    });
    runner_with(&page, dir.path(), solver.clone()).execute(&step).await.unwrap();
    assert_eq!(page.value_of("captcha").as_deref(), Some("x9y8"));
    assert_eq!(solver.seen().len(), 1);
}

#[tokio::test]
async fn test_unknown_action_stops_suite() {
    let dir = tempfile::tempdir().unwrap();
    let page = MockPage::new(login_page());
    let suite = TestSuite::from_json(
        r#"[
            {"name":"坏用例","steps":[{"action":"frobnicate"}]},
            {"name":"后续用例","steps":[{"action":"goto","url":"https://example.test/login"}]}
        ]"#,
    )
    .unwrap();

    let report = runner(&page, dir.path()).run_suite(&suite).await;

    assert_eq!((report.passed(), report.failed(), report.not_run()), (0, 1, 1));
    match &report.cases[0].status {
        CaseStatus::Failed { step, action, error } => {
            assert_eq!((*step, action.as_str()), (1, "frobnicate"));
            assert!(matches!(error, Error::UnknownAction(a) if a == "frobnicate"));
        }
        other => panic!("unexpected status: {other:?}"),
    }
    assert!(matches!(report.cases[1].status, CaseStatus::NotRun));
    assert!(page.visited().is_empty());
    assert!(report.into_result().is_err());
}

#[tokio::test]
async fn test_run_suite_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("suite.json");
    std::fs::write(
        &path,
        r#"[{"name":"打开","steps":[{"action":"goto","url":"https://example.test/login"}]}]"#,
    )
    .unwrap();
    let page = MockPage::new(El::new("div"));

    let report = runner(&page, dir.path()).run_suite_file(&path).await.unwrap();
    assert!(report.is_success());
    assert_eq!(report.cases.len(), 1);

    let missing = runner(&page, dir.path())
        .run_suite_file(&dir.path().join("missing.json"))
        .await
        .unwrap_err();
    assert!(matches!(missing, Error::Configuration(_)));
}
