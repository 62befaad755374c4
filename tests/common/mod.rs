//! Common test utilities
//!
//! Shared fixtures for the integration tests: runners over the in-memory
//! page, sample pages and suite files.

#![allow(dead_code)]

use autotest::captcha::MockSolver;
use autotest::config::{Config, Pacing};
use autotest::driver::{El, MockPage};
use autotest::runner::Runner;
use std::path::Path;
use std::sync::Arc;

/// Configuration with no settle delays and single-pass lookups
pub fn test_config(artifacts: &Path) -> Config {
    Config {
        timeout: 0,
        retry_captcha: 1,
        artifacts_dir: artifacts.to_path_buf(),
        pacing: Pacing::none(),
        ..Config::default()
    }
}

/// Runner over `page` whose captcha solver always answers `ab12`
pub fn mock_runner(page: &MockPage, artifacts: &Path) -> Runner {
    Runner::new(
        Arc::new(page.clone()),
        &test_config(artifacts),
        Arc::new(MockSolver::answering("ab12")),
    )
}

/// `<label>用户名</label><input>`
pub fn login_form() -> El {
    El::new("form").children([
        El::new("label").text("用户名"),
        El::input("text").id("username"),
        El::new("label").text("密码"),
        El::input("password").id("password"),
        El::new("button").id("login").text("登录"),
    ])
}

/// Table with rows `Alice|30` and `Bob|25`
pub fn people_table() -> El {
    let row = |name: &str, age: &str| El::new("tr").children([El::new("td").text(name), El::new("td").text(age)]);
    El::new("table").children([
        El::new("thead").child(El::new("tr").children([El::new("th").text("Name"), El::new("th").text("Age")])),
        El::new("tbody").children([row("Alice", "30"), row("Bob", "25")]),
    ])
}

/// Write `json` as a suite file under `dir`
pub fn write_suite(dir: &Path, json: &str) -> std::path::PathBuf {
    let path = dir.join("suite.json");
    std::fs::write(&path, json).unwrap();
    path
}

/// Get test HTML content
pub fn get_test_html() -> String {
    r#"
<!DOCTYPE html>
<html>
<head>
    <title>Login</title>
</head>
<body><div id="app">
    <form>
        <label>用户名</label><input id="username" type="text" />
        <label>密码</label><input id="password" type="password" />
        <button id="login" type="button" onclick="document.getElementById('welcome').style.display='block'">登录</button>
    </form>
    <div id="welcome" style="display:none">欢迎</div>
    <table>
        <thead><tr><th>Name</th><th>Age</th></tr></thead>
        <tbody><tr><td>Alice</td><td>30</td></tr><tr><td>Bob</td><td>25</td></tr></tbody>
    </table>
</div></body>
</html>
    "#
    .to_string()
}

/// The page of [`get_test_html`] built for the in-memory driver
pub fn test_page() -> El {
    El::new("div").id("app").children([
        login_form(),
        El::new("div").id("welcome").text("欢迎").hidden(),
        people_table(),
    ])
}

/// `data:` URL serving [`get_test_html`]
pub fn get_test_url() -> String {
    "data:text/html;charset=utf-8,".to_string() + &urlencoding::encode(&get_test_html())
}
