//! Form engine tests against the in-memory page

use std::sync::Arc;
use std::time::Duration;

use super::*;
use crate::config::Pacing;
use crate::driver::{El, MockEvent, MockPage, Modifier};
use crate::locator::{ElementLocator, SelectorDescriptor};
use crate::Error;

fn engine(page: &MockPage) -> FormEngine {
    let locator = ElementLocator::new(Arc::new(page.clone()), Duration::ZERO);
    FormEngine::new(Arc::new(locator), Pacing::none())
}

fn city_form() -> El {
    El::new("form").children([
        El::new("label").text("城市"),
        El::new("select")
            .id("city")
            .child(El::option("bj", " 北京 "))
            .child(El::option("sh", "上海")),
    ])
}

fn values(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

#[tokio::test]
async fn test_native_select_by_label_text() {
    let page = MockPage::new(city_form());
    engine(&page)
        .select_option(&SelectorDescriptor::text("城市"), "上海")
        .await
        .unwrap();
    assert_eq!(page.selected_labels("city"), vec!["上海"]);
}

#[tokio::test]
async fn test_native_select_falls_back_to_value() {
    let page = MockPage::new(city_form());
    engine(&page)
        .select_option(&SelectorDescriptor::id("city"), "sh")
        .await
        .unwrap();
    assert_eq!(page.selected_labels("city"), vec!["上海"]);
    assert!(page.clicked().is_empty());
}

#[tokio::test]
async fn test_native_multiple_select() {
    let page = MockPage::new(
        El::new("select")
            .id("tags")
            .attr("multiple", "")
            .children([El::option("a", "Alpha"), El::option("b", "Beta"), El::option("c", "Gamma")]),
    );
    engine(&page)
        .set_select_values(&SelectorDescriptor::id("tags"), &values(&["Alpha", "Gamma"]))
        .await
        .unwrap();
    assert_eq!(page.selected_labels("tags"), vec!["Alpha", "Gamma"]);
}

#[tokio::test]
async fn test_native_select_missing_option() {
    let page = MockPage::new(city_form());
    let err = engine(&page)
        .select_option(&SelectorDescriptor::id("city"), "广州")
        .await
        .unwrap_err();
    assert!(matches!(err, Error::OptionNotFound(v) if v == "广州"));
}

#[tokio::test]
async fn test_custom_dropdown_single_uses_first_value() {
    let page = MockPage::new(El::new("div").children([
        El::new("div")
            .class("el-select")
            .id("role")
            .reveals("role-popup")
            .child(El::input("text").attr("placeholder", "请选择角色").attr("readonly", "")),
        El::new("ul").id("role-popup").hidden().children([
            El::new("li").id("opt-admin").text("管理员"),
            El::new("li").id("opt-guest").text("访客"),
        ]),
    ]));
    engine(&page)
        .set_select_values(&SelectorDescriptor::id("role"), &values(&["管理员", "访客"]))
        .await
        .unwrap();
    assert_eq!(page.clicked(), vec!["div#role", "li#opt-admin"]);
}

fn role_dropdown_with_stale_popup(popup: Vec<El>) -> El {
    El::new("div").children([
        El::new("ul")
            .id("stale-popup")
            .hidden()
            .child(El::new("li").id("stale").text("管理员")),
        El::new("div")
            .class("el-select")
            .id("role")
            .reveals("role-popup")
            .child(El::input("text").attr("placeholder", "请选择角色").attr("readonly", "")),
        El::new("ul").id("role-popup").hidden().children(popup),
    ])
}

#[tokio::test]
async fn test_custom_dropdown_skips_unclickable_option() {
    let page = MockPage::new(role_dropdown_with_stale_popup(vec![
        El::new("li").id("opt-admin").text("管理员 (admin)"),
    ]));
    engine(&page)
        .set_select_values(&SelectorDescriptor::id("role"), &values(&["管理员"]))
        .await
        .unwrap();
    assert_eq!(page.clicked(), vec!["div#role", "li#opt-admin"]);
}

#[tokio::test]
async fn test_custom_dropdown_without_clickable_option() {
    let page = MockPage::new(role_dropdown_with_stale_popup(vec![El::new("li").id("opt-guest").text("访客")]));
    let err = engine(&page)
        .set_select_values(&SelectorDescriptor::id("role"), &values(&["管理员"]))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::OptionNotFound(v) if v == "管理员"));
    assert_eq!(page.clicked(), vec!["div#role"]);
}

fn multi_dropdown() -> El {
    El::new("div").children([
        El::new("div")
            .class("el-select")
            .id("tags")
            .reveals("tags-popup")
            .child(El::new("select").attr("multiple", "").hidden()),
        El::new("ul").id("tags-popup").hidden().children([
            El::new("li").id("alpha").text("Alpha"),
            El::new("li").id("beta").text("Beta"),
        ]),
    ])
}

#[tokio::test]
async fn test_custom_multi_select_holds_control() {
    let page = MockPage::new(multi_dropdown());
    engine(&page)
        .set_select_values(&SelectorDescriptor::id("tags"), &values(&["Alpha", "Beta"]))
        .await
        .unwrap();

    assert_eq!(
        page.events(),
        vec![
            MockEvent::Click { target: "div#tags".into(), modifiers: vec![] },
            MockEvent::Click { target: "li#alpha".into(), modifiers: vec![] },
            MockEvent::KeyDown(Modifier::Control),
            MockEvent::Click { target: "li#beta".into(), modifiers: vec![Modifier::Control] },
            MockEvent::KeyUp(Modifier::Control),
        ]
    );
}

#[tokio::test]
async fn test_custom_dropdown_missing_option_keeps_earlier_clicks() {
    let page = MockPage::new(multi_dropdown());
    let err = engine(&page)
        .set_select_values(&SelectorDescriptor::id("tags"), &values(&["Alpha", "Gamma"]))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::OptionNotFound(v) if v == "Gamma"));
    assert_eq!(page.clicked(), vec!["div#tags", "li#alpha"]);
    assert!(!page.events().contains(&MockEvent::KeyDown(Modifier::Control)));
}

#[tokio::test]
async fn test_empty_values_rejected() {
    let page = MockPage::new(city_form());
    let err = engine(&page)
        .set_select_values(&SelectorDescriptor::id("city"), &[])
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InvalidStep(_)));
}

fn agreement() -> El {
    El::new("div").children([
        El::new("label").text("同意协议"),
        El::input("checkbox").id("agree"),
        El::new("label").text("订阅邮件"),
        El::input("checkbox").id("newsletter").checked(),
    ])
}

#[tokio::test]
async fn test_toggle_checkbox_returns_new_state() {
    let page = MockPage::new(agreement());
    let forms = engine(&page);
    let desc = SelectorDescriptor::text("同意协议");

    assert!(forms.toggle_checkbox(&desc).await.unwrap());
    assert_eq!(page.is_checked("agree"), Some(true));
    assert!(!forms.toggle_checkbox(&desc).await.unwrap());
    assert_eq!(page.is_checked("agree"), Some(false));
}

#[tokio::test]
async fn test_set_checkbox_is_idempotent() {
    let page = MockPage::new(agreement());
    let forms = engine(&page);
    let desc = SelectorDescriptor::id("newsletter");

    forms.set_checkbox(&desc, true).await.unwrap();
    assert!(forms.checkbox_state(&desc).await.unwrap());
    forms.set_checkbox(&desc, false).await.unwrap();
    forms.set_checkbox(&desc, false).await.unwrap();
    assert!(!forms.checkbox_state(&desc).await.unwrap());
}

#[tokio::test]
async fn test_set_checkboxes_reports_failing_item() {
    let page = MockPage::new(agreement());
    let items = vec![
        (SelectorDescriptor::id("agree"), true),
        (SelectorDescriptor::id("missing"), true),
        (SelectorDescriptor::id("newsletter"), false),
    ];
    let err = engine(&page).set_checkboxes(&items).await.unwrap_err();

    match err {
        Error::BatchItemFailed { index, total, source, .. } => {
            assert_eq!((index, total), (2, 3));
            assert!(matches!(*source, Error::NotFound(_)));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(page.is_checked("agree"), Some(true));
    assert_eq!(page.is_checked("newsletter"), Some(true));
}

#[tokio::test]
async fn test_toggle_checkboxes_flips_each() {
    let page = MockPage::new(agreement());
    engine(&page)
        .toggle_checkboxes(&[SelectorDescriptor::id("agree"), SelectorDescriptor::id("newsletter")])
        .await
        .unwrap();
    assert_eq!(page.is_checked("agree"), Some(true));
    assert_eq!(page.is_checked("newsletter"), Some(false));
}

#[tokio::test]
async fn test_select_radios_across_groups() {
    let page = MockPage::new(El::new("form").children([
        El::input("radio").id("male").attr("name", "gender").checked(),
        El::input("radio").id("female").attr("name", "gender"),
        El::input("radio").id("junior").attr("name", "level").checked(),
        El::input("radio").id("senior").attr("name", "level"),
    ]));
    let forms = engine(&page);
    forms
        .select_radios(&[SelectorDescriptor::id("female"), SelectorDescriptor::id("senior")])
        .await
        .unwrap();

    assert_eq!(page.is_checked("male"), Some(false));
    assert_eq!(page.is_checked("female"), Some(true));
    assert_eq!(page.is_checked("junior"), Some(false));
    assert!(forms.radio_state(&SelectorDescriptor::id("senior")).await.unwrap());
}

#[tokio::test]
async fn test_select_reads() {
    let page = MockPage::new(city_form());
    let forms = engine(&page);
    let desc = SelectorDescriptor::text("城市");

    assert_eq!(forms.select_value(&desc).await.unwrap(), "bj");
    assert_eq!(forms.select_option_labels(&desc).await.unwrap(), vec!["北京", "上海"]);
}
