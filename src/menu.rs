//! Menu navigator
//!
//! Clicks a `>`-delimited path such as `系统管理 > 用户管理 > 新增用户`, one
//! level at a time. A level that is not visible yet is hovered first so
//! hover-expanded submenus open.

use std::sync::Arc;
use tracing::{debug, info, instrument};

use crate::config::{settle, Pacing};
use crate::driver::{ClickOptions, ElementHandle, Root};
use crate::locator::{strategies, Cascade, ElementLocator, Outcome};
use crate::{Error, Result};

/// Separator between menu levels
pub const PATH_SEPARATOR: char = '>';

/// Split a menu path into trimmed, non-empty levels
pub fn parse_path(path: &str) -> Result<Vec<String>> {
    if path.trim().is_empty() {
        return Err(Error::invalid_step("menu path is empty"));
    }
    path.split(PATH_SEPARATOR)
        .map(|item| {
            let item = item.trim();
            if item.is_empty() {
                Err(Error::invalid_step(format!("menu path '{}' has an empty item", path)))
            } else {
                Ok(item.to_string())
            }
        })
        .collect()
}

#[derive(Debug, Clone)]
pub struct MenuNavigator {
    locator: Arc<ElementLocator>,
    pacing: Pacing,
}

impl MenuNavigator {
    pub fn new(locator: Arc<ElementLocator>, pacing: Pacing) -> Self {
        Self { locator, pacing }
    }

    /// Click every level of `path` in order
    #[instrument(skip(self))]
    pub async fn click_path(&self, path: &str) -> Result<()> {
        let items = parse_path(path)?;
        let total = items.len();

        for (i, label) in items.iter().enumerate() {
            info!("Clicking menu item [{}/{}]: {}", i + 1, total, label);
            let item = self.locate_item(label).await?;

            let visible = match item.is_visible().await {
                Ok(visible) => visible,
                Err(e) if e.is_timeout() => return Err(e),
                Err(e) => {
                    debug!("Visibility check for '{}' failed: {}", label, e);
                    false
                }
            };
            if !visible {
                debug!("Menu item '{}' hidden, hovering to expand", label);
                item.hover().await?;
                settle(self.pacing.menu_expand_ms).await;
            }

            item.click(ClickOptions::default()).await?;
            settle(self.pacing.menu_ms).await;

            if i + 1 < total {
                settle(self.pacing.menu_expand_ms).await;
            }
        }
        Ok(())
    }

    async fn locate_item(&self, label: &str) -> Result<Arc<dyn ElementHandle>> {
        let cascade = Cascade::new(strategies::menu_item(label));
        match cascade.run(self.locator.page().as_ref(), &Root::Document).await? {
            Outcome::Found { handle, strategy } => {
                debug!("Menu item '{}' resolved via '{}'", label, strategy);
                Ok(handle)
            }
            Outcome::Missed { last_error } => {
                let detail = last_error
                    .map(|e| format!(" (last query error: {})", e))
                    .unwrap_or_default();
                Err(Error::not_found(format!("menu item '{}'{}", label, detail)))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::{El, MockEvent, MockPage};
    use std::time::Duration;

    fn navigator(page: &MockPage) -> MenuNavigator {
        let locator = ElementLocator::new(Arc::new(page.clone()), Duration::ZERO);
        MenuNavigator::new(Arc::new(locator), Pacing::none())
    }

    fn sidebar() -> El {
        El::new("ul").class("el-menu").children([
            El::new("li")
                .id("system")
                .text("系统管理")
                .reveals("system-sub"),
            El::new("ul").id("system-sub").hidden().children([
                El::new("li").id("users").text("用户管理").reveals_on_hover("users-sub"),
                El::new("li").id("roles").text("角色管理"),
            ]),
            El::new("ul").id("users-sub").hidden().child(El::new("li").id("add-user").text("新增用户")),
        ])
    }

    #[test]
    fn test_parse_path() {
        assert_eq!(
            parse_path(" 系统管理 > 用户管理 >新增用户 ").unwrap(),
            vec!["系统管理", "用户管理", "新增用户"]
        );
        assert_eq!(parse_path("首页").unwrap(), vec!["首页"]);
        assert!(matches!(parse_path("  "), Err(Error::InvalidStep(_))));
        assert!(matches!(parse_path("系统管理 > > 用户"), Err(Error::InvalidStep(_))));
    }

    #[tokio::test]
    async fn test_click_path_expands_levels() {
        let page = MockPage::new(sidebar());
        navigator(&page).click_path("系统管理 > 角色管理").await.unwrap();
        assert_eq!(page.clicked(), vec!["li#system", "li#roles"]);
    }

    #[tokio::test]
    async fn test_hidden_level_is_hovered() {
        let page = MockPage::new(El::new("nav").child(
            El::new("li")
                .id("add-user")
                .text("新增用户")
                .hidden()
                .reveals_on_hover("add-user"),
        ));
        navigator(&page).click_path("新增用户").await.unwrap();
        assert_eq!(
            page.events(),
            vec![
                MockEvent::Hover("li#add-user".to_string()),
                MockEvent::Click {
                    target: "li#add-user".to_string(),
                    modifiers: vec![],
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_item_still_hidden_after_hover_fails() {
        let page = MockPage::new(sidebar());
        let err = navigator(&page)
            .click_path("系统管理 > 用户管理 > 新增用户")
            .await
            .unwrap_err();
        assert!(err.is_timeout());
        assert_eq!(page.clicked(), vec!["li#system", "li#users"]);
    }

    #[tokio::test]
    async fn test_visibility_timeout_stops_navigation() {
        let page = MockPage::new(sidebar()).stall_visibility_after(1);
        let err = navigator(&page).click_path("系统管理").await.unwrap_err();
        assert!(err.is_timeout());
        assert!(page.events().is_empty());
    }

    #[tokio::test]
    async fn test_missing_item() {
        let page = MockPage::new(sidebar());
        let err = navigator(&page).click_path("系统管理 > 日志").await.unwrap_err();
        assert!(matches!(err, Error::NotFound(msg) if msg.contains("日志")));
        assert_eq!(page.clicked(), vec!["li#system"]);
    }
}
