//! Scope resolution
//!
//! Narrows the search root for one resolution call. Never cached: dialogs
//! open and close between steps.

use tracing::{debug, instrument, warn};

use super::descriptor::Scope;
use crate::driver::{PageDriver, Query, Root};
use crate::Result;

/// Modal containers, most specific first
pub const DIALOG_PATTERNS: [&str; 7] = [
    "[role='dialog']",
    ".el-dialog__wrapper",
    ".el-dialog",
    ".ant-modal-root",
    ".ant-modal-content",
    ".modal",
    ".dialog",
];

/// Main content regions
pub const MAIN_PATTERNS: [&str; 8] = [
    "main",
    ".el-main",
    ".el-container .el-main",
    ".ant-layout-content",
    ".layout-main",
    "#app main",
    "#app .main",
    "#app .content",
];

/// Resolve `scope` to a query root
///
/// `dialog` picks the first visible container across all patterns, `main`
/// the first match of the first matching pattern. Both fall back to the
/// whole document.
#[instrument(skip(page))]
pub async fn resolve(page: &dyn PageDriver, scope: Scope) -> Result<Root> {
    match scope {
        Scope::None => Ok(Root::Document),
        Scope::Dialog => {
            for pattern in DIALOG_PATTERNS {
                for candidate in page.query_all(&Root::Document, &Query::css(pattern)).await? {
                    if candidate.is_visible().await? {
                        debug!("Dialog scope resolved by {}", pattern);
                        return Ok(Root::Element(candidate));
                    }
                }
            }
            warn!("No visible dialog found, searching the whole page");
            Ok(Root::Document)
        }
        Scope::Main => {
            for pattern in MAIN_PATTERNS {
                if let Some(region) = page
                    .query_all(&Root::Document, &Query::css(pattern))
                    .await?
                    .into_iter()
                    .next()
                {
                    debug!("Main scope resolved by {}", pattern);
                    return Ok(Root::Element(region));
                }
            }
            debug!("No main region found, searching the whole page");
            Ok(Root::Document)
        }
    }
}
