//! Table engine
//!
//! Resolves a table, then a row, then optionally a column. The row handle
//! found once is reused for cell reads and row actions, so a row is never
//! searched twice within one operation.

use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use super::types::{ColumnKind, ColumnLocator, RowKind, RowLocator, TableAssertMode, TableLocator};
use crate::config::{settle, Pacing};
use crate::driver::{ClickOptions, ElementHandle, PageDriver, Query, Root, TextMatch};
use crate::locator::{cascade, strategies, Cascade, ElementLocator, Pick, SelectorDescriptor, SelectorKind};
use crate::{Error, Result};

/// Separator used when a row is matched by its cell texts
pub const CELL_SEPARATOR: &str = "|";

/// A resolved row
#[derive(Debug, Clone)]
pub struct RowMatch {
    pub table: Arc<dyn ElementHandle>,
    pub row: Arc<dyn ElementHandle>,
    /// 1-based position among the table's data rows
    pub index: usize,
    /// Trimmed text content of the row
    pub text: String,
}

/// Table reads, assertions and row actions
#[derive(Debug, Clone)]
pub struct TableEngine {
    locator: Arc<ElementLocator>,
    pacing: Pacing,
}

impl TableEngine {
    pub fn new(locator: Arc<ElementLocator>, pacing: Pacing) -> Self {
        Self { locator, pacing }
    }

    fn page(&self) -> &dyn PageDriver {
        self.locator.page().as_ref()
    }

    async fn query(&self, root: &Arc<dyn ElementHandle>, css: &str) -> Result<Vec<Arc<dyn ElementHandle>>> {
        self.page()
            .query_all(&Root::Element(Arc::clone(root)), &Query::css(css))
            .await
    }

    /// Resolve the table element; an empty selector means the first table on the page
    pub async fn find_table(&self, selector: &SelectorDescriptor) -> Result<Arc<dyn ElementHandle>> {
        let value = selector.value.trim();
        let root = self.locator.root(selector.scope).await?;
        let query = if value.is_empty() {
            Query::css("table")
        } else {
            match selector.kind {
                SelectorKind::Text => Query::has_descendant("table", "th", TextMatch::contains(value)),
                SelectorKind::XPath => Query::xpath(value),
                SelectorKind::Id => Query::id(value),
                _ => Query::css(value),
            }
        };

        let matches = self.page().query_all(&root, &query).await?;
        if value.is_empty() {
            return matches
                .into_iter()
                .next()
                .ok_or_else(|| Error::table_not_found("no table on the current page"));
        }
        cascade::pick(&matches, Pick::PreferVisible)
            .await?
            .ok_or_else(|| Error::table_not_found(selector.to_string()))
    }

    /// Data rows: `tbody tr` when the table has a body, otherwise every `tr`
    pub async fn rows(&self, table: &Arc<dyn ElementHandle>) -> Result<Vec<Arc<dyn ElementHandle>>> {
        let body_rows = self.query(table, "tbody tr").await?;
        if !body_rows.is_empty() {
            return Ok(body_rows);
        }
        self.query(table, "tr").await
    }

    /// Trimmed texts of a row's cells
    async fn cell_texts(&self, row: &Arc<dyn ElementHandle>) -> Result<Vec<String>> {
        let mut texts = Vec::new();
        for cell in self.query(row, "td, th").await? {
            texts.push(cell.text_content().await?.trim().to_string());
        }
        Ok(texts)
    }

    /// Resolve `locator.row` inside the table
    #[instrument(skip(self, locator), fields(row = %locator.row))]
    pub async fn find_row(&self, locator: &TableLocator) -> Result<RowMatch> {
        let table = self.find_table(&locator.selector).await?;
        let rows = self.rows(&table).await?;
        let wanted = &locator.row;

        if wanted.kind == RowKind::Index {
            let index: usize = wanted.value.trim().parse().map_err(|_| {
                Error::invalid_step(format!("row index '{}' is not a number", wanted.value))
            })?;
            if index < 1 || index > rows.len() {
                return Err(Error::row_not_found(format!(
                    "row index {} out of range ({} rows)",
                    index,
                    rows.len()
                )));
            }
            let row = Arc::clone(&rows[index - 1]);
            let text = row.text_content().await?.trim().to_string();
            return Ok(RowMatch {
                table,
                row,
                index,
                text,
            });
        }

        let mut found: Option<RowMatch> = None;
        let mut duplicates = 0;
        for (i, row) in rows.iter().enumerate() {
            let text = row.text_content().await?.trim().to_string();
            if let Some(first) = &found {
                if text == first.text {
                    duplicates += 1;
                }
                continue;
            }
            let joined = self.cell_texts(row).await?.join(CELL_SEPARATOR);
            if row_matches(wanted, &text, &joined) {
                found = Some(RowMatch {
                    table: Arc::clone(&table),
                    row: Arc::clone(row),
                    index: i + 1,
                    text,
                });
            }
        }

        let found = found.ok_or_else(|| Error::row_not_found(wanted.to_string()))?;
        if duplicates > 0 {
            warn!(
                "{} more row(s) share the text of row {}; using the first",
                duplicates, found.index
            );
        }
        debug!("Resolved {} to row {}", wanted, found.index);
        Ok(found)
    }

    /// 1-based column position
    pub async fn resolve_column(&self, table: &Arc<dyn ElementHandle>, column: &ColumnLocator) -> Result<usize> {
        match column.kind {
            ColumnKind::Index => {
                let index: usize = column.value.trim().parse().map_err(|_| {
                    Error::invalid_step(format!("column index '{}' is not a number", column.value))
                })?;
                if index < 1 {
                    return Err(Error::invalid_step("column index must be at least 1"));
                }
                Ok(index)
            }
            ColumnKind::Header => {
                for (i, header) in self.query(table, "th").await?.iter().enumerate() {
                    if header.text_content().await?.contains(column.value.as_str()) {
                        return Ok(i + 1);
                    }
                }
                Err(Error::column_not_found(format!("no header contains '{}'", column.value)))
            }
        }
    }

    /// The cell at the locator's row and column
    pub async fn find_cell(&self, locator: &TableLocator) -> Result<Arc<dyn ElementHandle>> {
        let column = locator
            .column
            .as_ref()
            .ok_or_else(|| Error::invalid_step("table column is required"))?;
        let row = self.find_row(locator).await?;
        let position = self.resolve_column(&row.table, column).await?;

        let cells = self.query(&row.row, "td, th").await?;
        cells.get(position - 1).cloned().ok_or_else(|| {
            Error::column_not_found(format!(
                "{} out of range (row {} has {} cells)",
                column,
                row.index,
                cells.len()
            ))
        })
    }

    /// Trimmed text of the located cell
    pub async fn cell_text(&self, locator: &TableLocator) -> Result<String> {
        Ok(self.find_cell(locator).await?.text_content().await?.trim().to_string())
    }

    /// Compare the located cell's text against `expected`
    #[instrument(skip(self, locator), fields(row = %locator.row))]
    pub async fn assert_cell(&self, locator: &TableLocator, expected: &str, mode: TableAssertMode) -> Result<()> {
        let actual = self.cell_text(locator).await?;
        if mode.holds(&actual, expected) {
            info!("Table cell '{}' {} '{}'", actual, mode.as_str(), expected);
            return Ok(());
        }
        Err(Error::assertion_failed(match mode {
            TableAssertMode::Equals => format!("expected cell '{}', got '{}'", expected, actual),
            TableAssertMode::Contains => format!("expected cell to contain '{}', got '{}'", expected, actual),
            TableAssertMode::NotEquals => format!("expected cell not to be '{}'", expected),
            TableAssertMode::NotContains => format!("expected cell not to contain '{}', got '{}'", expected, actual),
        }))
    }

    /// Click the control labelled `label` inside the located row
    ///
    /// Strategies are tried in order; a candidate whose click fails gives
    /// way to the next strategy's pick.
    #[instrument(skip(self, locator), fields(row = %locator.row))]
    pub async fn click_row_action(&self, locator: &TableLocator, label: &str) -> Result<()> {
        let row = self.find_row(locator).await?;
        let root = Root::Element(Arc::clone(&row.row));
        let cascade = Cascade::new(strategies::row_action(label));
        let mut candidates = cascade.candidates(self.page(), &root);

        while let Some((strategy, handle)) = candidates.next().await? {
            match handle.click(ClickOptions::default()).await {
                Ok(()) => {
                    info!("Clicked '{}' in row {} via '{}'", label, row.index, strategy);
                    settle(self.pacing.table_action_ms).await;
                    return Ok(());
                }
                Err(e) if e.is_disconnected() => return Err(e),
                Err(e) => {
                    debug!("Row action '{}' via '{}' not clickable: {}", label, strategy, e);
                    candidates.reject(e);
                }
            }
        }

        let detail = candidates
            .into_last_error()
            .map(|e| format!(" (last error: {})", e))
            .unwrap_or_default();
        Err(Error::not_found(format!(
            "action '{}' in row {}{}",
            label, row.index, detail
        )))
    }

    /// Header text to cell text for the located row; `column_N` keys when the table has no headers
    pub async fn row_data(&self, locator: &TableLocator) -> Result<HashMap<String, String>> {
        let row = self.find_row(locator).await?;
        let cells = self.cell_texts(&row.row).await?;
        let mut headers = Vec::new();
        for header in self.query(&row.table, "th").await? {
            headers.push(header.text_content().await?.trim().to_string());
        }

        if headers.is_empty() {
            return Ok(cells
                .into_iter()
                .enumerate()
                .map(|(i, cell)| (format!("column_{}", i + 1), cell))
                .collect());
        }
        Ok(headers.into_iter().zip(cells).collect())
    }
}

fn row_matches(wanted: &RowLocator, text: &str, joined: &str) -> bool {
    let value = wanted.value.as_str();
    match wanted.kind {
        RowKind::Text => text == value.trim() || joined == value.trim(),
        RowKind::Contains => text.contains(value) || joined.contains(value),
        RowKind::Index => false,
    }
}
