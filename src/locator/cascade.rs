//! First-successful-strategy combinator

use std::sync::Arc;
use tracing::debug;

use super::strategies::{Pick, Strategy};
use crate::driver::{ElementHandle, PageDriver, Root};
use crate::{Error, Result};

/// Result of running a cascade
#[derive(Debug)]
pub enum Outcome {
    /// A strategy produced a usable element
    Found {
        handle: Arc<dyn ElementHandle>,
        strategy: &'static str,
    },
    /// Every strategy missed; `last_error` is the last query failure seen
    Missed { last_error: Option<Error> },
}

/// An ordered list of strategies; the first one yielding a usable match wins
#[derive(Debug, Clone, Default)]
pub struct Cascade {
    strategies: Vec<Strategy>,
}

impl Cascade {
    pub fn new(strategies: Vec<Strategy>) -> Self {
        Self { strategies }
    }

    /// Append strategies tried after the current ones
    pub fn then(mut self, more: Vec<Strategy>) -> Self {
        self.strategies.extend(more);
        self
    }

    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }

    /// Run every strategy against `root` in order
    ///
    /// A strategy whose query fails is skipped; a timeout aborts the run.
    pub async fn run(&self, page: &dyn PageDriver, root: &Root) -> Result<Outcome> {
        let mut candidates = self.candidates(page, root);
        match candidates.next().await? {
            Some((strategy, handle)) => Ok(Outcome::Found { handle, strategy }),
            None => Ok(Outcome::Missed {
                last_error: candidates.into_last_error(),
            }),
        }
    }

    /// One picked element per matching strategy, produced lazily in order
    pub fn candidates<'a>(&'a self, page: &'a dyn PageDriver, root: &'a Root) -> Candidates<'a> {
        Candidates {
            strategies: self.strategies.iter(),
            page,
            root,
            last_error: None,
        }
    }
}

/// Cursor over a cascade's picks, for callers that act on a candidate and
/// move on to the next strategy when the action fails
pub struct Candidates<'a> {
    strategies: std::slice::Iter<'a, Strategy>,
    page: &'a dyn PageDriver,
    root: &'a Root,
    last_error: Option<Error>,
}

impl Candidates<'_> {
    /// The next strategy's pick; `None` once every strategy has been tried
    pub async fn next(&mut self) -> Result<Option<(&'static str, Arc<dyn ElementHandle>)>> {
        for strategy in self.strategies.by_ref() {
            let matches = match self.page.query_all(self.root, &strategy.query).await {
                Ok(matches) => matches,
                Err(e) if e.is_timeout() => return Err(e),
                Err(e) => {
                    debug!("Strategy '{}' failed: {}", strategy.name, e);
                    self.last_error = Some(e);
                    continue;
                }
            };
            if matches.is_empty() {
                continue;
            }
            if let Some(handle) = pick(&matches, strategy.pick).await? {
                debug!(
                    "Strategy '{}' matched {} element(s)",
                    strategy.name,
                    matches.len()
                );
                return Ok(Some((strategy.name, handle)));
            }
        }
        Ok(None)
    }

    /// Record a failed action on the last candidate
    pub fn reject(&mut self, error: Error) {
        self.last_error = Some(error);
    }

    /// The last query or action failure seen
    pub fn into_last_error(self) -> Option<Error> {
        self.last_error
    }
}

/// Apply the tie-break policy to one strategy's matches
pub async fn pick(matches: &[Arc<dyn ElementHandle>], policy: Pick) -> Result<Option<Arc<dyn ElementHandle>>> {
    for candidate in matches {
        match candidate.is_visible().await {
            Ok(true) => return Ok(Some(Arc::clone(candidate))),
            Ok(false) => {}
            Err(e) if e.is_timeout() => return Err(e),
            Err(e) => debug!("Visibility check failed: {}", e),
        }
    }
    Ok(match policy {
        Pick::PreferVisible => matches.first().cloned(),
        Pick::VisibleOnly => None,
    })
}
