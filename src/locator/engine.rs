//! Selector resolution engine

use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, instrument};

use super::cascade::{Cascade, Outcome};
use super::descriptor::{Scope, SelectorDescriptor, SelectorKind};
use super::{scope, strategies};
use crate::driver::{ElementHandle, PageDriver, Query, Root};
use crate::{Error, Result};

/// Default interval between polls of raw selectors
const DEFAULT_POLL: Duration = Duration::from_millis(100);

/// Resolves selector descriptors to single elements
#[derive(Debug, Clone)]
pub struct ElementLocator {
    page: Arc<dyn PageDriver>,
    wait: Duration,
    poll: Duration,
}

impl ElementLocator {
    /// `wait` bounds how long raw (`css`/`xpath`/`id`) selectors are polled
    pub fn new(page: Arc<dyn PageDriver>, wait: Duration) -> Self {
        Self {
            page,
            wait,
            poll: DEFAULT_POLL,
        }
    }

    pub fn with_poll(mut self, poll: Duration) -> Self {
        self.poll = poll;
        self
    }

    /// The page queries run against
    pub fn page(&self) -> &Arc<dyn PageDriver> {
        &self.page
    }

    /// Resolve a scope to a root for this call
    pub async fn root(&self, scope: Scope) -> Result<Root> {
        scope::resolve(self.page.as_ref(), scope).await
    }

    /// Resolve `desc` to exactly one element or fail with `NotFound`
    #[instrument(skip(self, desc), fields(selector = %desc))]
    pub async fn locate(&self, desc: &SelectorDescriptor) -> Result<Arc<dyn ElementHandle>> {
        self.resolve(desc, self.wait).await
    }

    /// Single-pass resolution; `None` instead of `NotFound`
    pub async fn probe(&self, desc: &SelectorDescriptor) -> Result<Option<Arc<dyn ElementHandle>>> {
        match self.resolve(desc, Duration::ZERO).await {
            Ok(handle) => Ok(Some(handle)),
            Err(Error::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn resolve(&self, desc: &SelectorDescriptor, wait: Duration) -> Result<Arc<dyn ElementHandle>> {
        if desc.is_empty() {
            return Err(Error::invalid_step(format!("{} selector has no value", desc.kind.as_str())));
        }
        let root = self.root(desc.scope).await?;

        let query = match desc.kind {
            SelectorKind::Css => Query::css(desc.value.trim()),
            SelectorKind::XPath => Query::xpath(desc.value.trim()),
            SelectorKind::Id => Query::id(desc.value.trim()),
            _ => return self.run_cascade(desc, &root).await,
        };
        self.first_match(desc, &root, &query, wait).await
    }

    /// Strategies tried for a label-kind descriptor
    pub fn cascade_for(desc: &SelectorDescriptor) -> Cascade {
        let label = desc.value.trim();
        match desc.kind {
            SelectorKind::Field => {
                let cascade = Cascade::new(strategies::field(label));
                if desc.scope == Scope::Dialog {
                    cascade.then(strategies::dialog_fallback())
                } else {
                    cascade
                }
            }
            SelectorKind::Button => {
                Cascade::new(strategies::button(label)).then(strategies::pseudo_button(label))
            }
            _ => Cascade::new(strategies::text(label)),
        }
    }

    async fn run_cascade(&self, desc: &SelectorDescriptor, root: &Root) -> Result<Arc<dyn ElementHandle>> {
        let cascade = Self::cascade_for(desc);
        match cascade.run(self.page.as_ref(), root).await? {
            Outcome::Found { handle, strategy } => {
                debug!("Resolved {} via '{}'", desc, strategy);
                Ok(handle)
            }
            Outcome::Missed { last_error } => {
                let detail = last_error
                    .map(|e| format!("; last query error: {}", e))
                    .unwrap_or_default();
                Err(Error::not_found(format!(
                    "{} ({} strategies tried{})",
                    desc,
                    cascade.len(),
                    detail
                )))
            }
        }
    }

    async fn first_match(
        &self,
        desc: &SelectorDescriptor,
        root: &Root,
        query: &Query,
        wait: Duration,
    ) -> Result<Arc<dyn ElementHandle>> {
        let deadline = Instant::now() + wait;
        loop {
            if let Some(first) = self.page.query_all(root, query).await?.into_iter().next() {
                return Ok(first);
            }
            if Instant::now() >= deadline {
                return Err(Error::not_found(desc.to_string()));
            }
            tokio::time::sleep(self.poll).await;
        }
    }
}
