//! Mock captcha solver for testing

use async_trait::async_trait;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use super::traits::CaptchaSolver;
use crate::{Error, Result};

/// Replays scripted answers; `None` scripts a recognition failure
#[derive(Debug, Clone, Default)]
pub struct MockSolver {
    answers: Arc<Mutex<VecDeque<Option<String>>>>,
    seen: Arc<Mutex<Vec<PathBuf>>>,
}

impl MockSolver {
    pub fn new<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = Option<S>>,
        S: Into<String>,
    {
        Self {
            answers: Arc::new(Mutex::new(
                answers.into_iter().map(|a| a.map(Into::into)).collect(),
            )),
            seen: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Always answer `text`
    pub fn answering(text: &str) -> Self {
        Self::new(std::iter::repeat(Some(text.to_string())).take(16))
    }

    /// Images passed to `solve`, in order
    pub fn seen(&self) -> Vec<PathBuf> {
        self.seen.lock().map(|s| s.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl CaptchaSolver for MockSolver {
    fn name(&self) -> &str {
        "mock"
    }

    async fn solve(&self, image: &Path) -> Result<String> {
        if let Ok(mut seen) = self.seen.lock() {
            seen.push(image.to_path_buf());
        }
        let next = self
            .answers
            .lock()
            .map_err(|_| Error::internal("mock solver poisoned"))?
            .pop_front()
            .flatten();
        next.ok_or_else(|| Error::captcha("mock recognition failed"))
    }
}
