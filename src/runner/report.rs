//! Run reports

use chrono::{DateTime, Local};
use std::fmt;
use std::time::Duration;
use tracing::{error, info};

use crate::{Error, Result};

/// Outcome of one test case
#[derive(Debug)]
pub enum CaseStatus {
    Passed,
    /// Failed at 1-based step `step`
    Failed { step: usize, action: String, error: Error },
    /// Skipped because an earlier case failed
    NotRun,
}

#[derive(Debug)]
pub struct CaseReport {
    pub name: String,
    pub status: CaseStatus,
    pub duration: Duration,
}

impl CaseReport {
    pub fn passed(&self) -> bool {
        matches!(self.status, CaseStatus::Passed)
    }

    pub fn failed(&self) -> bool {
        matches!(self.status, CaseStatus::Failed { .. })
    }
}

impl fmt::Display for CaseReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.status {
            CaseStatus::Passed => write!(f, "PASS  {} ({:.1?})", self.name, self.duration),
            CaseStatus::Failed { step, action, error } => write!(
                f,
                "FAIL  {} at step [{}] {}: {}",
                self.name, step, action, error
            ),
            CaseStatus::NotRun => write!(f, "SKIP  {}", self.name),
        }
    }
}

/// Outcome of a suite run
#[derive(Debug)]
pub struct SuiteReport {
    pub started_at: DateTime<Local>,
    pub duration: Duration,
    pub cases: Vec<CaseReport>,
}

impl SuiteReport {
    pub fn passed(&self) -> usize {
        self.cases.iter().filter(|c| c.passed()).count()
    }

    pub fn failed(&self) -> usize {
        self.cases.iter().filter(|c| c.failed()).count()
    }

    pub fn not_run(&self) -> usize {
        self.cases.len() - self.passed() - self.failed()
    }

    /// Every case ran and passed
    pub fn is_success(&self) -> bool {
        self.cases.iter().all(CaseReport::passed)
    }

    pub fn first_failure(&self) -> Option<&CaseReport> {
        self.cases.iter().find(|c| c.failed())
    }

    /// One-line totals
    pub fn summary(&self) -> String {
        format!(
            "{} case(s): {} passed, {} failed, {} not run in {:.1?}",
            self.cases.len(),
            self.passed(),
            self.failed(),
            self.not_run(),
            self.duration
        )
    }

    /// Emit the per-case lines and totals through `tracing`
    pub fn log(&self) {
        for case in &self.cases {
            if case.failed() {
                error!("{}", case);
            } else {
                info!("{}", case);
            }
        }
        info!("{}", self.summary());
    }

    /// `Ok` when the suite passed, otherwise the first failing case as `CaseFailed`
    pub fn into_result(self) -> Result<()> {
        for case in self.cases {
            if let CaseStatus::Failed { step, action, error } = case.status {
                return Err(Error::CaseFailed {
                    name: case.name,
                    source: Box::new(Error::step_failed(step, action, error)),
                });
            }
        }
        Ok(())
    }
}

impl fmt::Display for SuiteReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Run started {}", self.started_at.format("%Y-%m-%d %H:%M:%S"))?;
        for case in &self.cases {
            writeln!(f, "  {}", case)?;
        }
        write!(f, "{}", self.summary())
    }
}
