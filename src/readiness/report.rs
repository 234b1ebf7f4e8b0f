//! Per-branch results and the aggregate run report

use std::fmt::Write as _;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::checks::{Check, CheckStatus, CheckStep, Verdict};
use crate::error::{ErrorKind, ItemError};

#[derive(Debug, Clone, Serialize)]
pub struct BranchReport {
    pub branch: String,
    /// Id declared by the descriptor, once read
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repro_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub checks: Vec<Check>,
    #[serde(flatten)]
    pub verdict: Verdict,
}

impl BranchReport {
    pub(crate) fn new(
        branch: String,
        repro_id: Option<String>,
        title: Option<String>,
        checks: Vec<Check>,
    ) -> Self {
        let verdict = Verdict::from_checks(&checks);
        Self {
            branch,
            repro_id,
            title,
            checks,
            verdict,
        }
    }

    /// Line item for input that never resolved to a branch
    pub fn rejected(input: &str, error: &ItemError) -> Self {
        let step = match error.kind() {
            ErrorKind::Format => CheckStep::IdMatchesBranch,
            _ => CheckStep::DescriptorPresent,
        };
        Self::new(
            input.to_string(),
            None,
            None,
            vec![Check {
                step,
                status: CheckStatus::Error,
                detail: error.to_string(),
            }],
        )
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub total: usize,
    /// Includes warned branches
    pub passed: usize,
    pub warned: usize,
    pub failed: usize,
}

impl Summary {
    fn record(&mut self, verdict: &Verdict) {
        self.total += 1;
        match verdict {
            Verdict::Pass => self.passed += 1,
            Verdict::Warn { .. } => {
                self.passed += 1;
                self.warned += 1;
            }
            Verdict::Fail { .. } => self.failed += 1,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ReadinessReport {
    pub started_at: DateTime<Utc>,
    pub api_url: String,
    pub branches: Vec<BranchReport>,
    pub summary: Summary,
}

impl ReadinessReport {
    pub fn new(api_url: impl Into<String>) -> Self {
        Self {
            started_at: Utc::now(),
            api_url: api_url.into(),
            branches: Vec::new(),
            summary: Summary::default(),
        }
    }

    pub fn push(&mut self, branch: BranchReport) {
        self.summary.record(&branch.verdict);
        self.branches.push(branch);
    }

    /// A run succeeds iff no branch failed; warnings do not count
    pub fn is_success(&self) -> bool {
        self.summary.failed == 0
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn render_text(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Pruva branch readiness");
        let _ = writeln!(
            out,
            "Time:     {}",
            self.started_at.format("%Y-%m-%d %H:%M:%S UTC")
        );
        let _ = writeln!(out, "Registry: {}", self.api_url);

        if self.branches.is_empty() {
            let _ = writeln!(out, "\nNo reproduction branches selected.");
        }

        for branch in &self.branches {
            let _ = writeln!(out);
            match &branch.title {
                Some(title) => {
                    let _ = writeln!(
                        out,
                        "[{}] {} ({})",
                        branch.verdict.label(),
                        branch.branch,
                        title
                    );
                }
                None => {
                    let _ = writeln!(out, "[{}] {}", branch.verdict.label(), branch.branch);
                }
            }
            for check in &branch.checks {
                let _ = writeln!(
                    out,
                    "  {:<4} {:<22} {}",
                    check.status.symbol(),
                    check.step.label(),
                    check.detail
                );
            }
        }

        let s = &self.summary;
        let _ = writeln!(out);
        let _ = writeln!(
            out,
            "Total: {}  Passed: {}  Warned: {}  Failed: {}",
            s.total, s.passed, s.warned, s.failed
        );
        let _ = writeln!(
            out,
            "{}",
            if self.is_success() {
                "ALL BRANCHES READY"
            } else {
                "SOME BRANCHES FAILED"
            }
        );
        out
    }
}
