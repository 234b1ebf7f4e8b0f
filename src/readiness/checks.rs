use serde::Serialize;

/// One step of the readiness checklist, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckStep {
    DescriptorPresent,
    DescriptorWellFormed,
    IdMatchesBranch,
    StartupCommand,
    RegistryReachable,
    Title,
    Status,
    ScriptSelected,
    ScriptDownload,
}

impl CheckStep {
    pub fn label(&self) -> &'static str {
        match self {
            CheckStep::DescriptorPresent => "descriptor present",
            CheckStep::DescriptorWellFormed => "descriptor well-formed",
            CheckStep::IdMatchesBranch => "id matches branch",
            CheckStep::StartupCommand => "startup command",
            CheckStep::RegistryReachable => "registry metadata",
            CheckStep::Title => "title",
            CheckStep::Status => "status",
            CheckStep::ScriptSelected => "reproduction script",
            CheckStep::ScriptDownload => "script download",
        }
    }

    /// Failure of a hard step ends the checklist for that branch
    pub fn is_hard(&self) -> bool {
        matches!(
            self,
            CheckStep::DescriptorPresent
                | CheckStep::DescriptorWellFormed
                | CheckStep::RegistryReachable
                | CheckStep::ScriptSelected
                | CheckStep::ScriptDownload
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckStatus {
    Ok,
    Warning,
    Error,
    Skipped,
}

impl CheckStatus {
    pub fn symbol(&self) -> &'static str {
        match self {
            CheckStatus::Ok => "ok",
            CheckStatus::Warning => "warn",
            CheckStatus::Error => "FAIL",
            CheckStatus::Skipped => "skip",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Check {
    pub step: CheckStep,
    pub status: CheckStatus,
    pub detail: String,
}

/// Outcome for one branch
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "verdict", rename_all = "snake_case")]
pub enum Verdict {
    Pass,
    Warn { warnings: usize },
    Fail { errors: usize, reasons: Vec<String> },
}

impl Verdict {
    /// Derive the verdict from completed checks
    ///
    /// Any error fails the branch; otherwise any warning makes it a `Warn`.
    pub fn from_checks(checks: &[Check]) -> Self {
        let reasons: Vec<String> = checks
            .iter()
            .filter(|c| c.status == CheckStatus::Error)
            .map(|c| format!("{}: {}", c.step.label(), c.detail))
            .collect();
        let warnings = checks
            .iter()
            .filter(|c| c.status == CheckStatus::Warning)
            .count();

        if !reasons.is_empty() {
            Verdict::Fail {
                errors: reasons.len(),
                reasons,
            }
        } else if warnings > 0 {
            Verdict::Warn { warnings }
        } else {
            Verdict::Pass
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Verdict::Pass => "PASS",
            Verdict::Warn { .. } => "WARN",
            Verdict::Fail { .. } => "FAIL",
        }
    }

    pub fn is_fail(&self) -> bool {
        matches!(self, Verdict::Fail { .. })
    }

    /// `Pass` and `Warn` both count as passed
    pub fn is_pass(&self) -> bool {
        !self.is_fail()
    }
}
