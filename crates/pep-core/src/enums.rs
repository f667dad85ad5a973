//! Study designs, evidence grades, pipeline steps, and run statuses.
//!
//! All enums use `snake_case` serialization via `#[serde(rename_all = "snake_case")]`.
//! `as_str()` returns the same representation used in SQL storage.

use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// StudyDesign
// ---------------------------------------------------------------------------

/// Inferred design tier of a single study.
///
/// Variants are declared in relevance order: `HumanControlledTrial` is the
/// strongest evidence, `AnimalInVitro` the weakest. [`StudyDesign::priority`]
/// exposes that order numerically for sorting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StudyDesign {
    HumanControlledTrial,
    HumanObservational,
    HumanCaseReport,
    AnimalInVivo,
    AnimalInVitro,
}

impl StudyDesign {
    /// Every design, strongest first.
    pub const ALL: [Self; 5] = [
        Self::HumanControlledTrial,
        Self::HumanObservational,
        Self::HumanCaseReport,
        Self::AnimalInVivo,
        Self::AnimalInVitro,
    ];

    /// Sort priority: lower sorts first.
    #[must_use]
    pub const fn priority(self) -> u8 {
        match self {
            Self::HumanControlledTrial => 0,
            Self::HumanObservational => 1,
            Self::HumanCaseReport => 2,
            Self::AnimalInVivo => 3,
            Self::AnimalInVitro => 4,
        }
    }

    /// Whether this design describes human evidence.
    #[must_use]
    pub const fn is_human(self) -> bool {
        matches!(
            self,
            Self::HumanControlledTrial | Self::HumanObservational | Self::HumanCaseReport
        )
    }

    /// Whether this design counts toward the animal-study total.
    #[must_use]
    pub const fn is_animal(self) -> bool {
        matches!(self, Self::AnimalInVivo | Self::AnimalInVitro)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::HumanControlledTrial => "human_controlled_trial",
            Self::HumanObservational => "human_observational",
            Self::HumanCaseReport => "human_case_report",
            Self::AnimalInVivo => "animal_in_vivo",
            Self::AnimalInVitro => "animal_in_vitro",
        }
    }

    /// Human-readable label for reports and rendered documents.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::HumanControlledTrial => "Human controlled trial",
            Self::HumanObservational => "Human observational",
            Self::HumanCaseReport => "Human case report",
            Self::AnimalInVivo => "Animal (in vivo)",
            Self::AnimalInVitro => "Laboratory (in vitro)",
        }
    }
}

impl fmt::Display for StudyDesign {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// EvidenceGrade
// ---------------------------------------------------------------------------

/// Deterministic evidence-quality tier.
///
/// ```text
/// very_low < low < moderate < high
/// ```
///
/// The derived `Ord` follows declaration order and is the total order used
/// for every "does this meet the bar" comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvidenceGrade {
    VeryLow,
    Low,
    Moderate,
    High,
}

impl EvidenceGrade {
    /// Whether this grade is at least `minimum`.
    #[must_use]
    pub fn meets(self, minimum: Self) -> bool {
        self >= minimum
    }

    /// The next tier up, or `None` for `High`.
    #[must_use]
    pub const fn next(self) -> Option<Self> {
        match self {
            Self::VeryLow => Some(Self::Low),
            Self::Low => Some(Self::Moderate),
            Self::Moderate => Some(Self::High),
            Self::High => None,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::VeryLow => "very_low",
            Self::Low => "low",
            Self::Moderate => "moderate",
            Self::High => "high",
        }
    }

    /// Badge text shown on rendered pages.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::VeryLow => "Very Low",
            Self::Low => "Low",
            Self::Moderate => "Moderate",
            Self::High => "High",
        }
    }
}

impl fmt::Display for EvidenceGrade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// PipelineStep
// ---------------------------------------------------------------------------

/// One step of the per-peptide state machine.
///
/// ```text
/// ingest → normalize → grade → synthesize → quick_audit → full_audit → publish → done
///    └──────────────────────── any step ──────────────────────────────→ failed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStep {
    Ingest,
    Normalize,
    Grade,
    Synthesize,
    QuickAudit,
    FullAudit,
    Publish,
    Done,
}

impl PipelineStep {
    /// The step that follows this one on the happy path.
    #[must_use]
    pub const fn next(self) -> Option<Self> {
        match self {
            Self::Ingest => Some(Self::Normalize),
            Self::Normalize => Some(Self::Grade),
            Self::Grade => Some(Self::Synthesize),
            Self::Synthesize => Some(Self::QuickAudit),
            Self::QuickAudit => Some(Self::FullAudit),
            Self::FullAudit => Some(Self::Publish),
            Self::Publish => Some(Self::Done),
            Self::Done => None,
        }
    }

    /// Whether the step spends tokens on an external text capability.
    #[must_use]
    pub const fn is_cost_bearing(self) -> bool {
        matches!(self, Self::Synthesize | Self::FullAudit)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ingest => "ingest",
            Self::Normalize => "normalize",
            Self::Grade => "grade",
            Self::Synthesize => "synthesize",
            Self::QuickAudit => "quick_audit",
            Self::FullAudit => "full_audit",
            Self::Publish => "publish",
            Self::Done => "done",
        }
    }
}

impl fmt::Display for PipelineStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// RunStatus
// ---------------------------------------------------------------------------

/// Outcome of a single peptide run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    /// Every step completed, including publish.
    Succeeded,
    /// Every step up to publish completed; publish was skipped by the caller.
    Drafted,
    /// A compliance gate did not pass. Not a crash: the page is not ready.
    NotReady,
    /// A step failed.
    Failed,
}

impl RunStatus {
    #[must_use]
    pub const fn is_failure(self) -> bool {
        matches!(self, Self::Failed)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Succeeded => "succeeded",
            Self::Drafted => "drafted",
            Self::NotReady => "not_ready",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// ComplianceMode / IssueSeverity
// ---------------------------------------------------------------------------

/// Which compliance tier to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComplianceMode {
    /// Local regex heuristics only; no network.
    Quick,
    /// External auditing capability; authoritative.
    Full,
}

impl ComplianceMode {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Quick => "quick",
            Self::Full => "full",
        }
    }
}

impl fmt::Display for ComplianceMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Severity of a compliance finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueSeverity {
    /// Fails the gate.
    Blocking,
    /// Reduces the score only.
    Warning,
}

impl IssueSeverity {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Blocking => "blocking",
            Self::Warning => "warning",
        }
    }
}

impl fmt::Display for IssueSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
