use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{error, warn};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    /// Needs manual review but the layout still completes.
    Critical,
    Fatal,
}

/// Why an element was dropped from the board.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SuppressReason {
    /// Fully covers, or is fully covered by, an existing element.
    CompleteCoverage,
    /// A scale step would take it below `min_scale`.
    ScaleFloor,
    /// Still colliding after the last allowed iteration.
    IterationsExhausted,
    /// No remediation strategy produced a usable move.
    NoRemediation,
    /// Smaller than `min_size` and deletable.
    BelowMinSize,
}

impl fmt::Display for SuppressReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SuppressReason::CompleteCoverage => "complete coverage",
            SuppressReason::ScaleFloor => "scale below minimum",
            SuppressReason::IterationsExhausted => "iterations exhausted",
            SuppressReason::NoRemediation => "no remediation available",
            SuppressReason::BelowMinSize => "below minimum size",
        };
        f.write_str(s)
    }
}

/// Structured events for the surrounding system to log or surface to an operator.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum Diagnostic {
    ElementSuppressed { name: String, reason: SuppressReason },
    CriticalSuppressed { name: String },
    MinSizeViolation { name: String },
    FatalUnpackableGroup { group_id: String },
}

impl Diagnostic {
    pub fn severity(&self) -> Severity {
        match self {
            Diagnostic::ElementSuppressed { .. } | Diagnostic::MinSizeViolation { .. } => {
                Severity::Warning
            }
            Diagnostic::CriticalSuppressed { .. } => Severity::Critical,
            Diagnostic::FatalUnpackableGroup { .. } => Severity::Fatal,
        }
    }

    /// Element name or group id the event is about.
    pub fn name(&self) -> &str {
        match self {
            Diagnostic::ElementSuppressed { name, .. }
            | Diagnostic::CriticalSuppressed { name }
            | Diagnostic::MinSizeViolation { name } => name,
            Diagnostic::FatalUnpackableGroup { group_id } => group_id,
        }
    }

    /// Logs the event at a level matching its severity.
    pub fn emit(&self) {
        match self {
            Diagnostic::ElementSuppressed { name, reason } => {
                warn!(element = %name, %reason, "element suppressed")
            }
            Diagnostic::MinSizeViolation { name } => {
                warn!(element = %name, "element below minimum size, placed anyway")
            }
            Diagnostic::CriticalSuppressed { name } => {
                error!(element = %name, "critical element suppressed")
            }
            Diagnostic::FatalUnpackableGroup { group_id } => {
                error!(group = %group_id, "slug group cannot fit on any sheet")
            }
        }
    }
}
