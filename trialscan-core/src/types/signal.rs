//! Signal identifiers, severities, and per-signal results.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;

/// The nine primitive evidence-pattern detectors.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum SignalId {
    /// Material & late endpoint change.
    S1,
    /// Underpowered pivotal.
    S2,
    /// Subgroup-only win without multiplicity control.
    S3,
    /// ITT/PP contradiction with dropout asymmetry.
    S4,
    /// Effect size implausible vs. historical graveyard.
    S5,
    /// Interim looks without alpha-spending control.
    S6,
    /// Single-arm pivotal without precedent.
    S7,
    /// P-value cusp/heaping.
    S8,
    /// OS/PFS contradiction.
    S9,
}

impl SignalId {
    /// All signal ids in stable evaluation order.
    pub const ALL: [SignalId; 9] = [
        Self::S1,
        Self::S2,
        Self::S3,
        Self::S4,
        Self::S5,
        Self::S6,
        Self::S7,
        Self::S8,
        Self::S9,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::S1 => "S1",
            Self::S2 => "S2",
            Self::S3 => "S3",
            Self::S4 => "S4",
            Self::S5 => "S5",
            Self::S6 => "S6",
            Self::S7 => "S7",
            Self::S8 => "S8",
            Self::S9 => "S9",
        }
    }

    /// Parse a signal id as written in gate formulas ("S1".."S9").
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "S1" => Some(Self::S1),
            "S2" => Some(Self::S2),
            "S3" => Some(Self::S3),
            "S4" => Some(Self::S4),
            "S5" => Some(Self::S5),
            "S6" => Some(Self::S6),
            "S7" => Some(Self::S7),
            "S8" => Some(Self::S8),
            "S9" => Some(Self::S9),
            _ => None,
        }
    }
}

impl fmt::Display for SignalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Graduated severity of a fired signal. Ordering is meaningful: gates
/// resolve severity-tiered LRs by the maximum severity among supporting
/// signals.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Med,
    High,
}

impl Severity {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Med => "med",
            Self::High => "high",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A pointer into the StudyCard field that a firing detector relied on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvidenceRef {
    /// Dotted path of the field, e.g. `results.itt.p_value`.
    pub field: String,
    /// Rendered value at evaluation time.
    pub value: String,
}

impl EvidenceRef {
    pub fn new(field: impl Into<String>, value: impl fmt::Display) -> Self {
        Self {
            field: field.into(),
            value: value.to_string(),
        }
    }
}

/// Result of one detector over one trial-version. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalResult {
    pub signal_id: SignalId,
    pub fired: bool,
    pub severity: Severity,
    /// Detector-specific numeric value (computed power, tail probability, ...).
    pub value: Option<f64>,
    /// Non-empty whenever `fired` is true.
    pub evidence_refs: SmallVec<[EvidenceRef; 4]>,
    /// Set when a required input was imputed from a backstop default.
    pub low_certainty: bool,
    pub rationale: String,
}

impl SignalResult {
    /// A non-firing result. The rationale says why, usually missing
    /// evidence, never a guess.
    pub fn quiet(signal_id: SignalId, rationale: impl Into<String>) -> Self {
        Self {
            signal_id,
            fired: false,
            severity: Severity::Low,
            value: None,
            evidence_refs: SmallVec::new(),
            low_certainty: false,
            rationale: rationale.into(),
        }
    }

    /// A firing result. Every fired signal must carry at least one
    /// evidence reference.
    pub fn fired(
        signal_id: SignalId,
        severity: Severity,
        value: Option<f64>,
        evidence_refs: SmallVec<[EvidenceRef; 4]>,
        rationale: impl Into<String>,
    ) -> Self {
        debug_assert!(
            !evidence_refs.is_empty(),
            "fired signal must carry evidence"
        );
        Self {
            signal_id,
            fired: true,
            severity,
            value,
            evidence_refs,
            low_certainty: false,
            rationale: rationale.into(),
        }
    }

    /// Mark the result as derived from backstop/imputed inputs.
    pub fn with_low_certainty(mut self) -> Self {
        self.low_certainty = true;
        self
    }
}
