//! Historical/program context supplied alongside a StudyCard.

use serde::{Deserialize, Serialize};

/// Class-level historical statistics for effect-size plausibility checks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassHistory {
    /// The class/indication is flagged historically high-failure.
    pub graveyard: bool,
    /// 75th percentile of effect sizes among historically *successful*
    /// trials in this class.
    pub success_p75: Option<f64>,
    /// 90th percentile of the same distribution.
    pub success_p90: Option<f64>,
}

/// Per-trial evaluation context assembled by the host. Read-only, like the
/// StudyCard itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct SignalContext {
    pub class_history: Option<ClassHistory>,
    /// Indications with regulatory precedent for single-arm pivotal
    /// acceptance.
    pub single_arm_allowlist: Vec<String>,
    /// Nominal p-values pooled across the configured aggregation key
    /// (program or sponsor), for heaping detection.
    pub pooled_p_values: Vec<f64>,
    /// The aggregation key the pool was built over, for the audit trail.
    pub pooled_key: Option<String>,
}
