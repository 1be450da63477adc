//! The evidence record (StudyCard): a structured, schema-valid summary of
//! one trial-version, produced upstream and consumed read-only here.
//!
//! Fields a card cannot vouch for are `Option`: the engine treats `None` as
//! insufficient evidence, never as a default. Dates are days since the Unix
//! epoch; the engine only ever subtracts them.

use serde::{Deserialize, Serialize};

/// Read-only evidence record for one trial-version.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudyCard {
    pub trial_id: String,
    pub version: u32,
    pub is_pivotal: bool,
    pub sponsor: Option<String>,
    /// Development-program (asset) identifier, used as the default pooling
    /// key for program-level p-value heaping.
    pub program_id: Option<String>,
    pub therapeutic_class: Option<String>,
    pub indication: Option<String>,
    pub design: TrialDesign,
    pub analysis_plan: AnalysisPlan,
    pub results: TrialResults,
    /// Registration history, oldest first, for endpoint-change detection.
    pub versions: Vec<VersionEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialDesign {
    pub arms: u32,
    pub randomized: bool,
    pub blinding: Blinding,
    pub n_treatment: Option<u64>,
    pub n_control: Option<u64>,
    /// Allocation ratio k = n_treatment / n_control.
    pub allocation_ratio: Option<f64>,
    pub primary_endpoint: EndpointSpec,
    /// Days since epoch.
    pub start_date: Option<i64>,
    /// Estimated primary completion, days since epoch.
    pub primary_completion_date: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Blinding {
    Open,
    Single,
    Double,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndpointKind {
    /// Binary endpoint analyzed as a difference in proportions (e.g. ORR).
    Proportion,
    /// Time-to-event endpoint analyzed via hazard ratios (e.g. OS, PFS).
    TimeToEvent,
    Continuous,
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EndpointSpec {
    /// Raw registered endpoint text, normalized by the endpoint-change
    /// detector.
    pub description: String,
    pub kind: EndpointKind,
    /// Patient- or investigator-reported rather than objectively measured.
    pub subjective: bool,
}

/// Stated powering assumptions and analysis-plan structure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AnalysisPlan {
    pub power: PowerAssumptions,
    pub planned_interim_looks: u32,
    pub executed_interim_looks: Option<u32>,
    pub alpha_spending_declared: bool,
    /// Alpha was re-allocated when executed looks exceeded the plan.
    pub alpha_reallocated: bool,
    pub multiplicity_adjusted: bool,
    pub interaction_prespecified: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct PowerAssumptions {
    pub alpha: Option<f64>,
    pub one_sided: Option<bool>,
    /// Assumed control-arm event/response rate p_c.
    pub control_rate: Option<f64>,
    /// Assumed absolute treatment effect Δ (p_t = p_c + Δ).
    pub absolute_delta: Option<f64>,
    /// Alternative hazard ratio the trial was powered against.
    pub hr_alt: Option<f64>,
    /// Planned (or observed) event count D for time-to-event endpoints.
    pub planned_events: Option<u64>,
    /// Names of fields above that upstream extraction imputed from a
    /// backstop default rather than the protocol itself.
    pub imputed_fields: Vec<String>,
}

impl PowerAssumptions {
    pub fn is_imputed(&self, field: &str) -> bool {
        self.imputed_fields.iter().any(|f| f == field)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct TrialResults {
    pub itt: Option<AnalysisOutcome>,
    pub pp: Option<AnalysisOutcome>,
    pub primary_p_value: Option<f64>,
    pub claimed_effect_size: Option<f64>,
    pub dropout_treatment_pct: Option<f64>,
    pub dropout_control_pct: Option<f64>,
    pub subgroups: Vec<SubgroupResult>,
    pub pfs: Option<SurvivalOutcome>,
    pub os: Option<SurvivalOutcome>,
    pub os_events_observed: Option<u64>,
    pub os_events_planned: Option<u64>,
    /// Control-to-treatment crossover, percent of control arm.
    pub crossover_pct: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AnalysisOutcome {
    pub p_value: Option<f64>,
    pub effect_size: Option<f64>,
    /// Direction of the point estimate relative to benefit, when stated.
    pub beneficial: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubgroupResult {
    pub name: String,
    pub p_value: f64,
    pub multiplicity_adjusted: bool,
    pub prespecified_interaction: bool,
    /// The narrative foregrounds this subgroup as the headline result.
    pub foregrounded: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct SurvivalOutcome {
    pub hazard_ratio: Option<f64>,
    pub ci_low: Option<f64>,
    pub ci_high: Option<f64>,
    pub p_value: Option<f64>,
}

/// One registration-history entry, used for endpoint-change diffing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VersionEntry {
    pub version: u32,
    /// Days since epoch when this version was captured.
    pub captured_date: Option<i64>,
    pub primary_endpoint_text: String,
}
