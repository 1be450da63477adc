//! CalibrationConfig: per-gate LR tables, global clamp bounds, stop rules,
//! and primitive LR overrides.
//!
//! Loaded once per run and treated as immutable. Validation happens at load
//! time and is fatal: no trial is ever scored against a partially-valid
//! config. Identity for the audit trail is a human-readable revision tag
//! plus an xxh3 content hash.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use xxhash_rust::xxh3::xxh3_64;

use super::signal_thresholds::SignalThresholds;
use crate::errors::ConfigError;
use crate::expr::GateExpr;
use crate::types::SignalId;

/// Global numeric clamp bounds. All six are required; a missing bound is a
/// fatal load-time error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct GlobalBounds {
    pub lr_min: Option<f64>,
    pub lr_max: Option<f64>,
    pub logit_min: Option<f64>,
    pub logit_max: Option<f64>,
    pub prior_floor: Option<f64>,
    pub prior_ceil: Option<f64>,
}

/// Bounds after validation, embedded in every audit payload.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResolvedBounds {
    pub lr_min: f64,
    pub lr_max: f64,
    pub logit_min: f64,
    pub logit_max: f64,
    pub prior_floor: f64,
    pub prior_ceil: f64,
}

/// Severity-tiered LR table for one gate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeverityLrs {
    pub low: f64,
    pub med: f64,
    pub high: f64,
}

/// One gate: a boolean formula over signal ids plus its calibrated LR.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GateSpec {
    /// Formula over signal ids, e.g. `"S5 & (S6 | S7)"`.
    pub when: String,
    /// Base likelihood ratio.
    pub lr: f64,
    /// Optional severity-tiered table; the maximum severity among the
    /// gate's fired supporting signals selects the tier.
    pub by_severity: Option<SeverityLrs>,
}

/// One stop rule: a named condition forcing the final probability to at
/// least `level`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StopRuleSpec {
    pub when: String,
    pub level: f64,
}

/// Primitive per-signal LR contributions, applied outside any gate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct PrimitiveSpec {
    /// Signals that contribute a primitive LR term when fired.
    pub signals: Vec<String>,
    /// LR used for listed signals without an explicit override.
    pub default_lr: Option<f64>,
    /// Per-signal LR overrides.
    pub overrides: BTreeMap<String, f64>,
}

/// The full calibration document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct CalibrationConfig {
    /// Human-readable revision tag.
    pub revision: Option<String>,
    pub global: GlobalBounds,
    /// Gate catalog, keyed by gate id. BTreeMap for stable iteration order.
    pub gates: BTreeMap<String, GateSpec>,
    pub stop_rules: BTreeMap<String, StopRuleSpec>,
    pub primitives: PrimitiveSpec,
    pub signals: SignalThresholds,
}

impl CalibrationConfig {
    /// Compiled default catalog: the four standard gates, conservative bounds,
    /// and the OS-harm stop rule.
    pub fn default_catalog() -> Self {
        let mut gates = BTreeMap::new();
        gates.insert(
            "G1".to_string(),
            GateSpec {
                when: "S1 & S2".to_string(),
                lr: 3.5,
                by_severity: None,
            },
        );
        gates.insert(
            "G2".to_string(),
            GateSpec {
                when: "S3 & S4".to_string(),
                lr: 2.8,
                by_severity: None,
            },
        );
        gates.insert(
            "G3".to_string(),
            GateSpec {
                when: "S5 & (S6 | S7)".to_string(),
                lr: 4.2,
                by_severity: None,
            },
        );
        gates.insert(
            "G4".to_string(),
            GateSpec {
                when: "S8 & (S1 | S3)".to_string(),
                lr: 3.0,
                by_severity: None,
            },
        );

        let mut stop_rules = BTreeMap::new();
        stop_rules.insert(
            "os_harm".to_string(),
            StopRuleSpec {
                when: "S9".to_string(),
                level: 0.97,
            },
        );

        Self {
            revision: Some("default".to_string()),
            global: GlobalBounds {
                lr_min: Some(0.1),
                lr_max: Some(25.0),
                logit_min: Some(-6.0),
                logit_max: Some(6.0),
                prior_floor: Some(0.01),
                prior_ceil: Some(0.99),
            },
            gates,
            stop_rules,
            primitives: PrimitiveSpec::default(),
            signals: SignalThresholds::default(),
        }
    }

    /// Load and validate a calibration document from a TOML file.
    /// Environment variables (`TRIALSCAN_LR_MIN`, ...) override file values.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content =
            std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
                path: path.display().to_string(),
            })?;
        let mut config: CalibrationConfig =
            toml::from_str(&content).map_err(|e| ConfigError::ParseError {
                path: path.display().to_string(),
                message: e.to_string(),
            })?;
        Self::apply_env_overrides(&mut config);
        config.validate()?;
        let revision_id = config.revision_id()?;
        tracing::info!(
            revision = %revision_id,
            gates = config.gates.len(),
            stop_rules = config.stop_rules.len(),
            "calibration config loaded"
        );
        Ok(config)
    }

    /// Parse and validate a calibration document from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        let config: CalibrationConfig =
            toml::from_str(toml_str).map_err(|e| ConfigError::ParseError {
                path: "<string>".to_string(),
                message: e.to_string(),
            })?;
        config.validate()?;
        Ok(config)
    }

    /// Environment overrides for the global bounds.
    /// Pattern: `TRIALSCAN_LR_MIN`, `TRIALSCAN_PRIOR_CEIL`, etc.
    fn apply_env_overrides(config: &mut CalibrationConfig) {
        fn env_f64(name: &str) -> Option<f64> {
            std::env::var(name).ok().and_then(|v| v.parse().ok())
        }
        if let Some(v) = env_f64("TRIALSCAN_LR_MIN") {
            config.global.lr_min = Some(v);
        }
        if let Some(v) = env_f64("TRIALSCAN_LR_MAX") {
            config.global.lr_max = Some(v);
        }
        if let Some(v) = env_f64("TRIALSCAN_LOGIT_MIN") {
            config.global.logit_min = Some(v);
        }
        if let Some(v) = env_f64("TRIALSCAN_LOGIT_MAX") {
            config.global.logit_max = Some(v);
        }
        if let Some(v) = env_f64("TRIALSCAN_PRIOR_FLOOR") {
            config.global.prior_floor = Some(v);
        }
        if let Some(v) = env_f64("TRIALSCAN_PRIOR_CEIL") {
            config.global.prior_ceil = Some(v);
        }
        if let Ok(v) = std::env::var("TRIALSCAN_REVISION") {
            config.revision = Some(v);
        }
    }

    /// Validate the document. Every failure here is fatal.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.resolved_bounds()?;

        for (gate_id, spec) in &self.gates {
            if !(spec.lr.is_finite() && spec.lr > 0.0) {
                return Err(ConfigError::NonPositiveLr {
                    context: format!("gates.{gate_id}"),
                    value: spec.lr,
                });
            }
            if let Some(tiers) = &spec.by_severity {
                for (name, lr) in [
                    ("low", tiers.low),
                    ("med", tiers.med),
                    ("high", tiers.high),
                ] {
                    if !(lr.is_finite() && lr > 0.0) {
                        return Err(ConfigError::NonPositiveLr {
                            context: format!("gates.{gate_id}.by_severity.{name}"),
                            value: lr,
                        });
                    }
                }
                // The gate engine resolves the tier by maximum supporting
                // severity; that is only the maximum LR if tiers ascend.
                if !(tiers.low <= tiers.med && tiers.med <= tiers.high) {
                    return Err(ConfigError::ValidationFailed {
                        field: format!("gates.{gate_id}.by_severity"),
                        message: "tier LRs must ascend (low <= med <= high)".to_string(),
                    });
                }
            }
            GateExpr::parse(&spec.when).map_err(|e| ConfigError::BadFormula {
                context: format!("gates.{gate_id}"),
                source: e,
            })?;
        }

        for (rule_id, spec) in &self.stop_rules {
            if !(spec.level.is_finite() && spec.level > 0.0 && spec.level <= 1.0) {
                return Err(ConfigError::ValidationFailed {
                    field: format!("stop_rules.{rule_id}.level"),
                    message: "must be in (0, 1]".to_string(),
                });
            }
            GateExpr::parse(&spec.when).map_err(|e| ConfigError::BadFormula {
                context: format!("stop_rules.{rule_id}"),
                source: e,
            })?;
        }

        self.validate_primitives()?;
        self.validate_thresholds()?;
        Ok(())
    }

    fn validate_primitives(&self) -> Result<(), ConfigError> {
        for id in &self.primitives.signals {
            if SignalId::parse(id).is_none() {
                return Err(ConfigError::ValidationFailed {
                    field: "primitives.signals".to_string(),
                    message: format!("unknown signal id `{id}`"),
                });
            }
            if !self.primitives.overrides.contains_key(id) {
                match self.primitives.default_lr {
                    Some(lr) if lr.is_finite() && lr > 0.0 => {}
                    Some(lr) => {
                        return Err(ConfigError::NonPositiveLr {
                            context: "primitives.default_lr".to_string(),
                            value: lr,
                        })
                    }
                    None => {
                        return Err(ConfigError::ValidationFailed {
                            field: "primitives.default_lr".to_string(),
                            message: format!(
                                "required: signal `{id}` is listed without an override"
                            ),
                        })
                    }
                }
            }
        }
        for (id, lr) in &self.primitives.overrides {
            if SignalId::parse(id).is_none() {
                return Err(ConfigError::ValidationFailed {
                    field: "primitives.overrides".to_string(),
                    message: format!("unknown signal id `{id}`"),
                });
            }
            if !(lr.is_finite() && *lr > 0.0) {
                return Err(ConfigError::NonPositiveLr {
                    context: format!("primitives.overrides.{id}"),
                    value: *lr,
                });
            }
        }
        Ok(())
    }

    fn validate_thresholds(&self) -> Result<(), ConfigError> {
        let t = &self.signals;
        let unit_interval: [(&str, f64); 9] = [
            ("signals.power_fire_below", t.effective_power_fire_below()),
            (
                "signals.power_fire_below_low_certainty",
                t.effective_power_fire_below_low_certainty(),
            ),
            (
                "signals.significance_alpha",
                t.effective_significance_alpha(),
            ),
            ("signals.cusp_low", t.effective_cusp_low()),
            ("signals.cusp_high", t.effective_cusp_high()),
            ("signals.heaping_window_low", t.effective_heaping_window_low()),
            ("signals.heaping_split", t.effective_heaping_split()),
            (
                "signals.heaping_window_high",
                t.effective_heaping_window_high(),
            ),
            ("signals.heaping_tail_alpha", t.effective_heaping_tail_alpha()),
        ];
        for (field, value) in unit_interval {
            if !(value.is_finite() && value > 0.0 && value < 1.0) {
                return Err(ConfigError::ValidationFailed {
                    field: field.to_string(),
                    message: "must be in (0, 1)".to_string(),
                });
            }
        }
        if t.effective_cusp_low() > t.effective_cusp_high() {
            return Err(ConfigError::ValidationFailed {
                field: "signals.cusp_low".to_string(),
                message: "must not exceed signals.cusp_high".to_string(),
            });
        }
        let (lo, split, hi) = (
            t.effective_heaping_window_low(),
            t.effective_heaping_split(),
            t.effective_heaping_window_high(),
        );
        if !(lo < split && split < hi) {
            return Err(ConfigError::ValidationFailed {
                field: "signals.heaping_split".to_string(),
                message: "window_low < split < window_high required".to_string(),
            });
        }
        if t.effective_endpoint_change_window_days() < 0 {
            return Err(ConfigError::ValidationFailed {
                field: "signals.endpoint_change_window_days".to_string(),
                message: "must be non-negative".to_string(),
            });
        }
        Ok(())
    }

    /// The validated clamp bounds.
    pub fn resolved_bounds(&self) -> Result<ResolvedBounds, ConfigError> {
        let g = &self.global;
        let take = |v: Option<f64>, field: &str| -> Result<f64, ConfigError> {
            match v {
                Some(x) if x.is_finite() => Ok(x),
                Some(_) => Err(ConfigError::ValidationFailed {
                    field: format!("global.{field}"),
                    message: "must be finite".to_string(),
                }),
                None => Err(ConfigError::MissingBound {
                    field: field.to_string(),
                }),
            }
        };
        let bounds = ResolvedBounds {
            lr_min: take(g.lr_min, "lr_min")?,
            lr_max: take(g.lr_max, "lr_max")?,
            logit_min: take(g.logit_min, "logit_min")?,
            logit_max: take(g.logit_max, "logit_max")?,
            prior_floor: take(g.prior_floor, "prior_floor")?,
            prior_ceil: take(g.prior_ceil, "prior_ceil")?,
        };
        if bounds.lr_min <= 0.0 {
            return Err(ConfigError::NonPositiveLr {
                context: "global.lr_min".to_string(),
                value: bounds.lr_min,
            });
        }
        if bounds.lr_min > bounds.lr_max {
            return Err(ConfigError::ValidationFailed {
                field: "global.lr_min".to_string(),
                message: "must not exceed global.lr_max".to_string(),
            });
        }
        if bounds.logit_min >= bounds.logit_max {
            return Err(ConfigError::ValidationFailed {
                field: "global.logit_min".to_string(),
                message: "must be below global.logit_max".to_string(),
            });
        }
        if !(bounds.prior_floor > 0.0
            && bounds.prior_floor <= bounds.prior_ceil
            && bounds.prior_ceil < 1.0)
        {
            return Err(ConfigError::ValidationFailed {
                field: "global.prior_floor".to_string(),
                message: "need 0 < prior_floor <= prior_ceil < 1".to_string(),
            });
        }
        Ok(bounds)
    }

    /// xxh3 content hash over the canonical TOML rendering, as hex.
    /// An unserializable config must not get an identity.
    pub fn content_hash(&self) -> Result<String, ConfigError> {
        let canonical =
            toml::to_string(self).map_err(|e| ConfigError::CanonicalizeFailed {
                message: e.to_string(),
            })?;
        Ok(format!("{:016x}", xxh3_64(canonical.as_bytes())))
    }

    /// Revision tag plus content hash, e.g. `2026q1@9f2a...`.
    pub fn revision_id(&self) -> Result<String, ConfigError> {
        let tag = self.revision.as_deref().unwrap_or("unversioned");
        Ok(format!("{tag}@{}", self.content_hash()?))
    }
}
