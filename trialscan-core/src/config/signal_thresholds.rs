//! Detector threshold configuration.
//!
//! Every numeric cut point the detectors use is configurable; the compiled
//! defaults below are heuristic placeholders surfaced through
//! `low_certainty`, not calibrated truths.

use serde::{Deserialize, Serialize};

/// Aggregation key for program-level p-value heaping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum HeapingKey {
    #[default]
    Program,
    Sponsor,
}

/// Per-detector thresholds with compiled defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct SignalThresholds {
    /// S1: window around primary completion inside which an endpoint change
    /// is "late". Default: 180 days.
    pub endpoint_change_window_days: Option<i64>,
    /// S2: fire below this power. Default: 0.70.
    pub power_fire_below: Option<f64>,
    /// S2: stricter bar when inputs are imputed. Default: 0.55.
    pub power_fire_below_low_certainty: Option<f64>,
    /// Nominal significance level used by S3/S4/S9 PFS checks. Default: 0.05.
    pub significance_alpha: Option<f64>,
    /// S4: minimum arm-level dropout asymmetry, percentage points. Default: 10.
    pub dropout_asymmetry_pp: Option<f64>,
    /// S4: asymmetry for high severity. Default: 15.
    pub dropout_asymmetry_high_pp: Option<f64>,
    /// S6: planned interim looks that require a spending function. Default: 2.
    pub interim_looks_min: Option<u32>,
    /// S8: per-trial cusp band, closed interval. Defaults: 0.045, 0.050.
    pub cusp_low: Option<f64>,
    pub cusp_high: Option<f64>,
    /// S8: pooled heaping window and split point. Defaults: 0.045, 0.050, 0.055.
    pub heaping_window_low: Option<f64>,
    pub heaping_split: Option<f64>,
    pub heaping_window_high: Option<f64>,
    /// S8: minimum pooled p-values inside the window. Default: 10.
    pub heaping_min_pooled: Option<usize>,
    /// S8: required left-band excess (L >= multiple * R). Default: 2.0.
    pub heaping_left_multiple: Option<f64>,
    /// S8: binomial tail bar. Default: 0.01.
    pub heaping_tail_alpha: Option<f64>,
    /// S8: pooling granularity. Default: program.
    pub heaping_aggregation: Option<HeapingKey>,
    /// S9: OS hazard ratio treated as trending toward harm. Default: 1.10.
    pub os_harm_hr: Option<f64>,
    /// S9: OS hazard ratio for high severity. Default: 1.20.
    pub os_harm_hr_high: Option<f64>,
    /// S9: minimum fraction of planned OS events observed. Default: 0.60.
    pub os_events_fraction: Option<f64>,
    /// S9: maximum OS p-value for the harm trend. Default: 0.20.
    pub os_p_max: Option<f64>,
    /// S9: maximum crossover contamination, percent. Default: 30.
    pub crossover_max_pct: Option<f64>,
}

impl SignalThresholds {
    pub fn effective_endpoint_change_window_days(&self) -> i64 {
        self.endpoint_change_window_days.unwrap_or(180)
    }

    pub fn effective_power_fire_below(&self) -> f64 {
        self.power_fire_below.unwrap_or(0.70)
    }

    pub fn effective_power_fire_below_low_certainty(&self) -> f64 {
        self.power_fire_below_low_certainty.unwrap_or(0.55)
    }

    pub fn effective_significance_alpha(&self) -> f64 {
        self.significance_alpha.unwrap_or(0.05)
    }

    pub fn effective_dropout_asymmetry_pp(&self) -> f64 {
        self.dropout_asymmetry_pp.unwrap_or(10.0)
    }

    pub fn effective_dropout_asymmetry_high_pp(&self) -> f64 {
        self.dropout_asymmetry_high_pp.unwrap_or(15.0)
    }

    pub fn effective_interim_looks_min(&self) -> u32 {
        self.interim_looks_min.unwrap_or(2)
    }

    pub fn effective_cusp_low(&self) -> f64 {
        self.cusp_low.unwrap_or(0.045)
    }

    pub fn effective_cusp_high(&self) -> f64 {
        self.cusp_high.unwrap_or(0.050)
    }

    pub fn effective_heaping_window_low(&self) -> f64 {
        self.heaping_window_low.unwrap_or(0.045)
    }

    pub fn effective_heaping_split(&self) -> f64 {
        self.heaping_split.unwrap_or(0.050)
    }

    pub fn effective_heaping_window_high(&self) -> f64 {
        self.heaping_window_high.unwrap_or(0.055)
    }

    pub fn effective_heaping_min_pooled(&self) -> usize {
        self.heaping_min_pooled.unwrap_or(10)
    }

    pub fn effective_heaping_left_multiple(&self) -> f64 {
        self.heaping_left_multiple.unwrap_or(2.0)
    }

    pub fn effective_heaping_tail_alpha(&self) -> f64 {
        self.heaping_tail_alpha.unwrap_or(0.01)
    }

    pub fn effective_heaping_aggregation(&self) -> HeapingKey {
        self.heaping_aggregation.unwrap_or_default()
    }

    pub fn effective_os_harm_hr(&self) -> f64 {
        self.os_harm_hr.unwrap_or(1.10)
    }

    pub fn effective_os_harm_hr_high(&self) -> f64 {
        self.os_harm_hr_high.unwrap_or(1.20)
    }

    pub fn effective_os_events_fraction(&self) -> f64 {
        self.os_events_fraction.unwrap_or(0.60)
    }

    pub fn effective_os_p_max(&self) -> f64 {
        self.os_p_max.unwrap_or(0.20)
    }

    pub fn effective_crossover_max_pct(&self) -> f64 {
        self.crossover_max_pct.unwrap_or(30.0)
    }
}
