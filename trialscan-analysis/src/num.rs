//! Shared numeric helpers via the `statrs` crate.
//!
//! Clamp ordering is a contract: winsorize each LR before taking its
//! logarithm; clamp only the summed logit, never intermediate partial sums.
//! Every path below is guarded so no operation can hand a non-finite value
//! downstream.

use statrs::distribution::{Binomial, ContinuousCDF, DiscreteCDF, Normal};

/// Clamp a value into `[lo, hi]`.
pub fn winsorize(x: f64, lo: f64, hi: f64) -> f64 {
    x.clamp(lo, hi)
}

/// Log-odds transform. The caller guarantees `p` is already clamped into
/// an open unit subinterval, so the guard only catches programming errors.
pub fn logit(p: f64) -> f64 {
    if !(p > 0.0 && p < 1.0) {
        return if p <= 0.0 {
            f64::NEG_INFINITY
        } else {
            f64::INFINITY
        };
    }
    (p / (1.0 - p)).ln()
}

/// Inverse of `logit`.
pub fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

/// Standard normal CDF Φ(x).
pub fn normal_cdf(x: f64) -> f64 {
    match Normal::new(0.0, 1.0) {
        Ok(dist) => dist.cdf(x),
        Err(_) => 0.5, // Unreachable for unit parameters
    }
}

/// Standard normal quantile Φ⁻¹(p). Returns None outside (0, 1).
pub fn normal_quantile(p: f64) -> Option<f64> {
    if !(p > 0.0 && p < 1.0) {
        return None;
    }
    match Normal::new(0.0, 1.0) {
        Ok(dist) => {
            let q = dist.inverse_cdf(p);
            q.is_finite().then_some(q)
        }
        Err(_) => None,
    }
}

/// Critical z for a significance level and sidedness.
pub fn z_alpha(alpha: f64, one_sided: bool) -> Option<f64> {
    let tail = if one_sided { alpha } else { alpha / 2.0 };
    normal_quantile(1.0 - tail)
}

/// One-sided binomial tail P(X >= k) for X ~ Binomial(n, p).
pub fn binomial_tail_ge(k: u64, n: u64, p: f64) -> f64 {
    if k == 0 {
        return 1.0;
    }
    if k > n {
        return 0.0;
    }
    match Binomial::new(p, n) {
        Ok(dist) => {
            let tail = 1.0 - dist.cdf(k - 1);
            if tail.is_finite() {
                tail.clamp(0.0, 1.0)
            } else {
                1.0
            }
        }
        Err(_) => 1.0, // Invalid p; report no evidence of heaping
    }
}
