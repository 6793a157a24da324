//! Statistical primitives shared by the Welch and velocity selection
//! policies: an unequal-variance t-test and a Theil-Sen robust regression,
//! both reimplemented here in plain floating-point arithmetic rather than
//! pulled in from a general statistics crate; see DESIGN.md for the
//! tradeoffs.

use crate::Value;

/// Welch's t-test for two independent samples of unequal variance.
/// Returns `(p_value, mean_a - mean_b)`. The p-value uses a normal
/// approximation to the t-distribution rather than the exact Student-t CDF:
/// accurate enough once each sample has more than a handful of
/// observations, which holds here since sample size is the configured
/// `horizon` (tens of points by default).
pub fn welchs_t_test(a: &[Value], b: &[Value]) -> (f64, f64) {
    let (mean_a, var_a) = mean_variance(a);
    let (mean_b, var_b) = mean_variance(b);
    let na = a.len() as f64;
    let nb = b.len() as f64;

    let se = (var_a / na + var_b / nb).sqrt();
    let mean_diff = mean_a - mean_b;

    if se == 0.0 {
        return (if mean_diff == 0.0 { 1.0 } else { 0.0 }, mean_diff);
    }

    let t = mean_diff / se;
    let p_value = 2.0 * (1.0 - standard_normal_cdf(t.abs()));
    (p_value, mean_diff)
}

fn mean_variance(xs: &[Value]) -> (f64, f64) {
    let n = xs.len() as f64;
    let mean = xs.iter().map(|&x| x as f64).sum::<f64>() / n;
    let variance = if xs.len() < 2 {
        0.0
    } else {
        xs.iter().map(|&x| (x as f64 - mean).powi(2)).sum::<f64>() / (n - 1.0)
    };
    (mean, variance)
}

/// Standard normal CDF via the Abramowitz & Stegun rational approximation
/// to `erf` (formula 7.1.26, max error ~1.5e-7).
fn standard_normal_cdf(x: f64) -> f64 {
    0.5 * (1.0 + erf(x / std::f64::consts::SQRT_2))
}

fn erf(x: f64) -> f64 {
    let sign = if x < 0.0 { -1.0 } else { 1.0 };
    let x = x.abs();

    const A1: f64 = 0.254829592;
    const A2: f64 = -0.284496736;
    const A3: f64 = 1.421413741;
    const A4: f64 = -1.453152027;
    const A5: f64 = 1.061405429;
    const P: f64 = 0.3275911;

    let t = 1.0 / (1.0 + P * x);
    let y = 1.0 - (((((A5 * t + A4) * t) + A3) * t + A2) * t + A1) * t * (-x * x).exp();
    sign * y
}

/// A Theil-Sen fit: median slope and intercept, plus a confidence band on
/// the slope at the requested confidence level.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TheilSen {
    pub slope: f64,
    pub intercept: f64,
    pub slope_lo: f64,
    pub slope_hi: f64,
}

/// Fits `values` against `x = 0, 1, 2, ...`. `confidence` is `1 -
/// p_threshold`; the slope band is the `[alpha/2, 1 - alpha/2]` quantile
/// interval of all pairwise slopes, the nonparametric analogue of a
/// confidence interval for the Sen slope estimator.
pub fn theil_sen(values: &[Value], confidence: f64) -> TheilSen {
    let n = values.len();
    assert!(n >= 2, "Theil-Sen needs at least two points");

    let mut slopes = Vec::with_capacity(n * (n - 1) / 2);
    for i in 0..n {
        for j in (i + 1)..n {
            let dx = (j - i) as f64;
            let dy = (values[j] - values[i]) as f64;
            slopes.push(dy / dx);
        }
    }
    slopes.sort_by(|a, b| a.partial_cmp(b).unwrap());

    let alpha = 1.0 - confidence;
    let slope = quantile(&slopes, 0.5);
    let slope_lo = quantile(&slopes, alpha / 2.0);
    let slope_hi = quantile(&slopes, 1.0 - alpha / 2.0);

    let mut intercepts: Vec<f64> = values
        .iter()
        .enumerate()
        .map(|(i, &y)| y as f64 - slope * i as f64)
        .collect();
    intercepts.sort_by(|a, b| a.partial_cmp(b).unwrap());
    let intercept = quantile(&intercepts, 0.5);

    TheilSen {
        slope,
        intercept,
        slope_lo,
        slope_hi,
    }
}

fn quantile(sorted: &[f64], q: f64) -> f64 {
    if sorted.len() == 1 {
        return sorted[0];
    }
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    if lo == hi {
        sorted[lo]
    } else {
        let frac = pos - lo as f64;
        sorted[lo] * (1.0 - frac) + sorted[hi] * frac
    }
}
