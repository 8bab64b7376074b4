//! Unit-root and stationarity tests

use crate::analysis::statistics::{lagged_product, mean};
use crate::error::StatError;
use crate::types::{KpssRegression, TestResult};
use nalgebra::{DMatrix, DVector};
use statrs::distribution::{ContinuousCDF, Normal};

/// MacKinnon (1994) bounds and polynomial coefficients for the constant-only
/// Dickey-Fuller distribution with one variable.
const TAU_MAX_C: f64 = 2.74;
const TAU_MIN_C: f64 = -18.83;
const TAU_STAR_C: f64 = -1.61;
const TAU_C_SMALLP: [f64; 3] = [2.1659, 1.4412, 3.8269 * 1e-2];
const TAU_C_LARGEP: [f64; 4] = [1.7339, 9.3202 * 1e-1, -1.2745 * 1e-1, -1.0368 * 1e-2];

/// MacKinnon (2010) critical value surfaces, constant-only, one variable.
const TAU_C_CRIT: [(&str, [f64; 4]); 3] = [
    ("1%", [-3.43035, -6.5393, -16.786, -79.433]),
    ("5%", [-2.86154, -2.8903, -4.234, -40.040]),
    ("10%", [-2.56677, -1.5384, -2.809, 0.0]),
];

/// KPSS (1992) table: p-values and the matching critical values.
const KPSS_PVALUES: [f64; 4] = [0.10, 0.05, 0.025, 0.01];
const KPSS_CRIT_C: [f64; 4] = [0.347, 0.463, 0.574, 0.739];
const KPSS_CRIT_CT: [f64; 4] = [0.119, 0.146, 0.176, 0.216];

/// Least-squares fit of y on X.
struct OlsFit {
    beta: DVector<f64>,
    xtx_inv: DMatrix<f64>,
    ssr: f64,
    nobs: usize,
    k: usize,
}

impl OlsFit {
    fn new(x: &DMatrix<f64>, y: &DVector<f64>) -> Result<Self, StatError> {
        let (nobs, k) = x.shape();
        if nobs <= k {
            return Err(StatError::SampleTooShort);
        }

        // OLS: β = (X'X)^(-1) X'y
        let xtx = x.transpose() * x;
        let xty = x.transpose() * y;
        let xtx_inv = xtx.try_inverse().ok_or(StatError::SingularMatrix)?;
        let beta = &xtx_inv * xty;

        let residuals = y - x * &beta;
        let ssr = residuals.iter().map(|r| r * r).sum();

        Ok(Self {
            beta,
            xtx_inv,
            ssr,
            nobs,
            k,
        })
    }

    fn aic(&self) -> f64 {
        let n = self.nobs as f64;
        let llf = -n / 2.0 * ((2.0 * std::f64::consts::PI).ln() + (self.ssr / n).ln() + 1.0);
        -2.0 * llf + 2.0 * self.k as f64
    }

    fn t_value(&self, i: usize) -> f64 {
        let mse = self.ssr / (self.nobs - self.k) as f64;
        self.beta[i] / (mse * self.xtx_inv[(i, i)]).sqrt()
    }
}

/// Augmented Dickey-Fuller test with a constant.
///
/// H0: the series has a unit root (non-stationary).
/// H1: the series is stationary.
///
/// With `max_lag = None` the upper lag is `ceil(12 * (n/100)^(1/4))` and the
/// number of lagged differences is picked by AIC; with `Some(lag)` exactly
/// that many lags are used.
pub fn adf_test(data: &[f64], max_lag: Option<usize>) -> Result<TestResult, StatError> {
    if data.iter().any(|x| !x.is_finite()) {
        return Err(StatError::NonFinite);
    }
    let n = data.len();
    if n < 4 {
        return Err(StatError::SampleTooShort);
    }
    let (lo, hi) = data
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &x| (lo.min(x), hi.max(x)));
    if lo == hi {
        return Err(StatError::ConstantSeries);
    }

    // One deterministic term (the constant)
    let upper = (n / 2).checked_sub(2).ok_or(StatError::SampleTooShort)?;

    let diff: Vec<f64> = data.windows(2).map(|w| w[1] - w[0]).collect();

    let lag = match max_lag {
        Some(lag) => lag.min(upper),
        None => {
            let max_lag = ((12.0 * (n as f64 / 100.0).powf(0.25)).ceil() as usize).min(upper);
            select_lag_aic(data, &diff, max_lag)?
        }
    };

    // Δy_t = α + β*y_{t-1} + Σγ_i*Δy_{t-i} + ε_t
    let (x, y) = adf_design(data, &diff, lag, lag);
    let fit = OlsFit::new(&x, &y)?;
    let statistic = fit.t_value(1);
    if !statistic.is_finite() {
        return Err(StatError::NonFinite);
    }

    let nobs = fit.nobs;
    Ok(TestResult {
        test_name: "ADF Test".to_string(),
        statistic,
        p_value: mackinnon_p_value(statistic),
        critical_values: mackinnon_critical_values(nobs),
        lags: lag,
        nobs,
    })
}

/// Lag order minimizing AIC; every candidate is fitted on the sample left
/// after dropping `max_lag` differences so the criteria are comparable.
fn select_lag_aic(data: &[f64], diff: &[f64], max_lag: usize) -> Result<usize, StatError> {
    let mut best: Option<(f64, usize)> = None;
    for lag in 0..=max_lag {
        let (x, y) = adf_design(data, diff, lag, max_lag);
        let aic = OlsFit::new(&x, &y)?.aic();
        match best {
            Some((best_aic, _)) if aic >= best_aic => {}
            _ => best = Some((aic, lag)),
        }
    }
    best.map(|(_, lag)| lag).ok_or(StatError::SampleTooShort)
}

/// Regressors [1, y_{t-1}, Δy_{t-1}, ..., Δy_{t-lag}] over rows starting at
/// difference index `start`.
fn adf_design(data: &[f64], diff: &[f64], lag: usize, start: usize) -> (DMatrix<f64>, DVector<f64>) {
    let rows = diff.len() - start;
    let cols = 2 + lag;
    let x = DMatrix::from_fn(rows, cols, |r, c| {
        let t = start + r;
        match c {
            0 => 1.0,
            1 => data[t],
            i => diff[t - (i - 1)],
        }
    });
    let y = DVector::from_iterator(rows, diff[start..].iter().copied());
    (x, y)
}

/// MacKinnon (1994) approximate p-value of the ADF statistic.
pub fn mackinnon_p_value(t_stat: f64) -> f64 {
    if t_stat > TAU_MAX_C {
        return 1.0;
    }
    if t_stat < TAU_MIN_C {
        return 0.0;
    }
    let z = if t_stat <= TAU_STAR_C {
        polyval(&TAU_C_SMALLP, t_stat)
    } else {
        polyval(&TAU_C_LARGEP, t_stat)
    };
    // Normal::new(0, 1) is always valid
    Normal::new(0.0, 1.0).map(|d| d.cdf(z)).unwrap_or(f64::NAN)
}

/// MacKinnon (2010) finite-sample critical values.
pub fn mackinnon_critical_values(nobs: usize) -> Vec<(String, f64)> {
    let inv = 1.0 / nobs as f64;
    TAU_C_CRIT
        .iter()
        .map(|(level, c)| {
            let value = c[0] + c[1] * inv + c[2] * inv.powi(2) + c[3] * inv.powi(3);
            (level.to_string(), value)
        })
        .collect()
}

/// c[0] + c[1]*x + c[2]*x² + ...
fn polyval(coefs: &[f64], x: f64) -> f64 {
    coefs.iter().rev().fold(0.0, |acc, c| acc * x + c)
}

/// KPSS test (Kwiatkowski-Phillips-Schmidt-Shin).
///
/// H0: the series is stationary around the deterministic term.
/// H1: the series has a unit root.
///
/// The bandwidth of the Bartlett long-run variance is chosen automatically
/// (Hobijn et al., 1998). The p-value is interpolated on the published table
/// and therefore clamped to [0.01, 0.10].
pub fn kpss_test(data: &[f64], regression: KpssRegression) -> Result<TestResult, StatError> {
    if data.iter().any(|x| !x.is_finite()) {
        return Err(StatError::NonFinite);
    }
    let n = data.len();
    if n < 3 {
        return Err(StatError::SampleTooShort);
    }

    let residuals = match regression {
        KpssRegression::Constant => {
            let m = mean(data);
            data.iter().map(|y| y - m).collect::<Vec<_>>()
        }
        KpssRegression::ConstantTrend => detrend(data),
    };

    let ssr = lagged_product(&residuals, 0);
    if ssr <= 0.0 {
        return Err(StatError::ZeroVariance);
    }

    let lags = kpss_autolag(&residuals).min(n - 1);

    // η = Σ S_t² / n²
    let mut cumsum = 0.0;
    let eta = residuals
        .iter()
        .map(|r| {
            cumsum += r;
            cumsum * cumsum
        })
        .sum::<f64>()
        / (n as f64).powi(2);

    // Newey-West long-run variance
    let mut s2 = ssr;
    for l in 1..=lags {
        s2 += 2.0 * lagged_product(&residuals, l) * (1.0 - l as f64 / (lags + 1) as f64);
    }
    let s2 = s2 / n as f64;
    if !(s2.is_finite() && s2 > 0.0) {
        return Err(StatError::ZeroVariance);
    }

    let statistic = eta / s2;
    let crit = match regression {
        KpssRegression::Constant => KPSS_CRIT_C,
        KpssRegression::ConstantTrend => KPSS_CRIT_CT,
    };

    Ok(TestResult {
        test_name: format!("KPSS Test ({})", regression.code()),
        statistic,
        p_value: interpolate(statistic, &crit, &KPSS_PVALUES),
        critical_values: vec![
            ("10%".to_string(), crit[0]),
            ("5%".to_string(), crit[1]),
            ("2.5%".to_string(), crit[2]),
            ("1%".to_string(), crit[3]),
        ],
        lags,
        nobs: n,
    })
}

/// Residuals of y = a + b*t
fn detrend(data: &[f64]) -> Vec<f64> {
    let n = data.len();
    let t: Vec<f64> = (1..=n).map(|i| i as f64).collect();
    let t_mean = mean(&t);
    let y_mean = mean(data);

    let num: f64 = t
        .iter()
        .zip(data.iter())
        .map(|(ti, yi)| (ti - t_mean) * (yi - y_mean))
        .sum();
    let den: f64 = t.iter().map(|ti| (ti - t_mean).powi(2)).sum();

    let b = num / den;
    let a = y_mean - b * t_mean;

    data.iter()
        .zip(t.iter())
        .map(|(y, ti)| y - a - b * ti)
        .collect()
}

/// Data-dependent bandwidth for the KPSS long-run variance
fn kpss_autolag(residuals: &[f64]) -> usize {
    let n = residuals.len() as f64;
    let cov_lags = n.powf(2.0 / 9.0) as usize;

    let mut s0 = lagged_product(residuals, 0) / n;
    let mut s1 = 0.0;
    for i in 1..=cov_lags {
        let prod = lagged_product(residuals, i) / (n / 2.0);
        s0 += prod;
        s1 += i as f64 * prod;
    }

    let s_hat = s1 / s0;
    let gamma_hat = 1.1447 * (s_hat * s_hat).powf(1.0 / 3.0);
    let lags = gamma_hat * n.powf(1.0 / 3.0);
    if lags.is_finite() && lags > 0.0 {
        lags as usize
    } else {
        0
    }
}

/// Piecewise-linear interpolation clamped to the table ends
fn interpolate(x: f64, xp: &[f64], fp: &[f64]) -> f64 {
    if x <= xp[0] {
        return fp[0];
    }
    let last = xp.len() - 1;
    if x >= xp[last] {
        return fp[last];
    }
    let i = xp.windows(2).position(|w| x < w[1]).unwrap_or(last - 1);
    let w = (x - xp[i]) / (xp[i + 1] - xp[i]);
    fp[i] + w * (fp[i + 1] - fp[i])
}
