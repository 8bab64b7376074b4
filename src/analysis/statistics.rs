//! Basic descriptive statistics

/// Arithmetic mean (NaN for an empty slice)
pub fn mean(data: &[f64]) -> f64 {
    if data.is_empty() {
        return f64::NAN;
    }
    data.iter().sum::<f64>() / data.len() as f64
}

/// Sample variance (n - 1 in the denominator)
pub fn variance(data: &[f64]) -> f64 {
    let n = data.len();
    if n < 2 {
        return f64::NAN;
    }
    let m = mean(data);
    data.iter().map(|x| (x - m).powi(2)).sum::<f64>() / (n - 1) as f64
}

/// Sample standard deviation
pub fn std_dev(data: &[f64]) -> f64 {
    variance(data).sqrt()
}

/// Σ x_t * x_{t-lag}
pub fn lagged_product(data: &[f64], lag: usize) -> f64 {
    if lag >= data.len() {
        return 0.0;
    }
    data[lag..]
        .iter()
        .zip(data[..data.len() - lag].iter())
        .map(|(a, b)| a * b)
        .sum()
}

/// Round half away from zero to `decimals` places
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
