//! Sample standard deviation.
//!
//! STDDEV = sqrt(sum((x - mean)^2) / (n - 1)). Fewer than two values yield 0.

pub fn sample_stddev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
    variance.sqrt()
}
