//! Statistical helpers shared by profiling, cleaning and validation.

use std::collections::HashMap;

/// Arithmetic mean, `None` for an empty slice.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Median of the values (average of the two middle values for even counts).
pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let sorted = sorted(values);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}

/// Sample standard deviation (n − 1 denominator). Zero for fewer than two values.
pub fn calculate_std(values: &[f64]) -> f64 {
    let n = values.len() as f64;
    if n <= 1.0 {
        return 0.0;
    }
    let mean = mean(values).unwrap_or(0.0);
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
    variance.sqrt()
}

/// Skewness as the mean of cubed z-scores. Zero when the values are constant.
pub fn calculate_skewness(values: &[f64]) -> f64 {
    let std = calculate_std(values);
    if std == 0.0 {
        return 0.0;
    }
    let mean = mean(values).unwrap_or(0.0);
    let skew_sum: f64 = values.iter().map(|v| ((v - mean) / std).powi(3)).sum();
    skew_sum / values.len() as f64
}

/// First and third quartiles, taken at positions n·0.25 and n·0.75 of the
/// sorted values. `None` for fewer than four values.
pub fn quartiles(values: &[f64]) -> Option<(f64, f64)> {
    let n = values.len();
    if n < 4 {
        return None;
    }
    let sorted = sorted(values);
    let q1_idx = (n as f64 * 0.25) as usize;
    let q3_idx = ((n as f64 * 0.75) as usize).min(n - 1);
    Some((sorted[q1_idx], sorted[q3_idx]))
}

/// IQR envelope `[q1 − k·IQR, q3 + k·IQR]`.
pub fn iqr_bounds(values: &[f64], multiplier: f64) -> Option<(f64, f64)> {
    let (q1, q3) = quartiles(values)?;
    let iqr = q3 - q1;
    Some((q1 - multiplier * iqr, q3 + multiplier * iqr))
}

/// Z-score envelope `mean ± z·std`. `None` when the values are constant.
pub fn zscore_bounds(values: &[f64], threshold: f64) -> Option<(f64, f64)> {
    let mean = mean(values)?;
    let std = calculate_std(values);
    if std == 0.0 {
        return None;
    }
    Some((mean - threshold * std, mean + threshold * std))
}

/// Most frequent value and its count. Ties go to the value seen first.
pub fn mode<I, S>(values: I) -> Option<(String, usize)>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut counts: HashMap<String, (usize, usize)> = HashMap::new();
    for (position, value) in values.into_iter().enumerate() {
        let entry = counts.entry(value.into()).or_insert((0, position));
        entry.0 += 1;
    }
    counts
        .into_iter()
        .max_by(|(_, (count_a, first_a)), (_, (count_b, first_b))| {
            count_a.cmp(count_b).then(first_b.cmp(first_a))
        })
        .map(|(value, (count, _))| (value, count))
}

fn sorted(values: &[f64]) -> Vec<f64> {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    sorted
}
