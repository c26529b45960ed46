use crate::config::AnalysisConfig;

/// Summary statistics over the valid pixels of a derived temperature array.
///
/// `p95` is exported under the `Max` label in the CSV and figures; see
/// [`crate::report`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LstStats {
    pub mean: f64,
    pub median: f64,
    pub p95: f64,
}

impl LstStats {
    pub fn nan() -> Self {
        LstStats {
            mean: f64::NAN,
            median: f64::NAN,
            p95: f64::NAN,
        }
    }
}

/// Convert raw digital numbers to Celsius: `celsius = raw * scale - offset`.
///
/// The scale/offset pair is an assumed Kelvin*10 sensor encoding carried in
/// the configuration, not read from file metadata. NaN nodata stays NaN.
pub fn to_celsius(raw: &[f64], config: &AnalysisConfig) -> Vec<f64> {
    raw.iter()
        .map(|v| v * config.dn_scale - config.kelvin_offset)
        .collect()
}

/// Compute mean, median and 95th percentile over the strictly positive values.
///
/// This is the statistical validity policy: values `<= 0` are sensor/nodata
/// artifacts and are dropped (NaN fails the comparison and is dropped too).
/// It deliberately differs from the display policy in [`mask_invalid`], which
/// additionally caps at the validity ceiling. An input with no valid values
/// yields NaN statistics.
pub fn calculate_stats(values: &[f64]) -> LstStats {
    let mut valid: Vec<f64> = values.iter().copied().filter(|v| *v > 0.0).collect();
    if valid.is_empty() {
        return LstStats::nan();
    }

    valid.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let mean = valid.iter().sum::<f64>() / valid.len() as f64;
    let median = interpolated_quantile(&valid, 0.5);
    let p95 = interpolated_quantile(&valid, 0.95);

    LstStats { mean, median, p95 }
}

/// Linearly interpolated quantile over sorted data, matching the convention of
/// the usual numeric libraries: rank `q * (n - 1)` interpolated between the
/// two surrounding order statistics.
fn interpolated_quantile(sorted: &[f64], q: f64) -> f64 {
    let n = sorted.len();
    if n == 1 {
        return sorted[0];
    }
    let rank = q * (n - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = (lo + 1).min(n - 1);
    let frac = rank - lo as f64;
    sorted[lo] + (sorted[hi] - sorted[lo]) * frac
}

/// Mask values for display: valid iff `0 < v <= ceiling` (default 45 C).
///
/// This is the visual validity policy used by the heatmaps only. It is wider
/// at the bottom and narrower at the top than the statistics filter, so the
/// displayed pixel set and the statistic input set are not identical.
/// Invalid pixels become NaN.
pub fn mask_invalid(values: &[f64], config: &AnalysisConfig) -> Vec<f64> {
    values
        .iter()
        .map(|&v| {
            if v > 0.0 && v <= config.valid_ceiling_c {
                v
            } else {
                f64::NAN
            }
        })
        .collect()
}
