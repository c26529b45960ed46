use anyhow::{Context, Result};
use std::path::PathBuf;

use crate::config::AnalysisConfig;
use crate::temperature::LstStats;

/// Write the urban/rural statistics table.
///
/// Columns: `Statistic,Urban_LST_C,Rural_LST_C`. Row order is exactly
/// Mean, Median, Max. The `Max` row carries the 95th percentile; the label is
/// part of the table contract downstream consumers parse.
pub fn write_stats_csv(
    urban: &LstStats,
    rural: &LstStats,
    config: &AnalysisConfig,
) -> Result<PathBuf> {
    let path = config.stats_csv_path();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .context(format!("Failed to create output directory: {:?}", parent))?;
    }

    let mut writer =
        csv::Writer::from_path(&path).context(format!("Failed to create CSV: {:?}", path))?;
    writer
        .write_record(["Statistic", "Urban_LST_C", "Rural_LST_C"])
        .context("Failed to write CSV header")?;

    let rows = [
        ("Mean", urban.mean, rural.mean),
        ("Median", urban.median, rural.median),
        ("Max", urban.p95, rural.p95),
    ];
    for (name, urban_value, rural_value) in rows {
        writer
            .write_record([
                name.to_string(),
                urban_value.to_string(),
                rural_value.to_string(),
            ])
            .context("Failed to write CSV row")?;
    }
    writer.flush().context("Failed to flush CSV")?;

    println!("Statistics table saved to: {:?}", path);
    Ok(path)
}

/// Print one statistics line to stdout, e.g.
/// `Urban LST (°C): Mean = 26.85, Median = 26.85, Max = 26.85`.
pub fn print_stats(label: &str, stats: &LstStats) {
    println!(
        "{} LST (°C): Mean = {:.2}, Median = {:.2}, Max = {:.2}",
        label, stats.mean, stats.median, stats.p95
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_csv_row_order_matches_stats_tuple() {
        let dir = TempDir::new().unwrap();
        let mut cfg = AnalysisConfig::default();
        cfg.output_dir = dir.path().to_path_buf();

        let urban = LstStats {
            mean: 26.85,
            median: 27.0,
            p95: 29.5,
        };
        let rural = LstStats {
            mean: 22.1,
            median: 21.9,
            p95: 25.0,
        };
        let path = write_stats_csv(&urban, &rural, &cfg).unwrap();

        let contents = std::fs::read_to_string(path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines[0], "Statistic,Urban_LST_C,Rural_LST_C");
        assert!(lines[1].starts_with("Mean,26.85,"));
        assert!(lines[2].starts_with("Median,27,"));
        assert!(lines[3].starts_with("Max,29.5,"));
        assert_eq!(lines.len(), 4);
    }
}
