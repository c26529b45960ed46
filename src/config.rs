use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Analysis parameters for the urban/rural LST comparison.
///
/// Every tuning constant of the pipeline lives here under a name, with its
/// provenance documented, instead of being scattered through the stages as
/// literals. The defaults reproduce the Vancouver Landsat 9 scene the pipeline
/// is calibrated against.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Urban boundary polygons (GeoJSON).
    pub urban_boundary_path: PathBuf,
    /// Rural boundary polygons (GeoJSON).
    pub rural_boundary_path: PathBuf,
    /// Single-band thermal raster (GeoTIFF).
    pub raster_path: PathBuf,
    /// Directory receiving the figures and the CSV table.
    pub output_dir: PathBuf,
    /// CRS of the boundary files. GeoJSON is WGS84 unless stated otherwise.
    pub source_epsg: i32,
    /// Multiplier applied to raw digital numbers. Assumed Kelvin*10 sensor
    /// encoding; not read from file metadata.
    pub dn_scale: f64,
    /// Kelvin to Celsius offset, subtracted after scaling.
    pub kelvin_offset: f64,
    /// Upper bound of the display validity range, in Celsius. Pixels above it
    /// are masked in the heatmaps. Calibrated to this scene, not a physical
    /// limit.
    pub valid_ceiling_c: f64,
    /// Radius of the buffer drawn around the urban union to bound the rural
    /// subset, in CRS units (metres for projected Landsat scenes).
    pub buffer_radius_m: f64,
    /// Lower bound of the shared heatmap color scale, in Celsius.
    pub color_min_c: f64,
    /// Upper bound of the shared heatmap color scale, in Celsius.
    pub color_max_c: f64,
    /// Title of the urban panel in the boundary overview figure.
    pub urban_panel_title: String,
    /// Title of the rural panel in the boundary overview figure.
    pub rural_panel_title: String,
    /// Descriptive scene fields, used for stdout reporting and figure titles.
    pub scene: SceneMetadata,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        AnalysisConfig {
            urban_boundary_path: PathBuf::from("data/local-area-boundary.geojson"),
            rural_boundary_path: PathBuf::from("data/rural-area-boundary.geojson"),
            raster_path: PathBuf::from("tiff/LST_ST_B10.tif"),
            output_dir: PathBuf::from("output"),
            source_epsg: 4326,
            dn_scale: 0.1,
            kelvin_offset: 273.15,
            valid_ceiling_c: 45.0,
            buffer_radius_m: 20_000.0,
            color_min_c: 15.0,
            color_max_c: 25.0,
            urban_panel_title: "Urban Area (Vancouver)".to_string(),
            rural_panel_title: "Zoomed Rural Area Around Vancouver".to_string(),
            scene: SceneMetadata::default(),
        }
    }
}

impl AnalysisConfig {
    /// Path of the two-panel boundary overview map.
    pub fn boundary_map_path(&self) -> PathBuf {
        self.output_dir.join("urban_rural_maps.png")
    }

    /// Path of the two-panel temperature heatmap.
    pub fn temperature_map_path(&self) -> PathBuf {
        self.output_dir.join("temperature_maps.png")
    }

    /// Path of the grouped statistics bar chart.
    pub fn barchart_path(&self) -> PathBuf {
        self.output_dir.join("temperature_stats_barplot.png")
    }

    /// Path of the statistics CSV table.
    pub fn stats_csv_path(&self) -> PathBuf {
        self.output_dir.join("urban_rural_LST_stats.csv")
    }
}

/// Scene-level descriptive fields from the Landsat metadata file.
///
/// Hardcoded for the analyzed scene; nothing here is computed from the raster.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SceneMetadata {
    pub scene_date: NaiveDate,
    pub product_generated: NaiveDate,
    pub day_night: String,
    pub land_cloud_cover_pct: f64,
    pub scene_cloud_cover_pct: f64,
    pub station: String,
}

impl Default for SceneMetadata {
    fn default() -> Self {
        SceneMetadata {
            scene_date: NaiveDate::from_ymd_opt(2024, 8, 9).unwrap_or_default(),
            product_generated: NaiveDate::from_ymd_opt(2024, 8, 15).unwrap_or_default(),
            day_night: "DAY".to_string(),
            land_cloud_cover_pct: 18.28,
            scene_cloud_cover_pct: 15.57,
            station: "LGN".to_string(),
        }
    }
}

impl SceneMetadata {
    /// Print the metadata block to stdout.
    pub fn print(&self) {
        println!("\n--- Landsat Scene Metadata ---");
        println!("Scene Date: {}", self.scene_date);
        println!("Product Generated Date: {}", self.product_generated);
        println!("Day/Night: {}", self.day_night);
        println!("Land Cloud Cover (%): {}", self.land_cloud_cover_pct);
        println!("Scene Cloud Cover (%): {}", self.scene_cloud_cover_pct);
        println!("Satellite Station: {}", self.station);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_matches_scene_calibration() {
        let cfg = AnalysisConfig::default();
        assert_eq!(cfg.dn_scale, 0.1);
        assert_eq!(cfg.kelvin_offset, 273.15);
        assert_eq!(cfg.valid_ceiling_c, 45.0);
        assert_eq!(cfg.buffer_radius_m, 20_000.0);
    }

    #[test]
    fn test_output_paths() {
        let cfg = AnalysisConfig::default();
        assert_eq!(
            cfg.stats_csv_path(),
            PathBuf::from("output/urban_rural_LST_stats.csv")
        );
        assert_eq!(
            cfg.boundary_map_path(),
            PathBuf::from("output/urban_rural_maps.png")
        );
    }

    #[test]
    fn test_config_round_trips_through_json() {
        let cfg = AnalysisConfig::default();
        let json = serde_json::to_string(&cfg).unwrap();
        let back: AnalysisConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.color_min_c, cfg.color_min_c);
        assert_eq!(back.scene.station, cfg.scene.station);
    }
}
