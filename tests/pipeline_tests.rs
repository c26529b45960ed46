//! End-to-end pipeline tests against a synthesized thermal raster.

use gdal::raster::Buffer;
use gdal::spatial_ref::SpatialRef;
use gdal::DriverManager;
use geo::{polygon, Geometry};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use rslst::boundary::BoundaryLayer;
use rslst::config::AnalysisConfig;
use rslst::raster::ThermalRaster;
use rslst::render::{self, TempGrid};
use rslst::report;
use rslst::temperature::{calculate_stats, mask_invalid, to_celsius};

const EPSG: i32 = 32610; // UTM 10N, the zone of the analyzed Vancouver scene

// 20x20 raster, 30 m pixels, origin (500000, 5460000), north-up.
const TRANSFORM: [f64; 6] = [500_000.0, 30.0, 0.0, 5_460_000.0, 0.0, -30.0];

/// Write a 20x20 constant-valued GeoTIFF and return its path.
fn write_constant_raster(dir: &Path, value: f64) -> PathBuf {
    let path = dir.join("lst.tif");
    let driver = DriverManager::get_driver_by_name("GTiff").unwrap();
    let mut dataset = driver
        .create_with_band_type::<f64, _>(&path, 20, 20, 1)
        .unwrap();
    dataset.set_geo_transform(&TRANSFORM).unwrap();
    let srs = SpatialRef::from_epsg(EPSG as u32).unwrap();
    dataset.set_spatial_ref(&srs).unwrap();

    let data = vec![value; 20 * 20];
    let mut band = dataset.rasterband(1).unwrap();
    let mut buffer = Buffer::new((20, 20), data);
    band.write((0, 0), (20, 20), &mut buffer).unwrap();
    path
}

fn square(x0: f64, y0: f64, size: f64) -> Geometry<f64> {
    Geometry::Polygon(polygon![
        (x: x0, y: y0),
        (x: x0 + size, y: y0),
        (x: x0 + size, y: y0 + size),
        (x: x0, y: y0 + size),
    ])
}

/// Urban square well inside the raster extent.
fn urban_layer() -> BoundaryLayer {
    BoundaryLayer::from_geometries(vec![square(500_060.0, 5_459_460.0, 480.0)], EPSG)
}

#[test]
fn constant_kelvin_raster_yields_exact_stats() {
    let dir = TempDir::new().unwrap();
    // Kelvin*10 encoding: raw 3000 is 300 K is 26.85 C.
    let raster_path = write_constant_raster(dir.path(), 3000.0);

    let config = AnalysisConfig::default();
    let raster = ThermalRaster::open(&raster_path).unwrap();
    assert_eq!(raster.epsg(), EPSG);

    let urban = urban_layer().to_crs(raster.epsg()).unwrap();
    let clip = raster.clip(urban.geometries()).unwrap();
    assert!(!clip.is_empty());

    let celsius = to_celsius(&clip.data, &config);
    let stats = calculate_stats(&celsius);
    assert!((stats.mean - 26.85).abs() < 1e-9);
    assert!((stats.median - 26.85).abs() < 1e-9);
    assert!((stats.p95 - 26.85).abs() < 1e-9);
}

#[test]
fn clip_crops_to_minimal_window_and_masks_outside() {
    let dir = TempDir::new().unwrap();
    let raster_path = write_constant_raster(dir.path(), 3000.0);
    let raster = ThermalRaster::open(&raster_path).unwrap();

    // Square covering pixel columns/rows 2..18.
    let urban = urban_layer();
    let clip = raster.clip(urban.geometries()).unwrap();
    assert_eq!(clip.width, 16);
    assert_eq!(clip.height, 16);
    // The window origin moved by two pixels in both axes.
    assert!((clip.transform[0] - (500_000.0 + 2.0 * 30.0)).abs() < 1e-9);
    assert!((clip.transform[3] - (5_460_000.0 - 2.0 * 30.0)).abs() < 1e-9);
    // The square covers every center of the window, so nothing is NaN.
    assert!(clip.data.iter().all(|v| *v == 3000.0));

    // A diamond-shaped footprint leaves NaN in the window corners.
    let diamond = Geometry::Polygon(polygon![
        (x: 500_300.0, y: 5_459_940.0),
        (x: 500_540.0, y: 5_459_700.0),
        (x: 500_300.0, y: 5_459_460.0),
        (x: 500_060.0, y: 5_459_700.0),
    ]);
    let clip = raster.clip(&[diamond]).unwrap();
    assert!(clip.data[0].is_nan());
    assert!(clip.data.iter().any(|v| *v == 3000.0));
}

#[test]
fn zero_overlap_polygon_degrades_to_nan_stats() {
    let dir = TempDir::new().unwrap();
    let raster_path = write_constant_raster(dir.path(), 3000.0);
    let raster = ThermalRaster::open(&raster_path).unwrap();

    // 100 km east of the raster.
    let far = square(600_000.0, 5_459_000.0, 500.0);
    let clip = raster.clip(&[far]).unwrap();
    assert!(clip.is_empty());

    let config = AnalysisConfig::default();
    let stats = calculate_stats(&to_celsius(&clip.data, &config));
    assert!(stats.mean.is_nan());
    assert!(stats.median.is_nan());
    assert!(stats.p95.is_nan());
}

#[test]
fn boundary_layer_reads_geojson_from_disk() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("boundary.geojson");
    let geojson = r#"{
        "type": "FeatureCollection",
        "features": [{
            "type": "Feature",
            "properties": {"name": "test"},
            "geometry": {
                "type": "Polygon",
                "coordinates": [[
                    [500060.0, 5459460.0],
                    [500540.0, 5459460.0],
                    [500540.0, 5459940.0],
                    [500060.0, 5459940.0],
                    [500060.0, 5459460.0]
                ]]
            }
        }]
    }"#;
    std::fs::write(&path, geojson).unwrap();

    let layer = BoundaryLayer::from_geojson_file(&path, EPSG).unwrap();
    assert_eq!(layer.len(), 1);
    let bounds = layer.total_bounds().unwrap();
    assert!((bounds.min_x - 500_060.0).abs() < 1e-9);
    assert!((bounds.max_y - 5_459_940.0).abs() < 1e-9);
}

#[test]
fn figures_and_csv_land_on_disk() {
    let dir = TempDir::new().unwrap();
    let raster_path = write_constant_raster(dir.path(), 3000.0);

    let mut config = AnalysisConfig::default();
    config.output_dir = dir.path().join("output");

    let raster = ThermalRaster::open(&raster_path).unwrap();
    let urban = urban_layer();
    // Rural ring around the urban square, also on the raster.
    let rural = BoundaryLayer::from_geometries(vec![square(500_030.0, 5_459_430.0, 540.0)], EPSG);

    let buffer_region = urban.buffered_union(config.buffer_radius_m).unwrap();
    let rural_filtered = rural.filter_intersecting(&buffer_region);
    assert_eq!(rural_filtered.len(), 1);

    let urban_clip = raster.clip(urban.geometries()).unwrap();
    let rural_clip = raster.clip(rural_filtered.geometries()).unwrap();

    let urban_celsius = to_celsius(&urban_clip.data, &config);
    let rural_celsius = to_celsius(&rural_clip.data, &config);
    let urban_stats = calculate_stats(&urban_celsius);
    let rural_stats = calculate_stats(&rural_celsius);
    let urban_masked = mask_invalid(&urban_celsius, &config);
    let rural_masked = mask_invalid(&rural_celsius, &config);

    let map_path = render::render_boundary_maps(&urban, &rural_filtered, &config).unwrap();
    let heat_path = render::render_temperature_maps(
        TempGrid::new(&urban_masked, urban_clip.width, urban_clip.height),
        TempGrid::new(&rural_masked, rural_clip.width, rural_clip.height),
        &config,
    )
    .unwrap();
    let bar_path = render::render_stats_barchart(&urban_stats, &rural_stats, &config).unwrap();
    let csv_path = report::write_stats_csv(&urban_stats, &rural_stats, &config).unwrap();

    for path in [&map_path, &heat_path, &bar_path, &csv_path] {
        assert!(path.exists(), "missing output: {:?}", path);
    }
    assert_eq!(csv_path, config.output_dir.join("urban_rural_LST_stats.csv"));
}
