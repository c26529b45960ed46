use anyhow::Result;

use rslst::boundary::BoundaryLayer;
use rslst::config::AnalysisConfig;
use rslst::raster::ThermalRaster;
use rslst::render::{self, TempGrid};
use rslst::report;
use rslst::temperature::{calculate_stats, mask_invalid, to_celsius};

fn main() -> Result<()> {
    let config = AnalysisConfig::default();

    println!("=== Urban vs Rural LST Comparison ===\n");

    // Load inputs and bring the boundaries into the raster's CRS.
    let raster = ThermalRaster::open(&config.raster_path)?;
    let urban = BoundaryLayer::from_geojson_file(&config.urban_boundary_path, config.source_epsg)?;
    let rural = BoundaryLayer::from_geojson_file(&config.rural_boundary_path, config.source_epsg)?;
    let urban_proj = urban.to_crs(raster.epsg())?;
    let rural_proj = rural.to_crs(raster.epsg())?;
    println!(
        "Loaded {} urban and {} rural features (EPSG:{})",
        urban_proj.len(),
        rural_proj.len(),
        raster.epsg()
    );

    // The rural layer covers a large area; keep only the features touching a
    // buffer around the urban footprint.
    let buffer_region = urban_proj.buffered_union(config.buffer_radius_m)?;
    let rural_filtered = rural_proj.filter_intersecting(&buffer_region);
    println!(
        "Rural subset within {:.0} m buffer: {} of {} features",
        config.buffer_radius_m,
        rural_filtered.len(),
        rural_proj.len()
    );

    // Clip, convert, compute.
    let urban_clip = raster.clip(urban_proj.geometries())?;
    let rural_clip = raster.clip(rural_filtered.geometries())?;

    let urban_celsius = to_celsius(&urban_clip.data, &config);
    let rural_celsius = to_celsius(&rural_clip.data, &config);

    let urban_stats = calculate_stats(&urban_celsius);
    let rural_stats = calculate_stats(&rural_celsius);

    config.scene.print();
    println!();
    report::print_stats("Urban", &urban_stats);
    report::print_stats("Rural", &rural_stats);
    println!();

    // Figures use the display mask, which differs from the statistics filter.
    let urban_masked = mask_invalid(&urban_celsius, &config);
    let rural_masked = mask_invalid(&rural_celsius, &config);

    render::render_boundary_maps(&urban_proj, &rural_filtered, &config)?;
    render::render_temperature_maps(
        TempGrid::new(&urban_masked, urban_clip.width, urban_clip.height),
        TempGrid::new(&rural_masked, rural_clip.width, rural_clip.height),
        &config,
    )?;
    render::render_stats_barchart(&urban_stats, &rural_stats, &config)?;

    report::write_stats_csv(&urban_stats, &rural_stats, &config)?;

    Ok(())
}
