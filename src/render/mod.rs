//! Figure rendering for the urban/rural LST comparison.
//!
//! Three fixed-layout figures drawn onto RGB canvases: a two-panel boundary
//! overview, a two-panel masked-temperature heatmap with colorbars, and a
//! grouped bar chart of the summary statistics.

pub mod canvas;
pub mod colormap;

use anyhow::Result;
use image::Rgb;
use std::path::PathBuf;

use crate::boundary::BoundaryLayer;
use crate::config::AnalysisConfig;
use crate::temperature::LstStats;

use canvas::{blend, draw_geometry, Canvas, PanelTransform, BLACK, WHITE};

const FIG_WIDTH: u32 = 1400;
const FIG_HEIGHT: u32 = 600;
const PANEL_WIDTH: u32 = 620;
const PANEL_HEIGHT: u32 = 470;
const PANEL_TOP: i32 = 90;
const LEFT_PANEL_X: i32 = 50;
const RIGHT_PANEL_X: i32 = 730;

const URBAN_COLOR: Rgb<u8> = Rgb([31, 119, 180]); // tab:blue
const RURAL_COLOR: Rgb<u8> = Rgb([44, 160, 44]); // tab:green
const URBAN_EDGE: Rgb<u8> = Rgb([0, 128, 0]);
const RURAL_FILL: Rgb<u8> = Rgb([144, 238, 144]); // lightgreen
const RURAL_EDGE: Rgb<u8> = Rgb([0, 100, 0]); // darkgreen
const MARKER_COLOR: Rgb<u8> = Rgb([214, 39, 40]); // red

// Map-unit offset of the "Rural Area" label from its marker.
const LABEL_OFFSET_X: f64 = 600.0;
const LABEL_OFFSET_Y: f64 = 2000.0;

/// Masked temperature values with their grid shape, ready for display.
#[derive(Debug, Clone, Copy)]
pub struct TempGrid<'a> {
    pub data: &'a [f64],
    pub width: usize,
    pub height: usize,
}

impl<'a> TempGrid<'a> {
    pub fn new(data: &'a [f64], width: usize, height: usize) -> Self {
        TempGrid {
            data,
            width,
            height,
        }
    }
}

/// Two-panel boundary overview: the urban polygons and the rural subset
/// zoomed to the buffer region, with a marker on the first rural feature.
pub fn render_boundary_maps(
    urban: &BoundaryLayer,
    rural_filtered: &BoundaryLayer,
    config: &AnalysisConfig,
) -> Result<PathBuf> {
    let mut canvas = Canvas::new(FIG_WIDTH, FIG_HEIGHT, WHITE)?;

    // urban panel
    canvas.text_centered(
        LEFT_PANEL_X + PANEL_WIDTH as i32 / 2,
        40,
        22.0,
        BLACK,
        &config.urban_panel_title,
    );
    if let Some(bounds) = urban.total_bounds() {
        let transform =
            PanelTransform::fit(&bounds, LEFT_PANEL_X, PANEL_TOP, PANEL_WIDTH, PANEL_HEIGHT);
        let fill = blend(URBAN_COLOR, WHITE, 0.5);
        for geometry in urban.geometries() {
            draw_geometry(&mut canvas, &transform, geometry, fill, URBAN_EDGE);
        }
    }

    // rural panel, zoomed to the filtered subset
    canvas.text_centered(
        RIGHT_PANEL_X + PANEL_WIDTH as i32 / 2,
        40,
        22.0,
        BLACK,
        &config.rural_panel_title,
    );
    if let Some(bounds) = rural_filtered.total_bounds() {
        let transform =
            PanelTransform::fit(&bounds, RIGHT_PANEL_X, PANEL_TOP, PANEL_WIDTH, PANEL_HEIGHT);
        let fill = blend(RURAL_FILL, WHITE, 0.5);
        for geometry in rural_filtered.geometries() {
            draw_geometry(&mut canvas, &transform, geometry, fill, RURAL_EDGE);
        }

        if let Some(centroid) = rural_filtered.first_centroid() {
            let (px, py) = transform.to_px(centroid.x(), centroid.y());
            canvas.filled_circle((px as i32, py as i32), 5, MARKER_COLOR);
            let (lx, ly) =
                transform.to_px(centroid.x() + LABEL_OFFSET_X, centroid.y() + LABEL_OFFSET_Y);
            canvas.text(lx as i32, ly as i32, 16.0, MARKER_COLOR, "Rural Area");
        }
    }

    let path = config.boundary_map_path();
    canvas.save(&path)?;
    println!("Boundary map saved to: {:?}", path);
    Ok(path)
}

/// Two-panel heatmap of the masked temperature arrays on a shared color
/// scale, each panel with its own colorbar. Masked (NaN) pixels stay on the
/// white background.
pub fn render_temperature_maps(
    urban: TempGrid,
    rural: TempGrid,
    config: &AnalysisConfig,
) -> Result<PathBuf> {
    let mut canvas = Canvas::new(FIG_WIDTH, FIG_HEIGHT, WHITE)?;

    canvas.text_centered(
        FIG_WIDTH as i32 / 2,
        14,
        20.0,
        BLACK,
        "Urban vs Rural Surface Temperature",
    );
    let subtitle = format!(
        "Landsat Scene Date: {}, Cloud Cover: {:.2}%",
        config.scene.scene_date, config.scene.land_cloud_cover_pct
    );
    canvas.text_centered(FIG_WIDTH as i32 / 2, 40, 15.0, BLACK, &subtitle);

    draw_heatmap_panel(
        &mut canvas,
        urban,
        LEFT_PANEL_X,
        "Urban Surface Temperature (°C)",
        config,
    );
    draw_heatmap_panel(
        &mut canvas,
        rural,
        RIGHT_PANEL_X,
        "Rural Surface Temperature (°C)",
        config,
    );

    let path = config.temperature_map_path();
    canvas.save(&path)?;
    println!("Temperature map saved to: {:?}", path);
    Ok(path)
}

fn draw_heatmap_panel(
    canvas: &mut Canvas,
    grid: TempGrid,
    panel_x: i32,
    title: &str,
    config: &AnalysisConfig,
) {
    canvas.text_centered(panel_x + PANEL_WIDTH as i32 / 2, 64, 17.0, BLACK, title);
    if grid.width == 0 || grid.height == 0 {
        canvas.text_centered(
            panel_x + PANEL_WIDTH as i32 / 2,
            PANEL_TOP + PANEL_HEIGHT as i32 / 2,
            14.0,
            BLACK,
            "no data",
        );
        return;
    }

    // letterbox the grid into the panel, nearest-neighbor
    let scale = (PANEL_WIDTH as f64 / grid.width as f64)
        .min(PANEL_HEIGHT as f64 / grid.height as f64);
    let draw_w = (grid.width as f64 * scale) as u32;
    let draw_h = (grid.height as f64 * scale) as u32;
    let x0 = panel_x + ((PANEL_WIDTH - draw_w) / 2) as i32;
    let y0 = PANEL_TOP + ((PANEL_HEIGHT - draw_h) / 2) as i32;

    for py in 0..draw_h {
        for px in 0..draw_w {
            let col = ((px as f64 / scale) as usize).min(grid.width - 1);
            let row = ((py as f64 / scale) as usize).min(grid.height - 1);
            let value = grid.data[row * grid.width + col];
            if value.is_nan() {
                continue;
            }
            let color = colormap::map_value(value, config.color_min_c, config.color_max_c);
            canvas.put_pixel((x0 + px as i32) as u32, (y0 + py as i32) as u32, color);
        }
    }

    draw_colorbar(canvas, panel_x + PANEL_WIDTH as i32 + 8, PANEL_TOP, config);
}

fn draw_colorbar(canvas: &mut Canvas, x: i32, y: i32, config: &AnalysisConfig) {
    const BAR_WIDTH: u32 = 18;
    let bar_height = PANEL_HEIGHT;

    for py in 0..bar_height {
        let t = 1.0 - py as f64 / (bar_height - 1) as f64;
        let color = colormap::sample(t);
        for px in 0..BAR_WIDTH {
            canvas.put_pixel((x + px as i32) as u32, (y + py as i32) as u32, color);
        }
    }
    canvas.hollow_rect(x, y, BAR_WIDTH, bar_height, BLACK);

    let mid = (config.color_min_c + config.color_max_c) / 2.0;
    let label_x = x + BAR_WIDTH as i32 + 4;
    canvas.text(label_x, y - 6, 13.0, BLACK, &format!("{:.0}", config.color_max_c));
    canvas.text(
        label_x,
        y + bar_height as i32 / 2 - 6,
        13.0,
        BLACK,
        &format!("{:.0}", mid),
    );
    canvas.text(
        label_x,
        y + bar_height as i32 - 12,
        13.0,
        BLACK,
        &format!("{:.0}", config.color_min_c),
    );
}

/// Grouped bar chart of the three statistics for urban vs rural, with a
/// numeric label above each bar.
pub fn render_stats_barchart(
    urban: &LstStats,
    rural: &LstStats,
    config: &AnalysisConfig,
) -> Result<PathBuf> {
    const WIDTH: u32 = 1000;
    const HEIGHT: u32 = 600;
    const AXIS_LEFT: i32 = 120;
    const AXIS_RIGHT: i32 = 950;
    const AXIS_TOP: i32 = 120;
    const AXIS_BOTTOM: i32 = 520;
    const BAR_WIDTH: u32 = 70;

    let mut canvas = Canvas::new(WIDTH, HEIGHT, WHITE)?;

    canvas.text_centered(
        WIDTH as i32 / 2,
        14,
        20.0,
        BLACK,
        "Urban vs Rural Surface Temperature Statistics",
    );
    let subtitle = format!(
        "Landsat Scene Date: {}, Product Generated: {}",
        config.scene.scene_date, config.scene.product_generated
    );
    canvas.text_centered(WIDTH as i32 / 2, 40, 15.0, BLACK, &subtitle);

    let groups = [
        ("Mean", urban.mean, rural.mean),
        ("Median", urban.median, rural.median),
        ("Max", urban.p95, rural.p95),
    ];

    let max_value = groups
        .iter()
        .flat_map(|(_, u, r)| [*u, *r])
        .filter(|v| v.is_finite())
        .fold(0.0_f64, f64::max);
    let y_max = if max_value > 0.0 { max_value * 1.15 } else { 1.0 };
    let axis_height = (AXIS_BOTTOM - AXIS_TOP) as f64;
    let value_to_y = |v: f64| AXIS_BOTTOM - (v / y_max * axis_height) as i32;

    // axes
    canvas.line(
        (AXIS_LEFT as f32, AXIS_TOP as f32),
        (AXIS_LEFT as f32, AXIS_BOTTOM as f32),
        BLACK,
    );
    canvas.line(
        (AXIS_LEFT as f32, AXIS_BOTTOM as f32),
        (AXIS_RIGHT as f32, AXIS_BOTTOM as f32),
        BLACK,
    );
    canvas.text(AXIS_LEFT - 30, AXIS_TOP - 30, 14.0, BLACK, "Temperature (°C)");

    // y ticks
    for step in 0..=5 {
        let value = y_max * step as f64 / 5.0;
        let y = value_to_y(value);
        canvas.line(
            ((AXIS_LEFT - 5) as f32, y as f32),
            (AXIS_LEFT as f32, y as f32),
            BLACK,
        );
        let label = format!("{:.1}", value);
        let w = canvas.text_width(13.0, &label);
        canvas.text(AXIS_LEFT - 10 - w as i32, y - 7, 13.0, BLACK, &label);
    }

    // grouped bars
    let group_span = (AXIS_RIGHT - AXIS_LEFT) / groups.len() as i32;
    for (i, (label, urban_value, rural_value)) in groups.iter().enumerate() {
        let center = AXIS_LEFT + group_span * i as i32 + group_span / 2;
        draw_bar(
            &mut canvas,
            center - BAR_WIDTH as i32 - 4,
            *urban_value,
            URBAN_COLOR,
            &value_to_y,
            AXIS_BOTTOM,
            BAR_WIDTH,
        );
        draw_bar(
            &mut canvas,
            center + 4,
            *rural_value,
            RURAL_COLOR,
            &value_to_y,
            AXIS_BOTTOM,
            BAR_WIDTH,
        );
        canvas.text_centered(center, AXIS_BOTTOM + 12, 15.0, BLACK, label);
    }

    // legend
    let legend_x = AXIS_RIGHT - 140;
    canvas.fill_rect(legend_x, AXIS_TOP - 40, 16, 16, URBAN_COLOR);
    canvas.text(legend_x + 22, AXIS_TOP - 40, 14.0, BLACK, "Urban");
    canvas.fill_rect(legend_x, AXIS_TOP - 18, 16, 16, RURAL_COLOR);
    canvas.text(legend_x + 22, AXIS_TOP - 18, 14.0, BLACK, "Rural");

    let path = config.barchart_path();
    canvas.save(&path)?;
    println!("Statistics bar chart saved to: {:?}", path);
    Ok(path)
}

fn draw_bar(
    canvas: &mut Canvas,
    x: i32,
    value: f64,
    color: Rgb<u8>,
    value_to_y: &dyn Fn(f64) -> i32,
    baseline: i32,
    width: u32,
) {
    if !value.is_finite() || value <= 0.0 {
        return;
    }
    let top = value_to_y(value);
    let height = (baseline - top).max(1) as u32;
    canvas.fill_rect(x, top, width, height, color);
    canvas.text_centered(
        x + width as i32 / 2,
        top - 18,
        13.0,
        BLACK,
        &format!("{:.2}", value),
    );
}
