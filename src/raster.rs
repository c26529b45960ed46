use anyhow::{Context, Result};
use gdal::Dataset;
use geo::{Contains, Geometry, Point};
use std::path::Path;

use crate::geo_core::BoundingBox;

/// Single-band thermal raster opened through GDAL.
///
/// Read-only input: the pipeline never writes back to it.
pub struct ThermalRaster {
    dataset: Dataset,
    width: usize,
    height: usize,
    transform: [f64; 6],
    epsg: i32,
}

/// Pixel values restricted to a polygon footprint, cropped to the minimal
/// bounding window. Pixels outside the polygons are NaN.
#[derive(Debug, Clone)]
pub struct ClippedRaster {
    pub data: Vec<f64>,
    pub width: usize,
    pub height: usize,
    /// Geotransform of the cropped window (same convention as GDAL:
    /// `[x_origin, pixel_width, 0, y_origin, 0, pixel_height]`).
    pub transform: [f64; 6],
}

impl ClippedRaster {
    /// Produced when the polygons do not overlap the raster at all.
    /// Statistics over it are NaN; that is accepted, not corrected.
    pub fn empty(transform: [f64; 6]) -> Self {
        ClippedRaster {
            data: Vec::new(),
            width: 0,
            height: 0,
            transform,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl ThermalRaster {
    /// Open a raster and introspect its geotransform and CRS.
    ///
    /// A raster without CRS metadata is rejected: reprojecting the boundary
    /// layers onto it would be meaningless.
    pub fn open(path: &Path) -> Result<Self> {
        let dataset =
            Dataset::open(path).context(format!("Failed to open thermal raster: {:?}", path))?;
        let (width, height) = dataset.raster_size();
        let transform = dataset
            .geo_transform()
            .context("Raster has no geotransform")?;
        let spatial_ref = dataset
            .spatial_ref()
            .context("Raster has no CRS metadata")?;
        let epsg = spatial_ref
            .auth_code()
            .context("Raster CRS has no EPSG authority code")?;

        Ok(ThermalRaster {
            dataset,
            width,
            height,
            transform,
            epsg,
        })
    }

    pub fn epsg(&self) -> i32 {
        self.epsg
    }

    pub fn size(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    pub fn transform(&self) -> [f64; 6] {
        self.transform
    }

    /// Clip the first band to the union of `geometries`.
    ///
    /// The window is the minimal pixel rectangle covering the geometries'
    /// total bounds, intersected with the raster extent. Within the window,
    /// pixels whose center falls outside every geometry become NaN.
    pub fn clip(&self, geometries: &[Geometry<f64>]) -> Result<ClippedRaster> {
        let bounds = match BoundingBox::from_geometries(geometries) {
            Some(b) => b,
            None => return Ok(ClippedRaster::empty(self.transform)),
        };

        let window = match pixel_window(&self.transform, self.width, self.height, &bounds) {
            Some(w) => w,
            None => return Ok(ClippedRaster::empty(self.transform)),
        };
        let (min_col, min_row, win_width, win_height) = window;

        let band = self
            .dataset
            .rasterband(1)
            .context("Failed to get raster band 1")?;
        let buffer = band
            .read_as::<f64>(
                (min_col as isize, min_row as isize),
                (win_width, win_height),
                (win_width, win_height),
                None,
            )
            .context("Failed to read raster window")?;

        let x_origin = self.transform[0];
        let pixel_width = self.transform[1];
        let y_origin = self.transform[3];
        let pixel_height = self.transform[5];

        let clip_transform = [
            x_origin + min_col as f64 * pixel_width,
            pixel_width,
            0.0,
            y_origin + min_row as f64 * pixel_height,
            0.0,
            pixel_height,
        ];

        // Mask by pixel-center containment against each geometry.
        let mut data = vec![f64::NAN; win_width * win_height];
        for row in 0..win_height {
            for col in 0..win_width {
                let x = clip_transform[0] + (col as f64 + 0.5) * pixel_width;
                let y = clip_transform[3] + (row as f64 + 0.5) * pixel_height;
                let point = Point::new(x, y);
                if geometries.iter().any(|g| g.contains(&point)) {
                    let idx = row * win_width + col;
                    data[idx] = buffer.data()[idx];
                }
            }
        }

        Ok(ClippedRaster {
            data,
            width: win_width,
            height: win_height,
            transform: clip_transform,
        })
    }
}

/// Compute the pixel window `(min_col, min_row, width, height)` covering
/// `bounds`, clamped to the raster extent. `None` when there is no overlap.
fn pixel_window(
    transform: &[f64; 6],
    raster_width: usize,
    raster_height: usize,
    bounds: &BoundingBox,
) -> Option<(usize, usize, usize, usize)> {
    let x_origin = transform[0];
    let pixel_width = transform[1];
    let y_origin = transform[3];
    let pixel_height = transform[5]; // negative for north-up rasters

    let min_col = ((bounds.min_x - x_origin) / pixel_width).floor();
    let max_col = ((bounds.max_x - x_origin) / pixel_width).ceil();
    // y axis runs downward in pixel space
    let min_row = ((bounds.max_y - y_origin) / pixel_height).floor();
    let max_row = ((bounds.min_y - y_origin) / pixel_height).ceil();

    if max_col <= 0.0 || max_row <= 0.0 {
        return None;
    }
    if min_col >= raster_width as f64 || min_row >= raster_height as f64 {
        return None;
    }

    let min_col = min_col.max(0.0) as usize;
    let min_row = min_row.max(0.0) as usize;
    let max_col = (max_col.min(raster_width as f64)) as usize;
    let max_row = (max_row.min(raster_height as f64)) as usize;

    if max_col <= min_col || max_row <= min_row {
        return None;
    }

    Some((min_col, min_row, max_col - min_col, max_row - min_row))
}

#[cfg(test)]
mod tests {
    use super::*;

    // 100x80 raster, 30 m pixels, origin (500000, 5460000), north-up.
    const TRANSFORM: [f64; 6] = [500_000.0, 30.0, 0.0, 5_460_000.0, 0.0, -30.0];

    #[test]
    fn test_pixel_window_inside() {
        let bounds = BoundingBox::new(500_060.0, 5_459_700.0, 500_300.0, 5_459_940.0);
        let (col, row, w, h) = pixel_window(&TRANSFORM, 100, 80, &bounds).unwrap();
        assert_eq!(col, 2);
        assert_eq!(row, 2);
        assert_eq!(w, 8);
        assert_eq!(h, 8);
    }

    #[test]
    fn test_pixel_window_clamped_to_extent() {
        let bounds = BoundingBox::new(499_000.0, 5_455_000.0, 600_000.0, 5_465_000.0);
        let (col, row, w, h) = pixel_window(&TRANSFORM, 100, 80, &bounds).unwrap();
        assert_eq!((col, row), (0, 0));
        assert_eq!((w, h), (100, 80));
    }

    #[test]
    fn test_pixel_window_disjoint_is_none() {
        // Entirely west of the raster.
        let bounds = BoundingBox::new(400_000.0, 5_459_000.0, 410_000.0, 5_459_500.0);
        assert!(pixel_window(&TRANSFORM, 100, 80, &bounds).is_none());

        // Entirely south of the raster.
        let bounds = BoundingBox::new(500_100.0, 5_000_000.0, 500_200.0, 5_100_000.0);
        assert!(pixel_window(&TRANSFORM, 100, 80, &bounds).is_none());
    }

    #[test]
    fn test_empty_clip_has_nan_stats_shape() {
        let clip = ClippedRaster::empty(TRANSFORM);
        assert!(clip.is_empty());
        assert_eq!(clip.width, 0);
        assert_eq!(clip.height, 0);
    }
}
