use anyhow::{Context, Result};
use geo::algorithm::map_coords::MapCoords;
use geo::{BoundingRect, Geometry};
use proj::Proj;

/// Axis-aligned extent in a single CRS.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl BoundingBox {
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        BoundingBox {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    /// Total bounds of a geometry collection, or `None` when the collection is
    /// empty or degenerate.
    pub fn from_geometries(geometries: &[Geometry<f64>]) -> Option<Self> {
        let mut bounds: Option<BoundingBox> = None;
        for geometry in geometries {
            if let Some(rect) = geometry.bounding_rect() {
                let b = BoundingBox::new(rect.min().x, rect.min().y, rect.max().x, rect.max().y);
                bounds = Some(match bounds {
                    Some(acc) => acc.merge(&b),
                    None => b,
                });
            }
        }
        bounds
    }

    pub fn merge(&self, other: &BoundingBox) -> BoundingBox {
        BoundingBox::new(
            self.min_x.min(other.min_x),
            self.min_y.min(other.min_y),
            self.max_x.max(other.max_x),
            self.max_y.max(other.max_y),
        )
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    /// Transform the corner coordinates to another CRS.
    pub fn transform(&self, from_epsg: i32, to_epsg: i32) -> Result<Self> {
        let (min_x, min_y) = transform_coords(from_epsg, to_epsg, self.min_x, self.min_y)?;
        let (max_x, max_y) = transform_coords(from_epsg, to_epsg, self.max_x, self.max_y)?;
        Ok(BoundingBox::new(min_x, min_y, max_x, max_y))
    }
}

/// Transform a single coordinate pair between two EPSG codes.
pub fn transform_coords(from_epsg: i32, to_epsg: i32, x: f64, y: f64) -> Result<(f64, f64)> {
    let from_crs = format!("EPSG:{}", from_epsg);
    let to_crs = format!("EPSG:{}", to_epsg);

    let proj = Proj::new_known_crs(&from_crs, &to_crs, None)
        .context("Failed to create Proj transformation")?;

    let result = proj
        .convert((x, y))
        .context("Failed to transform coordinates")?;

    Ok(result)
}

/// Reproject a geometry between two EPSG codes.
///
/// Coordinates that fail to convert are left untouched; topology is preserved
/// because only vertex positions change.
pub fn reproject_geometry(
    geometry: &Geometry<f64>,
    from_epsg: i32,
    to_epsg: i32,
) -> Result<Geometry<f64>> {
    if from_epsg == to_epsg {
        return Ok(geometry.clone());
    }

    let from_crs = format!("EPSG:{}", from_epsg);
    let to_crs = format!("EPSG:{}", to_epsg);
    let proj = Proj::new_known_crs(&from_crs, &to_crs, None).context(format!(
        "Failed to create projection from {} to {}",
        from_crs, to_crs
    ))?;

    Ok(geometry.map_coords(|c| {
        let (x, y) = proj.convert((c.x, c.y)).unwrap_or((c.x, c.y));
        geo::coord! { x: x, y: y }
    }))
}
