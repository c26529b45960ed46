use anyhow::{Context, Result};
use geo::{Centroid, Geometry as GeoGeometry, Intersects, Point};
use geojson::GeoJson;
use geos::{Geom, Geometry as GeosGeometry};
use std::path::Path;

use crate::geo_core::{self, BoundingBox};

/// A set of boundary polygons in a known CRS.
///
/// Wraps the geometries of one GeoJSON boundary file. Two instances exist in
/// the pipeline: the urban polygons and the surrounding rural polygons.
#[derive(Debug, Clone)]
pub struct BoundaryLayer {
    geometries: Vec<GeoGeometry<f64>>,
    epsg: i32,
}

impl BoundaryLayer {
    /// Read a boundary layer from a GeoJSON file.
    ///
    /// `source_epsg` is the CRS the file's coordinates are expressed in;
    /// GeoJSON files carry WGS84 (EPSG:4326) unless produced otherwise.
    /// A missing or malformed file is a fatal read error.
    pub fn from_geojson_file(path: &Path, source_epsg: i32) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .context(format!("Failed to read boundary file: {:?}", path))?;
        let geojson: GeoJson = raw
            .parse()
            .context(format!("Failed to parse GeoJSON: {:?}", path))?;

        let mut geometries = Vec::new();
        match geojson {
            GeoJson::FeatureCollection(fc) => {
                for feature in &fc.features {
                    if let Some(ref geom) = feature.geometry {
                        let geo_geom: GeoGeometry<f64> = geom
                            .try_into()
                            .context(format!("Unsupported geometry in {:?}", path))?;
                        geometries.push(geo_geom);
                    }
                }
            }
            GeoJson::Feature(feature) => {
                if let Some(ref geom) = feature.geometry {
                    let geo_geom: GeoGeometry<f64> = geom
                        .try_into()
                        .context(format!("Unsupported geometry in {:?}", path))?;
                    geometries.push(geo_geom);
                }
            }
            GeoJson::Geometry(geom) => {
                let geo_geom: GeoGeometry<f64> = (&geom)
                    .try_into()
                    .context(format!("Unsupported geometry in {:?}", path))?;
                geometries.push(geo_geom);
            }
        }

        if geometries.is_empty() {
            anyhow::bail!("Boundary file contains no geometries: {:?}", path);
        }

        Ok(BoundaryLayer {
            geometries,
            epsg: source_epsg,
        })
    }

    /// Build a layer directly from geometries, mainly for tests and callers
    /// that already hold projected data.
    pub fn from_geometries(geometries: Vec<GeoGeometry<f64>>, epsg: i32) -> Self {
        BoundaryLayer { geometries, epsg }
    }

    pub fn geometries(&self) -> &[GeoGeometry<f64>] {
        &self.geometries
    }

    pub fn epsg(&self) -> i32 {
        self.epsg
    }

    pub fn len(&self) -> usize {
        self.geometries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.geometries.is_empty()
    }

    /// Reproject every geometry into the target CRS.
    pub fn to_crs(&self, target_epsg: i32) -> Result<Self> {
        if self.epsg == target_epsg {
            return Ok(self.clone());
        }

        let mut reprojected = Vec::with_capacity(self.geometries.len());
        for geometry in &self.geometries {
            reprojected.push(geo_core::reproject_geometry(
                geometry,
                self.epsg,
                target_epsg,
            )?);
        }

        Ok(BoundaryLayer {
            geometries: reprojected,
            epsg: target_epsg,
        })
    }

    /// Total bounds of the layer.
    pub fn total_bounds(&self) -> Option<BoundingBox> {
        BoundingBox::from_geometries(&self.geometries)
    }

    /// Buffer the union of all geometries by a fixed radius (CRS units).
    ///
    /// Used to bound the rural subset around the urban footprint.
    pub fn buffered_union(&self, radius: f64) -> Result<GeoGeometry<f64>> {
        let mut unioned: Option<GeosGeometry> = None;
        for geometry in &self.geometries {
            let geos_geom: GeosGeometry = geometry
                .clone()
                .try_into()
                .context("Failed to convert geometry to GEOS")?;
            let buffered = geos_geom
                .buffer(radius, 8)
                .context("Failed to buffer geometry")?;
            unioned = Some(match unioned {
                Some(acc) => acc.union(&buffered).context("Failed to union buffers")?,
                None => buffered,
            });
        }

        let unioned = unioned.context("Cannot buffer an empty layer")?;
        let geo_geom: GeoGeometry<f64> = unioned
            .try_into()
            .map_err(|e| anyhow::anyhow!("Failed to convert GEOS union back to geo: {:?}", e))?;
        Ok(geo_geom)
    }

    /// Keep only the features whose geometry intersects `region`.
    ///
    /// The test is boolean: any overlap qualifies, a feature crossing the
    /// region edge is retained in full.
    pub fn filter_intersecting(&self, region: &GeoGeometry<f64>) -> Self {
        let retained = self
            .geometries
            .iter()
            .filter(|g| g.intersects(region))
            .cloned()
            .collect();
        BoundaryLayer {
            geometries: retained,
            epsg: self.epsg,
        }
    }

    /// Centroid of the first feature, used as the map marker position.
    pub fn first_centroid(&self) -> Option<Point<f64>> {
        self.geometries.first().and_then(|g| g.centroid())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::polygon;

    fn square(x0: f64, y0: f64, size: f64) -> GeoGeometry<f64> {
        GeoGeometry::Polygon(polygon![
            (x: x0, y: y0),
            (x: x0 + size, y: y0),
            (x: x0 + size, y: y0 + size),
            (x: x0, y: y0 + size),
        ])
    }

    #[test]
    fn test_filter_excludes_feature_outside_buffer() {
        let urban = BoundaryLayer::from_geometries(vec![square(0.0, 0.0, 1_000.0)], 32610);
        let region = urban.buffered_union(20_000.0).unwrap();

        // 50 km away, entirely outside the 20 km buffer.
        let far = square(50_000.0, 50_000.0, 1_000.0);
        let rural = BoundaryLayer::from_geometries(vec![far], 32610);
        let filtered = rural.filter_intersecting(&region);
        assert!(filtered.is_empty());
    }

    #[test]
    fn test_filter_keeps_feature_crossing_buffer_edge() {
        let urban = BoundaryLayer::from_geometries(vec![square(0.0, 0.0, 1_000.0)], 32610);
        let region = urban.buffered_union(20_000.0).unwrap();

        // Starts inside the buffer (~19 km east) and extends far beyond it:
        // intersects, not contains, so it must be retained.
        let crossing = square(19_000.0, 0.0, 30_000.0);
        let rural = BoundaryLayer::from_geometries(vec![crossing], 32610);
        let filtered = rural.filter_intersecting(&region);
        assert_eq!(filtered.len(), 1);
    }

    #[test]
    fn test_total_bounds() {
        let layer = BoundaryLayer::from_geometries(
            vec![square(0.0, 0.0, 10.0), square(30.0, 5.0, 10.0)],
            32610,
        );
        let bounds = layer.total_bounds().unwrap();
        assert_eq!(bounds.min_x, 0.0);
        assert_eq!(bounds.max_x, 40.0);
        assert_eq!(bounds.max_y, 15.0);
    }

    #[test]
    fn test_first_centroid() {
        let layer = BoundaryLayer::from_geometries(vec![square(0.0, 0.0, 10.0)], 32610);
        let c = layer.first_centroid().unwrap();
        assert!((c.x() - 5.0).abs() < 1e-9);
        assert!((c.y() - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_to_crs_same_epsg_is_identity() {
        let layer = BoundaryLayer::from_geometries(vec![square(0.0, 0.0, 10.0)], 32610);
        let out = layer.to_crs(32610).unwrap();
        assert_eq!(out.geometries(), layer.geometries());
    }

    #[test]
    fn test_from_geojson_file_missing_is_error() {
        let result =
            BoundaryLayer::from_geojson_file(Path::new("no/such/boundary.geojson"), 4326);
        assert!(result.is_err());
    }
}
