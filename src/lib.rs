//! Urban vs rural Land Surface Temperature comparison.
//!
//! One-shot pipeline: load boundary polygons, reproject them to the thermal
//! raster's CRS, clip the raster per polygon set, convert digital numbers to
//! Celsius, compute summary statistics, render figures and export a CSV.

pub mod boundary;
pub mod config;
pub mod geo_core;
pub mod raster;
pub mod render;
pub mod report;
pub mod temperature;
