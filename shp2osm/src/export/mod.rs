//! Modules d'export (GeoJSON, OSM-JSON) et reprojection PROJ

pub mod geojson;
pub mod osm_json;
pub mod reproject;

pub use reproject::Reprojector;
