//! # shp2osm
//!
//! Conversion de shapefiles routiers en OSM-JSON et en graphes routables.
//!
//! ## Features
//!
//! - Déduplication exacte des points en nodes partagés
//! - Identifiants issus du champ `osm_id` ou d'un compteur séquentiel
//! - Reprojection pure Rust (WGS84, Web Mercator, UTM) ou via PROJ
//! - Graphe orienté routable, simplifié, et table géographique avec tampons
//! - CLI avec traitement parallèle d'un dossier de shapefiles
//!
//! ## Usage CLI
//!
//! ```bash
//! # Shapefile vers OSM-JSON, reprojeté depuis UTM 43N
//! shp2osm osm-json --path ./roads.shp --output ./roads.json --in-crs EPSG:32643
//!
//! # Graphe routable simplifié
//! shp2osm graph --path ./roads.shp --output ./graph.json --standards default
//! ```

pub mod config;
pub mod export;
pub mod graph;
pub mod osm;
pub mod pipeline;
pub mod progress;
pub mod reproject_lite;
pub mod table;
pub mod transform;

pub use graph::{GraphEdge, GraphNode, RoutableGraph};
pub use osm::{Element, ElementId, LookupStrategy, Node, OsmJson, Way};
pub use pipeline::{
    build_graph, build_table, to_osm_json, ConversionOptions, GraphOptions,
};
pub use table::GeoTable;
