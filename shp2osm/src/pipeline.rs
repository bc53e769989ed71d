//! Orchestration : shapefile → features → (reprojection) → OSM-JSON / graphe / table
//!
//! Chaque appel est autonome : le champ identifiant détecté au parsing est
//! transmis explicitement à l'assemblage.

use std::path::Path;

use anyhow::{Context, Result};
use shpgeo::{ParseResult, Standards};
use tracing::{info, warn};

use crate::graph::RoutableGraph;
use crate::osm::{assemble, AssemblyStats, LookupStrategy, OsmJson};
use crate::progress::create_progress_bar;
use crate::table::GeoTable;
use crate::transform::{coordinate_transform, DEFAULT_OUT_CRS};

pub use shpgeo::parse;

/// Options d'une conversion shapefile → OSM-JSON
#[derive(Debug, Clone)]
pub struct ConversionOptions {
    /// CRS du shapefile. `None` : coordonnées prises telles quelles.
    pub in_crs: Option<String>,
    /// CRS de sortie, utilisé seulement si `in_crs` est renseigné
    pub out_crs: String,
    pub standards: Option<Standards>,
    pub lookup: LookupStrategy,
    pub show_progress: bool,
}

impl Default for ConversionOptions {
    fn default() -> Self {
        Self {
            in_crs: None,
            out_crs: DEFAULT_OUT_CRS.to_string(),
            standards: None,
            lookup: LookupStrategy::default(),
            show_progress: false,
        }
    }
}

/// Options de construction du graphe
#[derive(Debug, Clone)]
pub struct GraphOptions {
    pub name: String,
    /// Garder toutes les composantes, pas seulement la plus grande
    pub retain_all: bool,
    pub simplify: bool,
}

impl Default for GraphOptions {
    fn default() -> Self {
        Self {
            name: "unnamed".to_string(),
            retain_all: false,
            simplify: true,
        }
    }
}

/// Parse puis reprojette si un CRS source est fourni
pub fn load_features(path: &Path, options: &ConversionOptions) -> Result<ParseResult> {
    let mut parsed = parse(path, options.standards.as_ref())
        .with_context(|| format!("Failed to parse {}", path.display()))?;

    if let Some(in_crs) = &options.in_crs {
        let bar = create_progress_bar(
            parsed.collection.len(),
            "Reprojection",
            options.show_progress,
        );
        parsed.collection =
            coordinate_transform(&parsed.collection, in_crs, &options.out_crs, &bar)?;
        bar.finish_and_clear();
    }

    Ok(parsed)
}

/// Convertit un shapefile en éléments OSM-JSON
pub fn to_osm_json(path: &Path, options: &ConversionOptions) -> Result<OsmJson> {
    to_osm_json_with_stats(path, options).map(|(osm, _)| osm)
}

/// Comme [`to_osm_json`], avec les compteurs d'assemblage
pub fn to_osm_json_with_stats(
    path: &Path,
    options: &ConversionOptions,
) -> Result<(OsmJson, AssemblyStats)> {
    let parsed = load_features(path, options)?;

    let bar = create_progress_bar(
        parsed.collection.len(),
        "Conversion en OSM JSON",
        options.show_progress,
    );
    let assembly = assemble(
        &parsed.collection,
        parsed.id_field.as_deref(),
        options.lookup,
        &bar,
    );
    bar.finish_and_clear();

    let stats = assembly.stats;
    if stats.polygons + stats.multi_polygons > 0 {
        warn!(
            polygons = stats.polygons,
            multi_polygons = stats.multi_polygons,
            "Polygon geometries produce no OSM elements"
        );
    }
    info!(
        path = %path.display(),
        nodes = stats.nodes,
        ways = stats.ways,
        "OSM JSON built"
    );

    Ok((assembly.osm, stats))
}

/// Construit un graphe routable depuis un shapefile
pub fn build_graph(
    path: &Path,
    options: &ConversionOptions,
    graph: &GraphOptions,
) -> Result<RoutableGraph> {
    let osm = to_osm_json(path, options)?;

    let mut routable = RoutableGraph::from_osm_json(&osm, &graph.name, graph.retain_all);
    if graph.simplify {
        routable.simplify();
    }

    Ok(routable)
}

/// Construit une table géographique WGS84 depuis un shapefile.
///
/// Aucune standardisation des champs. `buffer_distance` (mètres) remplace
/// chaque géométrie par sa zone tampon, calculée en UTM.
pub fn build_table(
    path: &Path,
    in_crs: Option<&str>,
    name: &str,
    buffer_distance: Option<f64>,
) -> Result<GeoTable> {
    let options = ConversionOptions {
        in_crs: in_crs.map(str::to_string),
        ..ConversionOptions::default()
    };
    let parsed = load_features(path, &options)?;

    if parsed.collection.is_empty() {
        info!(name = name, "Empty shapefile, empty table");
        return Ok(GeoTable::empty(name));
    }

    let table = GeoTable::from_features(&parsed.collection, name, DEFAULT_OUT_CRS);
    match buffer_distance {
        Some(distance) => table
            .project_to_utm()?
            .buffer(distance)?
            .project_to_latlong(),
        None => Ok(table),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options() {
        let options = ConversionOptions::default();
        assert!(options.in_crs.is_none());
        assert_eq!(options.out_crs, "EPSG:4326");
        assert_eq!(options.lookup, LookupStrategy::Linear);

        let graph = GraphOptions::default();
        assert_eq!(graph.name, "unnamed");
        assert!(!graph.retain_all);
        assert!(graph.simplify);
    }

    #[test]
    fn test_missing_shapefile() {
        let options = ConversionOptions::default();
        assert!(to_osm_json(Path::new("/nonexistent/roads.shp"), &options).is_err());
        assert!(build_table(Path::new("/nonexistent/roads.shp"), None, "t", None).is_err());
    }
}
