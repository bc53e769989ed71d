//! Définition et implémentation des commandes CLI
//!
//! - `osm-json` : shapefile → OSM-JSON
//! - `geojson` : shapefile → GeoJSON (après standardisation/reprojection)
//! - `graph` : shapefile → graphe routable (JSON)
//! - `table` : shapefile → table WGS84, avec tampon optionnel (GeoJSON)
//!
//! `--path` peut désigner un dossier : chaque shapefile est alors converti en
//! parallèle dans le dossier `--output`.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use rayon::prelude::*;
use tracing::{info, warn};

use shp2osm::export::geojson::{export_table, export_to_geojson};
use shp2osm::export::osm_json::export_to_osm_json;
use shp2osm::osm::LookupStrategy;
use shp2osm::pipeline::{self, ConversionOptions, GraphOptions};
use shp2osm::transform::DEFAULT_OUT_CRS;

#[derive(Subcommand)]
pub enum Commands {
    /// Convert a shapefile to OSM JSON (nodes then ways)
    OsmJson {
        /// Path to a .shp file or a directory of shapefiles
        #[arg(short, long)]
        path: PathBuf,

        /// Output file (or directory when --path is a directory)
        #[arg(short, long)]
        output: PathBuf,

        #[command(flatten)]
        crs: CrsArgs,

        /// Field standards: preset name (default/geofabrik), "none" or a JSON file
        #[arg(long, default_value = "none")]
        standards: String,

        /// Index nodes by exact coordinates instead of scanning (large inputs)
        #[arg(long)]
        hashed_lookup: bool,
    },

    /// Export a shapefile to GeoJSON
    Geojson {
        /// Path to a .shp file or a directory of shapefiles
        #[arg(short, long)]
        path: PathBuf,

        /// Output file (or directory when --path is a directory)
        #[arg(short, long)]
        output: PathBuf,

        #[command(flatten)]
        crs: CrsArgs,

        /// Field standards: preset name (default/geofabrik), "none" or a JSON file
        #[arg(long, default_value = "none")]
        standards: String,
    },

    /// Build a routable graph and write it as JSON
    Graph {
        /// Path to a .shp file or a directory of shapefiles
        #[arg(short, long)]
        path: PathBuf,

        /// Output file (or directory when --path is a directory)
        #[arg(short, long)]
        output: PathBuf,

        /// Source CRS (e.g. EPSG:32643). Coordinates are reprojected to WGS84.
        #[arg(long)]
        in_crs: Option<String>,

        /// Field standards: preset name (default/geofabrik), "none" or a JSON file
        #[arg(long, default_value = "none")]
        standards: String,

        /// Graph name
        #[arg(long, default_value = "unnamed")]
        name: String,

        /// Keep every connected component, not only the largest
        #[arg(long)]
        retain_all: bool,

        /// Keep interior nodes (no topology simplification)
        #[arg(long)]
        no_simplify: bool,
    },

    /// Export a shapefile as a WGS84 table (GeoJSON), optionally buffered
    Table {
        /// Path to a .shp file or a directory of shapefiles
        #[arg(short, long)]
        path: PathBuf,

        /// Output file (or directory when --path is a directory)
        #[arg(short, long)]
        output: PathBuf,

        /// Source CRS (e.g. EPSG:32643)
        #[arg(long)]
        in_crs: Option<String>,

        /// Table name
        #[arg(long, default_value = "unnamed")]
        name: String,

        /// Buffer distance in metres
        #[arg(long)]
        buffer: Option<f64>,
    },
}

/// Systèmes de coordonnées d'entrée et de sortie
#[derive(Args, Debug, Clone)]
pub struct CrsArgs {
    /// Source CRS (e.g. EPSG:32643). Without it, coordinates are kept as-is.
    #[arg(long)]
    pub in_crs: Option<String>,

    /// Target CRS, used only with --in-crs
    #[arg(long, default_value = DEFAULT_OUT_CRS)]
    pub out_crs: String,
}

impl CrsArgs {
    /// Options de conversion complètes (standards résolus)
    pub fn conversion_options(
        &self,
        standards: &str,
        hashed_lookup: bool,
        show_progress: bool,
    ) -> Result<ConversionOptions> {
        Ok(ConversionOptions {
            in_crs: self.in_crs.clone(),
            out_crs: self.out_crs.clone(),
            standards: shp2osm::config::resolve(standards)?,
            lookup: if hashed_lookup {
                LookupStrategy::Hashed
            } else {
                LookupStrategy::Linear
            },
            show_progress,
        })
    }
}

/// Exécute la commande osm-json
pub fn cmd_osm_json(path: &Path, output: &Path, options: &ConversionOptions) -> Result<()> {
    let options = batch_options(path, options);
    run(path, output, "json", |shp, out| {
        let (osm, stats) = pipeline::to_osm_json_with_stats(shp, &options)?;
        export_to_osm_json(&osm, out)?;
        info!(
            output = %out.display(),
            nodes = stats.nodes,
            ways = stats.ways,
            duplicates = stats.duplicate_points,
            "OSM JSON written"
        );
        Ok(osm.len())
    })
}

/// Exécute la commande geojson
pub fn cmd_geojson(path: &Path, output: &Path, options: &ConversionOptions) -> Result<()> {
    let options = batch_options(path, options);
    let crs = options.in_crs.as_ref().map(|_| options.out_crs.clone()).unwrap_or_default();
    run(path, output, "geojson", |shp, out| {
        let parsed = pipeline::load_features(shp, &options)?;
        export_to_geojson(&parsed.collection, &crs, out)?;
        Ok(parsed.collection.len())
    })
}

/// Exécute la commande graph
pub fn cmd_graph(
    path: &Path,
    output: &Path,
    options: &ConversionOptions,
    graph: &GraphOptions,
) -> Result<()> {
    let options = batch_options(path, options);
    run(path, output, "json", |shp, out| {
        let routable = pipeline::build_graph(shp, &options, graph)?;
        routable.write_json(out)?;
        info!(
            output = %out.display(),
            nodes = routable.node_count(),
            edges = routable.edge_count(),
            "Graph written"
        );
        Ok(routable.edge_count())
    })
}

/// Exécute la commande table
pub fn cmd_table(
    path: &Path,
    output: &Path,
    in_crs: Option<&str>,
    name: &str,
    buffer: Option<f64>,
) -> Result<()> {
    run(path, output, "geojson", |shp, out| {
        let table = pipeline::build_table(shp, in_crs, name, buffer)?;
        export_table(&table, out)?;
        Ok(table.len())
    })
}

/// Pas de barres de progression concurrentes en mode dossier
fn batch_options(path: &Path, options: &ConversionOptions) -> ConversionOptions {
    let mut options = options.clone();
    options.show_progress &= !path.is_dir();
    options
}

/// Applique `convert` à un shapefile, ou à tous ceux d'un dossier en parallèle.
///
/// `convert` retourne le nombre d'éléments écrits.
fn run<F>(path: &Path, output: &Path, extension: &str, convert: F) -> Result<()>
where
    F: Fn(&Path, &Path) -> Result<usize> + Sync,
{
    if !path.is_dir() {
        if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let count = convert(path, output)
            .with_context(|| format!("Failed to convert {}", path.display()))?;
        println!("Export complete: {} elements to {}", count, output.display());
        return Ok(());
    }

    let shapefiles = collect_shapefiles(path)?;
    if shapefiles.is_empty() {
        anyhow::bail!("No shapefiles found in {}", path.display());
    }
    std::fs::create_dir_all(output)?;

    info!("Found {} shapefiles to convert", shapefiles.len());

    let success_count = AtomicUsize::new(0);
    let error_count = AtomicUsize::new(0);
    let element_count = AtomicUsize::new(0);

    shapefiles.par_iter().for_each(|shp| {
        let out = output_path_for(shp, output, extension);
        match convert(shp, &out) {
            Ok(count) => {
                success_count.fetch_add(1, Ordering::Relaxed);
                element_count.fetch_add(count, Ordering::Relaxed);
            }
            Err(e) => {
                warn!("Failed to convert {}: {:#}", shp.display(), e);
                error_count.fetch_add(1, Ordering::Relaxed);
            }
        }
    });

    let errors = error_count.load(Ordering::Relaxed);
    println!(
        "Export complete: {}/{} shapefiles, {} elements",
        success_count.load(Ordering::Relaxed),
        shapefiles.len(),
        element_count.load(Ordering::Relaxed)
    );

    if errors > 0 {
        warn!("{} shapefiles failed", errors);
    }

    Ok(())
}

/// Fichier de sortie d'un shapefile en mode dossier
fn output_path_for(shp: &Path, output: &Path, extension: &str) -> PathBuf {
    let stem = shp
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("unknown");
    output.join(format!("{}.{}", stem, extension))
}

/// Collecte récursivement les fichiers .shp (ordre stable)
fn collect_shapefiles(path: &Path) -> Result<Vec<PathBuf>> {
    let mut shapefiles = Vec::new();

    if path.is_file() {
        if is_shapefile(path) {
            shapefiles.push(path.to_path_buf());
        }
        return Ok(shapefiles);
    }

    for entry in std::fs::read_dir(path)? {
        let entry_path = entry?.path();

        if entry_path.is_dir() {
            shapefiles.extend(collect_shapefiles(&entry_path)?);
        } else if is_shapefile(&entry_path) {
            shapefiles.push(entry_path);
        }
    }

    shapefiles.sort();
    Ok(shapefiles)
}

fn is_shapefile(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("shp"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct TestCli {
        #[command(subcommand)]
        command: Commands,
    }

    #[test]
    fn test_parse_osm_json_args() {
        let cli = TestCli::try_parse_from([
            "shp2osm",
            "osm-json",
            "--path",
            "roads.shp",
            "--output",
            "roads.json",
            "--in-crs",
            "EPSG:32643",
            "--hashed-lookup",
        ])
        .unwrap();

        let Commands::OsmJson {
            crs,
            standards,
            hashed_lookup,
            ..
        } = cli.command
        else {
            panic!("Expected osm-json");
        };
        assert_eq!(crs.in_crs.as_deref(), Some("EPSG:32643"));
        assert_eq!(crs.out_crs, "EPSG:4326");
        assert_eq!(standards, "none");

        let options = crs.conversion_options(&standards, hashed_lookup, false).unwrap();
        assert_eq!(options.lookup, LookupStrategy::Hashed);
        assert!(options.standards.is_none());
    }

    #[test]
    fn test_parse_graph_args() {
        let cli = TestCli::try_parse_from([
            "shp2osm",
            "graph",
            "-p",
            "roads.shp",
            "-o",
            "graph.json",
            "--retain-all",
            "--no-simplify",
            "--name",
            "city",
        ])
        .unwrap();

        let Commands::Graph {
            name,
            retain_all,
            no_simplify,
            ..
        } = cli.command
        else {
            panic!("Expected graph");
        };
        assert_eq!(name, "city");
        assert!(retain_all);
        assert!(no_simplify);
    }

    #[test]
    fn test_invalid_standards() {
        let crs = CrsArgs {
            in_crs: None,
            out_crs: DEFAULT_OUT_CRS.to_string(),
        };
        assert!(crs.conversion_options("/nonexistent.json", false, false).is_err());
        assert!(crs.conversion_options("default", false, false).unwrap().standards.is_some());
    }

    #[test]
    fn test_collect_shapefiles() {
        let dir = tempfile::tempdir().unwrap();
        let sub = dir.path().join("sub");
        std::fs::create_dir(&sub).unwrap();
        for name in ["b.shp", "a.SHP", "a.dbf", "notes.txt"] {
            std::fs::write(dir.path().join(name), b"").unwrap();
        }
        std::fs::write(sub.join("c.shp"), b"").unwrap();

        let found = collect_shapefiles(dir.path()).unwrap();
        let names: Vec<_> = found
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap().to_string())
            .collect();
        assert_eq!(found.len(), 3);
        assert!(names.contains(&"a.SHP".to_string()));
        assert!(names.contains(&"b.shp".to_string()));
        assert!(names.contains(&"c.shp".to_string()));
    }

    #[test]
    fn test_output_path_for() {
        assert_eq!(
            output_path_for(Path::new("/data/roads.shp"), Path::new("/out"), "json"),
            PathBuf::from("/out/roads.json")
        );
    }

    #[test]
    fn test_batch_options_hide_progress() {
        let dir = tempfile::tempdir().unwrap();
        let options = ConversionOptions {
            show_progress: true,
            ..Default::default()
        };
        assert!(!batch_options(dir.path(), &options).show_progress);
        assert!(batch_options(Path::new("roads.shp"), &options).show_progress);
    }
}
