//! Point d'entrée CLI pour shp2osm

use anyhow::Result;
use clap::Parser;
use tracing::{info, Level};
use tracing_subscriber::{fmt, EnvFilter};

mod cli;

use cli::Commands;

/// Convertir des shapefiles en OSM-JSON, GeoJSON, graphe routable ou table
#[derive(Parser)]
#[command(name = "shp2osm")]
#[command(author, version)]
#[command(about = "Convertir des shapefiles routiers en OSM-JSON et graphes routables")]
#[command(long_about = concat!(
    "Convertit un shapefile (ou un dossier de shapefiles) en éléments OSM-JSON.\n\n",
    "Les points identiques deviennent des nodes partagés ; les lignes deviennent des ways."
))]
struct Cli {
    /// Augmenter la verbosité (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Mode silencieux
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Configurer le logging
    init_logging(cli.verbose, cli.quiet);
    let show_progress = !cli.quiet;

    match cli.command {
        Commands::OsmJson {
            path,
            output,
            crs,
            standards,
            hashed_lookup,
        } => {
            info!(path = %path.display(), output = %output.display(), "Export vers OSM JSON");
            let options = crs.conversion_options(&standards, hashed_lookup, show_progress)?;
            cli::cmd_osm_json(&path, &output, &options)?;
        }
        Commands::Geojson {
            path,
            output,
            crs,
            standards,
        } => {
            info!(path = %path.display(), output = %output.display(), "Export vers GeoJSON");
            let options = crs.conversion_options(&standards, false, show_progress)?;
            cli::cmd_geojson(&path, &output, &options)?;
        }
        Commands::Graph {
            path,
            output,
            in_crs,
            standards,
            name,
            retain_all,
            no_simplify,
        } => {
            info!(path = %path.display(), output = %output.display(), "Construction du graphe");
            let options = shp2osm::ConversionOptions {
                in_crs,
                standards: shp2osm::config::resolve(&standards)?,
                show_progress,
                ..Default::default()
            };
            let graph = shp2osm::GraphOptions {
                name,
                retain_all,
                simplify: !no_simplify,
            };
            cli::cmd_graph(&path, &output, &options, &graph)?;
        }
        Commands::Table {
            path,
            output,
            in_crs,
            name,
            buffer,
        } => {
            info!(path = %path.display(), output = %output.display(), "Export de la table");
            cli::cmd_table(&path, &output, in_crs.as_deref(), &name, buffer)?;
        }
    }

    Ok(())
}

fn init_logging(verbose: u8, quiet: bool) {
    let level = match (quiet, verbose) {
        (true, _) => Level::WARN,
        (_, 0) => Level::INFO,
        (_, 1) => Level::DEBUG,
        (_, _) => Level::TRACE,
    };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr)
        .init();
}
