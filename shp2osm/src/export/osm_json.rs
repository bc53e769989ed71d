//! Export OSM-JSON

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};

use crate::osm::OsmJson;

/// Écrit les éléments OSM-JSON dans un fichier
pub fn export_to_osm_json(osm: &OsmJson, output_path: &Path) -> Result<()> {
    let file = File::create(output_path)
        .context(format!("Failed to create file: {}", output_path.display()))?;
    let mut writer = BufWriter::new(file);

    write_osm_json(&mut writer, osm)?;
    writer.flush()?;

    Ok(())
}

/// Sérialise `{"elements": [...]}` dans un writer
pub fn write_osm_json<W: Write>(writer: &mut W, osm: &OsmJson) -> Result<()> {
    serde_json::to_writer(writer, osm).context("Failed to serialize OSM-JSON")
}
