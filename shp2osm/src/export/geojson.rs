//! Export vers GeoJSON avec geozero (streaming)

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use geozero::geojson::GeoJsonWriter;
use geozero::GeozeroGeometry;
use shpgeo::{FeatureCollection, Properties};

use crate::reproject_lite::parse_epsg;
use crate::table::GeoTable;

/// Géométrie écrite pour une feature sans coordonnées
const UNKNOWN_GEOMETRY: &str = r#"{"type":"Unknown","coordinates":{}}"#;

/// Exporte une collection de features en GeoJSON
pub fn export_to_geojson(
    collection: &FeatureCollection,
    crs: &str,
    output_path: &Path,
) -> Result<()> {
    write_file(output_path, |writer| {
        write_feature_collection(
            writer,
            crs,
            collection
                .iter()
                .map(|f| (f.geometry.to_geo(), &f.properties)),
        )
    })
}

/// Exporte une table géographique en GeoJSON
pub fn export_table(table: &GeoTable, output_path: &Path) -> Result<()> {
    write_file(output_path, |writer| {
        write_feature_collection(
            writer,
            &table.crs,
            table
                .rows
                .iter()
                .map(|row| (row.geometry.clone(), &row.properties)),
        )
    })
}

fn write_file<F>(output_path: &Path, write: F) -> Result<()>
where
    F: FnOnce(&mut BufWriter<File>) -> Result<()>,
{
    let file = File::create(output_path)
        .context(format!("Failed to create file: {}", output_path.display()))?;
    let mut writer = BufWriter::new(file);
    write(&mut writer)?;
    writer.flush()?;
    Ok(())
}

/// Écrit une FeatureCollection, feature par feature
pub fn write_feature_collection<'a, W, I>(writer: &mut W, crs: &str, features: I) -> Result<()>
where
    W: Write,
    I: Iterator<Item = (Option<geo::Geometry>, &'a Properties)>,
{
    // Header FeatureCollection, CRS nommé si c'est un code EPSG
    write!(writer, r#"{{"type":"FeatureCollection","#)?;
    if let Some(epsg) = parse_epsg(crs) {
        write!(
            writer,
            r#""crs":{{"type":"name","properties":{{"name":"urn:ogc:def:crs:EPSG::{}"}}}},"#,
            epsg
        )?;
    }
    write!(writer, r#""features":["#)?;

    for (i, (geometry, properties)) in features.enumerate() {
        if i > 0 {
            write!(writer, ",")?;
        }
        write_feature(writer, i, geometry.as_ref(), properties)?;
    }

    // Footer
    write!(writer, "]}}")?;
    Ok(())
}

/// Écrit une feature en GeoJSON
fn write_feature<W: Write>(
    writer: &mut W,
    id: usize,
    geometry: Option<&geo::Geometry>,
    properties: &Properties,
) -> Result<()> {
    write!(writer, r#"{{"type":"Feature","id":{},"geometry":"#, id)?;

    match geometry {
        Some(geometry) => {
            let mut geom_buf = Vec::new();
            let mut geom_writer = GeoJsonWriter::new(&mut geom_buf);
            geometry.process_geom(&mut geom_writer)?;
            writer.write_all(&geom_buf)?;
        }
        None => writer.write_all(UNKNOWN_GEOMETRY.as_bytes())?,
    }

    write!(writer, r#","properties":"#)?;
    serde_json::to_writer(&mut *writer, properties).context("Failed to write properties")?;
    write!(writer, "}}")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::Point;
    use shpgeo::{AttrValue, Feature, Geometry};

    fn props(name: &str) -> Properties {
        [("name".to_string(), AttrValue::from(name))]
            .into_iter()
            .collect()
    }

    #[test]
    fn test_write_feature() {
        let mut buffer = Vec::new();
        let point = geo::Geometry::Point(Point::new(1.0, 2.0));
        write_feature(&mut buffer, 7, Some(&point), &props("say \"hi\"")).unwrap();

        let json: serde_json::Value = serde_json::from_slice(&buffer).unwrap();
        assert_eq!(json["type"], "Feature");
        assert_eq!(json["id"], 7);
        assert_eq!(json["geometry"]["type"], "Point");
        assert_eq!(json["properties"]["name"], "say \"hi\"");
    }

    #[test]
    fn test_unknown_geometry_literal() {
        let mut buffer = Vec::new();
        write_feature(&mut buffer, 0, None, &Properties::new()).unwrap();

        let json = String::from_utf8(buffer).unwrap();
        assert!(json.contains(r#""geometry":{"type":"Unknown","coordinates":{}}"#));
    }

    #[test]
    fn test_export_to_geojson() {
        let collection = FeatureCollection::new(vec![
            Feature::new(Geometry::Point(Point::new(5.0, 47.0)), props("Test")),
            Feature::new(Geometry::Unknown, props("Lost")),
        ]);

        let dir = tempfile::tempdir().unwrap();
        let output_path = dir.path().join("out.geojson");
        export_to_geojson(&collection, "EPSG:4326", &output_path).unwrap();

        let content = std::fs::read_to_string(&output_path).unwrap();
        assert!(content.contains("EPSG::4326"));

        let json: serde_json::Value = serde_json::from_str(&content).unwrap();
        assert_eq!(json["type"], "FeatureCollection");
        let features = json["features"].as_array().unwrap();
        assert_eq!(features.len(), 2);
        assert_eq!(features[0]["geometry"]["coordinates"], serde_json::json!([5.0, 47.0]));
        assert_eq!(features[1]["geometry"]["type"], "Unknown");
        assert_eq!(features[1]["properties"]["name"], "Lost");
    }

    #[test]
    fn test_crs_omitted_for_proj_string() {
        let mut buffer = Vec::new();
        write_feature_collection(&mut buffer, "+proj=longlat", std::iter::empty()).unwrap();
        let json: serde_json::Value = serde_json::from_slice(&buffer).unwrap();
        assert!(json.get("crs").is_none());
        assert_eq!(json["features"], serde_json::json!([]));
    }
}
