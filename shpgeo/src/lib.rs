//! # shpgeo
//!
//! Lecture de shapefiles (.shp + .dbf) en collections de features typées,
//! au format GeoJSON, avec standardisation des noms de champs.
//!
//! ## Features
//!
//! - Géométries `geo` (Point, LineString, MultiLineString, Polygon, MultiPolygon)
//! - Standardisation des champs via un mapping (`LINK_ID` -> `osm_id`...)
//! - Détection du champ identifiant `osm_id`, retournée explicitement
//!
//! ## Usage
//!
//! ```rust,ignore
//! use shpgeo::{parse, Standards};
//! use std::path::Path;
//!
//! let standards = Standards::from_json_str(r#"{"LINK_ID": "osm_id"}"#)?;
//! let result = parse(Path::new("roads.shp"), Some(&standards))?;
//! println!("{} features, id field: {:?}", result.collection.len(), result.id_field);
//! ```

pub mod error;
pub mod reader;
pub mod standard;
pub mod types;

pub use error::ShpError;
pub use standard::{to_standard, Standards};
pub use types::{
    AttrValue, Feature, FeatureCollection, Geometry, ParseResult, Properties, OSM_ID_FIELD,
};

use std::path::{Path, PathBuf};

use tracing::{debug, info};

/// Détecte le champ identifiant parmi les noms standardisés
pub fn detect_id_field<S: AsRef<str>>(field_names: &[S]) -> Option<String> {
    field_names
        .iter()
        .any(|name| name.as_ref() == OSM_ID_FIELD)
        .then(|| OSM_ID_FIELD.to_string())
}

/// Lit un shapefile et retourne ses features.
///
/// # Arguments
///
/// * `path` - Chemin du shapefile (avec ou sans extension `.shp`)
/// * `standards` - Mapping optionnel des noms de champs bruts vers les noms canoniques
///
/// # Returns
///
/// Un `ParseResult` contenant la collection (dans l'ordre des enregistrements),
/// les noms de champs standardisés et le champ identifiant détecté.
///
/// # Errors
///
/// Retourne `ShpError` si le .shp ou le .dbf est absent ou illisible.
pub fn parse(path: &Path, standards: Option<&Standards>) -> Result<ParseResult, ShpError> {
    let shp_path = companion(path, "shp")?;
    let dbf_path = companion(path, "dbf")?;

    // 1. Noms de champs bruts puis standardisés
    let raw_names = reader::read_field_names(&dbf_path)?;
    let field_names = match standards {
        Some(standards) => to_standard(&raw_names, standards),
        None => raw_names.clone(),
    };
    let id_field = detect_id_field(&field_names);

    // 2. Formes + enregistrements
    let records = reader::read_records(&shp_path)?;

    // 3. Construction des features
    // Si deux champs bruts donnent le même nom canonique, le dernier l'emporte
    let features: FeatureCollection = records
        .into_iter()
        .map(|(shape, record)| {
            let mut properties = Properties::new();
            for (raw, name) in raw_names.iter().zip(&field_names) {
                let value = record
                    .get(raw)
                    .map(reader::field_value_to_attr)
                    .unwrap_or(AttrValue::Null);
                properties.insert(name.clone(), value);
            }
            Feature::new(reader::shape_to_geometry(&shape), properties)
        })
        .collect();

    debug!(fields = ?field_names, "Field names after standardization");
    info!(
        path = %shp_path.display(),
        features = features.len(),
        id_field = ?id_field,
        "Shapefile parsed"
    );

    Ok(ParseResult {
        collection: features,
        field_names,
        id_field,
    })
}

/// Chemin d'un fichier compagnon (.shp, .dbf), vérifié
fn companion(path: &Path, extension: &str) -> Result<PathBuf, ShpError> {
    let candidate = path.with_extension(extension);
    if candidate.exists() {
        Ok(candidate)
    } else {
        Err(ShpError::MissingFile(candidate.display().to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_id_field() {
        assert_eq!(
            detect_id_field(&["osm_id", "name"]),
            Some("osm_id".to_string())
        );
        assert_eq!(detect_id_field(&["LINK_ID", "name"]), None);
        assert_eq!(detect_id_field::<&str>(&[]), None);
    }

    #[test]
    fn test_parse_missing_file() {
        let result = parse(Path::new("/nonexistent/roads.shp"), None);
        assert!(matches!(result, Err(ShpError::MissingFile(_))));
    }
}
