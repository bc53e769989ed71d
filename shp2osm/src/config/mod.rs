//! Configuration de la standardisation des champs
//!
//! Un mapping se choisit par une seule chaîne : nom de preset embarqué
//! (`default`, `geofabrik`), `none`, ou chemin vers un fichier JSON.

use std::path::Path;

use anyhow::{Context, Result};
use shpgeo::Standards;

/// Presets disponibles
pub const PRESETS: &[&str] = &["default", "geofabrik"];

/// Mapping par défaut pour les variantes de noms de champs connues
pub fn default_standard() -> Standards {
    // Le preset embarqué est testé ci-dessous
    from_preset("default").unwrap_or_default()
}

/// Charge un mapping depuis un fichier JSON
pub fn load(path: &Path) -> Result<Standards> {
    let content = std::fs::read_to_string(path)
        .context(format!("Failed to read standards file: {}", path.display()))?;

    Standards::from_json_str(&content)
        .context(format!("Failed to parse standards JSON: {}", path.display()))
}

/// Charge un mapping depuis un preset embarqué
pub fn from_preset(preset: &str) -> Result<Standards> {
    match preset {
        "default" => load_embedded(include_str!("presets/default.json")),
        "geofabrik" => load_embedded(include_str!("presets/geofabrik.json")),
        _ => anyhow::bail!("Unknown preset: {}. Use: {}", preset, PRESETS.join(", ")),
    }
}

fn load_embedded(json: &str) -> Result<Standards> {
    Standards::from_json_str(json).context("Failed to parse embedded standards")
}

/// Résout une spécification CLI : preset, `none` ou fichier
pub fn resolve(source: &str) -> Result<Option<Standards>> {
    if source.eq_ignore_ascii_case("none") {
        return Ok(None);
    }
    if PRESETS.contains(&source) {
        return from_preset(source).map(Some);
    }
    load(Path::new(source)).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_preset() {
        let standards = from_preset("default").unwrap();
        assert_eq!(standards.len(), 5);
        assert_eq!(standards.get("LINK_ID"), Some("osm_id"));
        assert_eq!(standards.get("DIRONSIGN"), Some("oneway"));
        assert_eq!(standards.get("FUNC_CLASS"), Some("highway"));
        assert_eq!(default_standard(), standards);
    }

    #[test]
    fn test_all_presets_parse() {
        for preset in PRESETS {
            assert!(from_preset(preset).is_ok(), "preset {}", preset);
        }
        assert!(from_preset("unknown").is_err());
    }

    #[test]
    fn test_resolve() {
        assert!(resolve("none").unwrap().is_none());
        assert!(resolve("default").unwrap().is_some());

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("standards.json");
        std::fs::write(&path, r#"{"ROAD_ID": "osm_id"}"#).unwrap();
        let standards = resolve(path.to_str().unwrap()).unwrap().unwrap();
        assert_eq!(standards.get("ROAD_ID"), Some("osm_id"));

        assert!(resolve("/nonexistent/standards.json").is_err());
    }
}
