//! Standardisation des noms de champs
//!
//! Un shapefile issu d'un fournisseur de données routières nomme ses champs
//! à sa façon (`LINK_ID`, `DIRONSIGN`...). Le mapping `Standards` renomme ces
//! champs vers le schéma attendu par l'assemblage OSM (`osm_id`, `oneway`...).

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::ShpError;

/// Mapping nom brut -> nom canonique
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Standards(HashMap<String, String>);

impl Standards {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse un objet JSON `{"CHAMP_BRUT": "canonique", ...}`
    pub fn from_json_str(json: &str) -> Result<Self, ShpError> {
        serde_json::from_str(json).map_err(|e| ShpError::InvalidStandards(e.to_string()))
    }

    /// Ajoute (ou remplace) une correspondance
    pub fn insert(&mut self, raw: impl Into<String>, canonical: impl Into<String>) {
        self.0.insert(raw.into(), canonical.into());
    }

    /// Nom canonique d'un champ brut, s'il est mappé
    pub fn get(&self, raw: &str) -> Option<&str> {
        self.0.get(raw).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Standards {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// Renomme les champs présents dans le mapping, les autres sont conservés.
///
/// L'ordre et la longueur sont préservés : `output[i]` vaut soit
/// `standards[input[i]]`, soit `input[i]`.
pub fn to_standard<S: AsRef<str>>(field_names: &[S], standards: &Standards) -> Vec<String> {
    field_names
        .iter()
        .map(|name| {
            let name = name.as_ref();
            standards.get(name).unwrap_or(name).to_string()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_standard_link_id() {
        let standards: Standards = [("LINK_ID", "osm_id")].into_iter().collect();
        let fields = to_standard(&["LINK_ID", "NAME"], &standards);
        assert_eq!(fields, vec!["osm_id".to_string(), "NAME".to_string()]);
    }

    #[test]
    fn test_to_standard_preserves_length_and_order() {
        let standards: Standards = [("SUB_TYPE", "highway"), ("FUNC_CLASS", "highway")]
            .into_iter()
            .collect();
        let input = ["A", "SUB_TYPE", "B", "FUNC_CLASS", "A"];
        let output = to_standard(&input, &standards);

        assert_eq!(output.len(), input.len());
        for (raw, canonical) in input.iter().zip(&output) {
            match standards.get(raw) {
                Some(mapped) => assert_eq!(canonical, mapped),
                None => assert_eq!(canonical, raw),
            }
        }
    }

    #[test]
    fn test_to_standard_empty_mapping() {
        let output = to_standard(&["X", "Y"], &Standards::new());
        assert_eq!(output, vec!["X", "Y"]);
    }

    #[test]
    fn test_from_json_str() {
        let standards = Standards::from_json_str(r#"{"DIRONSIGN": "oneway"}"#).unwrap();
        assert_eq!(standards.get("DIRONSIGN"), Some("oneway"));
        assert_eq!(standards.len(), 1);

        assert!(matches!(
            Standards::from_json_str("[1, 2]"),
            Err(ShpError::InvalidStandards(_))
        ));
    }
}
