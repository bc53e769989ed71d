//! Types de données pour le crate shpgeo

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Nom canonique du champ identifiant OSM
pub const OSM_ID_FIELD: &str = "osm_id";

/// Attributs d'une feature (nom de champ -> valeur)
pub type Properties = BTreeMap<String, AttrValue>;

/// Valeur scalaire d'un attribut dBase
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttrValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl AttrValue {
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => Ok(()),
            Self::Bool(b) => write!(f, "{}", b),
            Self::Int(i) => write!(f, "{}", i),
            Self::Float(v) => write!(f, "{}", v),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for AttrValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<i64> for AttrValue {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

impl From<f64> for AttrValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<bool> for AttrValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

/// Géométrie d'une feature
///
/// Les types non gérés par la chaîne de conversion (MultiPoint, Multipatch,
/// NullShape...) sont représentés par `Unknown`, sans coordonnées.
#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    Point(geo::Point),
    LineString(geo::LineString),
    MultiLineString(geo::MultiLineString),
    Polygon(geo::Polygon),
    MultiPolygon(geo::MultiPolygon),
    Unknown,
}

impl Geometry {
    /// Nom du type au sens GeoJSON
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Point(_) => "Point",
            Self::LineString(_) => "LineString",
            Self::MultiLineString(_) => "MultiLineString",
            Self::Polygon(_) => "Polygon",
            Self::MultiPolygon(_) => "MultiPolygon",
            Self::Unknown => "Unknown",
        }
    }

    /// Conversion vers `geo::Geometry` (None pour `Unknown`)
    pub fn to_geo(&self) -> Option<geo::Geometry> {
        match self {
            Self::Point(p) => Some(geo::Geometry::Point(*p)),
            Self::LineString(ls) => Some(geo::Geometry::LineString(ls.clone())),
            Self::MultiLineString(mls) => Some(geo::Geometry::MultiLineString(mls.clone())),
            Self::Polygon(p) => Some(geo::Geometry::Polygon(p.clone())),
            Self::MultiPolygon(mp) => Some(geo::Geometry::MultiPolygon(mp.clone())),
            Self::Unknown => None,
        }
    }
}

/// Une feature : géométrie + attributs
#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    pub geometry: Geometry,
    pub properties: Properties,
}

impl Feature {
    pub fn new(geometry: Geometry, properties: Properties) -> Self {
        Self {
            geometry,
            properties,
        }
    }
}

/// Collection ordonnée de features (équivalent d'une FeatureCollection GeoJSON)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureCollection {
    pub features: Vec<Feature>,
}

impl FeatureCollection {
    pub fn new(features: Vec<Feature>) -> Self {
        Self { features }
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Feature> {
        self.features.iter()
    }
}

impl FromIterator<Feature> for FeatureCollection {
    fn from_iter<I: IntoIterator<Item = Feature>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// Résultat de la lecture d'un shapefile
#[derive(Debug)]
pub struct ParseResult {
    /// Features dans l'ordre des enregistrements
    pub collection: FeatureCollection,

    /// Noms de champs après standardisation, dans l'ordre du fichier
    pub field_names: Vec<String>,

    /// Champ identifiant détecté (`osm_id`), à transmettre à l'assemblage
    pub id_field: Option<String>,
}
