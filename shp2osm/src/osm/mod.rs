//! Éléments OSM-JSON (nodes, ways) et assemblage depuis les features

pub mod assemble;
pub mod registry;

pub use assemble::{assemble, Assembly, AssemblyStats};
pub use registry::{LookupStrategy, NodeRegistry};

use std::fmt;

use serde::{Deserialize, Serialize};
use shpgeo::{AttrValue, Properties};

/// Identifiant d'un node ou d'un way : compteur séquentiel ou valeur externe
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ElementId {
    Int(i64),
    Text(String),
}

impl ElementId {
    /// Identifiant tiré d'une valeur d'attribut.
    ///
    /// Les flottants entiers (champs numériques dBase) deviennent des entiers,
    /// toute autre valeur est prise sous sa forme texte.
    pub fn from_attr(value: &AttrValue) -> Self {
        match value {
            AttrValue::Int(i) => Self::Int(*i),
            AttrValue::Float(f) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => {
                Self::Int(*f as i64)
            }
            other => Self::Text(other.to_string()),
        }
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(i) => write!(f, "{}", i),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for ElementId {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

impl From<&str> for ElementId {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

/// Node OSM : un point unique du graphe
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: ElementId,
    pub lon: f64,
    pub lat: f64,
    pub tags: Properties,
}

/// Way OSM : suite ordonnée de références de nodes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Way {
    pub id: ElementId,
    pub nodes: Vec<ElementId>,
    pub tags: Properties,
}

/// Élément OSM-JSON, sérialisé avec `"type": "node" | "way"`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Element {
    Node(Node),
    Way(Way),
}

/// Collection d'éléments : tous les nodes puis tous les ways
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OsmJson {
    pub elements: Vec<Element>,
}

impl OsmJson {
    /// Concatène nodes et ways dans cet ordre
    pub fn new(nodes: Vec<Node>, ways: Vec<Way>) -> Self {
        let elements = nodes
            .into_iter()
            .map(Element::Node)
            .chain(ways.into_iter().map(Element::Way))
            .collect();
        Self { elements }
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.elements.iter().filter_map(|e| match e {
            Element::Node(n) => Some(n),
            Element::Way(_) => None,
        })
    }

    pub fn ways(&self) -> impl Iterator<Item = &Way> {
        self.elements.iter().filter_map(|e| match e {
            Element::Way(w) => Some(w),
            Element::Node(_) => None,
        })
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
}
