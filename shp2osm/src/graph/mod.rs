//! Graphe routable construit depuis les éléments OSM-JSON
//!
//! Multigraphe orienté : chaque paire de nodes consécutifs d'un way donne une
//! arête (deux si le way est à double sens). Plusieurs arêtes peuvent relier
//! les mêmes nodes, distinguées par leur `key`.

mod build;
mod simplify;

use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;
use shpgeo::Properties;

use crate::osm::ElementId;

/// Sommet du graphe
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphNode {
    pub id: ElementId,
    /// Longitude
    pub x: f64,
    /// Latitude
    pub y: f64,
    pub tags: Properties,
}

/// Arête orientée
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphEdge {
    pub u: ElementId,
    pub v: ElementId,
    /// Rang parmi les arêtes parallèles u -> v
    pub key: usize,
    /// Ways d'origine (plusieurs après simplification)
    pub osmid: Vec<ElementId>,
    pub oneway: bool,
    /// Longueur en mètres
    pub length: f64,
    pub tags: Properties,
    /// Coordonnées traversées, renseignées par la simplification
    #[serde(skip_serializing_if = "Option::is_none")]
    pub geometry: Option<Vec<[f64; 2]>>,
}

/// Multigraphe orienté routable
#[derive(Debug, Clone)]
pub struct RoutableGraph {
    name: String,
    crs: String,
    simplified: bool,
    nodes: BTreeMap<ElementId, GraphNode>,
    edges: Vec<GraphEdge>,
}

/// Compteur des clés d'arêtes parallèles par couple (u, v)
#[derive(Debug, Default)]
struct EdgeKeys(HashMap<(ElementId, ElementId), usize>);

impl EdgeKeys {
    /// Compteurs repris d'arêtes existantes
    fn from_edges(edges: &[GraphEdge]) -> Self {
        let mut keys = Self::default();
        for edge in edges {
            let next = keys.0.entry((edge.u.clone(), edge.v.clone())).or_insert(0);
            *next = (*next).max(edge.key + 1);
        }
        keys
    }

    /// Prochaine clé libre pour une arête u -> v
    fn next(&mut self, u: &ElementId, v: &ElementId) -> usize {
        let next = self.0.entry((u.clone(), v.clone())).or_insert(0);
        let key = *next;
        *next += 1;
        key
    }
}

/// Vue sérialisable du graphe
#[derive(Serialize)]
struct GraphJson<'a> {
    name: &'a str,
    crs: &'a str,
    simplified: bool,
    nodes: Vec<&'a GraphNode>,
    edges: &'a [GraphEdge],
}

impl RoutableGraph {
    fn empty(name: &str) -> Self {
        Self {
            name: name.to_string(),
            crs: crate::transform::DEFAULT_OUT_CRS.to_string(),
            simplified: false,
            nodes: BTreeMap::new(),
            edges: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn crs(&self) -> &str {
        &self.crs
    }

    pub fn is_simplified(&self) -> bool {
        self.simplified
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn node(&self, id: &ElementId) -> Option<&GraphNode> {
        self.nodes.get(id)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &GraphNode> {
        self.nodes.values()
    }

    pub fn edges(&self) -> &[GraphEdge] {
        &self.edges
    }

    /// Index des arêtes entrantes et sortantes par node
    fn adjacency(&self) -> (HashMap<&ElementId, Vec<usize>>, HashMap<&ElementId, Vec<usize>>) {
        let mut outgoing: HashMap<&ElementId, Vec<usize>> = HashMap::new();
        let mut incoming: HashMap<&ElementId, Vec<usize>> = HashMap::new();
        for (i, edge) in self.edges.iter().enumerate() {
            outgoing.entry(&edge.u).or_default().push(i);
            incoming.entry(&edge.v).or_default().push(i);
        }
        (outgoing, incoming)
    }

    /// Sérialise le graphe en JSON (`nodes`, `edges`)
    pub fn to_json(&self) -> serde_json::Value {
        let view = GraphJson {
            name: &self.name,
            crs: &self.crs,
            simplified: self.simplified,
            nodes: self.nodes.values().collect(),
            edges: &self.edges,
        };
        // Tous les champs sont sérialisables en JSON (clés texte)
        serde_json::to_value(view).unwrap_or(serde_json::Value::Null)
    }

    /// Écrit le graphe dans un fichier JSON
    pub fn write_json(&self, output_path: &Path) -> Result<()> {
        let file = File::create(output_path)
            .context(format!("Failed to create file: {}", output_path.display()))?;
        serde_json::to_writer(BufWriter::new(file), &self.to_json())
            .context("Failed to write graph JSON")?;
        Ok(())
    }
}
