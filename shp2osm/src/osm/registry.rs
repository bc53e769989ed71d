//! Registre de nodes dédupliqués par coordonnées exactes
//!
//! Deux points sont le même node si et seulement si leurs longitudes et
//! latitudes sont égales en égalité flottante stricte (aucune tolérance).
//! La recherche par défaut est un parcours linéaire ; `LookupStrategy::Hashed`
//! donne exactement les mêmes résultats via une table indexée sur les
//! coordonnées.

use std::collections::HashMap;

use geo::Coord;
use shpgeo::Properties;

use super::{ElementId, Node, Way};

/// Vrai si un node existe exactement à ces coordonnées (parcours linéaire)
pub fn node_exists(point: Coord, nodes: &[Node]) -> bool {
    nodes.iter().any(|n| n.lon == point.x && n.lat == point.y)
}

/// Identifiant du premier node aux coordonnées exactes (parcours linéaire)
pub fn find_node(point: Coord, nodes: &[Node]) -> Option<&ElementId> {
    nodes
        .iter()
        .find(|n| n.lon == point.x && n.lat == point.y)
        .map(|n| &n.id)
}

pub fn new_node(id: ElementId, point: Coord, tags: Properties) -> Node {
    Node {
        id,
        lon: point.x,
        lat: point.y,
        tags,
    }
}

pub fn new_way(id: ElementId, nodes: Vec<ElementId>, tags: Properties) -> Way {
    Way { id, nodes, tags }
}

/// Stratégie de recherche des nodes existants
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LookupStrategy {
    #[default]
    Linear,
    Hashed,
}

/// Index interne du registre
enum NodeLookup {
    Linear,
    /// (bits lon, bits lat) -> position du premier node
    Hashed(HashMap<(u64, u64), usize>),
}

/// Clé exacte d'une coordonnée : `-0.0` est ramené à `0.0` (égaux en f64),
/// NaN n'a pas de clé (jamais égal à lui-même)
fn exact_key(point: Coord) -> Option<(u64, u64)> {
    fn bits(v: f64) -> Option<u64> {
        if v.is_nan() {
            None
        } else if v == 0.0 {
            Some(0.0_f64.to_bits())
        } else {
            Some(v.to_bits())
        }
    }
    Some((bits(point.x)?, bits(point.y)?))
}

/// Collection de nodes d'une conversion, dans l'ordre de création
pub struct NodeRegistry {
    nodes: Vec<Node>,
    lookup: NodeLookup,
}

impl NodeRegistry {
    pub fn new(strategy: LookupStrategy) -> Self {
        let lookup = match strategy {
            LookupStrategy::Linear => NodeLookup::Linear,
            LookupStrategy::Hashed => NodeLookup::Hashed(HashMap::new()),
        };
        Self {
            nodes: Vec::new(),
            lookup,
        }
    }

    pub fn exists(&self, point: Coord) -> bool {
        match &self.lookup {
            NodeLookup::Linear => node_exists(point, &self.nodes),
            NodeLookup::Hashed(index) => {
                exact_key(point).map_or(false, |key| index.contains_key(&key))
            }
        }
    }

    pub fn find(&self, point: Coord) -> Option<&ElementId> {
        match &self.lookup {
            NodeLookup::Linear => find_node(point, &self.nodes),
            NodeLookup::Hashed(index) => exact_key(point)
                .and_then(|key| index.get(&key))
                .map(|&pos| &self.nodes[pos].id),
        }
    }

    /// Ajoute un node. L'appelant vérifie `exists` au préalable.
    pub fn insert(&mut self, node: Node) {
        if let NodeLookup::Hashed(index) = &mut self.lookup {
            let point = Coord {
                x: node.lon,
                y: node.lat,
            };
            if let Some(key) = exact_key(point) {
                index.entry(key).or_insert(self.nodes.len());
            }
        }
        self.nodes.push(node);
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn into_nodes(self) -> Vec<Node> {
        self.nodes
    }
}
