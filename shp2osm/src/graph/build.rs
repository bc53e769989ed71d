//! Construction du graphe depuis OSM-JSON

use std::collections::{BTreeMap, HashMap, HashSet};

use geo::{HaversineDistance, Point};
use petgraph::unionfind::UnionFind;
use shpgeo::{AttrValue, Properties};
use tracing::{debug, info, warn};

use super::{EdgeKeys, GraphEdge, GraphNode, RoutableGraph};
use crate::osm::{ElementId, OsmJson, Way};

/// Sens de circulation d'un way
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Direction {
    Both,
    Forward,
    Reverse,
}

impl Direction {
    /// Interprète la valeur du tag `oneway`
    pub(super) fn from_tags(tags: &Properties) -> Self {
        match tags.get("oneway") {
            Some(AttrValue::Bool(true)) => Self::Forward,
            Some(AttrValue::Int(1)) => Self::Forward,
            Some(AttrValue::Int(-1)) => Self::Reverse,
            Some(AttrValue::Text(s)) => match s.trim().to_lowercase().as_str() {
                "yes" | "true" | "1" => Self::Forward,
                "-1" | "reverse" => Self::Reverse,
                _ => Self::Both,
            },
            _ => Self::Both,
        }
    }
}

impl RoutableGraph {
    /// Construit le graphe depuis des éléments OSM-JSON.
    ///
    /// Chaque node devient un sommet. Sauf `retain_all`, seule la plus grande
    /// composante faiblement connexe est conservée.
    pub fn from_osm_json(osm: &OsmJson, name: &str, retain_all: bool) -> Self {
        let mut graph = Self::empty(name);

        for node in osm.nodes() {
            graph.nodes.insert(
                node.id.clone(),
                GraphNode {
                    id: node.id.clone(),
                    x: node.lon,
                    y: node.lat,
                    tags: node.tags.clone(),
                },
            );
        }

        let mut keys = EdgeKeys::default();
        let mut skipped = 0usize;
        for way in osm.ways() {
            let direction = Direction::from_tags(&way.tags);
            for pair in way.nodes.windows(2) {
                let (u, v) = (&pair[0], &pair[1]);
                let Some(length) = graph.haversine(u, v) else {
                    skipped += 1;
                    continue;
                };

                match direction {
                    Direction::Forward => graph.add_edge(&mut keys, u, v, way, true, length),
                    Direction::Reverse => graph.add_edge(&mut keys, v, u, way, true, length),
                    Direction::Both => {
                        graph.add_edge(&mut keys, u, v, way, false, length);
                        graph.add_edge(&mut keys, v, u, way, false, length);
                    }
                }
            }
        }

        if skipped > 0 {
            warn!(count = skipped, "Way segments referencing unknown nodes skipped");
        }

        info!(
            name = name,
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            "Graph created"
        );

        if !retain_all {
            graph.retain_largest_component();
        }

        graph
    }

    fn add_edge(
        &mut self,
        keys: &mut EdgeKeys,
        u: &ElementId,
        v: &ElementId,
        way: &Way,
        oneway: bool,
        length: f64,
    ) {
        self.edges.push(GraphEdge {
            u: u.clone(),
            v: v.clone(),
            key: keys.next(u, v),
            osmid: vec![way.id.clone()],
            oneway,
            length,
            tags: way.tags.clone(),
            geometry: None,
        });
    }

    /// Distance en mètres entre deux nodes du graphe
    fn haversine(&self, u: &ElementId, v: &ElementId) -> Option<f64> {
        let a = self.nodes.get(u)?;
        let b = self.nodes.get(v)?;
        Some(Point::new(a.x, a.y).haversine_distance(&Point::new(b.x, b.y)))
    }

    /// Ne garde que la plus grande composante faiblement connexe
    pub fn retain_largest_component(&mut self) {
        if self.nodes.is_empty() {
            return;
        }

        let index: HashMap<&ElementId, usize> =
            self.nodes.keys().enumerate().map(|(i, id)| (id, i)).collect();
        let mut components = UnionFind::<usize>::new(index.len());
        for edge in &self.edges {
            if let (Some(&a), Some(&b)) = (index.get(&edge.u), index.get(&edge.v)) {
                components.union(a, b);
            }
        }

        let labels = components.into_labeling();

        // Taille par racine, égalité départagée par l'ordre des nodes
        let mut sizes: BTreeMap<usize, usize> = BTreeMap::new();
        let mut first_seen: Vec<usize> = Vec::new();
        for &root in &labels {
            let size = sizes.entry(root).or_insert(0);
            if *size == 0 {
                first_seen.push(root);
            }
            *size += 1;
        }
        let Some(largest) = first_seen.iter().rev().max_by_key(|root| sizes[*root]) else {
            return;
        };

        let keep: HashSet<ElementId> = index
            .iter()
            .filter(|(_, i)| labels[**i] == *largest)
            .map(|(id, _)| (**id).clone())
            .collect();

        let before = self.node_count();
        self.nodes.retain(|id, _| keep.contains(id));
        self.edges
            .retain(|e| keep.contains(&e.u) && keep.contains(&e.v));

        debug!(
            components = first_seen.len(),
            removed = before - self.node_count(),
            "Largest weakly connected component retained"
        );
    }
}
