//! Simplification de la topologie du graphe
//!
//! Les nodes intermédiaires d'une chaîne (deux voisins distincts, degré 2 ou
//! 4, un seul way) disparaissent : chaque chaîne devient une arête unique
//! dont la géométrie garde les coordonnées traversées.

use std::collections::{HashMap, HashSet};

use tracing::{info, warn};

use super::{EdgeKeys, GraphEdge, RoutableGraph};
use crate::osm::ElementId;

type Adjacency<'a> = HashMap<&'a ElementId, Vec<usize>>;

impl RoutableGraph {
    /// Fusionne les chaînes de nodes intermédiaires en arêtes uniques
    pub fn simplify(&mut self) {
        if self.simplified {
            warn!(name = %self.name, "Graph already simplified");
            return;
        }

        let before = (self.node_count(), self.edge_count());

        let (merged, interior) = {
            let (outgoing, incoming) = self.adjacency();
            let endpoints: HashSet<&ElementId> = self
                .nodes
                .keys()
                .filter(|id| self.is_endpoint(id, &outgoing, &incoming))
                .collect();

            let mut merged = Vec::new();
            let mut interior: HashSet<ElementId> = HashSet::new();
            for endpoint in self.nodes.keys().filter(|id| endpoints.contains(id)) {
                for &start in outgoing.get(endpoint).map(Vec::as_slice).unwrap_or(&[]) {
                    if endpoints.contains(&self.edges[start].v) {
                        continue;
                    }
                    let Some(path) = self.walk(start, &endpoints, &outgoing) else {
                        continue;
                    };
                    for &i in &path[..path.len() - 1] {
                        interior.insert(self.edges[i].v.clone());
                    }
                    merged.push(self.merge(&path));
                }
            }
            (merged, interior)
        };

        self.edges
            .retain(|e| !interior.contains(&e.u) && !interior.contains(&e.v));
        let mut keys = EdgeKeys::from_edges(&self.edges);
        for mut edge in merged {
            edge.key = keys.next(&edge.u, &edge.v);
            self.edges.push(edge);
        }
        self.nodes.retain(|id, _| !interior.contains(id));
        self.simplified = true;

        info!(
            nodes_before = before.0,
            nodes_after = self.node_count(),
            edges_before = before.1,
            edges_after = self.edge_count(),
            "Graph simplified"
        );
    }

    /// Un node est une extrémité s'il ne peut pas être absorbé dans une chaîne
    fn is_endpoint(&self, id: &ElementId, outgoing: &Adjacency, incoming: &Adjacency) -> bool {
        let out = outgoing.get(id).map(Vec::as_slice).unwrap_or(&[]);
        let inc = incoming.get(id).map(Vec::as_slice).unwrap_or(&[]);

        let neighbours: HashSet<&ElementId> = out
            .iter()
            .map(|&i| &self.edges[i].v)
            .chain(inc.iter().map(|&i| &self.edges[i].u))
            .collect();

        // Boucle sur lui-même
        if neighbours.contains(id) {
            return true;
        }
        // Puits ou source
        if out.is_empty() || inc.is_empty() {
            return true;
        }
        let degree = out.len() + inc.len();
        if !(neighbours.len() == 2 && (degree == 2 || degree == 4)) {
            return true;
        }

        let ways: HashSet<&ElementId> = out
            .iter()
            .chain(inc)
            .flat_map(|&i| self.edges[i].osmid.iter())
            .collect();
        ways.len() > 1
    }

    /// Suit une chaîne depuis l'arête `start` jusqu'à la prochaine extrémité.
    ///
    /// Retourne les index des arêtes parcourues, `None` si la chaîne
    /// s'interrompt sur un node intermédiaire.
    fn walk(
        &self,
        start: usize,
        endpoints: &HashSet<&ElementId>,
        outgoing: &Adjacency,
    ) -> Option<Vec<usize>> {
        let origin = &self.edges[start].u;
        let mut current = &self.edges[start].v;
        let mut visited: HashSet<&ElementId> = [origin, current].into_iter().collect();
        let mut path = vec![start];

        while !endpoints.contains(current) {
            let out = outgoing.get(current).map(Vec::as_slice).unwrap_or(&[]);
            let next = out
                .iter()
                .copied()
                .find(|&i| !visited.contains(&self.edges[i].v))
                .or_else(|| out.iter().copied().find(|&i| &self.edges[i].v == origin))?;

            path.push(next);
            current = &self.edges[next].v;
            if !visited.insert(current) {
                break;
            }
        }

        Some(path)
    }

    /// Construit l'arête résultant d'une chaîne
    fn merge(&self, path: &[usize]) -> GraphEdge {
        let first = &self.edges[path[0]];
        let last = &self.edges[path[path.len() - 1]];

        let mut osmid: Vec<ElementId> = Vec::new();
        for &i in path {
            for id in &self.edges[i].osmid {
                if !osmid.contains(id) {
                    osmid.push(id.clone());
                }
            }
        }

        let geometry = std::iter::once(&first.u)
            .chain(path.iter().map(|&i| &self.edges[i].v))
            .filter_map(|id| self.nodes.get(id))
            .map(|n| [n.x, n.y])
            .collect();

        GraphEdge {
            u: first.u.clone(),
            v: last.v.clone(),
            key: 0,
            osmid,
            oneway: first.oneway,
            length: path.iter().map(|&i| self.edges[i].length).sum(),
            tags: first.tags.clone(),
            geometry: Some(geometry),
        }
    }
}
