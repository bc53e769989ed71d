//! Assemblage des éléments OSM depuis une collection de features
//!
//! Un compteur unique, partagé par tous les types de géométrie, fournit les
//! identifiants séquentiels (à partir de 0) quand aucun champ identifiant
//! n'est configuré, ainsi que les identifiants des sommets de lignes.
//!
//! Comportements conservés tels quels :
//! - un point en doublon garde les tags du premier node créé, ceux de la
//!   feature sont ignorés (pas de fusion) ;
//! - Polygon et MultiPolygon ne produisent aucun élément ;
//! - l'indice d'une sous-ligne de MultiLineString est retrouvé par valeur,
//!   deux sous-lignes identiques partagent donc le premier indice.

use geo::{Coord, LineString, MultiLineString, Point};
use indicatif::ProgressBar;
use serde::Serialize;
use shpgeo::{AttrValue, FeatureCollection, Geometry, Properties};
use tracing::{debug, trace};

use super::registry::{new_node, new_way, LookupStrategy, NodeRegistry};
use super::{ElementId, OsmJson, Way};

/// Compteurs de l'assemblage
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AssemblyStats {
    pub points: usize,
    pub line_strings: usize,
    pub multi_line_strings: usize,
    pub polygons: usize,
    pub multi_polygons: usize,
    pub unknown: usize,
    pub duplicate_points: usize,
    pub nodes: usize,
    pub ways: usize,
}

/// Résultat de l'assemblage
#[derive(Debug, Clone)]
pub struct Assembly {
    pub osm: OsmJson,
    pub stats: AssemblyStats,
}

/// Convertit une collection de features en éléments OSM.
///
/// `id_field` est le champ identifiant détecté au parsing : sa valeur sert
/// d'identifiant aux points et aux ways. `progress` avance d'un cran par
/// feature traitée, doublons et polygones compris.
pub fn assemble(
    collection: &FeatureCollection,
    id_field: Option<&str>,
    lookup: LookupStrategy,
    progress: &ProgressBar,
) -> Assembly {
    let mut assembler = Assembler::new(id_field, lookup);

    for feature in collection.iter() {
        let properties = normalize_tags(&feature.properties);
        match &feature.geometry {
            Geometry::Point(point) => assembler.add_point(*point, properties),
            Geometry::LineString(line) => assembler.add_line(line, properties),
            Geometry::MultiLineString(lines) => assembler.add_multi_line(lines, &properties),
            Geometry::Polygon(_) => assembler.stats.polygons += 1,
            Geometry::MultiPolygon(_) => assembler.stats.multi_polygons += 1,
            Geometry::Unknown => assembler.stats.unknown += 1,
        }
        progress.inc(1);
    }

    let assembly = assembler.finish();
    debug!(stats = ?assembly.stats, "OSM elements assembled");
    assembly
}

/// Normalise la valeur `oneway` : entier -> texte, texte -> minuscules
pub fn normalize_tags(properties: &Properties) -> Properties {
    let mut tags = properties.clone();
    if let Some(oneway) = tags.get_mut("oneway") {
        match oneway {
            AttrValue::Int(i) => *oneway = AttrValue::Text(i.to_string()),
            AttrValue::Text(s) => *s = s.to_lowercase(),
            _ => {}
        }
    }
    tags
}

struct Assembler<'a> {
    id_field: Option<&'a str>,
    counter: i64,
    registry: NodeRegistry,
    ways: Vec<Way>,
    stats: AssemblyStats,
}

impl<'a> Assembler<'a> {
    fn new(id_field: Option<&'a str>, lookup: LookupStrategy) -> Self {
        Self {
            id_field,
            counter: 0,
            registry: NodeRegistry::new(lookup),
            ways: Vec::new(),
            stats: AssemblyStats::default(),
        }
    }

    fn next_id(&mut self) -> ElementId {
        let id = ElementId::Int(self.counter);
        self.counter += 1;
        id
    }

    /// Valeur du champ identifiant de la feature, si configuré et renseigné
    fn id_value<'p>(&self, properties: &'p Properties) -> Option<&'p AttrValue> {
        self.id_field
            .and_then(|field| properties.get(field))
            .filter(|value| !value.is_null())
    }

    /// Identifiant d'une feature : champ identifiant ou compteur
    fn feature_id(&mut self, properties: &Properties) -> ElementId {
        match self.id_value(properties) {
            Some(value) => ElementId::from_attr(value),
            None => self.next_id(),
        }
    }

    fn add_point(&mut self, point: Point, properties: Properties) {
        self.stats.points += 1;
        let coord = point.0;

        // L'identifiant est consommé même si le point existe déjà
        let id = self.feature_id(&properties);
        if !self.registry.exists(coord) {
            self.registry.insert(new_node(id, coord, properties));
        } else {
            self.stats.duplicate_points += 1;
            trace!(lon = coord.x, lat = coord.y, "Duplicate point, tags discarded");
        }
    }

    /// Node de chaque sommet, créé sans tags s'il n'existe pas
    fn vertex_ids(&mut self, line: &LineString) -> Vec<ElementId> {
        line.coords()
            .map(|&coord: &Coord| match self.registry.find(coord) {
                Some(id) => id.clone(),
                None => {
                    let id = self.next_id();
                    self.registry
                        .insert(new_node(id.clone(), coord, Properties::new()));
                    id
                }
            })
            .collect()
    }

    fn add_line(&mut self, line: &LineString, properties: Properties) {
        self.stats.line_strings += 1;
        let nodes = self.vertex_ids(line);
        let id = self.feature_id(&properties);
        self.ways.push(new_way(id, nodes, properties));
    }

    fn add_multi_line(&mut self, lines: &MultiLineString, properties: &Properties) {
        self.stats.multi_line_strings += 1;
        let base = self.id_value(properties).map(|v| ElementId::from_attr(v).to_string());

        for (position, line) in lines.iter().enumerate() {
            let nodes = self.vertex_ids(line);
            let id = match &base {
                Some(base) => {
                    let index = lines
                        .iter()
                        .position(|other| other == line)
                        .unwrap_or(position);
                    ElementId::Text(format!("{}{}", base, index))
                }
                None => self.next_id(),
            };
            self.ways.push(new_way(id, nodes, properties.clone()));
        }
    }

    fn finish(self) -> Assembly {
        let mut stats = self.stats;
        stats.nodes = self.registry.node_count();
        stats.ways = self.ways.len();
        Assembly {
            osm: OsmJson::new(self.registry.into_nodes(), self.ways),
            stats,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::osm::Element;
    use indicatif::ProgressDrawTarget;
    use shpgeo::Feature;

    fn props(pairs: &[(&str, AttrValue)]) -> Properties {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    fn point(x: f64, y: f64, p: Properties) -> Feature {
        Feature::new(Geometry::Point(Point::new(x, y)), p)
    }

    fn line(coords: Vec<(f64, f64)>, p: Properties) -> Feature {
        Feature::new(Geometry::LineString(LineString::from(coords)), p)
    }

    fn run(features: Vec<Feature>, id_field: Option<&str>) -> Assembly {
        assemble(
            &FeatureCollection::new(features),
            id_field,
            LookupStrategy::Linear,
            &ProgressBar::hidden(),
        )
    }

    #[test]
    fn test_duplicate_points_keep_first_tags() {
        let assembly = run(
            vec![
                point(10.0, 20.0, props(&[("name", "first".into())])),
                point(10.0, 20.0, props(&[("name", "second".into())])),
            ],
            None,
        );

        assert_eq!(assembly.osm.len(), 1);
        let node = assembly.osm.nodes().next().unwrap();
        assert_eq!(node.id, ElementId::Int(0));
        assert_eq!(node.tags.get("name"), Some(&AttrValue::from("first")));
        assert_eq!(assembly.stats.duplicate_points, 1);
    }

    #[test]
    fn test_distinct_points_create_distinct_nodes() {
        let assembly = run(
            vec![
                point(10.0, 20.0, Properties::new()),
                point(10.0, 20.0 + f64::EPSILON * 16.0, Properties::new()),
            ],
            None,
        );
        assert_eq!(assembly.osm.nodes().count(), 2);
    }

    #[test]
    fn test_linestring_nodes_and_way() {
        let tags = props(&[("name", "Main St".into())]);
        let assembly = run(
            vec![line(vec![(0.0, 0.0), (1.0, 0.0), (2.0, 0.0)], tags.clone())],
            None,
        );

        let nodes: Vec<_> = assembly.osm.nodes().collect();
        assert_eq!(nodes.len(), 3);
        for (i, node) in nodes.iter().enumerate() {
            assert_eq!(node.id, ElementId::Int(i as i64));
            assert!(node.tags.is_empty());
        }

        let ways: Vec<_> = assembly.osm.ways().collect();
        assert_eq!(ways.len(), 1);
        assert_eq!(
            ways[0].nodes,
            vec![ElementId::Int(0), ElementId::Int(1), ElementId::Int(2)]
        );
        assert_eq!(ways[0].id, ElementId::Int(3));
        assert_eq!(ways[0].tags, tags);
    }

    #[test]
    fn test_shared_vertices_are_reused() {
        let assembly = run(
            vec![
                line(vec![(0.0, 0.0), (1.0, 0.0)], Properties::new()),
                line(vec![(1.0, 0.0), (2.0, 0.0)], Properties::new()),
            ],
            None,
        );
        // nodes 0,1 ; way 2 ; node 3 ; way 4
        let ways: Vec<_> = assembly.osm.ways().collect();
        assert_eq!(assembly.osm.nodes().count(), 3);
        assert_eq!(ways[1].nodes, vec![ElementId::Int(1), ElementId::Int(3)]);
        assert_eq!(ways[1].id, ElementId::Int(4));
    }

    #[test]
    fn test_multilinestring_composite_ids() {
        let mls = MultiLineString::new(vec![
            LineString::from(vec![(0.0, 0.0), (1.0, 0.0)]),
            LineString::from(vec![(5.0, 5.0), (6.0, 5.0)]),
        ]);
        let feature = Feature::new(
            Geometry::MultiLineString(mls),
            props(&[("osm_id", "R1".into())]),
        );
        let assembly = run(vec![feature], Some("osm_id"));

        let ids: Vec<_> = assembly.osm.ways().map(|w| w.id.clone()).collect();
        assert_eq!(ids, vec![ElementId::from("R10"), ElementId::from("R11")]);
        assert_eq!(assembly.osm.nodes().count(), 4);
    }

    #[test]
    fn test_multilinestring_identical_parts_share_index() {
        let part = LineString::from(vec![(0.0, 0.0), (1.0, 0.0)]);
        let mls = MultiLineString::new(vec![part.clone(), part]);
        let feature = Feature::new(
            Geometry::MultiLineString(mls),
            props(&[("osm_id", AttrValue::Int(7))]),
        );
        let assembly = run(vec![feature], Some("osm_id"));

        let ids: Vec<_> = assembly.osm.ways().map(|w| w.id.clone()).collect();
        assert_eq!(ids, vec![ElementId::from("70"), ElementId::from("70")]);
    }

    #[test]
    fn test_multilinestring_without_id_field() {
        let mls = MultiLineString::new(vec![
            LineString::from(vec![(0.0, 0.0), (1.0, 0.0)]),
            LineString::from(vec![(1.0, 0.0), (2.0, 0.0)]),
        ]);
        let assembly = run(
            vec![Feature::new(Geometry::MultiLineString(mls), Properties::new())],
            None,
        );
        // nodes 0,1 ; way 2 ; node 3 ; way 4
        let ids: Vec<_> = assembly.osm.ways().map(|w| w.id.clone()).collect();
        assert_eq!(ids, vec![ElementId::Int(2), ElementId::Int(4)]);
    }

    #[test]
    fn test_point_id_from_field() {
        let assembly = run(
            vec![point(1.0, 1.0, props(&[("osm_id", AttrValue::Int(99))]))],
            Some("osm_id"),
        );
        assert_eq!(assembly.osm.nodes().next().unwrap().id, ElementId::Int(99));
    }

    #[test]
    fn test_missing_id_value_falls_back_to_counter() {
        let assembly = run(
            vec![point(1.0, 1.0, props(&[("osm_id", AttrValue::Null)]))],
            Some("osm_id"),
        );
        assert_eq!(assembly.osm.nodes().next().unwrap().id, ElementId::Int(0));
    }

    #[test]
    fn test_polygons_produce_nothing() {
        let poly = geo::Polygon::new(
            LineString::from(vec![(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 0.0)]),
            vec![],
        );
        let assembly = run(
            vec![
                Feature::new(Geometry::Polygon(poly.clone()), Properties::new()),
                Feature::new(
                    Geometry::MultiPolygon(geo::MultiPolygon::new(vec![poly])),
                    Properties::new(),
                ),
            ],
            None,
        );
        assert!(assembly.osm.is_empty());
        assert_eq!(assembly.stats.polygons, 1);
        assert_eq!(assembly.stats.multi_polygons, 1);
    }

    #[test]
    fn test_nodes_precede_ways() {
        let assembly = run(
            vec![
                line(vec![(0.0, 0.0), (1.0, 0.0)], Properties::new()),
                point(5.0, 5.0, Properties::new()),
                line(vec![(1.0, 0.0), (1.0, 1.0)], Properties::new()),
            ],
            None,
        );
        let n = assembly.stats.nodes;
        let m = assembly.stats.ways;
        assert_eq!(assembly.osm.len(), n + m);
        assert!(assembly.osm.elements[..n]
            .iter()
            .all(|e| matches!(e, Element::Node(_))));
        assert!(assembly.osm.elements[n..]
            .iter()
            .all(|e| matches!(e, Element::Way(_))));
    }

    #[test]
    fn test_hashed_lookup_matches_linear() {
        let features = vec![
            line(vec![(0.0, 0.0), (1.0, 0.0), (2.0, 0.0)], Properties::new()),
            point(1.0, 0.0, props(&[("name", "x".into())])),
            line(vec![(2.0, 0.0), (0.0, 0.0)], Properties::new()),
        ];
        let collection = FeatureCollection::new(features);
        let linear = assemble(
            &collection,
            None,
            LookupStrategy::Linear,
            &ProgressBar::hidden(),
        );
        let hashed = assemble(
            &collection,
            None,
            LookupStrategy::Hashed,
            &ProgressBar::hidden(),
        );
        assert_eq!(linear.osm, hashed.osm);
    }

    #[test]
    fn test_oneway_normalization() {
        let tags = normalize_tags(&props(&[("oneway", "YES".into())]));
        assert_eq!(tags.get("oneway"), Some(&AttrValue::from("yes")));

        let tags = normalize_tags(&props(&[("oneway", AttrValue::Int(1))]));
        assert_eq!(tags.get("oneway"), Some(&AttrValue::from("1")));
    }

    #[test]
    fn test_progress_advances_on_identical_features() {
        let features: Vec<Feature> = (0..5)
            .map(|_| point(10.0, 20.0, props(&[("name", "same".into())])))
            .chain((0..3).map(|_| line(vec![(0.0, 0.0), (1.0, 0.0)], Properties::new())))
            .collect();
        let total = features.len() as u64;
        let progress = ProgressBar::with_draw_target(Some(total), ProgressDrawTarget::hidden());

        let collection = FeatureCollection::new(features);
        let first = FeatureCollection::new(collection.features[..1].to_vec());
        assemble(&first, None, LookupStrategy::Linear, &progress);
        assert_eq!(progress.position(), 1);

        progress.set_position(0);
        let assembly = assemble(&collection, None, LookupStrategy::Hashed, &progress);
        assert_eq!(progress.position(), total);
        assert_eq!(assembly.stats.duplicate_points, 4);
    }

    #[test]
    fn test_empty_collection() {
        let assembly = run(vec![], None);
        assert!(assembly.osm.is_empty());
    }
}
