//! Table géographique : une ligne par feature (géométrie + attributs)
//!
//! Sert à l'analyse tabulaire et au calcul de zones tampon. Les distances de
//! tampon sont en mètres, via un aller-retour en UTM.

use std::f64::consts::PI;

use anyhow::{bail, Context, Result};
use geo::{
    BooleanOps, Coord, CoordsIter, Geometry as GeoGeometry, LineString, MultiPolygon, Polygon,
};
use shpgeo::{FeatureCollection, Properties};
use tracing::{debug, info};

use crate::reproject_lite::{parse_epsg, ReprojectorLite, UtmZone};
use crate::transform::DEFAULT_OUT_CRS;

/// Nombre de segments d'un disque de tampon
const DISC_SEGMENTS: usize = 32;

/// Ligne de la table. `geometry` vaut `None` pour une géométrie inconnue.
#[derive(Debug, Clone, PartialEq)]
pub struct TableRow {
    pub geometry: Option<GeoGeometry>,
    pub properties: Properties,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GeoTable {
    pub name: String,
    pub crs: String,
    pub rows: Vec<TableRow>,
}

impl GeoTable {
    /// Table vide portant seulement son nom
    pub fn empty(name: &str) -> Self {
        Self {
            name: name.to_string(),
            crs: DEFAULT_OUT_CRS.to_string(),
            rows: Vec::new(),
        }
    }

    /// Construit la table depuis une collection déjà en `crs`
    pub fn from_features(collection: &FeatureCollection, name: &str, crs: &str) -> Self {
        let rows = collection
            .iter()
            .map(|feature| TableRow {
                geometry: feature.geometry.to_geo(),
                properties: feature.properties.clone(),
            })
            .collect();

        Self {
            name: name.to_string(),
            crs: crs.to_string(),
            rows,
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Longitude/latitude moyennes de toutes les coordonnées
    fn mean_lon_lat(&self) -> Option<(f64, f64)> {
        let (mut sum_x, mut sum_y, mut count) = (0.0, 0.0, 0usize);
        for geometry in self.rows.iter().filter_map(|r| r.geometry.as_ref()) {
            for c in geometry.coords_iter() {
                sum_x += c.x;
                sum_y += c.y;
                count += 1;
            }
        }
        (count > 0).then(|| (sum_x / count as f64, sum_y / count as f64))
    }

    fn reproject(&self, reprojector: &ReprojectorLite) -> Self {
        Self {
            name: self.name.clone(),
            crs: format!("EPSG:{}", reprojector.target_epsg()),
            rows: self
                .rows
                .iter()
                .map(|row| TableRow {
                    geometry: row
                        .geometry
                        .as_ref()
                        .map(|g| reprojector.transform_geometry(g)),
                    properties: row.properties.clone(),
                })
                .collect(),
        }
    }

    /// Projette une table WGS84 dans la zone UTM de son centre moyen
    pub fn project_to_utm(&self) -> Result<Self> {
        if parse_epsg(&self.crs) != Some(4326) {
            bail!("Table {} must be in EPSG:4326, got {}", self.name, self.crs);
        }
        let Some((lon, lat)) = self.mean_lon_lat() else {
            return Ok(self.clone());
        };

        let zone = UtmZone::from_lon_lat(lon, lat);
        debug!(zone = zone.zone, south = zone.south, "Projecting table to UTM");
        let reprojector = ReprojectorLite::new(4326, zone.epsg())?;
        Ok(self.reproject(&reprojector))
    }

    /// Reprojette la table en WGS84
    pub fn project_to_latlong(&self) -> Result<Self> {
        let epsg = parse_epsg(&self.crs)
            .with_context(|| format!("Unknown table CRS: {}", self.crs))?;
        if epsg == 4326 {
            return Ok(self.clone());
        }
        let reprojector = ReprojectorLite::new(epsg, 4326)?;
        Ok(self.reproject(&reprojector))
    }

    /// Remplace chaque géométrie par sa zone tampon de `distance` unités du CRS
    pub fn buffer(&self, distance: f64) -> Result<Self> {
        if !distance.is_finite() || distance < 0.0 {
            bail!("Invalid buffer distance: {}", distance);
        }
        if distance == 0.0 {
            return Ok(self.clone());
        }

        let rows = self
            .rows
            .iter()
            .map(|row| TableRow {
                geometry: row
                    .geometry
                    .as_ref()
                    .map(|g| GeoGeometry::MultiPolygon(buffer_geometry(g, distance))),
                properties: row.properties.clone(),
            })
            .collect();

        info!(name = %self.name, distance = distance, rows = self.len(), "Buffer computed");
        Ok(Self {
            name: self.name.clone(),
            crs: self.crs.clone(),
            rows,
        })
    }
}

/// Zone tampon d'une géométrie : union des disques aux sommets, des
/// rectangles le long des segments et des surfaces d'origine
pub fn buffer_geometry(geometry: &GeoGeometry, distance: f64) -> MultiPolygon {
    let mut parts: Vec<Polygon> = Vec::new();

    for line in boundary_lines(geometry) {
        for coord in line.coords() {
            parts.push(disc(*coord, distance));
        }
        for segment in line.lines() {
            if let Some(rect) = segment_rect(segment.start, segment.end, distance) {
                parts.push(rect);
            }
        }
    }
    if let GeoGeometry::Point(p) = geometry {
        parts.push(disc(p.0, distance));
    }
    if let GeoGeometry::MultiPoint(mp) = geometry {
        parts.extend(mp.iter().map(|p| disc(p.0, distance)));
    }
    match geometry {
        GeoGeometry::Polygon(poly) => parts.push(poly.clone()),
        GeoGeometry::MultiPolygon(mp) => parts.extend(mp.iter().cloned()),
        _ => {}
    }

    parts
        .into_iter()
        .fold(MultiPolygon::new(vec![]), |acc, part| {
            acc.union(&MultiPolygon::new(vec![part]))
        })
}

/// Lignes à épaissir : lignes et contours des surfaces
fn boundary_lines(geometry: &GeoGeometry) -> Vec<LineString> {
    match geometry {
        GeoGeometry::LineString(ls) => vec![ls.clone()],
        GeoGeometry::MultiLineString(mls) => mls.0.clone(),
        GeoGeometry::Polygon(poly) => rings(poly),
        GeoGeometry::MultiPolygon(mp) => mp.iter().flat_map(rings).collect(),
        GeoGeometry::GeometryCollection(gc) => gc.iter().flat_map(boundary_lines).collect(),
        _ => Vec::new(),
    }
}

fn rings(poly: &Polygon) -> Vec<LineString> {
    std::iter::once(poly.exterior().clone())
        .chain(poly.interiors().iter().cloned())
        .collect()
}

/// Disque approché par un polygone régulier
fn disc(center: Coord, radius: f64) -> Polygon {
    let ring: Vec<Coord> = (0..=DISC_SEGMENTS)
        .map(|i| {
            // Décalé d'un demi-segment : aucun sommet sur les bords des rectangles
            let angle = 2.0 * PI * ((i % DISC_SEGMENTS) as f64 + 0.5) / DISC_SEGMENTS as f64;
            Coord {
                x: center.x + radius * angle.cos(),
                y: center.y + radius * angle.sin(),
            }
        })
        .collect();
    Polygon::new(LineString::new(ring), vec![])
}

/// Rectangle de demi-largeur `distance` autour d'un segment
fn segment_rect(start: Coord, end: Coord, distance: f64) -> Option<Polygon> {
    let (dx, dy) = (end.x - start.x, end.y - start.y);
    let length = dx.hypot(dy);
    if length == 0.0 {
        return None;
    }
    let (nx, ny) = (-dy / length * distance, dx / length * distance);
    Some(Polygon::new(
        LineString::from(vec![
            (start.x + nx, start.y + ny),
            (end.x + nx, end.y + ny),
            (end.x - nx, end.y - ny),
            (start.x - nx, start.y - ny),
            (start.x + nx, start.y + ny),
        ]),
        vec![],
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{Area, Contains, Point};
    use shpgeo::{AttrValue, Feature, Geometry};

    fn point_table() -> GeoTable {
        let collection = FeatureCollection::new(vec![Feature::new(
            Geometry::Point(Point::new(77.6, 12.97)),
            [("name".to_string(), AttrValue::from("A"))]
                .into_iter()
                .collect(),
        )]);
        GeoTable::from_features(&collection, "points", "EPSG:4326")
    }

    #[test]
    fn test_from_features() {
        let collection = FeatureCollection::new(vec![
            Feature::new(Geometry::Point(Point::new(1.0, 2.0)), Properties::new()),
            Feature::new(Geometry::Unknown, Properties::new()),
        ]);
        let table = GeoTable::from_features(&collection, "t", "EPSG:4326");
        assert_eq!(table.len(), 2);
        assert!(table.rows[0].geometry.is_some());
        assert!(table.rows[1].geometry.is_none());
    }

    #[test]
    fn test_point_buffer_area() {
        let table = GeoTable::from_features(
            &FeatureCollection::new(vec![Feature::new(
                Geometry::Point(Point::new(500000.0, 1000000.0)),
                Properties::new(),
            )]),
            "p",
            "EPSG:32643",
        );
        let buffered = table.buffer(10.0).unwrap();

        let Some(GeoGeometry::MultiPolygon(mp)) = &buffered.rows[0].geometry else {
            panic!("Expected MultiPolygon");
        };
        let expected = PI * 100.0;
        let area = mp.unsigned_area();
        assert!((area - expected).abs() / expected < 0.02, "area={}", area);
        assert!(mp.contains(&Point::new(500000.0, 1000000.0)));
    }

    #[test]
    fn test_line_buffer_contains_line() {
        let line = GeoGeometry::LineString(LineString::from(vec![(0.0, 0.0), (100.0, 0.0)]));
        let buffered = buffer_geometry(&line, 5.0);

        assert!(buffered.contains(&Point::new(50.0, 4.0)));
        assert!(buffered.contains(&Point::new(102.0, 0.0)));
        assert!(!buffered.contains(&Point::new(50.0, 6.0)));
        // Rectangle 100x10 plus deux demi-disques
        let expected = 1000.0 + PI * 25.0;
        assert!((buffered.unsigned_area() - expected).abs() / expected < 0.02);
    }

    #[test]
    fn test_invalid_distance() {
        assert!(point_table().buffer(-1.0).is_err());
        assert!(point_table().buffer(f64::NAN).is_err());
        assert_eq!(point_table().buffer(0.0).unwrap(), point_table());
    }

    #[test]
    fn test_utm_roundtrip() {
        let table = point_table();
        let utm = table.project_to_utm().unwrap();
        assert_eq!(utm.crs, "EPSG:32643");

        let back = utm.project_to_latlong().unwrap();
        assert_eq!(back.crs, "EPSG:4326");
        let Some(GeoGeometry::Point(p)) = &back.rows[0].geometry else {
            panic!("Expected Point");
        };
        assert!((p.x() - 77.6).abs() < 1e-5);
        assert!((p.y() - 12.97).abs() < 1e-5);
    }

    #[test]
    fn test_project_to_utm_requires_wgs84() {
        let mut table = point_table();
        table.crs = "EPSG:3857".to_string();
        assert!(table.project_to_utm().is_err());
    }

    #[test]
    fn test_empty_table() {
        let table = GeoTable::empty("nothing");
        assert!(table.is_empty());
        assert_eq!(table.project_to_utm().unwrap(), table);
    }
}
