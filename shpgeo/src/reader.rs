//! Lecture des fichiers .shp/.dbf et conversion vers les types du crate

use std::path::Path;

use geo::{Coord, LineString, MultiLineString, MultiPolygon, Polygon};
use shapefile::dbase::{self, FieldValue};
use shapefile::{PolygonRing, Shape};
use tracing::trace;

use crate::types::{AttrValue, Geometry};
use crate::ShpError;

/// Enregistrement brut : forme + attributs dBase
pub type RawRecord = (Shape, dbase::Record);

/// Lit les noms de champs depuis l'entête dBase, dans l'ordre du fichier
pub fn read_field_names(dbf_path: &Path) -> Result<Vec<String>, ShpError> {
    let reader = dbase::Reader::from_path(dbf_path).map_err(|e| ShpError::read(dbf_path, e))?;
    Ok(reader
        .fields()
        .iter()
        .map(|field| field.name().to_string())
        .collect())
}

/// Lit toutes les paires (forme, enregistrement) du shapefile
pub fn read_records(shp_path: &Path) -> Result<Vec<RawRecord>, ShpError> {
    let mut reader =
        shapefile::Reader::from_path(shp_path).map_err(|e| ShpError::read(shp_path, e))?;

    let records = reader
        .iter_shapes_and_records()
        .map(|result| result.map_err(|e| ShpError::read(shp_path, e)))
        .collect::<Result<Vec<_>, _>>()?;

    trace!(path = %shp_path.display(), count = records.len(), "Shape records read");
    Ok(records)
}

/// Accès (x, y) commun aux trois variantes de points shapefile
trait Xy {
    fn xy(&self) -> Coord;
}

impl Xy for shapefile::Point {
    fn xy(&self) -> Coord {
        Coord { x: self.x, y: self.y }
    }
}

impl Xy for shapefile::PointM {
    fn xy(&self) -> Coord {
        Coord { x: self.x, y: self.y }
    }
}

impl Xy for shapefile::PointZ {
    fn xy(&self) -> Coord {
        Coord { x: self.x, y: self.y }
    }
}

/// Convertit une forme shapefile en géométrie.
///
/// Une polyligne à une seule partie donne une LineString, sinon une
/// MultiLineString. Les anneaux de polygones sont regroupés : chaque anneau
/// extérieur ouvre un polygone, les anneaux intérieurs suivants y sont
/// rattachés. Un seul polygone donne un Polygon, sinon un MultiPolygon.
/// Les Z/M sont ignorés.
pub fn shape_to_geometry(shape: &Shape) -> Geometry {
    match shape {
        Shape::Point(p) => Geometry::Point(p.xy().into()),
        Shape::PointM(p) => Geometry::Point(p.xy().into()),
        Shape::PointZ(p) => Geometry::Point(p.xy().into()),
        Shape::Polyline(line) => lines_geometry(line.parts()),
        Shape::PolylineM(line) => lines_geometry(line.parts()),
        Shape::PolylineZ(line) => lines_geometry(line.parts()),
        Shape::Polygon(poly) => polygon_geometry(poly.rings()),
        Shape::PolygonM(poly) => polygon_geometry(poly.rings()),
        Shape::PolygonZ(poly) => polygon_geometry(poly.rings()),
        Shape::NullShape
        | Shape::Multipoint(_)
        | Shape::MultipointM(_)
        | Shape::MultipointZ(_)
        | Shape::Multipatch(_) => Geometry::Unknown,
    }
}

fn to_linestring<P: Xy>(points: &[P]) -> LineString {
    LineString::new(points.iter().map(Xy::xy).collect())
}

fn lines_geometry<P: Xy>(parts: &[Vec<P>]) -> Geometry {
    match parts {
        [single] => Geometry::LineString(to_linestring(single)),
        _ => Geometry::MultiLineString(MultiLineString::new(
            parts.iter().map(|part| to_linestring(part)).collect(),
        )),
    }
}

fn polygon_geometry<P: Xy>(rings: &[PolygonRing<P>]) -> Geometry {
    let mut polygons: Vec<(LineString, Vec<LineString>)> = Vec::new();

    for ring in rings {
        match ring {
            PolygonRing::Outer(points) => polygons.push((to_linestring(points), Vec::new())),
            PolygonRing::Inner(points) => match polygons.last_mut() {
                Some((_, interiors)) => interiors.push(to_linestring(points)),
                // Trou sans extérieur : on le traite comme un extérieur
                None => polygons.push((to_linestring(points), Vec::new())),
            },
        }
    }

    let mut polygons: Vec<Polygon> = polygons
        .into_iter()
        .map(|(exterior, interiors)| Polygon::new(exterior, interiors))
        .collect();

    if polygons.len() == 1 {
        Geometry::Polygon(polygons.remove(0))
    } else {
        Geometry::MultiPolygon(MultiPolygon::new(polygons))
    }
}

/// Convertit une valeur dBase en valeur d'attribut.
///
/// Les numériques sans partie décimale deviennent des entiers (les champs
/// `N` à zéro décimale sont lus en f64 par dBase). Les dates sont rendues
/// en texte ISO 8601.
pub fn field_value_to_attr(value: &FieldValue) -> AttrValue {
    match value {
        FieldValue::Character(Some(s)) => AttrValue::Text(s.clone()),
        FieldValue::Memo(s) => AttrValue::Text(s.clone()),
        FieldValue::Numeric(Some(n)) => numeric(*n),
        FieldValue::Float(Some(f)) => AttrValue::Float(f64::from(*f)),
        FieldValue::Double(d) => AttrValue::Float(*d),
        FieldValue::Currency(c) => AttrValue::Float(*c),
        FieldValue::Integer(i) => AttrValue::Int(i64::from(*i)),
        FieldValue::Logical(Some(b)) => AttrValue::Bool(*b),
        FieldValue::Date(Some(date)) => AttrValue::Text(iso_date(date)),
        FieldValue::DateTime(datetime) => {
            let time = datetime.time();
            AttrValue::Text(format!(
                "{}T{:02}:{:02}:{:02}",
                iso_date(&datetime.date()),
                time.hours(),
                time.minutes(),
                time.seconds()
            ))
        }
        FieldValue::Character(None)
        | FieldValue::Numeric(None)
        | FieldValue::Float(None)
        | FieldValue::Logical(None)
        | FieldValue::Date(None) => AttrValue::Null,
    }
}

fn iso_date(date: &dbase::Date) -> String {
    format!("{:04}-{:02}-{:02}", date.year(), date.month(), date.day())
}

fn numeric(n: f64) -> AttrValue {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < i64::MAX as f64 {
        AttrValue::Int(n as i64)
    } else {
        AttrValue::Float(n)
    }
}
