//! Reprojection d'une collection de features
//!
//! Point, LineString, MultiLineString et Polygon sont reprojetés. Tout autre
//! type (MultiPolygon compris) devient `Unknown`, sans coordonnées : ces
//! géométries sont perdues, les attributs restent copiés tels quels.

use anyhow::{Context, Result};
use geo::{LineString, MultiLineString, Polygon};
use indicatif::ProgressBar;
use shpgeo::{Feature, FeatureCollection, Geometry};
use tracing::{info, warn};

use crate::reproject_lite::SmartReprojector;

/// CRS cible par défaut (WGS84)
pub const DEFAULT_OUT_CRS: &str = "EPSG:4326";

/// Reprojette toutes les features de `in_crs` vers `out_crs`.
///
/// Échoue si l'un des deux CRS n'est pas résolu, aucune sortie partielle.
pub fn coordinate_transform(
    collection: &FeatureCollection,
    in_crs: &str,
    out_crs: &str,
    progress: &ProgressBar,
) -> Result<FeatureCollection> {
    let reprojector = SmartReprojector::new(in_crs, out_crs)
        .with_context(|| format!("Failed to build reprojector ({} → {})", in_crs, out_crs))?;

    info!(
        from = in_crs,
        to = out_crs,
        backend = reprojector.description(),
        features = collection.len(),
        "Reprojecting features"
    );

    let mut features = Vec::with_capacity(collection.len());
    let mut dropped = 0usize;
    for (index, feature) in collection.iter().enumerate() {
        progress.set_position(index as u64);

        let geometry = transform_geometry(&reprojector, &feature.geometry)
            .with_context(|| format!("Feature #{} could not be reprojected", index))?;
        if geometry == Geometry::Unknown {
            dropped += 1;
        }
        features.push(Feature::new(geometry, feature.properties.clone()));
    }
    progress.set_position(collection.len() as u64);

    if dropped > 0 {
        warn!(count = dropped, "Unsupported geometries replaced by Unknown");
    }

    Ok(FeatureCollection::new(features))
}

/// Reprojette une géométrie selon son type
pub fn transform_geometry(reprojector: &SmartReprojector, geometry: &Geometry) -> Result<Geometry> {
    let transformed = match geometry {
        Geometry::Point(p) => Geometry::Point(reprojector.transform_coord(p.0)?.into()),
        Geometry::LineString(ls) => Geometry::LineString(reprojector.transform_linestring(ls)?),
        Geometry::MultiLineString(mls) => {
            let lines = mls
                .iter()
                .map(|ls| reprojector.transform_linestring(ls))
                .collect::<Result<Vec<LineString>>>()?;
            Geometry::MultiLineString(MultiLineString::new(lines))
        }
        Geometry::Polygon(poly) => {
            let exterior = reprojector.transform_linestring(poly.exterior())?;
            let interiors = poly
                .interiors()
                .iter()
                .map(|ring| reprojector.transform_linestring(ring))
                .collect::<Result<Vec<LineString>>>()?;
            Geometry::Polygon(Polygon::new(exterior, interiors))
        }
        Geometry::MultiPolygon(_) | Geometry::Unknown => Geometry::Unknown,
    };
    Ok(transformed)
}
