//! Reprojection légère en Rust pur (sans dépendances externes)
//!
//! Systèmes supportés, en source comme en cible :
//! - WGS84 (EPSG:4326)
//! - Web Mercator (EPSG:3857)
//! - UTM WGS84 nord (EPSG:32601-32660) et sud (EPSG:32701-32760)

mod mercator;
mod smart;
mod utm;

pub use smart::SmartReprojector;
pub use utm::UtmZone;

use std::sync::OnceLock;

use anyhow::{bail, Result};
use geo::{Coord, MapCoords};
use regex::Regex;

/// Demi-grand axe de l'ellipsoïde WGS84 (m)
const WGS84_A: f64 = 6378137.0;
/// Première excentricité WGS84 au carré : 2f - f², f = 1/298.257223563
const WGS84_E2: f64 = 0.006_694_379_990_141_317;

/// Code EPSG d'un identifiant CRS (`EPSG:32643`, `epsg:4326`)
pub fn parse_epsg(crs: &str) -> Option<u32> {
    static EPSG: OnceLock<Regex> = OnceLock::new();
    let re = EPSG.get_or_init(|| Regex::new(r"^(?i)\s*epsg:\s*(\d+)\s*$").expect("EPSG regex"));
    re.captures(crs)?.get(1)?.as_str().parse().ok()
}

/// Point en coordonnées géographiques (radians)
#[derive(Debug, Clone, Copy)]
pub struct Geographic {
    /// Longitude en radians
    pub lon: f64,
    /// Latitude en radians
    pub lat: f64,
}

impl Geographic {
    pub fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }

    /// Convertit en degrés
    pub fn to_degrees(self) -> (f64, f64) {
        (self.lon.to_degrees(), self.lat.to_degrees())
    }

    /// Crée depuis des degrés
    pub fn from_degrees(lon_deg: f64, lat_deg: f64) -> Self {
        Self {
            lon: lon_deg.to_radians(),
            lat: lat_deg.to_radians(),
        }
    }
}

/// Système de coordonnées pris en charge par la reprojection légère
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LiteCrs {
    Wgs84,
    WebMercator,
    Utm(UtmZone),
}

impl LiteCrs {
    fn from_epsg(epsg: u32) -> Option<Self> {
        match epsg {
            4326 => Some(Self::Wgs84),
            3857 => Some(Self::WebMercator),
            _ => UtmZone::from_epsg(epsg).map(Self::Utm),
        }
    }

    fn unproject(self, x: f64, y: f64) -> Geographic {
        match self {
            Self::Wgs84 => Geographic::from_degrees(x, y),
            Self::WebMercator => mercator::web_mercator_to_geographic(x, y),
            Self::Utm(zone) => utm::utm_to_geographic(x, y, zone),
        }
    }

    fn project(self, geo: Geographic) -> (f64, f64) {
        match self {
            Self::Wgs84 => geo.to_degrees(),
            Self::WebMercator => mercator::geographic_to_web_mercator(geo),
            Self::Utm(zone) => utm::geographic_to_utm(geo, zone),
        }
    }
}

/// Reprojection légère entre deux systèmes supportés
#[derive(Debug, Clone)]
pub struct ReprojectorLite {
    source: LiteCrs,
    target: LiteCrs,
    target_epsg: u32,
}

impl ReprojectorLite {
    /// Crée un nouveau reprojector
    pub fn new(source_epsg: u32, target_epsg: u32) -> Result<Self> {
        let Some(source) = LiteCrs::from_epsg(source_epsg) else {
            bail!(
                "EPSG:{} non supporté. Systèmes supportés: 4326, 3857, 32601-32660, 32701-32760",
                source_epsg
            );
        };
        let Some(target) = LiteCrs::from_epsg(target_epsg) else {
            bail!(
                "EPSG:{} non supporté. Systèmes supportés: 4326, 3857, 32601-32660, 32701-32760",
                target_epsg
            );
        };

        Ok(Self {
            source,
            target,
            target_epsg,
        })
    }

    /// Vérifie si un EPSG est supporté
    pub fn is_supported_epsg(epsg: u32) -> bool {
        LiteCrs::from_epsg(epsg).is_some()
    }

    /// Vérifie si la reprojection est supportée
    pub fn is_supported(source: u32, target: u32) -> bool {
        Self::is_supported_epsg(source) && Self::is_supported_epsg(target)
    }

    pub fn target_epsg(&self) -> u32 {
        self.target_epsg
    }

    /// Transforme un point (x, y) de la source vers la cible
    pub fn transform_point(&self, x: f64, y: f64) -> (f64, f64) {
        // Source -> géographique (WGS84) -> cible
        let geo = self.source.unproject(x, y);
        self.target.project(geo)
    }

    pub fn transform_coord(&self, coord: Coord) -> Coord {
        let (x, y) = self.transform_point(coord.x, coord.y);
        Coord { x, y }
    }

    /// Transforme une géométrie `geo`, tous types confondus
    pub fn transform_geometry(&self, geom: &geo::Geometry) -> geo::Geometry {
        geom.map_coords(|c| self.transform_coord(c))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_epsg() {
        assert_eq!(parse_epsg("EPSG:32643"), Some(32643));
        assert_eq!(parse_epsg("epsg:4326"), Some(4326));
        assert_eq!(parse_epsg(" EPSG: 3857 "), Some(3857));
        assert_eq!(parse_epsg("+proj=longlat +datum=WGS84"), None);
        assert_eq!(parse_epsg("EPSG:"), None);
    }

    #[test]
    fn test_utm_to_wgs84() {
        // Bangalore en UTM 43N
        let reproj = ReprojectorLite::new(32643, 4326).unwrap();
        let (lon, lat) = reproj.transform_point(780000.0, 1435000.0);

        assert!((lon - 77.6).abs() < 0.1, "lon={}", lon);
        assert!((lat - 12.97).abs() < 0.1, "lat={}", lat);
    }

    #[test]
    fn test_wgs84_to_3857() {
        let reproj = ReprojectorLite::new(4326, 3857).unwrap();
        let (x, y) = reproj.transform_point(0.0, 0.0);
        assert!(x.abs() < 1e-6 && y.abs() < 1e-6);
    }

    #[test]
    fn test_transform_geometry() {
        let reproj = ReprojectorLite::new(4326, 32643).unwrap();
        let line = geo::Geometry::LineString(geo::LineString::from(vec![
            (77.59, 12.97),
            (77.60, 12.98),
        ]));
        match reproj.transform_geometry(&line) {
            geo::Geometry::LineString(ls) => {
                assert_eq!(ls.0.len(), 2);
                assert!(ls.0[0].x > 700000.0 && ls.0[0].x < 800000.0);
            }
            other => panic!("Expected LineString, got {:?}", other),
        }
    }

    #[test]
    fn test_unsupported_epsg() {
        assert!(ReprojectorLite::new(2154, 4326).is_err());
        assert!(ReprojectorLite::new(4326, 99999).is_err());
    }
}
