//! Choix du backend de reprojection pour une paire de CRS
//!
//! Ordre : identité (même code EPSG), reproject_lite, puis PROJ.

use super::{parse_epsg, ReprojectorLite};
use anyhow::Result;
use geo::{Coord, LineString};

/// Reprojecteur résolu depuis deux identifiants CRS
pub enum SmartReprojector {
    /// Reprojection légère (pure Rust)
    Lite(ReprojectorLite),
    /// Reprojection via PROJ (si feature activée)
    #[cfg(feature = "reproject")]
    Proj(crate::export::reproject::Reprojector),
    /// Pas de reprojection (source == cible)
    Identity,
}

impl SmartReprojector {
    /// Crée un reprojector entre deux identifiants CRS
    pub fn new(source: &str, target: &str) -> Result<Self> {
        let source_epsg = parse_epsg(source);
        let target_epsg = parse_epsg(target);

        // Pas de reprojection nécessaire. Un CRS inconnu de reproject_lite
        // passe quand même par PROJ pour être validé.
        if let (Some(s), Some(t)) = (source_epsg, target_epsg) {
            if s == t && ReprojectorLite::is_supported_epsg(s) {
                return Ok(Self::Identity);
            }
        }

        // Essayer reproject_lite d'abord
        if let (Some(s), Some(t)) = (source_epsg, target_epsg) {
            if ReprojectorLite::is_supported(s, t) {
                return Ok(Self::Lite(ReprojectorLite::new(s, t)?));
            }
        }

        // Fallback sur proj si disponible
        #[cfg(feature = "reproject")]
        {
            let proj = crate::export::reproject::Reprojector::new(source, target)?;
            return Ok(Self::Proj(proj));
        }

        // Aucune option disponible
        #[cfg(not(feature = "reproject"))]
        anyhow::bail!(
            "Reprojection {} → {} non supportée.\n\
             Projections supportées (reproject_lite) : 4326, 3857, 32601-32660, 32701-32760\n\
             Pour d'autres projections, compilez avec: cargo build --features reproject",
            source,
            target
        );
    }

    /// Transforme une coordonnée
    pub fn transform_coord(&self, coord: Coord) -> Result<Coord> {
        match self {
            Self::Identity => Ok(coord),
            Self::Lite(lite) => Ok(lite.transform_coord(coord)),
            #[cfg(feature = "reproject")]
            Self::Proj(proj) => proj.transform_coord(coord),
        }
    }

    /// Transforme une suite ordonnée de coordonnées
    pub fn transform_linestring(&self, ls: &LineString) -> Result<LineString> {
        match self {
            Self::Identity => Ok(ls.clone()),
            Self::Lite(lite) => Ok(ls.0.iter().map(|&c| lite.transform_coord(c)).collect()),
            #[cfg(feature = "reproject")]
            Self::Proj(proj) => proj.transform_linestring(ls),
        }
    }

    /// Retourne une description du reprojector utilisé
    pub fn description(&self) -> &'static str {
        match self {
            Self::Identity => "identity (pas de reprojection)",
            Self::Lite(_) => "reproject_lite (pure Rust)",
            #[cfg(feature = "reproject")]
            Self::Proj(_) => "proj (PROJ library)",
        }
    }
}
