//! Reprojection de coordonnées avec PROJ
//!
//! Ce module est disponible uniquement avec le feature `reproject`.

#[cfg(feature = "reproject")]
use anyhow::{Context, Result};
#[cfg(feature = "reproject")]
use geo::{Coord, LineString};
#[cfg(feature = "reproject")]
use proj::Proj;

/// Reprojection entre deux systèmes de coordonnées connus de PROJ
#[cfg(feature = "reproject")]
pub struct Reprojector {
    proj: Proj,
    source: String,
    target: String,
}

#[cfg(feature = "reproject")]
impl Reprojector {
    /// Crée un reprojector entre deux identifiants CRS (`EPSG:32643`, chaîne PROJ...)
    pub fn new(source: &str, target: &str) -> Result<Self> {
        let proj = Proj::new_known_crs(source, target, None).context(format!(
            "Failed to create projection from {} to {}",
            source, target
        ))?;

        Ok(Self {
            proj,
            source: source.to_string(),
            target: target.to_string(),
        })
    }

    /// Transforme une coordonnée unique
    pub fn transform_coord(&self, coord: Coord) -> Result<Coord> {
        let (x, y) = self
            .proj
            .convert((coord.x, coord.y))
            .with_context(|| {
                format!(
                    "Coordinate transformation from {} to {} failed",
                    self.source, self.target
                )
            })?;
        Ok(Coord { x, y })
    }

    /// Transforme une LineString (conversion par lot)
    pub fn transform_linestring(&self, ls: &LineString) -> Result<LineString> {
        let mut coords: Vec<(f64, f64)> = ls.0.iter().map(|c| (c.x, c.y)).collect();

        self.proj
            .convert_array(&mut coords)
            .context("Batch coordinate transformation failed")?;

        Ok(LineString::new(
            coords.into_iter().map(|(x, y)| Coord { x, y }).collect(),
        ))
    }
}


#[cfg(not(feature = "reproject"))]
use anyhow::{bail, Result};

/// Reprojector factice - pas de reprojection PROJ disponible
#[cfg(not(feature = "reproject"))]
pub struct Reprojector;

#[cfg(not(feature = "reproject"))]
impl Reprojector {
    /// Échoue toujours sans la feature
    pub fn new(source: &str, target: &str) -> Result<Self> {
        bail!(
            "Reprojection from {} to {} requires the 'reproject' feature. \
             Build with: cargo build --features reproject",
            source,
            target
        )
    }
}
