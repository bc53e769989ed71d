//! Types d'erreurs pour le crate shpgeo

use std::path::Path;

use thiserror::Error;

/// Erreurs pouvant survenir lors de la lecture d'un shapefile
#[derive(Debug, Error)]
pub enum ShpError {
    /// Erreur d'I/O lors de l'ouverture des fichiers
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Fichier compagnon manquant (.shp, .dbf)
    #[error("Missing required file: {0}")]
    MissingFile(String),

    /// Erreur remontée par le lecteur shapefile/dBase
    #[error("Read error in {path}: {reason}")]
    Read { path: String, reason: String },

    /// Mapping de standardisation illisible
    #[error("Invalid field standards: {0}")]
    InvalidStandards(String),
}

impl ShpError {
    /// Crée une erreur de lecture avec contexte
    pub fn read(path: &Path, reason: impl ToString) -> Self {
        Self::Read {
            path: path.display().to_string(),
            reason: reason.to_string(),
        }
    }
}
