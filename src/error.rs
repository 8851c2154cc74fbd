//! # Error Types Module
//!
//! Questo modulo definisce tutti i tipi di errore custom dell'applicazione.
//!
//! ## Categorie di errori:
//! - `Traversal`: impossibile elencare una directory durante la scansione (fatale)
//! - `Transcode`: ffmpeg ha fallito su un singolo file (il file viene saltato)
//! - `MtimeSet`: impossibile propagare il timestamp sul file finale (solo log)
//! - `Io`: errori di I/O durante lo swap o la copia di un file
//! - `MissingDependency`: tool esterno mancante (ffmpeg)
//! - `Validation`: parametri di configurazione non validi
//!
//! Gli errori di lettura del timestamp non compaiono qui: il resolver
//! ricade sempre sulla data sentinella.
//!
//! ## Esempio:
//! ```rust,ignore
//! if !tool_exists {
//!     return Err(ShrinkError::MissingDependency("ffmpeg".to_string()));
//! }
//! ```

use std::path::PathBuf;

/// Custom error types for the shrink pipeline
#[derive(thiserror::Error, Debug)]
pub enum ShrinkError {
    #[error("Cannot list directory {}: {source}", path.display())]
    Traversal {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    #[error("Transcode failed for {}: {message}", path.display())]
    Transcode { path: PathBuf, message: String },

    #[error("Cannot set modification time on {}: {source}", path.display())]
    MtimeSet {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Dependency missing: {0}")]
    MissingDependency(String),

    #[error("Invalid configuration: {0}")]
    Validation(String),
}

impl ShrinkError {
    /// Errors that must stop the whole run rather than a single file
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::Traversal { .. } | Self::MissingDependency(_) | Self::Validation(_)
        )
    }
}
