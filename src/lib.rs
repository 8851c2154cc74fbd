//! # Shrink Movies Library
//!
//! Questo è il modulo principale della libreria che espone tutte le API pubbliche.
//!
//! ## Architettura dei moduli:
//! - `config`: configurazione e validazione parametri
//! - `error`: tipi di errore custom
//! - `file_manager`: classificazione filmati, scansione directory, swap sicuro
//! - `timestamp`: timestamp canonico di un file
//! - `video_processor`: trait `Transcoder` e implementazione FFmpeg
//! - `tool_resolver`: ricerca del binario ffmpeg
//! - `optimizer`: pipeline concorrente (worker, coordinatore, retention policy)
//! - `progress`: progress bar e statistiche
//! - `json_output`: eventi JSON per uso programmatico
//!
//! ## Utilizzo:
//! ```rust,no_run
//! use shrink_movies::{Config, MovieShrinker};
//! use std::path::Path;
//!
//! # async fn demo() -> anyhow::Result<()> {
//! let shrinker = MovieShrinker::new(Path::new("/movies"), Config::default())?;
//! let summary = shrinker.run().await?;
//! println!("{} files replaced", summary.stats.files_replaced);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod file_manager;
pub mod json_output;
pub mod optimizer;
pub mod progress;
pub mod timestamp;
pub mod tool_resolver;
pub mod utils;
pub mod video_processor;

pub use config::Config;
pub use error::ShrinkError;
pub use file_manager::{FileManager, FileTask};
pub use optimizer::{MovieShrinker, RetentionDecision, RetentionPolicy, RunSummary, TranscodeResult};
pub use video_processor::{EncodeProfile, FfmpegTranscoder, Transcoder};
