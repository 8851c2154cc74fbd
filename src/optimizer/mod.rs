//! # Optimizer Module
//!
//! Modulo che separa le responsabilità della pipeline in sottomoduli:
//! - `media_optimizer`: orchestratore principale (`MovieShrinker`)
//! - `task_optimizer`: worker per singoli file (`TranscodeWorker`)
//! - `concurrency`: pool limitato di task (`ConcurrencyCoordinator`)
//! - `retention`: decisione sostituisci/scarta (`RetentionPolicy`)
//! - `path_resolver`: prenotazione nomi e mirroring della directory di output

pub mod concurrency;
pub mod media_optimizer;
pub mod path_resolver;
pub mod retention;
pub mod task_optimizer;

pub use concurrency::ConcurrencyCoordinator;
pub use media_optimizer::{MovieShrinker, RunSummary};
pub use path_resolver::{NameRegistry, PathResolver};
pub use retention::{RetentionDecision, RetentionPolicy};
pub use task_optimizer::{Placement, TranscodeResult, TranscodeWorker};
