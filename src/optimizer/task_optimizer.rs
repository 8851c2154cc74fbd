//! # Task Optimizer Module
//!
//! Worker per la transcodifica di singoli file.
//!
//! ## Pipeline per file:
//! 1. Risolve il timestamp canonico
//! 2. Prenota un nome di staging univoco nella directory di lavoro
//! 3. Invoca il transcoder
//! 4. Confronta le dimensioni e applica la retention policy
//! 5. Sostituisce / sposta / scarta
//! 6. Propaga il timestamp sul file tenuto (best effort)
//!
//! I passi 1-2 (`plan`) sono sincroni e vengono eseguiti in ordine di dispatch,
//! i passi 3-6 (`execute`) girano in parallelo.
//!
//! Il timeout opzionale copre solo il passo 3: confronto, swap e timestamp
//! non vengono mai interrotti a metà.

use crate::{
    error::ShrinkError,
    file_manager::{FileManager, FileTask},
    optimizer::{
        path_resolver::{NameRegistry, PathResolver},
        retention::{size_ratio, RetentionDecision, RetentionPolicy},
    },
    timestamp::{resolve_timestamp, set_file_timestamp, staging_stem, Timestamp},
    video_processor::{EncodeProfile, Transcoder},
};
use serde::Serialize;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Outcome of one transcoded file
#[derive(Debug, Clone, Serialize)]
pub struct TranscodeResult {
    pub source_path: PathBuf,
    /// Where the retained file lives, or the (removed) staging file on discard
    pub output_path: PathBuf,
    pub input_size: u64,
    pub output_size: u64,
    pub size_ratio: f64,
    pub decision: RetentionDecision,
    /// The transcoded bytes were placed at `output_path`
    pub kept: bool,
}

impl TranscodeResult {
    pub fn bytes_saved(&self) -> u64 {
        if self.kept {
            self.input_size.saturating_sub(self.output_size)
        } else {
            0
        }
    }
}

/// A task with its timestamp resolved and staging name reserved
#[derive(Debug, Clone)]
pub struct PlannedTranscode {
    pub task: FileTask,
    pub timestamp: Timestamp,
    pub staging_path: PathBuf,
}

/// Where retained files go
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// Replace the original inside the input tree
    InPlace,
    /// Write into the task's destination directory, never touching originals
    OutputDir,
}

/// Worker shared by all tasks of a run
pub struct TranscodeWorker {
    transcoder: Arc<dyn Transcoder>,
    profile: EncodeProfile,
    policy: RetentionPolicy,
    placement: Placement,
    dry_run: bool,
    /// Deadline for the encoder alone
    timeout: Option<Duration>,
    work_dir: PathBuf,
    names: NameRegistry,
}

impl TranscodeWorker {
    pub fn new(
        transcoder: Arc<dyn Transcoder>,
        profile: EncodeProfile,
        policy: RetentionPolicy,
        placement: Placement,
        work_dir: PathBuf,
    ) -> Self {
        Self {
            transcoder,
            profile,
            policy,
            placement,
            dry_run: false,
            timeout: None,
            work_dir,
            names: NameRegistry::new(),
        }
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Resolve the timestamp and reserve a unique staging name
    pub fn plan(&self, task: FileTask) -> PlannedTranscode {
        let timestamp = resolve_timestamp(&task.source_path);
        let staging_path = self
            .names
            .reserve(&self.work_dir, &staging_stem(&timestamp), "mp4", None);
        debug!(
            "Planned {} -> {}",
            task.source_path.display(),
            staging_path.display()
        );

        PlannedTranscode {
            task,
            timestamp,
            staging_path,
        }
    }

    /// Plan and execute in one go
    pub async fn transcode(&self, task: FileTask) -> Result<TranscodeResult, ShrinkError> {
        let plan = self.plan(task);
        self.execute(plan).await
    }

    /// Transcode, compare sizes, apply the retention policy
    pub async fn execute(&self, plan: PlannedTranscode) -> Result<TranscodeResult, ShrinkError> {
        let source = &plan.task.source_path;
        let staging = &plan.staging_path;

        if let Err(e) = self.encode(source, staging).await {
            Self::discard_staging(staging).await;
            return Err(e);
        }

        let (input_size, output_size) = match Self::measure(source, staging).await {
            Ok(sizes) => sizes,
            Err(e) => {
                Self::discard_staging(staging).await;
                return Err(e);
            }
        };
        let ratio = size_ratio(input_size, output_size);
        let decision = self.policy.decide(ratio);
        debug!(
            "Decision for {}: {:?} (ratio {:.4}, threshold {})",
            source.display(),
            decision,
            ratio,
            self.policy.threshold()
        );

        let (output_path, kept) = if self.dry_run {
            info!("Dry run: would {:?} {}", decision, source.display());
            Self::discard_staging(staging).await;
            (staging.clone(), false)
        } else {
            match self.apply(&plan, decision).await {
                Ok(placed) => placed,
                Err(e) => {
                    Self::discard_staging(staging).await;
                    return Err(e);
                }
            }
        };

        info!("Processed file: {} ratio: {:.4}", source.display(), ratio);

        Ok(TranscodeResult {
            source_path: source.clone(),
            output_path,
            input_size,
            output_size,
            size_ratio: ratio,
            decision,
            kept,
        })
    }

    /// Run the encoder under the optional deadline. Expiry drops the encode
    /// future, which kills the child process.
    async fn encode(&self, source: &Path, staging: &Path) -> Result<(), ShrinkError> {
        let encode = self.transcoder.encode(source, staging, &self.profile);
        match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, encode).await {
                Ok(outcome) => outcome,
                Err(_) => {
                    warn!("Transcode of {} exceeded {:?}", source.display(), limit);
                    Err(ShrinkError::Transcode {
                        path: source.to_path_buf(),
                        message: format!("timed out after {:?}", limit),
                    })
                }
            },
            None => encode.await,
        }
    }

    async fn measure(source: &Path, staging: &Path) -> Result<(u64, u64), ShrinkError> {
        let input_size = FileManager::file_size(source).await?;
        let output_size = FileManager::file_size(staging).await?;
        Ok((input_size, output_size))
    }

    /// Returns the path of the file left behind and whether it holds the transcoded bytes
    async fn apply(
        &self,
        plan: &PlannedTranscode,
        decision: RetentionDecision,
    ) -> Result<(PathBuf, bool), ShrinkError> {
        let source = &plan.task.source_path;
        let staging = &plan.staging_path;
        let staging_name = staging
            .file_stem()
            .and_then(OsStr::to_str)
            .unwrap_or("transcoded");

        match (self.placement, decision) {
            (Placement::InPlace, RetentionDecision::Replace) => {
                let dir = source.parent().unwrap_or(Path::new(""));
                let final_path = self.names.reserve(dir, staging_name, "mp4", Some(source));
                FileManager::swap_into_place(source, staging, &final_path).await?;
                Self::propagate_timestamp(&final_path, &plan.timestamp);
                Ok((final_path, true))
            }
            (Placement::InPlace, RetentionDecision::Discard) => {
                Self::discard_staging(staging).await;
                Ok((staging.clone(), false))
            }
            (Placement::OutputDir, RetentionDecision::Replace) => {
                let final_path =
                    self.names
                        .reserve(&plan.task.destination_dir, staging_name, "mp4", None);
                PathResolver::ensure_parent_dirs(&final_path).await?;
                if let Err(e) = FileManager::move_file(staging, &final_path).await {
                    Self::discard_staging(staging).await;
                    return Err(e);
                }
                Self::propagate_timestamp(&final_path, &plan.timestamp);
                Ok((final_path, true))
            }
            (Placement::OutputDir, RetentionDecision::Discard) => {
                Self::discard_staging(staging).await;
                // The output tree still gets a copy of the original
                let stem = source
                    .file_stem()
                    .and_then(OsStr::to_str)
                    .unwrap_or("original");
                let extension = source
                    .extension()
                    .and_then(OsStr::to_str)
                    .unwrap_or("mp4");
                let copy_path =
                    self.names
                        .reserve(&plan.task.destination_dir, stem, extension, None);
                PathResolver::ensure_parent_dirs(&copy_path).await?;
                tokio::fs::copy(source, &copy_path).await?;
                Self::propagate_timestamp(&copy_path, &plan.timestamp);
                Ok((staging.clone(), false))
            }
        }
    }

    /// Best effort: a failure is logged, never fatal
    fn propagate_timestamp(path: &Path, timestamp: &Timestamp) {
        if let Err(e) = set_file_timestamp(path, timestamp) {
            error!("{}", e);
        }
    }

    async fn discard_staging(staging: &Path) {
        match tokio::fs::remove_file(staging).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!("Failed to remove staging file {}: {}", staging.display(), e),
        }
    }
}
