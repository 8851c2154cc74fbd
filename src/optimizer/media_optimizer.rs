//! # Movie Shrinker Main Orchestrator
//!
//! Orchestratore principale che delega ai moduli specializzati.
//!
//! ## Flusso di esecuzione:
//! 1. **Validazione**: config e directory di input
//! 2. **Dependency check**: il transcoder deve essere eseguibile
//! 3. **Discovery**: lista completa dei filmati (non in streaming)
//! 4. **Directory di lavoro**: creata prima del dispatch, rimossa dopo l'ultimo task
//! 5. **Processing parallelo**: `ConcurrencyCoordinator` + `TranscodeWorker`
//!    (il timeout per file limita solo la transcodifica)
//! 6. **Report**: statistiche e riga finale "Done processing"
//!
//! Gli errori su un singolo file vengono loggati e non fermano il run;
//! sono fatali solo config, dipendenze e scansione della directory.

use crate::{
    config::Config,
    error::ShrinkError,
    file_manager::{FileManager, FileTask},
    json_output::JsonMessage,
    optimizer::{
        concurrency::ConcurrencyCoordinator,
        retention::RetentionPolicy,
        task_optimizer::{Placement, TranscodeResult, TranscodeWorker},
    },
    progress::{ProgressTracker, ShrinkStats},
    video_processor::{FfmpegTranscoder, Transcoder},
};
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info};

/// What a finished run produced
#[derive(Debug)]
pub struct RunSummary {
    /// Successful transcodes, in dispatch order
    pub results: Vec<TranscodeResult>,
    pub failures: usize,
    pub peak_concurrency: usize,
    pub stats: ShrinkStats,
}

impl RunSummary {
    pub fn tasks_dispatched(&self) -> usize {
        self.results.len() + self.failures
    }
}

/// Orchestratore principale
pub struct MovieShrinker {
    config: Config,
    input_dir: PathBuf,
    transcoder: Arc<dyn Transcoder>,
}

impl MovieShrinker {
    /// Shrinker backed by the system ffmpeg
    pub fn new(input_dir: &Path, config: Config) -> Result<Self> {
        Self::with_transcoder(input_dir, config, Arc::new(FfmpegTranscoder::new()))
    }

    /// Shrinker with an injected transcoder
    pub fn with_transcoder(
        input_dir: &Path,
        config: Config,
        transcoder: Arc<dyn Transcoder>,
    ) -> Result<Self> {
        if input_dir.as_os_str().is_empty() {
            return Err(ShrinkError::Validation("Input directory must not be empty".to_string()).into());
        }
        config.validate()?;

        Ok(Self {
            config,
            input_dir: input_dir.to_path_buf(),
            transcoder,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Esegue il run completo
    pub async fn run(&self) -> Result<RunSummary> {
        let start_time = Instant::now();
        self.log_configuration();

        self.transcoder.check_available().await?;

        let tasks = FileManager::collect(&self.input_dir, self.config.output_path.as_deref())?;
        info!("Found {} movie files to process", tasks.len());

        if self.config.json_output {
            JsonMessage::start(self.input_dir.clone(), tasks.len(), &self.config).emit();
        }

        if let Some(ref output_dir) = self.config.output_path {
            tokio::fs::create_dir_all(output_dir)
                .await
                .with_context(|| format!("Failed to create output directory {}", output_dir.display()))?;
        }

        let work_dir = tempfile::Builder::new()
            .prefix("shrink-movies")
            .tempdir()
            .context("Failed to create working directory")?;

        let summary = self.process_tasks(tasks, work_dir.path()).await?;

        // Every task has been joined at this point
        if let Err(e) = work_dir.close() {
            error!("Failed to remove working directory: {}", e);
        }

        self.print_final_stats(&summary, start_time.elapsed().as_secs_f64());
        info!("Done processing: {}", self.input_dir.display());

        Ok(summary)
    }

    fn log_configuration(&self) {
        info!("Starting movie shrinking in: {}", self.input_dir.display());
        info!(
            "🎬 Encoder: {} (libx264, preset {}, CRF {})",
            self.transcoder.name(),
            self.config.preset,
            self.config.video_crf
        );
        info!(
            "Replace when transcoded/original < {} | {} concurrent transcodes",
            self.config.size_threshold, self.config.workers
        );

        match self.config.output_path {
            Some(ref output_path) => info!("📁 Output directory: {}", output_path.display()),
            None => info!("📁 Mode: Replace files in place"),
        }

        if self.config.dry_run {
            info!("🧪 Dry run mode: No files will be modified");
        }
        if let Some(timeout) = self.config.timeout() {
            info!("Per-file timeout: {}s", timeout.as_secs());
        }
    }

    async fn process_tasks(&self, tasks: Vec<FileTask>, work_dir: &Path) -> Result<RunSummary> {
        let placement = if self.config.output_path.is_some() {
            Placement::OutputDir
        } else {
            Placement::InPlace
        };
        let worker = Arc::new(
            TranscodeWorker::new(
                Arc::clone(&self.transcoder),
                self.config.encode_profile(),
                RetentionPolicy::new(self.config.size_threshold),
                placement,
                work_dir.to_path_buf(),
            )
            .with_dry_run(self.config.dry_run)
            .with_timeout(self.config.timeout()),
        );

        let progress = ProgressTracker::new(tasks.len(), self.config.progress_visible());
        let coordinator = ConcurrencyCoordinator::new(self.config.workers);
        let json_output = self.config.json_output;

        let outcomes = coordinator
            .run_all(tasks, |task| {
                // Planning runs here, in dispatch order
                let plan = worker.plan(task);
                let source = plan.task.source_path.clone();
                let worker = Arc::clone(&worker);
                let progress = progress.clone();

                async move {
                    match worker.execute(plan).await {
                        Ok(result) => {
                            progress.record_result(&result);
                            if json_output {
                                JsonMessage::file_complete(&result).emit();
                            }
                            Ok(result)
                        }
                        Err(e) => {
                            let e = anyhow::Error::new(e)
                                .context(format!("Failed to process {}", source.display()));
                            error!("{:#}", e);
                            progress.record_error(&source);
                            if json_output {
                                JsonMessage::file_error(source, &e).emit();
                            }
                            Err(e)
                        }
                    }
                }
            })
            .await?;

        let mut results = Vec::new();
        let mut failures = 0;
        for outcome in outcomes {
            match outcome {
                Ok(result) => results.push(result),
                Err(_) => failures += 1,
            }
        }

        let stats = progress.finish();
        Ok(RunSummary {
            results,
            failures,
            peak_concurrency: coordinator.peak_active(),
            stats,
        })
    }

    fn print_final_stats(&self, summary: &RunSummary, duration_seconds: f64) {
        let stats = &summary.stats;

        if self.config.json_output {
            JsonMessage::complete(stats.clone(), duration_seconds).emit();
        }

        info!("=== Shrinking Complete ===");
        info!("Files processed: {}", stats.files_processed);
        info!("Files replaced: {}", stats.files_replaced);
        info!("Files discarded: {}", stats.files_discarded);
        info!("Errors: {}", stats.errors);
        info!("Bytes saved: {}", FileManager::format_size(stats.total_bytes_saved));
        info!("Average reduction: {:.2}%", stats.overall_reduction_percent());
        info!("Peak concurrent transcodes: {}", summary.peak_concurrency);
        info!("Elapsed: {:.1}s", duration_seconds);
    }
}
