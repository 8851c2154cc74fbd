//! # Progress Tracking and Statistics Module
//!
//! Questo modulo gestisce il progress tracking e le statistiche del run.
//!
//! ## Componenti principali:
//! - `ProgressManager`: barra di progresso `indicatif` (nascosta in modalità JSON)
//! - `ShrinkStats`: statistiche cumulative (sostituiti, scartati, errori, byte risparmiati)
//!
//! ## Visual feedback:
//! ```text
//! ⠋ [00:02:15] [========================================] 12/12 (100%) ✅ holiday.avi: 0.612
//! ```

use crate::file_manager::FileManager;
use crate::optimizer::task_optimizer::TranscodeResult;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

/// Manages progress reporting for a run
#[derive(Clone)]
pub struct ProgressManager {
    bar: ProgressBar,
}

impl ProgressManager {
    /// Create a new progress manager; a hidden one draws nothing
    pub fn new(total_files: u64, visible: bool) -> Self {
        if !visible {
            return Self {
                bar: ProgressBar::hidden(),
            };
        }

        let bar = ProgressBar::new(total_files);
        if let Ok(style) = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}")
        {
            bar.set_style(style.progress_chars("=>-"));
        }
        bar.enable_steady_tick(Duration::from_millis(100));

        Self { bar }
    }

    /// Update progress with a message
    pub fn update(&self, message: &str) {
        self.bar.inc(1);
        self.bar.set_message(message.to_string());
    }

    /// Finish with a final message
    pub fn finish(&self, message: &str) {
        self.bar.finish_with_message(message.to_string());
    }

    pub fn position(&self) -> u64 {
        self.bar.position()
    }
}

/// Statistics tracker for a run
#[derive(Debug, Default, Clone, Serialize)]
pub struct ShrinkStats {
    pub files_processed: usize,
    pub files_replaced: usize,
    pub files_discarded: usize,
    pub errors: usize,
    pub total_bytes_saved: u64,
    pub total_original_size: u64,
}

impl ShrinkStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_result(&mut self, result: &TranscodeResult) {
        self.files_processed += 1;
        self.total_original_size += result.input_size;
        if result.kept {
            self.files_replaced += 1;
            self.total_bytes_saved += result.bytes_saved();
        } else {
            self.files_discarded += 1;
        }
    }

    pub fn add_error(&mut self) {
        self.files_processed += 1;
        self.errors += 1;
    }

    pub fn overall_reduction_percent(&self) -> f64 {
        if self.total_original_size > 0 {
            (self.total_bytes_saved as f64 / self.total_original_size as f64) * 100.0
        } else {
            0.0
        }
    }

    pub fn format_summary(&self) -> String {
        format!(
            "Processed: {} files | Replaced: {} | Discarded: {} | Errors: {} | Total saved: {} ({:.2}%)",
            self.files_processed,
            self.files_replaced,
            self.files_discarded,
            self.errors,
            FileManager::format_size(self.total_bytes_saved),
            self.overall_reduction_percent()
        )
    }
}

/// Thread-safe progress shared by all tasks of a run
#[derive(Clone)]
pub struct ProgressTracker {
    pub total_files: usize,
    stats: Arc<Mutex<ShrinkStats>>,
    progress_manager: ProgressManager,
}

impl ProgressTracker {
    pub fn new(total_files: usize, visible: bool) -> Self {
        Self {
            total_files,
            stats: Arc::new(Mutex::new(ShrinkStats::new())),
            progress_manager: ProgressManager::new(total_files as u64, visible),
        }
    }

    pub fn record_result(&self, result: &TranscodeResult) {
        self.lock().add_result(result);
        let marker = if result.kept { "✅" } else { "⏩" };
        self.progress_manager.update(&format!(
            "{} {}: {:.3}",
            marker,
            display_name(&result.source_path),
            result.size_ratio
        ));
    }

    pub fn record_error(&self, path: &Path) {
        self.lock().add_error();
        self.progress_manager
            .update(&format!("❌ {}: error", display_name(path)));
    }

    pub fn snapshot(&self) -> ShrinkStats {
        self.lock().clone()
    }

    pub fn finish(&self) -> ShrinkStats {
        let stats = self.snapshot();
        self.progress_manager.finish(&stats.format_summary());
        stats
    }

    pub fn completed(&self) -> u64 {
        self.progress_manager.position()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ShrinkStats> {
        self.stats.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .unwrap_or_default()
        .to_string_lossy()
        .into_owned()
}
