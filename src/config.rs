//! # Configuration Management Module
//!
//! Questo modulo gestisce tutta la configurazione dell'applicazione.
//!
//! ## Parametri di configurazione:
//! - `video_crf`: CRF video (0-51, default: 28, più basso = migliore qualità)
//! - `preset`: preset x264 (default: "slow")
//! - `size_threshold`: sostituisce il file se `nuovo / originale < soglia` (default: 0.93)
//! - `workers`: numero massimo di transcodifiche simultanee (default: 4)
//! - `output_path`: directory di output (default: None = sostituzione in place)
//! - `dry_run`: simulazione senza modifiche (default: false)
//! - `timeout_secs`: timeout per singolo file (default: nessuno)
//! - `json_output`: eventi JSON su stdout (default: false)
//! - `show_progress`: barra di progresso (default: true)
//!
//! ## Esempio:
//! ```rust,ignore
//! let config = Config {
//!     video_crf: 24,
//!     workers: 2,
//!     ..Default::default()
//! };
//! config.validate()?;
//! ```

use crate::error::ShrinkError;
use crate::video_processor::EncodeProfile;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Presets accepted by libx264
pub const X264_PRESETS: &[&str] = &[
    "ultrafast",
    "superfast",
    "veryfast",
    "faster",
    "fast",
    "medium",
    "slow",
    "slower",
    "veryslow",
    "placebo",
];

/// Configuration for a shrink run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Video CRF value (0-51, lower = better quality)
    pub video_crf: u8,
    /// x264 speed/efficiency preset
    pub preset: String,
    /// Replace only if transcoded / original < threshold
    pub size_threshold: f64,
    /// Maximum number of simultaneous transcodes
    pub workers: usize,
    /// Output directory for retained files (None = replace in place)
    pub output_path: Option<PathBuf>,
    /// Dry run - don't touch originals
    pub dry_run: bool,
    /// Per-file transcode timeout in seconds
    pub timeout_secs: Option<u64>,
    /// Output progress and results as JSON lines
    pub json_output: bool,
    /// Draw the progress bar
    pub show_progress: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            video_crf: 28,
            preset: "slow".to_string(),
            size_threshold: 0.93,
            workers: 4,
            output_path: None,
            dry_run: false,
            timeout_secs: None,
            json_output: false,
            show_progress: true,
        }
    }
}

impl Config {
    /// Validate configuration parameters
    pub fn validate(&self) -> Result<(), ShrinkError> {
        if self.video_crf > 51 {
            return Err(ShrinkError::Validation(
                "Video CRF must be between 0 and 51".to_string(),
            ));
        }

        if !X264_PRESETS.contains(&self.preset.as_str()) {
            return Err(ShrinkError::Validation(format!(
                "Unknown x264 preset '{}' (expected one of: {})",
                self.preset,
                X264_PRESETS.join(", ")
            )));
        }

        // NaN fails both comparisons, so check it explicitly
        if self.size_threshold.is_nan() || self.size_threshold <= 0.0 || self.size_threshold > 1.0 {
            return Err(ShrinkError::Validation(
                "Size threshold must be between 0.0 (exclusive) and 1.0".to_string(),
            ));
        }

        if self.workers == 0 {
            return Err(ShrinkError::Validation(
                "Number of workers must be greater than 0".to_string(),
            ));
        }

        if self.timeout_secs == Some(0) {
            return Err(ShrinkError::Validation(
                "Timeout must be at least one second".to_string(),
            ));
        }

        if let Some(ref output_path) = self.output_path {
            if output_path.exists() && !output_path.is_dir() {
                return Err(ShrinkError::Validation(format!(
                    "Output path is not a directory: {}",
                    output_path.display()
                )));
            }
        }

        Ok(())
    }

    /// Encoding profile handed to the transcoder
    pub fn encode_profile(&self) -> EncodeProfile {
        EncodeProfile {
            crf: self.video_crf,
            preset: self.preset.clone(),
            ..EncodeProfile::default()
        }
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }

    /// Progress bar is pointless when stdout carries JSON events
    pub fn progress_visible(&self) -> bool {
        self.show_progress && !self.json_output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_config_validation() {
        let mut config = Config::default();
        assert!(config.validate().is_ok());

        config.video_crf = 52;
        assert!(config.validate().is_err());

        config.video_crf = 28;
        config.size_threshold = 1.5;
        assert!(config.validate().is_err());

        config.size_threshold = 0.0;
        assert!(config.validate().is_err());

        config.size_threshold = f64::NAN;
        assert!(config.validate().is_err());

        config.size_threshold = 1.0;
        assert!(config.validate().is_ok());

        config.workers = 0;
        assert!(config.validate().is_err());

        config.workers = 1;
        config.preset = "ludicrous".to_string();
        assert!(config.validate().is_err());

        config.preset = "veryslow".to_string();
        config.timeout_secs = Some(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.video_crf, 28);
        assert_eq!(config.preset, "slow");
        assert_eq!(config.size_threshold, 0.93);
        assert_eq!(config.workers, 4);
        assert!(config.output_path.is_none());
        assert!(!config.dry_run);
        assert!(config.timeout().is_none());
    }

    #[test]
    fn test_output_path_must_be_directory() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("not_a_dir");
        std::fs::write(&file, b"x").unwrap();

        let config = Config {
            output_path: Some(file),
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ShrinkError::Validation(_))));

        // A missing output directory is fine, it gets created at run start
        let config = Config {
            output_path: Some(temp_dir.path().join("later")),
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_encode_profile_follows_config() {
        let config = Config {
            video_crf: 23,
            preset: "medium".to_string(),
            ..Default::default()
        };
        let profile = config.encode_profile();
        assert_eq!(profile.crf, 23);
        assert_eq!(profile.preset, "medium");
        assert_eq!(profile.video_codec, "libx264");
        assert!(profile.copy_audio);
        assert!(profile.fast_start);
    }

    #[test]
    fn test_progress_hidden_in_json_mode() {
        let config = Config {
            json_output: true,
            ..Default::default()
        };
        assert!(!config.progress_visible());
    }
}
