//! # JSON Output Module
//!
//! Questo modulo gestisce l'output strutturato in JSON (una riga per evento su stdout)
//! per chi pilota il tool da un altro processo.
//!
//! ## Tipi di messaggi:
//! - `start`: inizio del run
//! - `file_complete`: file transcodificato, con decisione della retention policy
//! - `file_error`: errore su un singolo file (il run continua)
//! - `complete`: fine del run con statistiche finali

use crate::config::Config;
use crate::optimizer::retention::RetentionDecision;
use crate::optimizer::task_optimizer::TranscodeResult;
use crate::progress::ShrinkStats;
use serde::Serialize;
use std::path::PathBuf;

/// Tipo di messaggio JSON
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum JsonMessage {
    Start {
        input_dir: PathBuf,
        output_dir: Option<PathBuf>,
        total_files: usize,
        config: Config,
    },

    FileComplete {
        path: PathBuf,
        output_path: PathBuf,
        original_size: u64,
        transcoded_size: u64,
        ratio: f64,
        decision: RetentionDecision,
        kept: bool,
    },

    FileError {
        path: PathBuf,
        error: String,
    },

    Complete {
        #[serde(flatten)]
        stats: ShrinkStats,
        duration_seconds: f64,
    },
}

impl JsonMessage {
    /// Emit the message as a single JSON line
    pub fn emit(&self) {
        if let Ok(json) = self.to_line() {
            println!("{}", json);
        }
    }

    pub fn to_line(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn start(input_dir: PathBuf, total_files: usize, config: &Config) -> Self {
        Self::Start {
            input_dir,
            output_dir: config.output_path.clone(),
            total_files,
            config: config.clone(),
        }
    }

    pub fn file_complete(result: &TranscodeResult) -> Self {
        Self::FileComplete {
            path: result.source_path.clone(),
            output_path: result.output_path.clone(),
            original_size: result.input_size,
            transcoded_size: result.output_size,
            ratio: result.size_ratio,
            decision: result.decision,
            kept: result.kept,
        }
    }

    pub fn file_error(path: PathBuf, error: &anyhow::Error) -> Self {
        Self::FileError {
            path,
            error: format!("{:#}", error),
        }
    }

    pub fn complete(stats: ShrinkStats, duration_seconds: f64) -> Self {
        Self::Complete {
            stats,
            duration_seconds,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_complete_line() {
        let result = TranscodeResult {
            source_path: PathBuf::from("/in/a.mp4"),
            output_path: PathBuf::from("/in/20200101_000000.mp4"),
            input_size: 100,
            output_size: 50,
            size_ratio: 0.5,
            decision: RetentionDecision::Replace,
            kept: true,
        };
        let line = JsonMessage::file_complete(&result).to_line().unwrap();
        let value: serde_json::Value = serde_json::from_str(&line).unwrap();

        assert_eq!(value["type"], "file_complete");
        assert_eq!(value["decision"], "replace");
        assert_eq!(value["ratio"], 0.5);
        assert_eq!(value["kept"], true);
    }

    #[test]
    fn test_complete_flattens_stats() {
        let stats = ShrinkStats {
            files_processed: 2,
            errors: 1,
            ..Default::default()
        };
        let line = JsonMessage::complete(stats, 1.5).to_line().unwrap();
        let value: serde_json::Value = serde_json::from_str(&line).unwrap();

        assert_eq!(value["type"], "complete");
        assert_eq!(value["files_processed"], 2);
        assert_eq!(value["errors"], 1);
        assert_eq!(value["duration_seconds"], 1.5);
    }

    #[test]
    fn test_start_and_error_lines() {
        let config = Config::default();
        let line = JsonMessage::start(PathBuf::from("/in"), 3, &config).to_line().unwrap();
        let value: serde_json::Value = serde_json::from_str(&line).unwrap();
        assert_eq!(value["type"], "start");
        assert_eq!(value["total_files"], 3);
        assert_eq!(value["config"]["video_crf"], 28);

        let err = anyhow::anyhow!("ffmpeg exited");
        let line = JsonMessage::file_error(PathBuf::from("/in/x.avi"), &err).to_line().unwrap();
        assert!(line.contains("\"type\":\"file_error\""));
        assert!(line.contains("ffmpeg exited"));
    }
}
