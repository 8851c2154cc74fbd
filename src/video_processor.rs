//! # Video Processing Module
//!
//! Questo modulo definisce la capacità di transcodifica usata dalla pipeline.
//!
//! ## Responsabilità:
//! - Trait `Transcoder`: astrazione sul tool esterno (sostituibile nei test)
//! - `EncodeProfile`: profilo di codifica orientato a dimensione/qualità
//! - `FfmpegTranscoder`: implementazione basata su FFmpeg
//!
//! ## Profilo di default:
//! - Codec video: libx264
//! - Preset: slow
//! - CRF: 28
//! - `-movflags +faststart` (metadata prima dei dati, riproduzione progressiva)
//! - Audio copiato senza ricodifica
//!
//! ## Esempio:
//! ```rust,ignore
//! let transcoder = FfmpegTranscoder::new();
//! transcoder.check_available().await?;
//! transcoder.encode(&input, &output, &EncodeProfile::default()).await?;
//! ```

use crate::args;
use crate::error::ShrinkError;
use crate::tool_resolver::ToolPathResolver;
use crate::utils::stderr_tail;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

/// Encoding parameters handed to a [`Transcoder`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodeProfile {
    pub video_codec: String,
    pub preset: String,
    pub crf: u8,
    /// Place the moov atom before media data
    pub fast_start: bool,
    /// Copy the audio stream unmodified
    pub copy_audio: bool,
}

impl Default for EncodeProfile {
    fn default() -> Self {
        Self {
            video_codec: "libx264".to_string(),
            preset: "slow".to_string(),
            crf: 28,
            fast_start: true,
            copy_audio: true,
        }
    }
}

impl EncodeProfile {
    /// FFmpeg output options for this profile (everything between input and output path)
    pub fn ffmpeg_args(&self) -> Vec<String> {
        let mut args = args!["-c:v", self.video_codec, "-preset", self.preset, "-crf", self.crf];
        if self.fast_start {
            args.extend(args!["-movflags", "+faststart"]);
        }
        if self.copy_audio {
            args.extend(args!["-c:a", "copy"]);
        }
        args
    }
}

/// External encoder capability
#[async_trait]
pub trait Transcoder: Send + Sync {
    /// Tool name for logs
    fn name(&self) -> &str;

    /// Fail early if the tool cannot run at all
    async fn check_available(&self) -> Result<(), ShrinkError> {
        Ok(())
    }

    /// Encode `source` into `destination`; returns once the tool has exited
    async fn encode(
        &self,
        source: &Path,
        destination: &Path,
        profile: &EncodeProfile,
    ) -> Result<(), ShrinkError>;
}

/// Transcoder running the `ffmpeg` binary
pub struct FfmpegTranscoder {
    program: Option<PathBuf>,
}

impl FfmpegTranscoder {
    /// Resolve ffmpeg from `TOOLS_DIR` or PATH
    pub fn new() -> Self {
        Self {
            program: ToolPathResolver::new().resolve_tool("ffmpeg"),
        }
    }

    /// Use a specific ffmpeg binary
    pub fn with_program(program: PathBuf) -> Self {
        Self {
            program: Some(program),
        }
    }

    fn program(&self) -> Result<&Path, ShrinkError> {
        self.program.as_deref().ok_or_else(|| {
            ShrinkError::MissingDependency(format!(
                "ffmpeg is required for transcoding (install with: {})",
                ToolPathResolver::install_hint("ffmpeg")
            ))
        })
    }

    fn build_command(&self, program: &Path, source: &Path, destination: &Path, profile: &EncodeProfile) -> Command {
        let mut cmd = Command::new(program);
        cmd.args(["-hide_banner", "-nostdin", "-y"]);

        // Suppress FFmpeg chatter unless in debug mode
        if !tracing::enabled!(tracing::Level::DEBUG) {
            cmd.args(["-loglevel", "warning"]);
        }

        cmd.arg("-i")
            .arg(source)
            .args(profile.ffmpeg_args())
            .arg(destination)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            // A timed-out task drops this future; take the child down with it
            .kill_on_drop(true);
        cmd
    }
}

impl Default for FfmpegTranscoder {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transcoder for FfmpegTranscoder {
    fn name(&self) -> &str {
        "ffmpeg"
    }

    async fn check_available(&self) -> Result<(), ShrinkError> {
        let program = self.program()?;
        let status = Command::new(program)
            .arg("-version")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .map_err(|e| ShrinkError::MissingDependency(format!("cannot execute {}: {}", program.display(), e)))?;

        if !status.success() {
            return Err(ShrinkError::MissingDependency(format!(
                "{} -version exited with {}",
                program.display(),
                status
            )));
        }
        Ok(())
    }

    async fn encode(
        &self,
        source: &Path,
        destination: &Path,
        profile: &EncodeProfile,
    ) -> Result<(), ShrinkError> {
        let program = self.program()?;
        debug!(
            "🎬 Encoding {} -> {} (crf {}, preset {})",
            source.display(),
            destination.display(),
            profile.crf,
            profile.preset
        );

        let start_time = std::time::Instant::now();
        let output = self
            .build_command(program, source, destination, profile)
            .output()
            .await
            .map_err(|e| ShrinkError::Transcode {
                path: source.to_path_buf(),
                message: format!("failed to execute {}: {}", program.display(), e),
            })?;

        if !output.status.success() {
            let tail = stderr_tail(&output.stderr, 5);
            return Err(ShrinkError::Transcode {
                path: source.to_path_buf(),
                message: if tail.is_empty() {
                    format!("ffmpeg exited with {}", output.status)
                } else {
                    format!("ffmpeg exited with {}: {}", output.status, tail)
                },
            });
        }

        debug!(
            "✅ Encoded {} in {:.1}s",
            source.display(),
            start_time.elapsed().as_secs_f64()
        );
        Ok(())
    }
}
