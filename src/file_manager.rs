//! # File Management Module
//!
//! Questo modulo gestisce tutte le operazioni sui file e la discovery dei filmati.
//!
//! ## Responsabilità:
//! - Classificazione dei file per estensione (`is_movie`)
//! - Discovery ricorsiva dei filmati, saltando le directory nascoste
//! - Operazioni sicure sui file: swap tramite area temporanea, spostamenti
//! - Formattazione human-readable delle dimensioni
//!
//! ## Formati supportati:
//! MPG, MPEG, AVI, MP4, 3GP, MOV (case-insensitive)
//!
//! ## Esempio:
//! ```rust,ignore
//! let tasks = FileManager::collect(Path::new("/movies"), None)?;
//! for task in &tasks {
//!     println!("{}", task.source_path.display());
//! }
//! ```

use crate::error::ShrinkError;
use crate::optimizer::path_resolver::PathResolver;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Extensions recognised as movies (lowercase, without the dot)
pub const MOVIE_EXTENSIONS: &[&str] = &["mpg", "mpeg", "avi", "mp4", "3gp", "mov"];

/// Deepest directory level the walker descends into
pub const MAX_DEPTH: usize = 256;

/// One movie queued for transcoding
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileTask {
    pub source_path: PathBuf,
    /// Where a retained file ends up
    pub destination_dir: PathBuf,
}

/// Manages file operations and discovery
pub struct FileManager;

impl FileManager {
    /// Check if a file is a movie. A bare `.mp4` is a hidden name without
    /// extension and does not count.
    pub fn is_movie(path: &Path) -> bool {
        match path.extension() {
            Some(ext) => {
                let ext_lower = ext.to_string_lossy().to_lowercase();
                MOVIE_EXTENSIONS.contains(&ext_lower.as_str())
            }
            None => false,
        }
    }

    /// Directory names starting with '.' are skipped. Empty names are not hidden.
    pub fn is_hidden_name(name: &OsStr) -> bool {
        name.to_string_lossy().starts_with('.')
    }

    /// Collect every movie under `root`, depth-first, entries sorted by name.
    ///
    /// Any directory that cannot be listed aborts the whole traversal.
    pub fn collect(root: &Path, output_root: Option<&Path>) -> Result<Vec<FileTask>, ShrinkError> {
        let mut tasks = Vec::new();

        let walker = WalkDir::new(root)
            .follow_links(false)
            .max_depth(MAX_DEPTH)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| {
                entry.depth() == 0
                    || !(entry.file_type().is_dir() && Self::is_hidden_name(entry.file_name()))
            });

        for entry in walker {
            let entry = entry.map_err(|source| ShrinkError::Traversal {
                path: source
                    .path()
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|| root.to_path_buf()),
                source,
            })?;

            if !entry.file_type().is_file() || !Self::is_movie(entry.path()) {
                continue;
            }

            let source_path = entry.into_path();
            let destination_dir = match output_root {
                Some(output_root) => PathResolver::mirror_dir(&source_path, root, output_root),
                None => source_path
                    .parent()
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|| root.to_path_buf()),
            };
            debug!("Queued {}", source_path.display());
            tasks.push(FileTask {
                source_path,
                destination_dir,
            });
        }

        Ok(tasks)
    }

    /// Size of a file in bytes
    pub async fn file_size(path: &Path) -> Result<u64, ShrinkError> {
        Ok(fs::metadata(path).await?.len())
    }

    /// Replace `original` with `transcoded`, written to `final_path`.
    ///
    /// The original is copied into a holding directory first and restored
    /// from there if the transcoded copy cannot be put in place. `final_path`
    /// may equal `original`.
    pub async fn swap_into_place(
        original: &Path,
        transcoded: &Path,
        final_path: &Path,
    ) -> Result<(), ShrinkError> {
        let holding = tempfile::Builder::new().prefix("swap").tempdir()?;
        let file_name = original
            .file_name()
            .map(OsStr::to_os_string)
            .unwrap_or_else(|| "original".into());
        let aside = holding.path().join(file_name);

        fs::copy(original, &aside).await?;
        fs::remove_file(original).await?;

        if let Err(e) = fs::copy(transcoded, final_path).await {
            // Restore the original before reporting
            let _ = fs::remove_file(final_path).await;
            if let Err(restore_err) = fs::copy(&aside, original).await {
                warn!(
                    "Could not restore {} from {}: {}",
                    original.display(),
                    aside.display(),
                    restore_err
                );
                // Keep the holding area so the original is not lost
                let kept = holding.keep();
                warn!("Original kept at {}", kept.join(aside.file_name().unwrap_or_default()).display());
            }
            return Err(e.into());
        }

        if let Err(e) = fs::remove_file(transcoded).await {
            warn!("Failed to remove staging file {}: {}", transcoded.display(), e);
        }

        holding.close()?;
        Ok(())
    }

    /// Move a file, falling back to copy + remove across filesystems
    pub async fn move_file(from: &Path, to: &Path) -> Result<(), ShrinkError> {
        if fs::rename(from, to).await.is_ok() {
            return Ok(());
        }
        fs::copy(from, to).await?;
        fs::remove_file(from).await?;
        Ok(())
    }

    /// Get human-readable file size
    pub fn format_size(size: u64) -> String {
        const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
        let mut size = size as f64;
        let mut unit_index = 0;

        while size >= 1024.0 && unit_index < UNITS.len() - 1 {
            size /= 1024.0;
            unit_index += 1;
        }

        if unit_index == 0 {
            format!("{} {}", size as u64, UNITS[unit_index])
        } else {
            format!("{:.2} {}", size, UNITS[unit_index])
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn touch(path: &Path) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, b"data").unwrap();
    }

    #[test]
    fn test_is_movie_case_insensitive() {
        for name in ["a.mpg", "a.MPEG", "a.Avi", "a.mp4", "a.3GP", "a.MoV", "dir/clip.mov"] {
            assert!(FileManager::is_movie(Path::new(name)), "{name}");
        }
        for name in ["a.mkv", "a.jpg", "mp4", "a.mp4.txt", "a.", "a"] {
            assert!(!FileManager::is_movie(Path::new(name)), "{name}");
        }
    }

    #[test]
    fn test_bare_extension_name_is_not_a_movie() {
        // A name that is only a dot plus extension has no extension at all
        assert!(!FileManager::is_movie(Path::new(".mp4")));
        assert!(!FileManager::is_movie(Path::new("trip/.MOV")));
        assert!(FileManager::is_movie(Path::new(".f.mp4")));
    }

    #[test]
    fn test_hidden_name_guard() {
        assert!(FileManager::is_hidden_name(OsStr::new(".cache")));
        assert!(!FileManager::is_hidden_name(OsStr::new("cache")));
        assert!(!FileManager::is_hidden_name(OsStr::new("")));
    }

    #[test]
    fn test_collect_skips_hidden_directories() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        touch(&root.join("b.mp4"));
        touch(&root.join("a.MOV"));
        touch(&root.join("notes.txt"));
        touch(&root.join("trip/day1/c.avi"));
        touch(&root.join("trip/d.3gp"));
        touch(&root.join(".cache/hidden.mp4"));
        touch(&root.join("trip/.thumbs/e.mp4"));
        // Hidden files are still movies, only hidden directories are skipped
        touch(&root.join(".f.mpg"));

        let tasks = FileManager::collect(root, None).unwrap();
        let found: Vec<PathBuf> = tasks
            .iter()
            .map(|t| t.source_path.strip_prefix(root).unwrap().to_path_buf())
            .collect();

        assert_eq!(
            found,
            vec![
                PathBuf::from(".f.mpg"),
                PathBuf::from("a.MOV"),
                PathBuf::from("b.mp4"),
                PathBuf::from("trip/d.3gp"),
                PathBuf::from("trip/day1/c.avi"),
            ]
        );
        for task in &tasks {
            assert_eq!(task.destination_dir, task.source_path.parent().unwrap());
        }
    }

    #[test]
    fn test_collect_hidden_root_is_walked() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().join(".library");
        touch(&root.join("a.mp4"));

        let tasks = FileManager::collect(&root, None).unwrap();
        assert_eq!(tasks.len(), 1);
    }

    #[test]
    fn test_collect_mirrors_output_directory() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().join("in");
        let out = temp_dir.path().join("out");
        touch(&root.join("x/y/a.mp4"));
        touch(&root.join("b.mov"));

        let tasks = FileManager::collect(&root, Some(&out)).unwrap();
        assert_eq!(tasks.len(), 2);
        assert_eq!(tasks[0].destination_dir, out);
        assert_eq!(tasks[1].destination_dir, out.join("x/y"));
    }

    #[test]
    fn test_collect_missing_root_is_fatal() {
        let temp_dir = TempDir::new().unwrap();
        let err = FileManager::collect(&temp_dir.path().join("missing"), None).unwrap_err();
        assert!(matches!(err, ShrinkError::Traversal { .. }));
        assert!(err.is_fatal());
    }

    #[cfg(unix)]
    #[test]
    fn test_collect_does_not_follow_symlinks() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().join("root");
        touch(&root.join("a.mp4"));
        touch(&temp_dir.path().join("elsewhere/b.mp4"));
        std::os::unix::fs::symlink(temp_dir.path().join("elsewhere"), root.join("link")).unwrap();
        std::os::unix::fs::symlink(&root, root.join("loop")).unwrap();

        let tasks = FileManager::collect(&root, None).unwrap();
        assert_eq!(tasks.len(), 1);
        assert!(tasks[0].source_path.ends_with("a.mp4"));
    }

    #[tokio::test]
    async fn test_swap_into_place_new_name() {
        let temp_dir = TempDir::new().unwrap();
        let original = temp_dir.path().join("movie.avi");
        let staged = temp_dir.path().join("staged.mp4");
        let final_path = temp_dir.path().join("20200101_000000.mp4");
        std::fs::write(&original, b"original bytes").unwrap();
        std::fs::write(&staged, b"small").unwrap();

        FileManager::swap_into_place(&original, &staged, &final_path).await.unwrap();

        assert!(!original.exists());
        assert!(!staged.exists());
        assert_eq!(std::fs::read(&final_path).unwrap(), b"small");
    }

    #[tokio::test]
    async fn test_swap_into_place_same_name() {
        let temp_dir = TempDir::new().unwrap();
        let original = temp_dir.path().join("20200101_000000.mp4");
        let staged = temp_dir.path().join("staged.mp4");
        std::fs::write(&original, b"original bytes").unwrap();
        std::fs::write(&staged, b"small").unwrap();

        FileManager::swap_into_place(&original, &staged, &original).await.unwrap();

        assert_eq!(std::fs::read(&original).unwrap(), b"small");
        assert!(!staged.exists());
    }

    #[tokio::test]
    async fn test_swap_restores_original_on_failure() {
        let temp_dir = TempDir::new().unwrap();
        let original = temp_dir.path().join("movie.avi");
        std::fs::write(&original, b"original bytes").unwrap();
        let missing_staged = temp_dir.path().join("never_written.mp4");
        let final_path = temp_dir.path().join("20200101_000000.mp4");

        let result = FileManager::swap_into_place(&original, &missing_staged, &final_path).await;

        assert!(result.is_err());
        assert_eq!(std::fs::read(&original).unwrap(), b"original bytes");
        assert!(!final_path.exists());
    }

    #[test]
    fn test_move_file() {
        let temp_dir = TempDir::new().unwrap();
        let from = temp_dir.path().join("a.mp4");
        let to = temp_dir.path().join("b.mp4");
        std::fs::write(&from, b"bytes").unwrap();

        tokio_test::block_on(FileManager::move_file(&from, &to)).unwrap();

        assert!(!from.exists());
        assert_eq!(std::fs::read(&to).unwrap(), b"bytes");
    }

    #[test]
    fn test_format_size() {
        assert_eq!(FileManager::format_size(512), "512 B");
        assert_eq!(FileManager::format_size(2048), "2.00 KB");
        assert_eq!(FileManager::format_size(5 * 1024 * 1024), "5.00 MB");
    }
}
