//! # Path Resolution Module
//!
//! Centralizza il calcolo dei path di destinazione:
//! - `NameRegistry`: prenota nomi univoci per tutta la durata di un run
//!   (`<stem>.mp4`, poi `<stem>_0001.mp4`, `<stem>_0002.mp4`, ...)
//! - `PathResolver::mirror_dir`: replica la struttura dell'input sotto la directory di output

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::debug;

/// Run-scoped reservation of destination names
#[derive(Debug, Clone, Default)]
pub struct NameRegistry {
    reserved: Arc<Mutex<HashSet<PathBuf>>>,
}

impl NameRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve `<dir>/<stem>.<extension>` or the first free counter-suffixed variant.
    ///
    /// A name is taken if it was reserved earlier in this run or exists on
    /// disk. `replacing` names a file that is about to be replaced and may
    /// therefore be reused.
    pub fn reserve(&self, dir: &Path, stem: &str, extension: &str, replacing: Option<&Path>) -> PathBuf {
        let mut reserved = self.reserved.lock().unwrap_or_else(PoisonError::into_inner);

        let is_taken = |candidate: &Path| {
            reserved.contains(candidate) || (candidate.exists() && Some(candidate) != replacing)
        };

        let mut candidate = dir.join(format!("{}.{}", stem, extension));
        let mut counter: u32 = 1;
        while is_taken(&candidate) {
            candidate = dir.join(format!("{}_{:04}.{}", stem, counter, extension));
            counter += 1;
        }

        debug!("Reserved {}", candidate.display());
        reserved.insert(candidate.clone());
        candidate
    }

    pub fn len(&self) -> usize {
        self.reserved.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Utility per calcolare i path di output in modo centralizzato
pub struct PathResolver;

impl PathResolver {
    /// Directory under `output_root` matching the source's directory under `input_root`
    pub fn mirror_dir(source: &Path, input_root: &Path, output_root: &Path) -> PathBuf {
        let parent = source.parent().unwrap_or(Path::new(""));
        match parent.strip_prefix(input_root) {
            Ok(relative) => output_root.join(relative),
            Err(e) => {
                debug!("Strip prefix failed for {}: {} - using output root", source.display(), e);
                output_root.to_path_buf()
            }
        }
    }

    /// Crea le directory parent se necessario
    pub async fn ensure_parent_dirs(path: &Path) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_counter_suffix_in_reservation_order() {
        let temp_dir = TempDir::new().unwrap();
        let registry = NameRegistry::new();
        let dir = temp_dir.path();

        let names: Vec<PathBuf> = (0..3)
            .map(|_| registry.reserve(dir, "20200101_000000", "mp4", None))
            .collect();

        assert_eq!(
            names,
            vec![
                dir.join("20200101_000000.mp4"),
                dir.join("20200101_000000_0001.mp4"),
                dir.join("20200101_000000_0002.mp4"),
            ]
        );
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn test_existing_files_are_skipped() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path();
        std::fs::write(dir.join("20200101_000000.mp4"), b"x").unwrap();
        std::fs::write(dir.join("20200101_000000_0001.mp4"), b"x").unwrap();

        let registry = NameRegistry::new();
        assert_eq!(
            registry.reserve(dir, "20200101_000000", "mp4", None),
            dir.join("20200101_000000_0002.mp4")
        );
    }

    #[test]
    fn test_replaced_file_name_can_be_reused() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path();
        let source = dir.join("20200101_000000.mp4");
        std::fs::write(&source, b"x").unwrap();

        let registry = NameRegistry::new();
        assert_eq!(registry.reserve(dir, "20200101_000000", "mp4", Some(&source)), source);
        // Once reserved, nobody else gets it
        assert_eq!(
            registry.reserve(dir, "20200101_000000", "mp4", Some(&source)),
            dir.join("20200101_000000_0001.mp4")
        );
    }

    #[test]
    fn test_registry_clones_share_reservations() {
        let temp_dir = TempDir::new().unwrap();
        let registry = NameRegistry::new();
        let clone = registry.clone();

        let first = registry.reserve(temp_dir.path(), "a", "mp4", None);
        let second = clone.reserve(temp_dir.path(), "a", "mp4", None);
        assert_ne!(first, second);
    }

    #[test]
    fn test_mirror_dir() {
        let out = Path::new("/out");
        assert_eq!(
            PathResolver::mirror_dir(Path::new("/in/x/y/a.mp4"), Path::new("/in"), out),
            PathBuf::from("/out/x/y")
        );
        assert_eq!(
            PathResolver::mirror_dir(Path::new("/in/a.mp4"), Path::new("/in"), out),
            PathBuf::from("/out")
        );
        assert_eq!(
            PathResolver::mirror_dir(Path::new("/elsewhere/a.mp4"), Path::new("/in"), out),
            PathBuf::from("/out")
        );
    }
}
