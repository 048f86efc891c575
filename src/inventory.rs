//! Local inventory: archive names already stored on disk.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::fs::FileSystem;

/// Lower-cased names of regular files found in one or more directories.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Inventory {
    names: HashSet<String>,
}

impl Inventory {
    /// Scans each directory in order. Paths that are missing or not
    /// directories contribute nothing.
    pub async fn scan<F: FileSystem + ?Sized>(fs: &F, dirs: &[PathBuf]) -> Self {
        let mut inventory = Self::default();
        for dir in dirs {
            if !fs.is_dir(dir).await {
                log::debug!("Skipping inventory of {}: not a directory", dir.display());
                continue;
            }
            match fs.list_file_names(dir).await {
                Ok(names) => {
                    log::debug!("{} file(s) in {}", names.len(), dir.display());
                    inventory.extend(names);
                }
                Err(e) => log::warn!("Could not list {}: {e}", dir.display()),
            }
        }
        inventory
    }

    /// Case-insensitive membership test.
    #[must_use]
    pub fn contains(&self, filename: &str) -> bool {
        self.names.contains(&filename.to_lowercase())
    }

    /// Number of distinct names.
    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Returns true if no files were found.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl<S: AsRef<str>> Extend<S> for Inventory {
    fn extend<I: IntoIterator<Item = S>>(&mut self, iter: I) {
        self.names
            .extend(iter.into_iter().map(|name| name.as_ref().to_lowercase()));
    }
}

impl<S: AsRef<str>> FromIterator<S> for Inventory {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut inventory = Self::default();
        inventory.extend(iter);
        inventory
    }
}

/// Directories searched for existing archives: the target and, when distinct,
/// its parent, so sibling collections are not downloaded twice.
#[must_use]
pub fn candidate_dirs(target: &Path) -> Vec<PathBuf> {
    let mut dirs = vec![target.to_path_buf()];
    let parent = match target.parent() {
        Some(p) if p.as_os_str().is_empty() => PathBuf::from("."),
        Some(p) => p.to_path_buf(),
        None => return dirs,
    };
    if parent != target {
        dirs.push(parent);
    }
    dirs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::TokioFileSystem;
    use tempfile::TempDir;

    #[tokio::test]
    async fn scan_is_case_insensitive() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("Song.zip"), b"x").unwrap();

        let inventory = Inventory::scan(&TokioFileSystem, &[dir.path().to_path_buf()]).await;
        assert!(inventory.contains("song.zip"));
        assert!(inventory.contains("SONG.ZIP"));
        assert!(!inventory.contains("other.zip"));
    }

    #[tokio::test]
    async fn scan_merges_target_and_parent() {
        let root = TempDir::new().unwrap();
        let target = root.path().join("cambridge");
        std::fs::create_dir(&target).unwrap();
        std::fs::write(target.join("a.zip"), b"x").unwrap();
        std::fs::write(root.path().join("b.zip"), b"x").unwrap();
        std::fs::create_dir(root.path().join("c.zip")).unwrap();

        let inventory = Inventory::scan(&TokioFileSystem, &candidate_dirs(&target)).await;
        assert!(inventory.contains("a.zip"));
        assert!(inventory.contains("b.zip"));
        assert!(!inventory.contains("c.zip"));
        // "cambridge" itself is a directory, not an archive
        assert!(!inventory.contains("cambridge"));
        assert_eq!(inventory.len(), 2);
    }

    #[tokio::test]
    async fn missing_and_non_directory_paths_contribute_nothing() {
        let root = TempDir::new().unwrap();
        let file = root.path().join("not-a-dir.zip");
        std::fs::write(&file, b"x").unwrap();

        let inventory = Inventory::scan(
            &TokioFileSystem,
            &[root.path().join("missing"), file],
        )
        .await;
        assert!(inventory.is_empty());
    }

    #[test]
    fn candidate_dirs_include_parent() {
        assert_eq!(
            candidate_dirs(Path::new("data/cambridge")),
            vec![PathBuf::from("data/cambridge"), PathBuf::from("data")]
        );
    }

    #[test]
    fn candidate_dirs_relative_leaf_uses_current_dir() {
        assert_eq!(
            candidate_dirs(Path::new("downloads")),
            vec![PathBuf::from("downloads"), PathBuf::from(".")]
        );
    }

    #[test]
    fn candidate_dirs_root_has_no_parent() {
        assert_eq!(candidate_dirs(Path::new("/")), vec![PathBuf::from("/")]);
    }

    #[test]
    fn inventory_from_names() {
        let inventory: Inventory = ["A.zip", "a.ZIP", "b.zip"].into_iter().collect();
        assert_eq!(inventory.len(), 2);
    }
}
