//! Source-tree implementations
//!
//! [`FsTree`] is the production view over a real project directory;
//! [`MemTree`] backs adapter tests and dry runs without touching disk.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use walkdir::WalkDir;

use crate::domain::services::SourceTree;

/// A project tree rooted at a real directory. All paths are root-relative.
pub struct FsTree {
    root: PathBuf,
}

impl FsTree {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn absolute(&self, path: &Path) -> PathBuf {
        self.root.join(path)
    }
}

impl SourceTree for FsTree {
    fn read(&self, path: &Path) -> io::Result<String> {
        fs::read_to_string(self.absolute(path))
    }

    fn write(&self, path: &Path, contents: &str) -> io::Result<()> {
        let absolute = self.absolute(path);
        if let Some(parent) = absolute.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(absolute, contents)
    }

    fn exists(&self, path: &Path) -> bool {
        self.absolute(path).exists()
    }

    fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        fs::create_dir_all(self.absolute(path))
    }

    fn files(&self) -> io::Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        for entry in WalkDir::new(&self.root).into_iter().filter_map(Result::ok) {
            if entry.file_type().is_file() {
                if let Ok(relative) = entry.path().strip_prefix(&self.root) {
                    files.push(relative.to_path_buf());
                }
            }
        }
        files.sort();
        Ok(files)
    }
}

/// An in-memory project tree: a sorted map of relative path → contents.
#[derive(Default)]
pub struct MemTree {
    entries: RwLock<BTreeMap<PathBuf, String>>,
}

impl MemTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the tree with a file, creating it eagerly.
    pub fn with_file(self, path: impl Into<PathBuf>, contents: impl Into<String>) -> Self {
        self.entries
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .insert(path.into(), contents.into());
        self
    }

    /// Snapshot of a single file's contents, if present.
    pub fn contents(&self, path: &Path) -> Option<String> {
        self.entries
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .get(path)
            .cloned()
    }
}

impl SourceTree for MemTree {
    fn read(&self, path: &Path) -> io::Result<String> {
        self.entries
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .get(path)
            .cloned()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, path.display().to_string()))
    }

    fn write(&self, path: &Path, contents: &str) -> io::Result<()> {
        self.entries
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .insert(path.to_path_buf(), contents.to_string());
        Ok(())
    }

    fn exists(&self, path: &Path) -> bool {
        self.entries
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .contains_key(path)
    }

    fn create_dir_all(&self, _path: &Path) -> io::Result<()> {
        // Directories are implicit in the map keys.
        Ok(())
    }

    fn files(&self) -> io::Result<Vec<PathBuf>> {
        Ok(self
            .entries
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .keys()
            .cloned()
            .collect())
    }
}
