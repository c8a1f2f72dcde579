//! Project classification
//!
//! Pure inspection of an extracted directory: normalize to the effective
//! project root, then label the tree STATIC, SERVER, or UNKNOWN. The caller
//! persists both outputs; nothing here mutates the tree.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::debug;
use walkdir::WalkDir;

use crate::domain::value_objects::ProjectKind;

/// Maven build descriptor marking a server project.
pub const BUILD_DESCRIPTOR: &str = "pom.xml";
/// Conventional server source layout.
pub const SERVER_SOURCE_DIR: &str = "src/main/java";

pub struct ProjectClassifier;

impl Default for ProjectClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl ProjectClassifier {
    pub fn new() -> Self {
        Self
    }

    /// Normalize an extracted directory to its effective project root.
    ///
    /// Archives often extract into a single wrapper folder; when the given
    /// directory has neither an HTML file nor a build descriptor at its top
    /// level and contains exactly one subdirectory, that subdirectory is the
    /// root. Idempotent: applying it to its own output returns the same path.
    pub fn find_root(&self, extracted: &Path) -> io::Result<PathBuf> {
        if has_html_at_top_level(extracted)? || extracted.join(BUILD_DESCRIPTOR).is_file() {
            return Ok(extracted.to_path_buf());
        }

        let mut dirs = Vec::new();
        for entry in fs::read_dir(extracted)? {
            let entry = entry?;
            if entry.file_type()?.is_dir() {
                dirs.push(entry.path());
            }
        }

        if dirs.len() == 1 {
            let root = dirs.remove(0);
            debug!(root = %root.display(), "Unwrapped single-folder archive");
            return Ok(root);
        }

        Ok(extracted.to_path_buf())
    }

    /// Label a project root. First match wins: build descriptor or server
    /// source layout ⇒ Server; any HTML file ⇒ Static; otherwise Unknown.
    pub fn classify(&self, root: &Path) -> ProjectKind {
        if contains_file_named(root, BUILD_DESCRIPTOR) || root.join(SERVER_SOURCE_DIR).is_dir() {
            return ProjectKind::Server;
        }

        if contains_html_file(root) {
            return ProjectKind::Static;
        }

        ProjectKind::Unknown
    }
}

fn has_html_at_top_level(dir: &Path) -> io::Result<bool> {
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if entry.file_type()?.is_file() && is_html_name(&entry.file_name().to_string_lossy()) {
            return Ok(true);
        }
    }
    Ok(false)
}

fn contains_file_named(root: &Path, name: &str) -> bool {
    WalkDir::new(root)
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_ignored(e))
        .filter_map(Result::ok)
        .any(|e| e.file_type().is_file() && e.file_name() == name)
}

fn contains_html_file(root: &Path) -> bool {
    WalkDir::new(root)
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_ignored(e))
        .filter_map(Result::ok)
        .any(|e| e.file_type().is_file() && is_html_name(&e.file_name().to_string_lossy()))
}

fn is_html_name(name: &str) -> bool {
    let lower = name.to_lowercase();
    lower.ends_with(".html") || lower.ends_with(".htm")
}

/// Directories that never decide a classification.
fn is_ignored(entry: &walkdir::DirEntry) -> bool {
    entry
        .file_name()
        .to_str()
        .map(|s| s.starts_with('.') || s == "node_modules" || s == "target")
        .unwrap_or(false)
}
