// ABOUTME: File manifest for a deployment: every application file with its SHA-1 digest.
// ABOUTME: The provider deduplicates uploads by digest, so the manifest drives uploads too.

use serde::Serialize;
use snafu::ResultExt;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

use super::error::{ProviderError, ReadFileSnafu, WalkSnafu};

/// Directory names never uploaded.
pub const IGNORED_DIRS: &[&str] = &[".git", "node_modules", ".vercel", ".now"];

/// One file of the deployment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileEntry {
    /// Path relative to the application root, `/`-separated.
    pub file: String,
    /// Hex SHA-1 of the contents.
    pub sha: String,
    pub size: u64,
    #[serde(skip)]
    pub path: PathBuf,
}

/// All files under an application root, sorted by relative path.
#[derive(Debug, Clone, Default)]
pub struct FileManifest {
    entries: Vec<FileEntry>,
}

impl FileManifest {
    /// Walk `root` and hash every regular file outside the ignored directories.
    pub fn build(root: &Path) -> Result<Self, ProviderError> {
        let walker = WalkDir::new(root)
            .follow_links(true)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| !is_ignored(e));

        let mut entries = Vec::new();
        for entry in walker {
            let entry = entry.context(WalkSnafu { path: root })?;
            if !entry.file_type().is_file() {
                continue;
            }

            let path = entry.path();
            let content = std::fs::read(path).context(ReadFileSnafu { path })?;
            let sha = hex::encode(sha1_smol::Sha1::from(&content).digest().bytes());

            entries.push(FileEntry {
                file: relative_name(root, path),
                sha,
                size: content.len() as u64,
                path: path.to_path_buf(),
            });
        }

        tracing::debug!(files = entries.len(), root = %root.display(), "hashed application files");
        Ok(Self { entries })
    }

    pub fn entries(&self) -> &[FileEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The first entry for each distinct digest, in manifest order.
    pub fn unique_digests(&self) -> Vec<&FileEntry> {
        let mut seen = HashSet::new();
        self.entries
            .iter()
            .filter(|entry| seen.insert(entry.sha.as_str()))
            .collect()
    }
}

fn is_ignored(entry: &DirEntry) -> bool {
    entry.depth() > 0
        && entry.file_type().is_dir()
        && entry
            .file_name()
            .to_str()
            .is_some_and(|name| IGNORED_DIRS.contains(&name))
}

fn relative_name(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
