//! Directory scanner and content hasher.
//!
//! Walks the library root, splitting regular files into PDFs and `.tags`
//! sidecars by file-name suffix (case-insensitive, so a file named just
//! `.pdf` counts), and pairs each PDF
//! with the sidecar that shares its directory and base name.

use anyhow::{bail, Context, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::config::LibraryConfig;
use crate::tags::sidecar_stem;

/// Files found under the library root, each list sorted by path.
#[derive(Debug, Default, Clone)]
pub struct ScanResult {
    pub pdfs: Vec<PathBuf>,
    pub tag_files: Vec<PathBuf>,
}

impl ScanResult {
    /// Maps each tag file's pairing stem to the tag file.
    pub fn sidecars(&self) -> HashMap<PathBuf, PathBuf> {
        self.tag_files
            .iter()
            .map(|tags| (sidecar_stem(tags), tags.clone()))
            .collect()
    }
}

pub fn scan_library(config: &LibraryConfig) -> Result<ScanResult> {
    let root = &config.root;
    if !root.is_dir() {
        bail!("Library root does not exist: {}", root.display());
    }

    let exclude_set = build_globset(&config.exclude_globs)?;
    let mut result = ScanResult::default();

    let walker = WalkDir::new(root).follow_links(config.follow_symlinks);
    for entry in walker {
        let entry =
            entry.with_context(|| format!("Failed to scan library root {}", root.display()))?;
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        let relative = relative_path(root, path);
        if exclude_set.is_match(&relative) {
            continue;
        }

        let name = file_name_lowercase(path);
        if name.ends_with(".pdf") {
            result.pdfs.push(path.to_path_buf());
        } else if name.ends_with(".tags") {
            result.tag_files.push(path.to_path_buf());
        }
    }

    result.pdfs.sort();
    result.tag_files.sort();

    tracing::debug!(
        pdfs = result.pdfs.len(),
        tag_files = result.tag_files.len(),
        "scanned {}",
        root.display()
    );

    Ok(result)
}

/// `/`-separated path of `path` relative to `root`.
pub fn relative_path(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

fn file_name_lowercase(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default()
}

/// `sha256:<hex>` digest of a document's bytes.
pub fn hash_bytes(bytes: &[u8]) -> String {
    format!("sha256:{}", hex::encode(Sha256::digest(bytes)))
}

fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern)?);
    }
    Ok(builder.build()?)
}
