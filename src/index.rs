//! Index builder: scan → hash → inspect → reconcile → merge tags → write.
//!
//! Manuals are processed strictly one after another; an uncached manual
//! blocks the loop on its extraction call. Filesystem errors while scanning,
//! reading or writing abort the run before a partial index is written.
//! Extraction and PDF-parsing problems are per-manual and never abort.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::cache::{ExtractionCache, Lookup};
use crate::config::{Config, LibraryConfig};
use crate::extractor::{create_extractor, MetadataExtractor};
use crate::models::{IndexDocument, ManualRecord};
use crate::output::write_json_atomic;
use crate::pdf::inspect_pdf;
use crate::progress::{IndexProgressEvent, IndexProgressReporter, ProgressMode};
use crate::scan::{hash_bytes, relative_path, scan_library};
use crate::tags::{auto_tags, merge_tags, parse_tags, read_tags_file, sidecar_stem, Tag};

/// Counters from one indexing run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct IndexReport {
    pub manuals: usize,
    pub tag_files: usize,
    pub cache_hits: usize,
    pub extracted: usize,
    pub failed: usize,
    pub skipped: usize,
    pub cache_written: bool,
}

impl IndexReport {
    fn count(&mut self, lookup: Lookup) {
        match lookup {
            Lookup::Hit => self.cache_hits += 1,
            Lookup::Extracted => self.extracted += 1,
            Lookup::Failed => self.failed += 1,
            Lookup::Skipped => self.skipped += 1,
        }
    }

    /// Number of calls made to the extraction provider.
    pub fn extraction_calls(&self) -> usize {
        self.extracted + self.failed
    }
}

/// Builds and writes the index for `library` to `index_path`, and writes the
/// extraction cache if it changed.
pub async fn build_index(
    library: &LibraryConfig,
    index_path: &Path,
    extractor: Option<&dyn MetadataExtractor>,
    progress: &dyn IndexProgressReporter,
) -> Result<(IndexDocument, IndexReport)> {
    let root = &library.root;
    progress.report(IndexProgressEvent::Scanning {
        root: root.display().to_string(),
    });

    let scan = scan_library(library)?;
    let sidecars = scan.sidecars();
    let cache_path = library.cache_path();
    let mut cache = ExtractionCache::load(&cache_path);

    let mut report = IndexReport {
        tag_files: scan.tag_files.len(),
        ..Default::default()
    };
    let total = scan.pdfs.len() as u64;
    let mut manuals = Vec::with_capacity(scan.pdfs.len());

    for (i, pdf_path) in scan.pdfs.iter().enumerate() {
        let rel = relative_path(root, pdf_path);
        progress.report(IndexProgressEvent::Indexing {
            n: i as u64 + 1,
            total,
            path: rel.clone(),
        });

        let record =
            index_manual(pdf_path, &rel, &sidecars, &mut cache, extractor, &mut report).await?;
        manuals.push(record);
    }

    let document = IndexDocument {
        generated_at: Utc::now(),
        manuals,
    };

    write_json_atomic(index_path, &document)
        .with_context(|| format!("Failed to write index: {}", index_path.display()))?;
    report.cache_written = cache.store(&cache_path)?;
    if report.cache_written {
        tracing::info!("{} updated", cache_path.display());
    }

    report.manuals = document.manuals.len();
    Ok((document, report))
}

async fn index_manual(
    pdf_path: &Path,
    rel: &str,
    sidecars: &HashMap<PathBuf, PathBuf>,
    cache: &mut ExtractionCache,
    extractor: Option<&dyn MetadataExtractor>,
    report: &mut IndexReport,
) -> Result<ManualRecord> {
    let stat = std::fs::metadata(pdf_path)
        .with_context(|| format!("Failed to stat {}", pdf_path.display()))?;
    let bytes =
        std::fs::read(pdf_path).with_context(|| format!("Failed to read {}", pdf_path.display()))?;
    let content_hash = hash_bytes(&bytes);
    let info = inspect_pdf(&bytes, rel);

    let (metadata, lookup) = cache.reconcile(rel, &content_hash, &info.text, extractor).await;
    report.count(lookup);

    let user_tags = match sidecars.get(&sidecar_stem(pdf_path)) {
        Some(tags_path) => read_tags_file(tags_path)?,
        None => Vec::new(),
    };
    let tags = merge_tags(&auto_tags(&metadata), &parse_tags(&user_tags));

    tracing::info!(
        "indexed {}: brand='{}', model='{}', device='{}', manualType='{}'",
        rel,
        metadata.brand,
        metadata.model,
        metadata.device,
        metadata.manual_type
    );

    let last_modified = stat
        .modified()
        .map(DateTime::<Utc>::from)
        .unwrap_or_else(|_| DateTime::<Utc>::from(std::time::UNIX_EPOCH));

    Ok(ManualRecord {
        path: rel.to_string(),
        filename: pdf_path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default(),
        content_hash,
        tags: tags.iter().map(Tag::to_string).collect(),
        page_count: info.page_count,
        title: info.title,
        last_modified,
    })
}

/// `shelf index`: resolves paths from config and CLI overrides, builds the
/// index and prints a summary on stdout.
pub async fn run_index(
    config: &Config,
    root: Option<PathBuf>,
    output: Option<PathBuf>,
    progress: Option<ProgressMode>,
) -> Result<()> {
    let mut library = config.library.clone();
    if let Some(root) = root {
        library.root = root;
    }
    let index_path = output.unwrap_or_else(|| library.index_path());

    let extractor = create_extractor(&config.extraction)?;
    let reporter = progress.unwrap_or_else(ProgressMode::default_for_tty).reporter();

    let (_, report) = build_index(
        &library,
        &index_path,
        extractor.as_deref(),
        reporter.as_ref(),
    )
    .await?;

    println!("index {}", library.root.display());
    println!("  manuals: {}", report.manuals);
    println!("  tag files: {}", report.tag_files);
    println!("  cache hits: {}", report.cache_hits);
    if config.extraction.is_enabled() {
        println!("  extracted: {}", report.extracted);
        println!("  extraction failures: {}", report.failed);
    } else {
        println!("  extraction disabled, skipped: {}", report.skipped);
    }
    println!(
        "  cache: {}",
        if report.cache_written { "updated" } else { "unchanged" }
    );
    println!("Index built at {}", index_path.display());
    Ok(())
}
