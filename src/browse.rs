//! Read-side CLI commands: `sections`, `list`, `pages` and `link`.
//!
//! Each command loads the index written by `shelf index` and prints to
//! stdout. They share their logic with the HTTP backend through
//! [`crate::library`], [`crate::pages`] and [`crate::link`].

use anyhow::{anyhow, bail, Result};

use crate::config::Config;
use crate::library::{display_tags, headline, Library, Selection};
use crate::link::share_url;
use crate::pages::{scroll_target, PageLayout};

fn load_library(config: &Config) -> Result<Library> {
    Library::load(&config.library.index_path())
}

/// `shelf sections`: one line per section, values comma-separated.
pub fn run_sections(config: &Config) -> Result<()> {
    let library = load_library(config)?;
    let sections = library.sections();
    if sections.is_empty() {
        println!("No tags.");
        return Ok(());
    }
    for section in sections {
        println!("{}: {}", section.key, section.values.join(", "));
    }
    Ok(())
}

/// `shelf list`: manuals matching every `--tag` section and the search text.
pub fn run_list(config: &Config, tags: &[String], search: Option<&str>, json: bool) -> Result<()> {
    let library = load_library(config)?;
    let selection = Selection::from_filters(tags)?;
    let manuals = library.filter(&selection, search.unwrap_or_default());

    if json {
        println!("{}", serde_json::to_string_pretty(&manuals)?);
        return Ok(());
    }

    if manuals.is_empty() {
        println!("No manuals.");
        return Ok(());
    }

    for (i, manual) in manuals.iter().enumerate() {
        println!("{}. {}", i + 1, headline(manual));
        println!("    path: {}", manual.path);
        if let Some(title) = &manual.title {
            println!("    title: {}", title);
        }
        println!("    pages: {}", manual.page_count);
        let tags = display_tags(manual);
        if !tags.is_empty() {
            println!("    tags: {}", tags.join(", "));
        }
        println!();
    }
    println!("{} of {} manuals", manuals.len(), library.manuals().len());
    Ok(())
}

/// `shelf pages`: hidden and visible pages of one manual.
pub fn run_pages(config: &Config, path: &str) -> Result<()> {
    let library = load_library(config)?;
    let manual = library
        .find(path)
        .ok_or_else(|| anyhow!("manual not in index: {}", path))?;
    let layout = PageLayout::for_manual(manual);

    println!("{}", layout.path);
    println!("  pages: {}", layout.page_count);
    println!("  hidden: {}", compact_ranges(&layout.hidden));
    println!("  visible: {}", compact_ranges(&layout.visible));
    Ok(())
}

/// `shelf link`: absolute deep link to a manual, optionally at a page. A
/// hidden page is moved to the page the viewer would actually show.
pub fn run_link(config: &Config, path: &str, page: Option<u32>) -> Result<()> {
    let library = load_library(config)?;
    let manual = library
        .find(path)
        .ok_or_else(|| anyhow!("manual not in index: {}", path))?;

    let page = match page {
        Some(0) => bail!("--page must be at least 1"),
        Some(requested) => {
            let layout = PageLayout::for_manual(manual);
            let target = scroll_target(requested, &layout.visible);
            if target != Some(requested) {
                tracing::info!(
                    "page {} of {} is not shown, linking to {:?}",
                    requested,
                    manual.path,
                    target
                );
            }
            target
        }
        None => None,
    };

    println!(
        "{}",
        share_url(&config.server.public_url(), &manual.path, page)
    );
    Ok(())
}

/// "1-3, 7, 9-12" for an ascending page list; "none" when empty.
fn compact_ranges(pages: &[u32]) -> String {
    let mut parts: Vec<String> = Vec::new();
    let mut iter = pages.iter().copied().peekable();
    while let Some(start) = iter.next() {
        let mut end = start;
        while iter.peek() == Some(&(end + 1)) {
            end += 1;
            iter.next();
        }
        parts.push(if start == end {
            start.to_string()
        } else {
            format!("{}-{}", start, end)
        });
    }
    if parts.is_empty() {
        "none".to_string()
    } else {
        parts.join(", ")
    }
}
