//! # Manual Shelf
//!
//! A local-first index and viewer backend for a folder of product manuals.
//!
//! Manual Shelf walks a directory of PDFs, asks an LLM for each manual's
//! brand, model, device and manual type (once per file content, cached by
//! hash), merges those with hand-written `.tags` sidecars, and writes a
//! single `index.json`. The viewer side groups tags into filter sections,
//! hides pages named by `!hide-page-range` directives, and builds shareable
//! deep links.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐   ┌──────────────┐   ┌────────────┐
//! │   Scanner   │──▶│  Reconciler  │──▶│ index.json │
//! │ PDFs + tags │   │ cache + LLM  │   │ merged tags│
//! └─────────────┘   └──────────────┘   └─────┬──────┘
//!                                            │
//!                      ┌─────────────────────┤
//!                      ▼                     ▼
//!                 ┌──────────┐         ┌──────────┐
//!                 │   CLI    │         │   HTTP   │
//!                 │ (shelf)  │         │ (viewer) │
//!                 └──────────┘         └──────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! shelf index ./pdf                 # build ./pdf/index.json
//! shelf sections                    # tag sections for filtering
//! shelf list --tag brand=Siemens    # filter manuals
//! shelf link kitchen/eq700.pdf --page 12
//! shelf serve                       # start the viewer backend
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Index and cache data types |
//! | [`scan`] | Directory scanner and content hasher |
//! | [`tags`] | Tag grammar, `.tags` files, tag merge |
//! | [`pdf`] | Page count, title and text from PDF bytes |
//! | [`extractor`] | LLM metadata extraction |
//! | [`cache`] | Extraction cache reconciler |
//! | [`index`] | Index builder (`shelf index`) |
//! | [`output`] | Atomic JSON file writes |
//! | [`progress`] | Indexing progress on stderr |
//! | [`sections`] | Tag sections for the filter sidebar |
//! | [`library`] | Loaded index, selection filtering and search |
//! | [`pages`] | Hidden page ranges |
//! | [`link`] | Deep links and share URLs |
//! | [`browse`] | Read-side CLI commands |
//! | [`server`] | Viewer HTTP backend |

pub mod browse;
pub mod cache;
pub mod config;
pub mod extractor;
pub mod index;
pub mod library;
pub mod link;
pub mod models;
pub mod output;
pub mod pages;
pub mod pdf;
pub mod progress;
pub mod scan;
pub mod sections;
pub mod server;
pub mod tags;
