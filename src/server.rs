//! Read-only HTTP backend for the manual viewer.
//!
//! Serves the index, its tag sections, filtered listings, page layouts and
//! the PDFs themselves. The index is re-read on every request, so a fresh
//! `shelf index` run is picked up without restarting. The server never
//! writes to the library.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`  | `/health` | Health check (returns version) |
//! | `GET`  | `/index.json` | The index document as written by the indexer |
//! | `GET`  | `/api/sections` | Tag sections for the filter sidebar |
//! | `GET`  | `/api/manuals?q=..&tag=k=v` | Manuals matching a search and tag selection |
//! | `GET`  | `/api/pages/{*path}` | Hidden and visible pages of one manual |
//! | `GET`  | `/api/share?pdf=..&page=..` | Absolute deep link for sharing |
//! | `GET`  | `/pdf/{*path}` | PDF bytes, only for manuals in the index |
//!
//! # Error Contract
//!
//! ```json
//! { "error": { "code": "not_found", "message": "manual not in index: tv.pdf" } }
//! ```
//!
//! Error codes: `bad_request` (400), `not_found` (404),
//! `index_unavailable` (503), `internal` (500).
//!
//! # CORS
//!
//! All origins, methods, and headers are permitted so a statically hosted
//! front end can call the API from another origin.

use axum::{
    extract::{Path, RawQuery, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::config::Config;
use crate::library::{headline, Library, Selection};
use crate::link::{parse_query, share_url, DeepLink};
use crate::models::{IndexDocument, ManualRecord};
use crate::pages::PageLayout;
use crate::sections::TagSection;

/// Shared application state passed to all route handlers via Axum's `State` extractor.
#[derive(Clone)]
struct AppState {
    config: Arc<Config>,
}

impl AppState {
    fn library(&self) -> Result<Library, AppError> {
        let path = self.config.library.index_path();
        Library::load(&path).map_err(|e| {
            tracing::warn!("index unavailable: {:#}", e);
            AppError::new(ErrorCode::IndexUnavailable, format!("{:#}", e))
        })
    }
}

/// Builds the router with all routes and CORS applied.
pub fn router(config: &Config) -> Router {
    let state = AppState {
        config: Arc::new(config.clone()),
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handle_health))
        .route("/index.json", get(handle_index))
        .route("/api/sections", get(handle_sections))
        .route("/api/manuals", get(handle_manuals))
        .route("/api/pages/{*path}", get(handle_pages))
        .route("/api/share", get(handle_share))
        .route("/pdf/{*path}", get(handle_pdf))
        .layer(cors)
        .with_state(state)
}

/// Starts the viewer backend on `[server].bind` and runs until the process
/// is terminated.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let bind_addr = config.server.bind.clone();
    let app = router(config);

    tracing::info!(
        "serving {} on http://{}",
        config.library.index_path().display(),
        bind_addr
    );
    println!("Viewer backend listening on http://{}", bind_addr);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// ============ Error response ============

/// Machine-readable error codes of the JSON error contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ErrorCode {
    BadRequest,
    NotFound,
    IndexUnavailable,
    Internal,
}

impl ErrorCode {
    fn as_str(self) -> &'static str {
        match self {
            ErrorCode::BadRequest => "bad_request",
            ErrorCode::NotFound => "not_found",
            ErrorCode::IndexUnavailable => "index_unavailable",
            ErrorCode::Internal => "internal",
        }
    }

    fn status(self) -> StatusCode {
        match self {
            ErrorCode::BadRequest => StatusCode::BAD_REQUEST,
            ErrorCode::NotFound => StatusCode::NOT_FOUND,
            ErrorCode::IndexUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            ErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Debug)]
struct AppError {
    code: ErrorCode,
    message: String,
}

impl AppError {
    fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    fn not_in_index(path: &str) -> Self {
        Self::new(ErrorCode::NotFound, format!("manual not in index: {}", path))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({
            "error": { "code": self.code.as_str(), "message": self.message }
        });
        (self.code.status(), Json(body)).into_response()
    }
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ============ GET /index.json ============

async fn handle_index(State(state): State<AppState>) -> Result<Json<IndexDocument>, AppError> {
    let library = state.library()?;
    Ok(Json(library.document().clone()))
}

// ============ GET /api/sections ============

#[derive(Serialize)]
struct SectionsResponse {
    sections: Vec<TagSection>,
}

async fn handle_sections(
    State(state): State<AppState>,
) -> Result<Json<SectionsResponse>, AppError> {
    let library = state.library()?;
    Ok(Json(SectionsResponse {
        sections: library.sections(),
    }))
}

// ============ GET /api/manuals ============

/// A manual as listed by the viewer, with its display heading.
#[derive(Serialize)]
struct ManualListing<'a> {
    #[serde(flatten)]
    manual: &'a ManualRecord,
    headline: String,
}

#[derive(Serialize)]
struct ManualsResponse<'a> {
    total: usize,
    manuals: Vec<ManualListing<'a>>,
}

/// Handler for `GET /api/manuals`.
///
/// `tag` may repeat (`?tag=brand=LG&tag=device=tv`), which is why the raw
/// query is parsed here instead of through `Query<T>`.
async fn handle_manuals(
    State(state): State<AppState>,
    RawQuery(query): RawQuery,
) -> Result<Response, AppError> {
    let params = parse_query(query.as_deref().unwrap_or_default());
    let filters: Vec<&str> = params
        .iter()
        .filter(|(k, _)| k == "tag")
        .map(|(_, v)| v.as_str())
        .collect();
    let search = params
        .iter()
        .find(|(k, _)| k == "q")
        .map(|(_, v)| v.as_str())
        .unwrap_or_default();

    let selection = Selection::from_filters(&filters)
        .map_err(|e| AppError::new(ErrorCode::BadRequest, e.to_string()))?;

    let library = state.library()?;
    let manuals: Vec<ManualListing> = library
        .filter(&selection, search)
        .into_iter()
        .map(|manual| ManualListing {
            headline: headline(manual),
            manual,
        })
        .collect();

    Ok(Json(ManualsResponse {
        total: library.manuals().len(),
        manuals,
    })
    .into_response())
}

// ============ GET /api/pages/{*path} ============

async fn handle_pages(
    State(state): State<AppState>,
    Path(path): Path<String>,
) -> Result<Json<PageLayout>, AppError> {
    let library = state.library()?;
    let manual = library
        .find(&path)
        .ok_or_else(|| AppError::not_in_index(&path))?;
    Ok(Json(PageLayout::for_manual(manual)))
}

// ============ GET /api/share ============

#[derive(Serialize)]
struct ShareResponse {
    url: String,
}

async fn handle_share(
    State(state): State<AppState>,
    RawQuery(query): RawQuery,
) -> Result<Json<ShareResponse>, AppError> {
    let link = DeepLink::from_query(query.as_deref().unwrap_or_default())
        .ok_or_else(|| AppError::new(ErrorCode::BadRequest, "pdf parameter is required"))?;

    let library = state.library()?;
    if library.find(&link.pdf).is_none() {
        return Err(AppError::not_in_index(&link.pdf));
    }

    Ok(Json(ShareResponse {
        url: share_url(&state.config.server.public_url(), &link.pdf, link.page),
    }))
}

// ============ GET /pdf/{*path} ============

/// Handler for `GET /pdf/{*path}`.
///
/// Only paths listed in the index are served, which keeps requests from
/// reaching files outside the library.
async fn handle_pdf(
    State(state): State<AppState>,
    Path(path): Path<String>,
) -> Result<Response, AppError> {
    let library = state.library()?;
    let manual = library
        .find(&path)
        .ok_or_else(|| AppError::not_in_index(&path))?;

    let file = state.config.library.root.join(&manual.path);
    let bytes = tokio::fs::read(&file).await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            AppError::new(
                ErrorCode::NotFound,
                format!("file missing from library: {}", manual.path),
            )
        } else {
            tracing::warn!("failed to read {}: {}", file.display(), e);
            AppError::new(ErrorCode::Internal, format!("failed to read {}", manual.path))
        }
    })?;

    Ok(([(header::CONTENT_TYPE, "application/pdf")], bytes).into_response())
}
