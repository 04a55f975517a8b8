// Bird Taxonomy - Web Server
// Read-only REST API over a taxonomy previously written by taxonomy-reader

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::get,
    Router,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tower_http::cors::CorsLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;

use bird_taxonomy::readers::ListSource;
use bird_taxonomy::{
    load_from_dir, RankCounts, ServerConfig, Taxon, TaxonId, Taxonomy, OTHER_LISTS,
};

/// Shared application state
#[derive(Clone)]
struct AppState {
    taxonomy: Arc<Taxonomy>,
    loaded_at: DateTime<Utc>,
}

/// API Response wrapper
#[derive(Serialize)]
struct ApiResponse<T> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T> ApiResponse<T> {
    fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message),
        }
    }
}

/// API root resource
#[derive(Serialize)]
struct RootResponse {
    name: &'static str,
    loaded_at: String,
    version: String,
    links: Vec<&'static str>,
}

#[derive(Serialize)]
struct SourcesResponse {
    checklist: &'static str,
    version: String,
    other_lists: &'static [ListSource],
}

/// Taxon without its subtree (simplified for listings)
#[derive(Serialize)]
struct TaxonSummary {
    rank: String,
    name: String,
    index_name: String,
    sort_index: Option<usize>,
    subtaxa_count: usize,
}

impl TaxonSummary {
    fn new(taxonomy: &Taxonomy, id: TaxonId) -> Self {
        let taxon = taxonomy.get(id);
        Self {
            rank: taxon.rank.to_string(),
            name: taxon.name.clone(),
            index_name: taxon.index_name().to_string(),
            sort_index: taxon.sort_index,
            subtaxa_count: taxonomy.subtaxa(id).len(),
        }
    }
}

#[derive(Serialize)]
struct TaxonDetail {
    #[serde(flatten)]
    taxon: Taxon,
    subtaxa: Vec<TaxonSummary>,
}

#[derive(Serialize)]
struct StatsResponse {
    #[serde(flatten)]
    counts: RankCounts,
    total: usize,
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET / - API root
async fn root(State(state): State<AppState>) -> impl IntoResponse {
    Json(RootResponse {
        name: "Bird Taxonomy HTTP API",
        loaded_at: state.loaded_at.to_rfc3339(),
        version: state.taxonomy.version().to_string(),
        links: vec!["/sources", "/taxa", "/stats"],
    })
}

/// GET /sources - Checklist and cross-referenced lists
async fn get_sources(State(state): State<AppState>) -> impl IntoResponse {
    let t = &state.taxonomy;
    Json(ApiResponse::ok(SourcesResponse {
        checklist: t.checklist().label(),
        version: t.version().to_string(),
        other_lists: OTHER_LISTS,
    }))
}

/// GET /taxa - Top-level taxa
async fn get_taxa(State(state): State<AppState>) -> impl IntoResponse {
    let t = &state.taxonomy;
    let roots: Vec<TaxonSummary> = t
        .roots()
        .iter()
        .map(|id| TaxonSummary::new(t, *id))
        .collect();
    Json(ApiResponse::ok(roots))
}

fn taxon_detail(t: &Taxonomy, name: &str) -> Option<TaxonDetail> {
    let id = t.lookup(name)?;
    Some(TaxonDetail {
        taxon: t.get(id).clone(),
        subtaxa: t
            .subtaxa(id)
            .iter()
            .map(|child| TaxonSummary::new(t, *child))
            .collect(),
    })
}

/// GET /taxa/:name - One taxon by index name (`Path` has already decoded it)
async fn get_taxon(State(state): State<AppState>, Path(name): Path<String>) -> impl IntoResponse {
    match taxon_detail(&state.taxonomy, &name) {
        Some(detail) => (StatusCode::OK, Json(ApiResponse::ok(detail))).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(ApiResponse::<TaxonDetail>::error(format!("no taxon named '{name}'"))),
        )
            .into_response(),
    }
}

/// GET /stats - Per-rank counts
async fn get_stats(State(state): State<AppState>) -> impl IntoResponse {
    let t = &state.taxonomy;
    Json(ApiResponse::ok(StatsResponse {
        counts: *t.counts(),
        total: t.total(),
    }))
}

fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/sources", get(get_sources))
        .route("/taxa", get(get_taxa))
        .route("/taxa/:name", get(get_taxon))
        .route("/stats", get(get_stats))
        .with_state(state)
        .layer(CorsLayer::permissive())
}

// ============================================================================
// Main Server
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = ServerConfig::from_env();
    println!("🐦 Bird Taxonomy - Web Server");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let taxonomy = load_from_dir(&config.taxonomy_dir, config.checklist).with_context(|| {
        format!(
            "no taxonomy at {} (run: taxonomy-reader {} -w FILES...)",
            config.taxonomy_dir.display(),
            config.checklist.dir_name()
        )
    })?;
    info!(
        "Loaded {} {} with {} taxa from {}",
        taxonomy.checklist().label(),
        taxonomy.version(),
        taxonomy.total(),
        config.taxonomy_dir.display()
    );

    let state = AppState {
        taxonomy: Arc::new(taxonomy),
        loaded_at: Utc::now(),
    };
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(&config.addr)
        .await
        .with_context(|| format!("failed to bind to {}", config.addr))?;

    println!("\n🚀 Server running on http://{}", config.addr);
    println!("   API: http://{}/taxa", config.addr);
    println!("\n   Press Ctrl+C to stop\n");

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
