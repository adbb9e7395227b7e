//! JSON HTTP API: graph builds and person autocomplete.

use crate::config::Config;
use crate::db::Db;
use crate::error::{ExploreError, Result};
use crate::graph::{GraphBuilder, GraphResult};
use crate::source::SqliteRelationSource;
use crate::suggest::Suggester;
use axum::{
    extract::{Query, State},
    http::{HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Form, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

const PROMPT: &str = "Enter person name to start graph traversal.";

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    db: Db,
    builder: Arc<GraphBuilder>,
    suggester: Arc<Suggester>,
}

impl AppState {
    pub fn new(db: Db, builder: GraphBuilder, suggester: Suggester) -> Self {
        Self {
            db,
            builder: Arc::new(builder),
            suggester: Arc::new(suggester),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        let db = Db::new(config.db_path());
        let suggester = Suggester::new(db.clone(), config.suggest.limit, config.suggest.cache_capacity);
        Self::new(db, GraphBuilder::new(config.graph.limits()), suggester)
    }
}

#[derive(Debug, Deserialize)]
struct GraphParams {
    #[serde(default)]
    name: String,
}

#[derive(Debug, Deserialize)]
struct AutocompleteParams {
    #[serde(default)]
    term: String,
}

#[derive(Debug, Serialize)]
struct GraphResponse {
    message: String,
    summary: String,
    #[serde(flatten)]
    graph: GraphResult,
}

fn error_response(err: ExploreError) -> Response {
    let status = match err {
        ExploreError::SourceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        ExploreError::InvalidInput(_) | ExploreError::InvalidSeed(_) => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    log::error!("Request failed: {}", err);
    (status, Json(serde_json::json!({ "error": err.to_string() }))).into_response()
}

/// Build the graph for `?name=`. Blank input returns an empty graph and a prompt.
async fn handle_graph(State(state): State<AppState>, Query(params): Query<GraphParams>) -> Response {
    let builder = Arc::clone(&state.builder);
    let name = params.name;
    let built = state
        .db
        .with_connection(move |conn| {
            let source = SqliteRelationSource::new(conn);
            builder.build(&source, &name)
        })
        .await;

    match built {
        Ok(graph) => {
            let summary = graph.summary();
            Json(GraphResponse {
                message: summary.clone(),
                summary,
                graph,
            })
            .into_response()
        }
        Err(ExploreError::InvalidSeed(_)) => Json(GraphResponse {
            message: PROMPT.to_string(),
            summary: String::new(),
            graph: GraphResult::empty(),
        })
        .into_response(),
        Err(e) => error_response(e),
    }
}

async fn autocomplete(state: &AppState, term: &str) -> Response {
    match state.suggester.suggest(term).await {
        Ok(names) => Json(names).into_response(),
        Err(e) => error_response(e),
    }
}

async fn handle_autocomplete_get(
    State(state): State<AppState>,
    Query(params): Query<AutocompleteParams>,
) -> Response {
    autocomplete(&state, &params.term).await
}

async fn handle_autocomplete_post(
    State(state): State<AppState>,
    Form(params): Form<AutocompleteParams>,
) -> Response {
    autocomplete(&state, &params.term).await
}

async fn handle_health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    if allowed_origins.is_empty() {
        return CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any);
    }
    let origins: Vec<HeaderValue> = allowed_origins.iter().filter_map(|o| o.parse().ok()).collect();
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(Any)
        .allow_headers(Any)
}

/// Create the axum router
pub fn router(state: AppState, allowed_origins: &[String]) -> Router {
    Router::new()
        .route("/graph", get(handle_graph))
        .route("/autocomplete", get(handle_autocomplete_get).post(handle_autocomplete_post))
        .route("/health", get(handle_health))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors_layer(allowed_origins)),
        )
        .with_state(state)
}

/// Serve the API on 127.0.0.1:`port` until the process stops.
pub async fn serve(config: &Config, port: u16) -> Result<()> {
    let app = router(AppState::from_config(config), &config.http_server.allowed_origins);

    let addr = format!("127.0.0.1:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr).await.map_err(|e| {
        ExploreError::Io(std::io::Error::new(
            e.kind(),
            format!("Failed to bind to {}: {}. Set http_server.port in config.toml to use another port.", addr, e),
        ))
    })?;

    log::info!("Serving ExploreWiki API on http://{}", addr);
    axum::serve(listener, app).await?;
    Ok(())
}
