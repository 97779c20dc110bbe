//! HTTP transport: the axum router and the server endpoints that are not
//! part of the compile pipeline.

use axum::{
    body::Body,
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};

use crate::error::{Result, ServerError};
use crate::hmr::{self, HMR_CLIENT_PATH, HMR_EVENTS_PATH};
use crate::pipeline;
use crate::routes;
use crate::state::SharedState;

/// Development server.
pub struct DevServer {
    state: SharedState,
}

impl DevServer {
    pub fn new(state: SharedState) -> Self {
        Self { state }
    }

    /// Bind the configured address and serve until the task is dropped.
    ///
    /// # Errors
    ///
    /// Returns an error when the address cannot be bound.
    pub async fn start(self) -> Result<()> {
        let addr = self.state.config.addr;
        let app = build_router(self.state);

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| ServerError::Server(format!("failed to bind {addr}: {e}")))?;

        tracing::info!(%addr, "development server listening");

        axum::serve(listener, app)
            .await
            .map_err(|e| ServerError::Server(format!("server error: {e}")))?;
        Ok(())
    }
}

/// Assemble the router: server endpoints first, then the pipeline fallback.
/// CORS is wide open in development.
pub fn build_router(state: SharedState) -> Router {
    Router::new()
        .route(HMR_CLIENT_PATH, get(hmr::handle_hmr_client))
        .route(HMR_EVENTS_PATH, get(hmr::handle_events))
        .route("/__swite_routes", get(routes::handle_routes))
        .route("/__swite_diagnose", get(handle_diagnose))
        .route("/__swite_clear_cache", get(handle_clear_cache))
        .route("/favicon.ico", get(handle_favicon))
        .fallback(pipeline::handle_request)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

async fn handle_favicon() -> impl IntoResponse {
    StatusCode::NO_CONTENT
}

#[derive(Debug, Deserialize)]
struct DiagnoseQuery {
    url: Option<String>,
}

/// What the server would do with a URL, without serving it.
#[derive(Debug, Serialize)]
struct DiagnoseReport {
    url: String,
    handler: &'static str,
    file: String,
    exists: bool,
    cached: bool,
}

/// `/__swite_diagnose?url=...`: echo resolution for a URL.
async fn handle_diagnose(
    State(state): State<SharedState>,
    Query(query): Query<DiagnoseQuery>,
) -> Response {
    let Some(url) = query.url else {
        let body = "missing 'url' query parameter";
        return Response::builder()
            .status(StatusCode::BAD_REQUEST)
            .header(header::CONTENT_TYPE, "text/plain")
            .header(header::CONTENT_LENGTH, body.len())
            .body(Body::from(body))
            .unwrap();
    };

    let path = state.resolver.ctx().resolve_file_path(&url);
    let report = DiagnoseReport {
        handler: handler_name(&url),
        exists: path.is_file(),
        cached: state.cache.contains(&path),
        file: path.display().to_string(),
        url,
    };
    axum::Json(report).into_response()
}

fn handler_name(url: &str) -> &'static str {
    if url.starts_with("/node_modules/") {
        return "node-modules";
    }
    if url.starts_with("/public/") || url.starts_with("/assets/") {
        return "static";
    }
    match pipeline::url_extension(url).as_deref() {
        Some("ui") | Some("uix") => "ui",
        Some("ts") | Some("tsx") => "ts",
        Some("js") | Some("mjs") | Some("jsx") => "js",
        _ => "static",
    }
}

/// `/__swite_clear_cache`: drop every cache entry and confirm.
///
/// This landing page is the one intentional HTML response in the server.
async fn handle_clear_cache(State(state): State<SharedState>) -> Response {
    let dropped = state.cache.len();
    state.cache.clear();
    tracing::info!(dropped, "compilation cache cleared");

    let html = format!(
        "<!DOCTYPE html><html><head><title>Swite</title></head>\
         <body><h1>Cache cleared</h1><p>{dropped} entries dropped.</p>\
         <p><a href=\"/\">Back to app</a></p></body></html>"
    );
    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "text/html; charset=utf-8")
        .header(header::CONTENT_LENGTH, html.len())
        .header(header::CACHE_CONTROL, "no-cache, no-store, must-revalidate")
        .body(Body::from(html))
        .unwrap()
}
