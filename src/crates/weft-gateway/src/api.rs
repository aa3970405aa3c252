//! Public HTTP surface
//!
//! Two endpoints: a catch-all root that feeds every inbound request through
//! the graph traversal, and `/graph`, which renders the configured graph for
//! inspection. Traversal failures deliberately surface as an empty 500 - the
//! detail stays in the gateway's own log, not in the caller's hands.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::{header, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::routing::{any, get};
use axum::Router;
use serde::Deserialize;
use tower_http::trace::TraceLayer;
use tracing::error;

use weft_graph::{render, RenderOptions};

use crate::router::RequestRouter;
use crate::wire::HttpRequest;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub router: Arc<RequestRouter>,
}

/// Build the gateway's HTTP router
pub fn create_router(router: Arc<RequestRouter>) -> Router {
    let app_state = AppState { router };

    // "/graph" is static and wins over the wildcard; every other path is
    // fed through the traversal
    Router::new()
        .route("/", any(handle_request))
        .route("/*path", any(handle_request))
        .route("/graph", get(handle_graph))
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}

/// Feed the inbound request through the graph and reply with the terminal body
async fn handle_request(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
    body: Bytes,
) -> Response {
    let request = HttpRequest {
        method: method.to_string(),
        path: uri.path().to_string(),
        body: body.to_vec(),
    };

    match state.router.handle(request).await {
        Ok(response) => response.body.into_response(),
        Err(err) => {
            error!(error = %err, "graph traversal failed");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

#[derive(Debug, Deserialize)]
struct RenderQuery {
    format: Option<String>,
}

/// Render the configured graph; `?format=svg|dot|mermaid`, SVG by default
async fn handle_graph(State(state): State<AppState>, Query(query): Query<RenderQuery>) -> Response {
    let options = match query.format.as_deref() {
        None | Some("svg") => RenderOptions::svg(),
        Some("dot") => RenderOptions::dot(),
        Some("mermaid") => RenderOptions::mermaid(),
        Some(other) => {
            return (
                StatusCode::BAD_REQUEST,
                format!("unknown render format '{other}'"),
            )
                .into_response()
        }
    };

    match render(state.router.graph(), &options) {
        Ok(rendered) => (
            [(header::CONTENT_TYPE, options.format.content_type())],
            rendered,
        )
            .into_response(),
        Err(err) => {
            error!(error = %err, "graph rendering failed");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
