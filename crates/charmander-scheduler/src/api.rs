//! Admin HTTP surface.

use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, HeaderMap, HeaderValue, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};

use charmander_sync::StateReporter;

/// Shared application state.
pub struct AppState {
    pub reporter: Arc<StateReporter>,
}

/// Creates the admin router.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/metrics", get(metrics))
        .fallback(ping)
        .with_state(state)
}

/// Liveness probe.
///
/// Answers any path ending in `/ping` with `Pong`, mirroring the request
/// origin into the CORS allow header so dashboards on other origins can
/// poll it.
async fn ping(uri: Uri, headers: HeaderMap) -> Response {
    if !uri.path().ends_with("/ping") {
        return StatusCode::NOT_FOUND.into_response();
    }

    let mut response = (StatusCode::OK, "Pong\n").into_response();
    let response_headers = response.headers_mut();
    if let Some(origin) = headers.get(header::ORIGIN) {
        response_headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, origin.clone());
    }
    response_headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static("POST, GET, OPTIONS, PUT, DELETE"),
    );
    response_headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static(
            "Accept, Content-Type, Content-Length, Accept-Encoding, X-CSRF-Token, Authorization",
        ),
    );
    response
}

/// Sync counters endpoint.
async fn metrics(State(state): State<Arc<AppState>>) -> String {
    let metrics = state.reporter.metrics();

    format!(
        "# HELP charmander_sync_cycles_total Reconciliation cycles started\n\
         # TYPE charmander_sync_cycles_total counter\n\
         charmander_sync_cycles_total {}\n\n\
         # HELP charmander_sync_cycles_skipped_total Cycles skipped with the store unreachable\n\
         # TYPE charmander_sync_cycles_skipped_total counter\n\
         charmander_sync_cycles_skipped_total {}\n\n\
         # HELP charmander_sync_entries_published_total SET/EXPIRE pairs written to the store\n\
         # TYPE charmander_sync_entries_published_total counter\n\
         charmander_sync_entries_published_total {}\n\n\
         # HELP charmander_sync_malformed_replies_total Store replies that failed to decode\n\
         # TYPE charmander_sync_malformed_replies_total counter\n\
         charmander_sync_malformed_replies_total {}\n\n\
         # HELP charmander_sync_malformed_keys_total Intelligence keys that did not parse\n\
         # TYPE charmander_sync_malformed_keys_total counter\n\
         charmander_sync_malformed_keys_total {}\n\n\
         # HELP charmander_sync_serialisation_failures_total Entities dropped from a push batch\n\
         # TYPE charmander_sync_serialisation_failures_total counter\n\
         charmander_sync_serialisation_failures_total {}\n",
        metrics.cycles,
        metrics.cycles_skipped,
        metrics.entries_published,
        metrics.malformed_replies,
        metrics.malformed_keys,
        metrics.serialisation_failures,
    )
}
