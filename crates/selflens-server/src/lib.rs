//! HTTP front for a journal.
//!
//! - `GET /api/journal` returns `{profile, incidents}`
//! - `POST /api/journal` replaces that document wholesale
//! - `GET /health` reports liveness and the incident count
//! - anything else is served from the public directory, with unknown paths
//!   answered by `index.html` so client-side routes resolve

use std::net::SocketAddr;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use anyhow::{Context, Result};
use axum::{
    extract::{Json, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use selflens_core::JournalDocument;
use selflens_journal::Journal;
use selflens_store::{KeyValueStore, ServerConfig};
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;

// ── Types ──

/// Shared handle to the journal being served.
pub struct AppState<S: KeyValueStore> {
    journal: Mutex<Journal<S>>,
}

pub type SharedState<S> = Arc<AppState<S>>;

// ── Helpers ──

impl<S: KeyValueStore> AppState<S> {
    pub fn new(journal: Journal<S>) -> SharedState<S> {
        Arc::new(Self {
            journal: Mutex::new(journal),
        })
    }

    fn journal(&self) -> MutexGuard<'_, Journal<S>> {
        // Every mutation writes a whole record, so a poisoned lock still
        // guards a consistent journal.
        self.journal
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn internal_error(e: anyhow::Error) -> Response {
    tracing::error!("request failed: {:#}", e);
    (StatusCode::INTERNAL_SERVER_ERROR, format!("{:#}", e)).into_response()
}

// ── Handlers ──

async fn health<S>(State(state): State<SharedState<S>>) -> impl IntoResponse
where
    S: KeyValueStore + Send + 'static,
{
    let count = state.journal().incidents().len();
    Json(serde_json::json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
        "incidents": count,
    }))
}

async fn get_journal<S>(State(state): State<SharedState<S>>) -> Json<JournalDocument>
where
    S: KeyValueStore + Send + 'static,
{
    Json(state.journal().document())
}

async fn put_journal<S>(
    State(state): State<SharedState<S>>,
    Json(document): Json<JournalDocument>,
) -> Response
where
    S: KeyValueStore + Send + 'static,
{
    let count = document.incidents.len();
    match state.journal().replace_document(document) {
        Ok(()) => {
            tracing::info!("journal replaced with {} incidents", count);
            (StatusCode::OK, Json(serde_json::json!({ "saved": count }))).into_response()
        }
        Err(e) => internal_error(e),
    }
}

// ── Public API ──

/// API routes only.
pub fn api_router<S>(state: SharedState<S>) -> Router
where
    S: KeyValueStore + Send + 'static,
{
    Router::new()
        .route("/health", get(health::<S>))
        .route("/api/journal", get(get_journal::<S>).post(put_journal::<S>))
        .with_state(state)
}

/// API routes plus the static front end under `public_dir`.
pub fn router<S>(state: SharedState<S>, public_dir: &Path) -> Router
where
    S: KeyValueStore + Send + 'static,
{
    let index = public_dir.join("index.html");
    let static_files = ServeDir::new(public_dir).fallback(ServeFile::new(index));

    api_router(state)
        .fallback_service(static_files)
        .layer(TraceLayer::new_for_http())
}

/// Bind and serve until the process is stopped.
pub async fn serve<S>(journal: Journal<S>, config: &ServerConfig) -> Result<()>
where
    S: KeyValueStore + Send + 'static,
{
    let addr: SocketAddr = format!("{}:{}", config.bind, config.port)
        .parse()
        .with_context(|| format!("invalid bind address {}:{}", config.bind, config.port))?;

    if !config.public_dir.join("index.html").exists() {
        tracing::warn!(
            "no index.html under {}, only the API will be useful",
            config.public_dir.display()
        );
    }

    let app = router(AppState::new(journal), &config.public_dir);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {}", addr))?;

    tracing::info!("SelfLens running on port {}", config.port);
    axum::serve(listener, app).await.context("server stopped")?;
    Ok(())
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{header, Method, Request};
    use chrono::NaiveDate;
    use http_body_util::BodyExt;
    use selflens_core::{IncidentDraft, IncidentType, Profile};
    use selflens_store::MemoryStore;
    use std::fs;
    use tower::ServiceExt;

    fn state_with_one_incident() -> SharedState<MemoryStore> {
        let mut journal = Journal::open(MemoryStore::new()).unwrap();
        let mut draft = IncidentDraft::new(NaiveDate::from_ymd_opt(2026, 6, 1).unwrap());
        draft.kind = IncidentType::Positive;
        journal.add_incident(draft).unwrap();
        AppState::new(journal)
    }

    async fn body_text(resp: Response) -> String {
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_get_journal_returns_document() {
        let app = api_router(state_with_one_incident());
        let req = Request::builder()
            .uri("/api/journal")
            .body(Body::empty())
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let document: JournalDocument = serde_json::from_str(&body_text(resp).await).unwrap();
        assert_eq!(document.incidents.len(), 1);
        assert_eq!(document.incidents[0].kind, IncidentType::Positive);
    }

    #[tokio::test]
    async fn test_post_replaces_document() {
        let state = state_with_one_incident();
        let app = api_router(state.clone());

        let replacement = JournalDocument {
            profile: Profile {
                username: "remote".to_string(),
                ..Profile::default()
            },
            incidents: Vec::new(),
        };
        let req = Request::builder()
            .method(Method::POST)
            .uri("/api/journal")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_string(&replacement).unwrap()))
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let journal = state.journal();
        assert!(journal.incidents().is_empty());
        assert_eq!(journal.profile().username, "remote");
    }

    #[tokio::test]
    async fn test_post_rejects_malformed_body() {
        let state = state_with_one_incident();
        let app = api_router(state.clone());
        let req = Request::builder()
            .method(Method::POST)
            .uri("/api/journal")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"incidents": [{"severity": 99}]}"#))
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert!(resp.status().is_client_error());
        assert_eq!(state.journal().incidents().len(), 1);
    }

    #[tokio::test]
    async fn test_health() {
        let app = api_router(state_with_one_incident());
        let req = Request::builder().uri("/health").body(Body::empty()).unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(body_text(resp).await.contains("\"incidents\":1"));
    }

    #[tokio::test]
    async fn test_static_files_with_spa_fallback() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join("index.html"), "<div id=\"root\"></div>").unwrap();
        fs::write(tmp.path().join("app.js"), "console.log('lens')").unwrap();
        let state = state_with_one_incident();

        let req = Request::builder().uri("/app.js").body(Body::empty()).unwrap();
        let resp = router(state.clone(), tmp.path()).oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(body_text(resp).await.contains("lens"));

        let req = Request::builder()
            .uri("/insights/anything")
            .body(Body::empty())
            .unwrap();
        let resp = router(state, tmp.path()).oneshot(req).await.unwrap();
        assert!(body_text(resp).await.contains("id=\"root\""));
    }
}
