//! HTTP surface: the GitLab webhook endpoint plus status endpoints.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use thiserror::Error;
use tracing::{info, warn};

use super::payload::PushEvent;
use super::queue::{EnqueueError, EventQueue};
use super::verify_token;

const TOKEN_HEADER: &str = "x-gitlab-token";
const EVENT_HEADER: &str = "x-gitlab-event";

/// Shared state of the HTTP handlers.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<Shared>,
}

struct Shared {
    queue: EventQueue,
    webhook_secret: String,
    gitlab_url: String,
    redmine_url: String,
}

impl AppState {
    /// Builds handler state around the producer side of the queue.
    #[must_use]
    pub fn new(
        queue: EventQueue,
        webhook_secret: impl Into<String>,
        gitlab_url: impl Into<String>,
        redmine_url: impl Into<String>,
    ) -> Self {
        Self {
            inner: Arc::new(Shared {
                queue,
                webhook_secret: webhook_secret.into(),
                gitlab_url: gitlab_url.into(),
                redmine_url: redmine_url.into(),
            }),
        }
    }
}

/// Handler errors, each mapped to an HTTP status.
#[derive(Debug, Error)]
pub enum AppError {
    /// Missing or wrong `X-Gitlab-Token`.
    #[error("Invalid token")]
    Unauthorized,
    /// The body is not a webhook payload.
    #[error("invalid payload: {0}")]
    BadRequest(String),
    /// The queue cannot take the event.
    #[error(transparent)]
    Unavailable(#[from] EnqueueError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match self {
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        };
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

/// Builds the router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/queue/status", get(queue_status))
        .route("/webhook/gitlab", post(gitlab_webhook))
        .with_state(state)
}

/// Serves `router(state)` on `addr` until Ctrl-C.
///
/// # Errors
///
/// Returns an error if the address cannot be bound or the server fails.
pub async fn serve(addr: &str, state: AppState) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "webhook server listening");
    axum::serve(listener, router(state)).with_graceful_shutdown(shutdown_signal()).await
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "cannot listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown requested");
}

async fn root() -> Json<Value> {
    Json(json!({
        "status": "running",
        "service": "tracksync",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn health(State(state): State<AppState>) -> Json<Value> {
    let shared = &state.inner;
    Json(json!({
        "status": "healthy",
        "gitlab_url": shared.gitlab_url,
        "redmine_url": shared.redmine_url,
        "queue_size": shared.queue.depth(),
    }))
}

async fn queue_status(State(state): State<AppState>) -> Json<Value> {
    let queue = &state.inner.queue;
    Json(json!({
        "queue_size": queue.depth(),
        "is_empty": queue.depth() == 0,
        "capacity": queue.capacity(),
    }))
}

async fn gitlab_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Value>, AppError> {
    let header = |name: &str| headers.get(name).and_then(|v| v.to_str().ok());
    info!(event = header(EVENT_HEADER).unwrap_or("-"), "received GitLab webhook");

    if !verify_token(&state.inner.webhook_secret, header(TOKEN_HEADER)) {
        warn!("invalid webhook token");
        return Err(AppError::Unauthorized);
    }

    let event: PushEvent =
        serde_json::from_slice(&body).map_err(|e| AppError::BadRequest(e.to_string()))?;
    if !event.is_push() {
        info!(kind = %event.object_kind, "ignoring non-push event");
        return Ok(Json(json!({
            "status": "skipped",
            "reason": format!("Not a push event: {}", event.object_kind),
        })));
    }

    state.inner.queue.try_enqueue(event)?;
    Ok(Json(json!({
        "status": "queued",
        "message": "Webhook received and queued for processing",
    })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use tokio::sync::mpsc::Receiver;
    use tower::ServiceExt;

    const PUSH: &str = r#"{"object_kind":"push","ref":"refs/heads/main","project_id":3,
        "project":{"name":"web"},"commits":[{"id":"abc","message":"m","author":{"name":"A"}}]}"#;

    fn app(secret: &str, capacity: usize) -> (Router, Receiver<PushEvent>) {
        let (queue, rx) = EventQueue::bounded(capacity);
        let state = AppState::new(queue, secret, "https://git.local", "https://rm.local");
        (router(state), rx)
    }

    fn webhook(token: Option<&str>, body: &str) -> Request<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri("/webhook/gitlab")
            .header("content-type", "application/json")
            .header("X-Gitlab-Event", "Push Hook");
        if let Some(token) = token {
            builder = builder.header("X-Gitlab-Token", token);
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    async fn json_body(resp: Response) -> Value {
        let body = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn valid_push_is_queued() {
        let (app, mut rx) = app("s3cret", 4);
        let resp = app.oneshot(webhook(Some("s3cret"), PUSH)).await.unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(json_body(resp).await["status"], "queued");
        let event = rx.recv().await.unwrap();
        assert_eq!(event.commits.len(), 1);
    }

    #[tokio::test]
    async fn wrong_token_is_unauthorized() {
        let (app, mut rx) = app("s3cret", 4);
        let resp = app.oneshot(webhook(Some("guess"), PUSH)).await.unwrap();

        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn malformed_body_is_bad_request() {
        let (app, _rx) = app("", 4);
        let resp = app.oneshot(webhook(None, "{not json")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn non_push_event_is_skipped() {
        let (app, mut rx) = app("", 4);
        let resp = app
            .oneshot(webhook(None, r#"{"object_kind":"merge_request"}"#))
            .await
            .unwrap();

        let json = json_body(resp).await;
        assert_eq!(json["status"], "skipped");
        assert_eq!(json["reason"], "Not a push event: merge_request");
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn full_queue_is_service_unavailable() {
        let (app, _rx) = app("", 1);
        let first = app.clone().oneshot(webhook(None, PUSH)).await.unwrap();
        assert_eq!(first.status(), StatusCode::OK);

        let second = app.oneshot(webhook(None, PUSH)).await.unwrap();
        assert_eq!(second.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn health_reports_queue_depth() {
        let (app, _rx) = app("", 4);
        app.clone().oneshot(webhook(None, PUSH)).await.unwrap();

        let resp = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let json = json_body(resp).await;
        assert_eq!(json["status"], "healthy");
        assert_eq!(json["queue_size"], 1);
        assert_eq!(json["redmine_url"], "https://rm.local");
    }
}
