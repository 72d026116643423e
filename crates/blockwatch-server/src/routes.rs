//! HTTP routes and handlers.
//!
//! The API layer stays thin: handlers validate request shapes and delegate
//! every domain-state decision to the content service.

use std::time::Duration;

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use blockwatch_core::{ContentId, ContentItem, Error, IncidentId, User, UserId};
use blockwatch_moderation::{NewComment, NewPost};

use crate::app::AppState;
use crate::auth::{bearer_token, Authenticator};
use crate::gateway;

pub fn create_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/users", post(register_user))
        .route("/posts", post(create_post))
        .route("/posts/:id", get(get_post))
        .route("/posts/:id/comments", get(post_comments))
        .route("/comments", post(create_comment))
        .route("/me/content", get(my_content))
        .route("/realtime", get(realtime_status));

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_check))
        .route("/metrics", get(metrics))
        .route("/ws", get(gateway::websocket_handler))
        .nest("/api", api_routes)
        .fallback(fallback)
        .layer(cors)
        .with_state(state)
}

async fn health_check() -> &'static str {
    "OK"
}

async fn metrics(State(state): State<AppState>) -> String {
    state.metrics_handle.render()
}

/// Registration request for the development user directory
#[derive(Debug, Deserialize)]
struct RegisterRequest {
    name: String,
}

#[derive(Debug, Serialize)]
struct RegisterResponse {
    user_id: UserId,
    name: String,
    token: String,
}

async fn register_user(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<Response, AppError> {
    let name = req.name.trim();
    if name.is_empty() {
        return Err(Error::validation("a user needs a name").into());
    }

    let user = User::new(name);
    state.users.insert(user.clone()).await;

    let ttl = Duration::from_secs(state.config.auth.token_ttl_secs);
    let token = state.auth.issue(user.id, ttl);

    info!(user = %user.id, "User registered");

    let response = RegisterResponse {
        user_id: user.id,
        name: user.name,
        token,
    };
    Ok((StatusCode::CREATED, Json(response)).into_response())
}

/// Creation request for a post
#[derive(Debug, Deserialize)]
struct CreatePostRequest {
    #[serde(default)]
    body: Option<String>,

    /// Already-hosted media reference
    #[serde(default)]
    media_url: Option<String>,

    #[serde(default)]
    incident: Option<IncidentId>,
}

async fn create_post(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<CreatePostRequest>,
) -> Result<Response, AppError> {
    let author = authenticated(&state, &headers).await?;

    let item = state
        .service
        .create_post(
            author,
            NewPost {
                body: req.body,
                media: None,
                media_url: req.media_url,
                incident: req.incident,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(item)).into_response())
}

async fn get_post(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<ContentId>,
) -> Result<Json<ContentItem>, AppError> {
    let viewer = maybe_authenticated(&state, &headers).await?;
    let item = state.service.get(id, viewer).await?;
    Ok(Json(item))
}

async fn post_comments(
    State(state): State<AppState>,
    Path(id): Path<ContentId>,
) -> Result<Json<Vec<ContentItem>>, AppError> {
    let comments = state.service.comments_for_post(id).await?;
    Ok(Json(comments))
}

/// Creation request for a comment or one-level reply
#[derive(Debug, Deserialize)]
struct CreateCommentRequest {
    body: String,

    #[serde(default)]
    post: Option<ContentId>,

    #[serde(default)]
    parent_comment: Option<ContentId>,
}

async fn create_comment(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<CreateCommentRequest>,
) -> Result<Response, AppError> {
    let author = authenticated(&state, &headers).await?;

    let item = state
        .service
        .create_comment(
            author,
            NewComment {
                body: req.body,
                post: req.post,
                parent_comment: req.parent_comment,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(item)).into_response())
}

async fn my_content(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<ContentItem>>, AppError> {
    let author = authenticated(&state, &headers).await?;
    let items = state.service.authored_by(author).await?;
    Ok(Json(items))
}

#[derive(Debug, Serialize)]
struct RealtimeStatus {
    connected_users: usize,
    total_connections: usize,
}

async fn realtime_status(State(state): State<AppState>) -> Json<RealtimeStatus> {
    Json(RealtimeStatus {
        connected_users: state.registry.connected_users().await.len(),
        total_connections: state.registry.total_connections().await,
    })
}

async fn fallback() -> (StatusCode, &'static str) {
    (StatusCode::NOT_FOUND, "Not found")
}

/// Resolve the authenticated caller, refusing requests without a credential
async fn authenticated(state: &AppState, headers: &HeaderMap) -> Result<UserId, AppError> {
    let bearer = headers
        .get("authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(bearer_token)
        .ok_or_else(|| Error::auth("missing bearer credential"))?;

    Ok(state.auth.authenticate(bearer).await?)
}

/// Resolve the caller when a credential is present; anonymous otherwise.
/// A supplied-but-invalid credential is still refused.
async fn maybe_authenticated(
    state: &AppState,
    headers: &HeaderMap,
) -> Result<Option<UserId>, AppError> {
    let bearer = headers
        .get("authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(bearer_token);

    match bearer {
        Some(bearer) => Ok(Some(state.auth.authenticate(bearer).await?)),
        None => Ok(None),
    }
}

/// Error handling
#[derive(Debug)]
pub struct AppError(Error);

impl From<Error> for AppError {
    fn from(err: Error) -> Self {
        Self(err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, kind) = match &self.0 {
            Error::Validation(_) => (StatusCode::BAD_REQUEST, "validation_error"),
            Error::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            Error::Auth(_) => (StatusCode::UNAUTHORIZED, "authentication_error"),
            _ => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
        };

        let body = json!({
            "error": {
                "message": self.0.to_string(),
                "type": kind,
            }
        });

        (status, Json(body)).into_response()
    }
}
