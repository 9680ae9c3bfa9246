//! HTTP surface for user lookup and creation.
//!
//! Every response body is a JSON envelope with a `status` field. User data
//! only ever leaves through [`UserView`], which has no secret fields.

use crate::core::users::UserService;
use crate::domain::model::UserView;
use crate::utils::error::{AppError, ErrorCategory, Result};
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::trace::TraceLayer;

#[derive(Clone)]
struct AppState {
    users: UserService,
}

#[derive(Debug, Deserialize)]
struct GetUserParams {
    id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CreateUserParams {
    name: Option<String>,
    email: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ApiResponse {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<UserView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ApiResponse {
    fn user(status: &'static str, user: UserView) -> Self {
        Self {
            status,
            user: Some(user),
            message: None,
        }
    }

    fn message(status: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            user: None,
            message: Some(message.into()),
        }
    }
}

/// Maps a domain error onto a status code and envelope.
struct ApiError(AppError);

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (code, body) = match self.0.category() {
            ErrorCategory::Validation => (
                StatusCode::BAD_REQUEST,
                ApiResponse::message("error", self.0.to_string()),
            ),
            ErrorCategory::NotFound => (
                StatusCode::NOT_FOUND,
                ApiResponse::message("not_found", self.0.to_string()),
            ),
            ErrorCategory::Conflict => (
                StatusCode::CONFLICT,
                ApiResponse::message("error", self.0.to_string()),
            ),
            ErrorCategory::Infrastructure | ErrorCategory::Configuration => {
                // 內部錯誤細節只寫入日誌
                tracing::error!(
                    "❌ Request failed: {} (Severity: {:?})",
                    self.0,
                    self.0.severity()
                );
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ApiResponse::message("critical_error", "Internal server error"),
                )
            }
        };
        (code, Json(body)).into_response()
    }
}

/// Build the HTTP router.
pub fn build_router(users: UserService) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/users", get(get_user_handler))
        .route("/create_user", get(create_user_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(AppState { users })
}

/// Bind `addr` and serve until Ctrl-C.
pub async fn run_server(users: UserService, addr: &str) -> Result<()> {
    let app = build_router(users);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("🌐 User service listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("User service stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}

async fn health_handler() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

async fn get_user_handler(
    State(state): State<AppState>,
    Query(params): Query<GetUserParams>,
) -> std::result::Result<Response, ApiError> {
    let raw_id = params
        .id
        .ok_or_else(|| AppError::validation("missing query parameter 'id'"))?;
    let id: i64 = raw_id
        .trim()
        .parse()
        .map_err(|_| AppError::validation(format!("id must be an integer, got '{}'", raw_id)))?;

    match state.users.find_user(id).await? {
        Some(user) => {
            Ok((StatusCode::OK, Json(ApiResponse::user("success", user))).into_response())
        }
        None => Ok((
            StatusCode::NOT_FOUND,
            Json(ApiResponse::message("not_found", "User not found")),
        )
            .into_response()),
    }
}

async fn create_user_handler(
    State(state): State<AppState>,
    Query(params): Query<CreateUserParams>,
) -> std::result::Result<Response, ApiError> {
    let name = params
        .name
        .ok_or_else(|| AppError::validation("missing query parameter 'name'"))?;
    let email = params.email.unwrap_or_default();

    let user = state.users.create_user(&name, &email).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::user("created", user))).into_response())
}
