//! HTTP request handlers

use super::types::{
    BackRequest, CallbackRequest, CallbackResponse, ErrorResponse, NavigateRequest,
    NavigationResponse, UserStateResponse,
};
use super::AppState;
use crate::error::MenuError;
use crate::manager::MenuStatistics;
use crate::router::CallbackEvent;
use crate::state::UserId;
use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Button presses and direct navigation
        .route("/api/callback", post(handle_callback))
        .route("/api/navigate", post(navigate))
        .route("/api/back", post(go_back))
        // Inspection
        .route("/api/users/:id/state", get(get_user_state))
        .route("/api/users/:id/menu", get(render_current))
        .route("/api/stats", get(get_stats))
        .route("/api/menus", get(export_menus))
        // Version
        .route("/version", get(get_version))
        .with_state(state)
}

// ============================================================
// Navigation
// ============================================================

async fn handle_callback(
    State(state): State<AppState>,
    Json(req): Json<CallbackRequest>,
) -> Result<Json<CallbackResponse>, AppError> {
    let event = CallbackEvent::new(req.user_id, req.token).with_context(req.context);
    let outcome = state.manager.handle_callback(event).await?;

    Ok(Json(CallbackResponse {
        handled: outcome.is_handled(),
        outcome,
    }))
}

async fn navigate(
    State(state): State<AppState>,
    Json(req): Json<NavigateRequest>,
) -> Result<Json<NavigationResponse>, AppError> {
    let outcome = state
        .manager
        .navigate_to(&req.menu_id, req.user_id, req.context)
        .await?;
    Ok(Json(NavigationResponse { outcome }))
}

async fn go_back(
    State(state): State<AppState>,
    Json(req): Json<BackRequest>,
) -> Result<Json<NavigationResponse>, AppError> {
    let outcome = state.manager.go_back(req.user_id, req.context).await?;
    Ok(Json(NavigationResponse { outcome }))
}

// ============================================================
// Inspection
// ============================================================

async fn get_user_state(
    State(state): State<AppState>,
    Path(user_id): Path<UserId>,
) -> Result<Json<UserStateResponse>, AppError> {
    let export = state
        .manager
        .export_navigation_state(user_id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("No navigation state for user {user_id}")))?;
    Ok(Json(UserStateResponse { state: export }))
}

/// Re-render the user's current menu, e.g. after a handler changed context
async fn render_current(
    State(state): State<AppState>,
    Path(user_id): Path<UserId>,
) -> Result<Json<NavigationResponse>, AppError> {
    let outcome = state.manager.render_current(user_id).await?;
    Ok(Json(NavigationResponse { outcome }))
}

async fn get_stats(State(state): State<AppState>) -> Json<MenuStatistics> {
    Json(state.manager.get_menu_statistics().await)
}

async fn export_menus(State(state): State<AppState>) -> Result<Response, AppError> {
    let json = state.manager.export_menu_config().await?;
    Ok(([(header::CONTENT_TYPE, "application/json")], json).into_response())
}

// ============================================================
// Version
// ============================================================

async fn get_version() -> &'static str {
    concat!("menu-nav ", env!("CARGO_PKG_VERSION"))
}

// ============================================================
// Error Handling
// ============================================================

#[derive(Debug)]
enum AppError {
    BadRequest(String),
    Forbidden(String),
    NotFound(String),
    Internal(String),
}

impl From<MenuError> for AppError {
    fn from(err: MenuError) -> Self {
        let message = err.to_string();
        match err {
            MenuError::MenuNotFound(_) => AppError::NotFound(message),
            MenuError::PermissionDenied { .. } => AppError::Forbidden(message),
            MenuError::Handler { .. } => AppError::Internal(message),
            MenuError::Validation { .. }
            | MenuError::DuplicateMenu(_)
            | MenuError::UnknownMenu { .. }
            | MenuError::Config(_) => AppError::BadRequest(message),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = Json(ErrorResponse::new(message));
        (status, body).into_response()
    }
}
