//! Axum route handlers for the Arcade gateway API.

use std::sync::Arc;

use arcade_core::{GameAccess, GameDescriptor, LaunchOutcome, UserId};
use arcade_launcher::LocalCoordinator;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::error::GatewayError;

// ── Shared state ─────────────────────────────────────────────────────────────

type Arcade = Arc<LocalCoordinator>;

// ── Request / response types ──────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct SetAccessBody {
    /// Filenames to enable. Every other catalog game is disabled.
    pub games: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct AccessResponse {
    pub user_id: UserId,
    pub games: Vec<GameAccess>,
}

/// Body of a launch that ran to completion.
#[derive(Debug, Serialize)]
pub struct LaunchResponse {
    #[serde(flatten)]
    pub outcome: LaunchOutcome,
    pub message: String,
}

// ── Router ────────────────────────────────────────────────────────────────────

/// Build the application router around a coordinator.
pub fn create_router(arcade: Arcade) -> Router {
    Router::new()
        .route("/v1/games", get(list_games))
        .route("/v1/users/{user_id}/games/{filename}/launch", post(launch_game))
        .route("/v1/users/{user_id}/access", get(get_access).put(set_access))
        .route("/health", get(health))
        .with_state(arcade)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

// ── Handlers ──────────────────────────────────────────────────────────────────

/// `GET /health`: liveness probe.
pub async fn health() -> impl IntoResponse {
    (StatusCode::OK, Json(serde_json::json!({"status": "ok"})))
}

/// `GET /v1/games`: the current catalog.
///
/// # Errors
/// Returns [`GatewayError::Launcher`] if the game directory cannot be listed.
pub async fn list_games(State(arcade): State<Arcade>) -> Result<Json<Vec<GameDescriptor>>, GatewayError> {
    Ok(Json(arcade.games().await?))
}

/// `POST /v1/users/{user_id}/games/{filename}/launch`: run a game and wait
/// for its outcome.
///
/// # Errors
/// Returns [`GatewayError::Launch`] for every refused or failed launch.
pub async fn launch_game(
    State(arcade): State<Arcade>,
    Path((user_id, filename)): Path<(String, String)>,
) -> Result<Json<LaunchResponse>, GatewayError> {
    let user = UserId::parse(&user_id)?;
    let outcome = arcade.launch(&user, &filename).await;
    if let Some(kind) = outcome.error_kind() {
        return Err(GatewayError::Launch(kind));
    }
    let message = outcome.user_message();
    Ok(Json(LaunchResponse { outcome, message }))
}

/// `GET /v1/users/{user_id}/access`: effective access to every game.
///
/// # Errors
/// Returns [`GatewayError`] for a malformed user id or a store failure.
pub async fn get_access(
    State(arcade): State<Arcade>,
    Path(user_id): Path<String>,
) -> Result<Json<AccessResponse>, GatewayError> {
    let user = UserId::parse(&user_id)?;
    let games = arcade.get_access(&user).await?;
    Ok(Json(AccessResponse { user_id: user, games }))
}

/// `PUT /v1/users/{user_id}/access`: replace the user's enabled set.
///
/// # Errors
/// Returns [`GatewayError`] for a malformed user id or a store failure.
pub async fn set_access(
    State(arcade): State<Arcade>,
    Path(user_id): Path<String>,
    Json(body): Json<SetAccessBody>,
) -> Result<Json<AccessResponse>, GatewayError> {
    let user = UserId::parse(&user_id)?;
    let games = arcade.set_access(&user, &body.games).await?;
    Ok(Json(AccessResponse { user_id: user, games }))
}
