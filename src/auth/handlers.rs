use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use tracing::instrument;

use crate::{
    auth::{
        dto::{AuthResponse, PublicUser, SignInRequest, SignUpRequest},
        extractors::AuthUser,
    },
    error::AuthError,
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/signup", post(sign_up))
        .route("/auth/signin", post(sign_in))
}

pub fn me_routes() -> Router<AppState> {
    Router::new().route("/me", get(get_me))
}

#[instrument(skip(state, payload))]
pub async fn sign_up(
    State(state): State<AppState>,
    Json(payload): Json<SignUpRequest>,
) -> Result<Json<AuthResponse>, AuthError> {
    let response = state.auth.sign_up(&payload.email, &payload.password).await?;
    Ok(Json(response))
}

#[instrument(skip(state, payload))]
pub async fn sign_in(
    State(state): State<AppState>,
    Json(payload): Json<SignInRequest>,
) -> Result<Json<AuthResponse>, AuthError> {
    let response = state.auth.sign_in(&payload.email, &payload.password).await?;
    Ok(Json(response))
}

#[instrument(skip(state))]
pub async fn get_me(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
) -> Result<Json<PublicUser>, AuthError> {
    let user = state.auth.current_user(&claims).await?;
    Ok(Json(user))
}
