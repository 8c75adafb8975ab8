use super::{created, Created};
use crate::error::ApiResult;
use crate::middleware::{ApiJson, CurrentUser};
use crate::state::AppState;
use airport_metrics::TracingService;
use airport_models::{
    AccessToken, AirportError, RefreshRequest, RegisterRequest, TokenPair, TokenRequest,
    UserPatch, UserView, VerifyRequest,
};
use axum::extract::State;
use axum::Json;
use serde_json::{json, Value};
use tracing::instrument;

fn record_auth_failure(state: &AppState, error: &AirportError) {
    if error.http_status() == 401 {
        state.metrics.record_auth_failure();
        TracingService::log_auth_failure(&error.to_string());
    }
}

#[utoipa::path(
    post,
    path = "/api/v1/user/register/",
    tag = "user",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User registered", body = UserView),
        (status = 400, description = "Invalid email or password")
    )
)]
#[instrument(skip_all)]
pub async fn register(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<RegisterRequest>,
) -> ApiResult<Created<UserView>> {
    let user = state.accounts.register(request).await?;
    state.metrics.record_user_registered();
    TracingService::log_user_registered(user.id);
    Ok(created(user))
}

#[utoipa::path(
    post,
    path = "/api/v1/user/token/",
    tag = "user",
    request_body = TokenRequest,
    responses(
        (status = 200, description = "Access and refresh tokens", body = TokenPair),
        (status = 401, description = "No active account with these credentials")
    )
)]
#[instrument(skip_all)]
pub async fn obtain_token(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<TokenRequest>,
) -> ApiResult<Json<TokenPair>> {
    match state.accounts.obtain_token(request).await {
        Ok(pair) => Ok(Json(pair)),
        Err(e) => {
            record_auth_failure(&state, &e);
            Err(e.into())
        }
    }
}

#[utoipa::path(
    post,
    path = "/api/v1/user/token/refresh/",
    tag = "user",
    request_body = RefreshRequest,
    responses(
        (status = 200, description = "New access token", body = AccessToken),
        (status = 401, description = "Invalid or expired refresh token")
    )
)]
#[instrument(skip_all)]
pub async fn refresh_token(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<RefreshRequest>,
) -> ApiResult<Json<AccessToken>> {
    match state.accounts.refresh_token(request).await {
        Ok(access) => Ok(Json(access)),
        Err(e) => {
            record_auth_failure(&state, &e);
            Err(e.into())
        }
    }
}

#[utoipa::path(
    post,
    path = "/api/v1/user/token/verify/",
    tag = "user",
    request_body = VerifyRequest,
    responses(
        (status = 200, description = "Token is valid"),
        (status = 401, description = "Invalid or expired token")
    )
)]
#[instrument(skip_all)]
pub async fn verify_token(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<VerifyRequest>,
) -> ApiResult<Json<Value>> {
    match state.accounts.verify_token(request).await {
        Ok(()) => Ok(Json(json!({}))),
        Err(e) => {
            record_auth_failure(&state, &e);
            Err(e.into())
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/user/me/",
    tag = "user",
    responses(
        (status = 200, description = "The caller", body = UserView),
        (status = 401, description = "Not authenticated")
    ),
    security(("jwt" = []))
)]
pub async fn get_me(State(state): State<AppState>, CurrentUser(user): CurrentUser) -> Json<UserView> {
    Json(state.accounts.me(&user))
}

#[utoipa::path(
    put,
    path = "/api/v1/user/me/",
    tag = "user",
    request_body = RegisterRequest,
    responses(
        (status = 200, description = "Profile updated", body = UserView),
        (status = 400, description = "Invalid email or password"),
        (status = 401, description = "Not authenticated")
    ),
    security(("jwt" = []))
)]
#[instrument(skip_all, fields(user_id = user.id))]
pub async fn update_me(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiJson(request): ApiJson<RegisterRequest>,
) -> ApiResult<Json<UserView>> {
    let patch = UserPatch {
        email: Some(request.email),
        password: Some(request.password),
    };
    Ok(Json(state.accounts.update_me(&user, patch).await?))
}

#[utoipa::path(
    patch,
    path = "/api/v1/user/me/",
    tag = "user",
    request_body = UserPatch,
    responses(
        (status = 200, description = "Profile updated", body = UserView),
        (status = 400, description = "Invalid email or password"),
        (status = 401, description = "Not authenticated")
    ),
    security(("jwt" = []))
)]
#[instrument(skip_all, fields(user_id = user.id))]
pub async fn patch_me(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiJson(patch): ApiJson<UserPatch>,
) -> ApiResult<Json<UserView>> {
    Ok(Json(state.accounts.update_me(&user, patch).await?))
}
