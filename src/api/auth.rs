//! Authentication endpoints

use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    error::AppResult,
    models::user::{AccountInfo, Portal, RegisterLibrarian, RegisterPatron},
    AppState,
};

use super::{ApiJson, AuthenticatedUser};

/// Login request
#[derive(Deserialize, ToSchema)]
pub struct LoginRequest {
    /// Account email (case-insensitive)
    pub identifier: String,
    pub password: String,
    /// Portal the caller signs in from
    pub portal: Option<Portal>,
    /// Required with the librarian portal
    pub access_code: Option<String>,
}

/// Login response
#[derive(Serialize, ToSchema)]
pub struct LoginResponse {
    pub token: String,
    pub token_type: String,
    /// Token lifetime in seconds
    pub expires_in: i64,
    pub account: AccountInfo,
}

#[derive(Serialize, ToSchema)]
pub struct LogoutResponse {
    pub detail: String,
}

/// Login and get a JWT token
#[utoipa::path(
    post,
    path = "/auth/login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = LoginResponse),
        (status = 400, description = "Missing identifier or password", body = crate::error::ErrorResponse),
        (status = 401, description = "Invalid credentials", body = crate::error::ErrorResponse),
        (status = 403, description = "Portal not allowed for this account", body = crate::error::ErrorResponse)
    )
)]
pub async fn login(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<LoginRequest>,
) -> AppResult<Json<LoginResponse>> {
    let session = state
        .services
        .auth
        .login(
            &request.identifier,
            &request.password,
            request.portal,
            request.access_code.as_deref(),
        )
        .await?;

    Ok(Json(LoginResponse {
        token: session.token,
        token_type: "Bearer".to_string(),
        expires_in: session.expires_in,
        account: session.account,
    }))
}

/// Create a patron account and its member record
#[utoipa::path(
    post,
    path = "/auth/register",
    tag = "auth",
    request_body = RegisterPatron,
    responses(
        (status = 201, description = "Account created", body = AccountInfo),
        (status = 400, description = "Invalid input or email already used", body = crate::error::ErrorResponse),
        (status = 403, description = "Wrong portal", body = crate::error::ErrorResponse)
    )
)]
pub async fn register(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<RegisterPatron>,
) -> AppResult<(StatusCode, Json<AccountInfo>)> {
    let account = state.services.auth.register(request).await?;
    Ok((StatusCode::CREATED, Json(account)))
}

/// Create a librarian account (requires the access code)
#[utoipa::path(
    post,
    path = "/auth/register-librarian",
    tag = "auth",
    request_body = RegisterLibrarian,
    responses(
        (status = 201, description = "Account created", body = AccountInfo),
        (status = 400, description = "Invalid input or email already used", body = crate::error::ErrorResponse),
        (status = 403, description = "Incorrect access code", body = crate::error::ErrorResponse)
    )
)]
pub async fn register_librarian(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<RegisterLibrarian>,
) -> AppResult<(StatusCode, Json<AccountInfo>)> {
    let account = state.services.auth.register_librarian(request).await?;
    Ok((StatusCode::CREATED, Json(account)))
}

/// Revoke the current token
#[utoipa::path(
    post,
    path = "/auth/logout",
    tag = "auth",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Logged out", body = LogoutResponse),
        (status = 401, description = "Not authenticated", body = crate::error::ErrorResponse)
    )
)]
pub async fn logout(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<LogoutResponse>> {
    state.services.auth.logout(&claims).await?;
    Ok(Json(LogoutResponse {
        detail: "Logged out".to_string(),
    }))
}

/// Get current account information
#[utoipa::path(
    get,
    path = "/auth/me",
    tag = "auth",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Current account", body = AccountInfo),
        (status = 401, description = "Not authenticated", body = crate::error::ErrorResponse)
    )
)]
pub async fn me(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> AppResult<Json<AccountInfo>> {
    let account = state.services.auth.me(&user.caller()).await?;
    Ok(Json(account))
}
