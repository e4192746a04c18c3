//! Registration, login, logout and session endpoints.
//!
//! Every successful login-like call answers with the public user and sets the
//! `auth-token` cookie; the token itself never appears in a response body.

use axum::{
    extract::{rejection::JsonRejection, Extension},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;
use utoipa::ToSchema;

use super::{parse_body, user_response, UserResponse};
use crate::{
    auth::{cookie, AuthService, Role},
    config::Config,
    errors::AppError,
};

#[derive(ToSchema, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub name: String,
}

#[derive(ToSchema, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub struct SessionResponse {
    pub sub: String,
    pub email: String,
    pub role: Role,
    pub exp: i64,
}

#[utoipa::path(
    post,
    path = "/v1/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created; session cookie set.", body = UserResponse),
        (status = 400, description = "Invalid input or email already registered."),
    ),
    tag = "auth"
)]
pub async fn register(
    auth: Extension<AuthService>,
    config: Extension<Arc<Config>>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<Response, AppError> {
    let request = parse_body(payload)?;
    let registration = auth
        .register_user(&request.email, &request.password, &request.name)
        .await?;

    let mut headers = HeaderMap::new();
    cookie::attach(&mut headers, &registration.token, config.is_production())?;

    Ok(user_response(StatusCode::CREATED, headers, registration.user))
}

#[utoipa::path(
    post,
    path = "/v1/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Credentials accepted; session cookie set.", body = UserResponse),
        (status = 401, description = "Invalid email or password."),
    ),
    tag = "auth"
)]
pub async fn login(
    auth: Extension<AuthService>,
    config: Extension<Arc<Config>>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Response, AppError> {
    let request = parse_body(payload)?;
    let user = auth
        .validate_credentials(&request.email, &request.password)
        .await?;
    let token = auth.generate_auth_token(&user)?;

    let mut headers = HeaderMap::new();
    cookie::attach(&mut headers, &token, config.is_production())?;

    Ok(user_response(StatusCode::OK, headers, user))
}

#[utoipa::path(
    post,
    path = "/v1/auth/logout",
    responses(
        (status = 204, description = "Session cookie cleared."),
    ),
    tag = "auth"
)]
pub async fn logout(config: Extension<Arc<Config>>) -> Result<Response, AppError> {
    let mut headers = HeaderMap::new();
    cookie::clear(&mut headers, config.is_production())?;
    Ok((StatusCode::NO_CONTENT, headers).into_response())
}

#[utoipa::path(
    get,
    path = "/v1/auth/session",
    responses(
        (status = 200, description = "Current session claims; cookie refreshed when close to expiry.", body = SessionResponse),
        (status = 401, description = "Missing, invalid or expired session cookie."),
    ),
    tag = "auth"
)]
pub async fn session(
    headers: HeaderMap,
    auth: Extension<AuthService>,
    config: Extension<Arc<Config>>,
) -> Result<Response, AppError> {
    let current = cookie::extract(cookie::cookie_header(&headers).as_deref())
        .ok_or_else(|| AppError::authentication(cookie::NO_TOKEN))?;
    let claims = auth.codec().verify(&current)?;

    let mut response_headers = HeaderMap::new();
    let claims = match auth.codec().renew(&claims)? {
        Some((renewed, renewed_claims)) => {
            debug!(user_id = %claims.sub, "Session token refreshed");
            cookie::attach(&mut response_headers, &renewed, config.is_production())?;
            renewed_claims
        }
        None => claims,
    };

    let body = SessionResponse {
        sub: claims.sub,
        email: claims.email,
        role: claims.role,
        exp: claims.exp,
    };
    Ok((StatusCode::OK, response_headers, Json(body)).into_response())
}
