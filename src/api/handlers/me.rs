//! Authenticated self-service endpoints.

use axum::{
    extract::{rejection::JsonRejection, Extension},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use std::sync::Arc;
use utoipa::ToSchema;

use super::{parse_body, require_auth, user_response, UserResponse};
use crate::{
    auth::{cookie, AuthService, ProfileUpdate},
    config::Config,
    errors::AppError,
};

#[derive(ToSchema, Deserialize, Debug)]
#[serde(deny_unknown_fields)]
pub struct ProfileUpdateRequest {
    pub name: Option<String>,
    pub email: Option<String>,
}

#[derive(ToSchema, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PasswordChangeRequest {
    pub current_password: String,
    pub new_password: String,
}

#[utoipa::path(
    get,
    path = "/v1/me",
    responses(
        (status = 200, description = "Return the authenticated user profile.", body = UserResponse),
        (status = 401, description = "Missing or invalid session cookie."),
        (status = 404, description = "The account no longer exists."),
    ),
    tag = "me"
)]
pub async fn get_me(headers: HeaderMap, auth: Extension<AuthService>) -> Result<Response, AppError> {
    let claims = require_auth(&headers, auth.codec())?;
    let user = auth.get_user(&claims.sub).await?;
    Ok(user_response(StatusCode::OK, HeaderMap::new(), user))
}

#[utoipa::path(
    put,
    path = "/v1/me",
    request_body = ProfileUpdateRequest,
    responses(
        (status = 200, description = "Profile updated; cookie reissued when the email changed.", body = UserResponse),
        (status = 400, description = "Invalid update or email already in use."),
        (status = 401, description = "Missing or invalid session cookie."),
    ),
    tag = "me"
)]
pub async fn update_me(
    headers: HeaderMap,
    auth: Extension<AuthService>,
    config: Extension<Arc<Config>>,
    payload: Result<Json<ProfileUpdateRequest>, JsonRejection>,
) -> Result<Response, AppError> {
    let claims = require_auth(&headers, auth.codec())?;
    let request = parse_body(payload)?;

    let user = auth
        .update_profile(
            &claims.sub,
            ProfileUpdate {
                name: request.name,
                email: request.email,
            },
        )
        .await?;

    // The token carries the email, so a changed address needs a new one.
    let mut response_headers = HeaderMap::new();
    if user.email != claims.email {
        let token = auth.generate_auth_token(&user)?;
        cookie::attach(&mut response_headers, &token, config.is_production())?;
    }

    Ok(user_response(StatusCode::OK, response_headers, user))
}

#[utoipa::path(
    put,
    path = "/v1/me/password",
    request_body = PasswordChangeRequest,
    responses(
        (status = 204, description = "Password changed."),
        (status = 400, description = "New password does not meet the rules."),
        (status = 401, description = "Missing session or wrong current password."),
    ),
    tag = "me"
)]
pub async fn update_password(
    headers: HeaderMap,
    auth: Extension<AuthService>,
    payload: Result<Json<PasswordChangeRequest>, JsonRejection>,
) -> Result<Response, AppError> {
    let claims = require_auth(&headers, auth.codec())?;
    let request = parse_body(payload)?;

    auth.update_password(&claims.sub, &request.current_password, &request.new_password)
        .await?;

    Ok(StatusCode::NO_CONTENT.into_response())
}
