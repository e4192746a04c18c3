pub mod auth;
pub mod health;
pub mod me;

use axum::{
    extract::rejection::JsonRejection,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    auth::{
        cookie::{self, cookie_header},
        PublicUser, TokenClaims, TokenCodec,
    },
    errors::AppError,
};

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct UserResponse {
    pub user: PublicUser,
}

/// Unwrap a JSON body, reporting a malformed one as a validation error.
pub(crate) fn parse_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    payload.map(|Json(body)| body).map_err(|rejection| {
        AppError::field("Invalid request body", "body", &rejection.body_text())
    })
}

/// Verify the session cookie and return its claims.
pub(crate) fn require_auth(headers: &HeaderMap, codec: &TokenCodec) -> Result<TokenClaims, AppError> {
    cookie::validate(cookie_header(headers).as_deref(), codec)
}

/// `{user}` body with a status and any `Set-Cookie` headers.
pub(crate) fn user_response(status: StatusCode, headers: HeaderMap, user: PublicUser) -> Response {
    (status, headers, Json(UserResponse { user })).into_response()
}
