//! Session cookie handling for the identity token.

use axum::http::{
    HeaderMap, HeaderValue,
    header::{COOKIE, SET_COOKIE},
};

use super::token::{TokenClaims, TokenCodec, TOKEN_TTL_SECONDS};
use crate::errors::AppError;

pub const AUTH_COOKIE_NAME: &str = "auth-token";

pub const NO_TOKEN: &str = "No authentication token found";

/// Cookie lifetime matches the token validity window.
pub const COOKIE_MAX_AGE_SECONDS: i64 = TOKEN_TTL_SECONDS;

fn build_cookie(value: &str, max_age: i64, secure: bool) -> Result<HeaderValue, AppError> {
    let mut cookie =
        format!("{AUTH_COOKIE_NAME}={value}; Path=/; HttpOnly; SameSite=Lax; Max-Age={max_age}");
    // Browsers drop Secure cookies on plain http, so only production sets it.
    if secure {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie)
        .map_err(|err| AppError::internal(format!("invalid cookie header: {err}")))
}

/// Append a `Set-Cookie` carrying the token.
///
/// # Errors
/// Returns an internal error if the token contains characters not allowed in a header.
pub fn attach(headers: &mut HeaderMap, token: &str, secure: bool) -> Result<(), AppError> {
    headers.append(SET_COOKIE, build_cookie(token, COOKIE_MAX_AGE_SECONDS, secure)?);
    Ok(())
}

/// Append a `Set-Cookie` that expires the session cookie immediately.
///
/// # Errors
/// Returns an internal error if the header cannot be built.
pub fn clear(headers: &mut HeaderMap, secure: bool) -> Result<(), AppError> {
    headers.append(SET_COOKIE, build_cookie("", 0, secure)?);
    Ok(())
}

/// Parse a raw `Cookie` header and return the first non-empty token, `None`
/// when absent.
#[must_use]
pub fn extract(cookie_header: Option<&str>) -> Option<String> {
    let header = cookie_header?;
    for pair in header.split(';') {
        let mut parts = pair.trim().splitn(2, '=');
        let Some(key) = parts.next() else {
            continue;
        };
        if key.trim() != AUTH_COOKIE_NAME {
            continue;
        }
        let value = parts.next().unwrap_or_default().trim().trim_matches('"');
        if value.is_empty() {
            continue;
        }
        return Some(value.to_string());
    }
    None
}

/// Collect every `Cookie` header of a request into one string.
#[must_use]
pub fn cookie_header(headers: &HeaderMap) -> Option<String> {
    let joined = headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .collect::<Vec<_>>()
        .join("; ");
    if joined.is_empty() { None } else { Some(joined) }
}

/// Extract the token and verify it.
///
/// # Errors
/// `AppError::Authentication` with `NO_TOKEN` when the cookie is missing, or
/// the token codec's error when verification fails.
pub fn validate(cookie_header: Option<&str>, codec: &TokenCodec) -> Result<TokenClaims, AppError> {
    let token = extract(cookie_header).ok_or_else(|| AppError::authentication(NO_TOKEN))?;
    codec.verify(&token)
}
