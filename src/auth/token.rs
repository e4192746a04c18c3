//! HS256 identity tokens.
//!
//! Tokens are compact `header.claims.signature` strings, each segment
//! base64url without padding. The signature is HMAC-SHA256 over
//! `header.claims` keyed with `JWT_SECRET`.

use base64ct::{Base64UrlUnpadded, Encoding};
use chrono::Utc;
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::fmt;
use thiserror::Error;
use tracing::debug;

use super::models::Role;
use crate::errors::AppError;

/// Token validity window (7 days). The session cookie Max-Age is derived from it.
pub const TOKEN_TTL_SECONDS: i64 = 60 * 60 * 24 * 7;

/// Tokens with less than this much validity left are reissued on refresh.
pub const REFRESH_THRESHOLD_SECONDS: i64 = 60 * 60 * 24;

pub const MIN_SECRET_LEN: usize = 32;

pub const INVALID_TOKEN: &str = "Invalid or expired token";

const ALG: &str = "HS256";

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
struct TokenHeader {
    alg: String,
    typ: String,
}

impl TokenHeader {
    fn hs256() -> Self {
        Self {
            alg: ALG.to_string(),
            typ: "JWT".to_string(),
        }
    }
}

/// Identity carried by a token, before timestamps are stamped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenSubject {
    pub sub: String,
    pub email: String,
    pub role: Role,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TokenClaims {
    pub sub: String,
    pub email: String,
    pub role: Role,
    pub iat: i64,
    pub exp: i64,
}

impl TokenClaims {
    #[must_use]
    pub fn subject(&self) -> TokenSubject {
        TokenSubject {
            sub: self.sub.clone(),
            email: self.email.clone(),
            role: self.role,
        }
    }
}

/// Reasons a token is rejected. Callers only ever see `INVALID_TOKEN`; the
/// detail is logged at debug level.
#[derive(Debug, Error)]
enum TokenError {
    #[error("invalid token format")]
    Format,
    #[error("invalid base64url encoding")]
    Base64,
    #[error("invalid json")]
    Json(#[from] serde_json::Error),
    #[error("unsupported algorithm: {0}")]
    UnsupportedAlg(String),
    #[error("invalid signature")]
    InvalidSignature,
    #[error("token expired")]
    Expired,
}

fn b64e_json<T: Serialize>(value: &T) -> Result<String, serde_json::Error> {
    let json = serde_json::to_vec(value)?;
    Ok(Base64UrlUnpadded::encode_string(&json))
}

fn b64d_json<T: for<'de> Deserialize<'de>>(segment: &str) -> Result<T, TokenError> {
    let bytes = Base64UrlUnpadded::decode_vec(segment).map_err(|_| TokenError::Base64)?;
    Ok(serde_json::from_slice(&bytes)?)
}

/// Issues, verifies and refreshes identity tokens with a shared secret.
pub struct TokenCodec {
    secret: SecretString,
}

impl fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenCodec").field("secret", &"***").finish()
    }
}

impl TokenCodec {
    /// # Errors
    /// Returns an internal (configuration) error when the secret is shorter
    /// than `MIN_SECRET_LEN` bytes.
    pub fn new(secret: &SecretString) -> Result<Self, AppError> {
        let raw = secret.expose_secret();
        if raw.len() < MIN_SECRET_LEN {
            return Err(AppError::internal(format!(
                "JWT secret must be at least {MIN_SECRET_LEN} characters"
            )));
        }
        Ok(Self {
            secret: SecretString::from(raw.to_string()),
        })
    }

    fn mac(&self) -> Result<HmacSha256, AppError> {
        HmacSha256::new_from_slice(self.secret.expose_secret().as_bytes())
            .map_err(|_| AppError::internal("failed to initialize HMAC"))
    }

    /// Issue a token valid for `TOKEN_TTL_SECONDS` from now.
    ///
    /// # Errors
    /// Returns an internal error if the claims cannot be encoded.
    pub fn issue(&self, subject: &TokenSubject) -> Result<String, AppError> {
        self.issue_at(subject, Utc::now().timestamp())
    }

    /// Issue a token with `iat = now`.
    ///
    /// # Errors
    /// Returns an internal error if the claims cannot be encoded.
    pub fn issue_at(&self, subject: &TokenSubject, now: i64) -> Result<String, AppError> {
        self.encode(&stamp(subject, now))
    }

    fn encode(&self, claims: &TokenClaims) -> Result<String, AppError> {
        let encode = |err: serde_json::Error| AppError::internal(format!("token encoding: {err}"));
        let header_b64 = b64e_json(&TokenHeader::hs256()).map_err(encode)?;
        let claims_b64 = b64e_json(claims).map_err(encode)?;
        let signing_input = format!("{header_b64}.{claims_b64}");

        let mut mac = self.mac()?;
        mac.update(signing_input.as_bytes());
        let signature = mac.finalize().into_bytes();
        let signature_b64 = Base64UrlUnpadded::encode_string(&signature);

        Ok(format!("{signing_input}.{signature_b64}"))
    }

    /// # Errors
    /// Returns `AppError::Authentication` for any malformed, forged or expired token.
    pub fn verify(&self, token: &str) -> Result<TokenClaims, AppError> {
        self.verify_at(token, Utc::now().timestamp())
    }

    /// Verify signature and expiry against `now`, then return the claims.
    ///
    /// # Errors
    /// Returns `AppError::Authentication` for any malformed, forged or expired token.
    pub fn verify_at(&self, token: &str, now: i64) -> Result<TokenClaims, AppError> {
        match self.decode(token, now) {
            Ok(claims) => Ok(claims),
            Err(DecodeError::Rejected(reason)) => {
                debug!("Token rejected: {reason}");
                Err(AppError::authentication(INVALID_TOKEN))
            }
            Err(DecodeError::Internal(err)) => Err(err),
        }
    }

    fn decode(&self, token: &str, now: i64) -> Result<TokenClaims, DecodeError> {
        let mut parts = token.split('.');
        let header_b64 = parts.next().ok_or(TokenError::Format)?;
        let claims_b64 = parts.next().ok_or(TokenError::Format)?;
        let sig_b64 = parts.next().ok_or(TokenError::Format)?;
        if parts.next().is_some() {
            return Err(TokenError::Format.into());
        }

        let header: TokenHeader = b64d_json(header_b64)?;
        if header.alg != ALG {
            return Err(TokenError::UnsupportedAlg(header.alg).into());
        }

        let signature = Base64UrlUnpadded::decode_vec(sig_b64).map_err(|_| TokenError::Base64)?;
        let mut mac = self.mac().map_err(DecodeError::Internal)?;
        mac.update(header_b64.as_bytes());
        mac.update(b".");
        mac.update(claims_b64.as_bytes());
        mac.verify_slice(&signature)
            .map_err(|_| TokenError::InvalidSignature)?;

        // Only now is the payload trusted enough to parse.
        let claims: TokenClaims = b64d_json(claims_b64)?;
        if claims.exp <= now {
            return Err(TokenError::Expired.into());
        }

        Ok(claims)
    }

    /// Sliding expiry: reissue when less than a day of validity is left,
    /// otherwise hand back the same token.
    ///
    /// # Errors
    /// Returns `AppError::Authentication` if the token does not verify.
    pub fn refresh(&self, token: &str) -> Result<String, AppError> {
        self.refresh_at(token, Utc::now().timestamp())
    }

    /// # Errors
    /// Returns `AppError::Authentication` if the token does not verify.
    pub fn refresh_at(&self, token: &str, now: i64) -> Result<String, AppError> {
        let claims = self.verify_at(token, now)?;
        match self.renew_at(&claims, now)? {
            Some((renewed, _)) => Ok(renewed),
            None => Ok(token.to_string()),
        }
    }

    /// Reissue already verified claims when they are inside the refresh
    /// window. Returns the new token with its claims, or `None` when the
    /// current token is still fresh.
    ///
    /// # Errors
    /// Returns an internal error if the claims cannot be encoded.
    pub fn renew(&self, claims: &TokenClaims) -> Result<Option<(String, TokenClaims)>, AppError> {
        self.renew_at(claims, Utc::now().timestamp())
    }

    /// # Errors
    /// Returns an internal error if the claims cannot be encoded.
    pub fn renew_at(
        &self,
        claims: &TokenClaims,
        now: i64,
    ) -> Result<Option<(String, TokenClaims)>, AppError> {
        if claims.exp - now >= REFRESH_THRESHOLD_SECONDS {
            return Ok(None);
        }
        let renewed = stamp(&claims.subject(), now);
        let token = self.encode(&renewed)?;
        Ok(Some((token, renewed)))
    }
}

fn stamp(subject: &TokenSubject, now: i64) -> TokenClaims {
    TokenClaims {
        sub: subject.sub.clone(),
        email: subject.email.clone(),
        role: subject.role,
        iat: now,
        exp: now + TOKEN_TTL_SECONDS,
    }
}

enum DecodeError {
    Rejected(TokenError),
    Internal(AppError),
}

impl From<TokenError> for DecodeError {
    fn from(err: TokenError) -> Self {
        Self::Rejected(err)
    }
}
