//! Credential checks, registration and account updates.
//!
//! The service keeps no state of its own: every call reads and writes through
//! the injected `UserStore` and signs tokens with the shared `TokenCodec`.
//! Lookup-then-write sequences are not transactional; the store's unique email
//! constraint is what ultimately rejects a concurrent duplicate.

use std::sync::Arc;
use tracing::{debug, info, instrument};

use super::{
    models::{NewUser, PublicUser, Role, UserUpdate},
    password::{hash_password_blocking, verify_password_blocking},
    store::{email_in_use, UserStore},
    token::{TokenCodec, TokenSubject},
};
use crate::{
    errors::AppError,
    shared::validation::{
        normalize_email, validate_password, validate_profile_update, validate_registration,
        FieldErrors,
    },
};

pub const INVALID_CREDENTIALS: &str = "Invalid email or password";
pub const EMAIL_REGISTERED: &str = "Email already registered";
pub const INVALID_CURRENT_PASSWORD: &str = "Invalid current password";

// Verified against when the email is unknown so both failure paths cost one Argon2 run.
const DUMMY_PASSWORD_HASH: &str = "$argon2id$v=19$m=19456,t=2,p=1$c29tZXNhbHRzb21lc2FsdA$AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Registration {
    pub user: PublicUser,
    pub token: String,
}

#[derive(Clone)]
pub struct AuthService {
    store: Arc<dyn UserStore>,
    codec: Arc<TokenCodec>,
}

impl AuthService {
    #[must_use]
    pub fn new(store: Arc<dyn UserStore>, codec: Arc<TokenCodec>) -> Self {
        Self { store, codec }
    }

    #[must_use]
    pub fn codec(&self) -> &TokenCodec {
        &self.codec
    }

    /// Check an email/password pair.
    ///
    /// Unknown email and wrong password fail with the same message.
    ///
    /// # Errors
    /// `AppError::Authentication(INVALID_CREDENTIALS)` on mismatch; store errors otherwise.
    #[instrument(skip(self, password))]
    pub async fn validate_credentials(
        &self,
        email: &str,
        password: &str,
    ) -> Result<PublicUser, AppError> {
        let Some(user) = self.store.find_by_email(email).await? else {
            let _ = verify_password_blocking(password.to_string(), DUMMY_PASSWORD_HASH.to_string())
                .await;
            debug!("Login for unknown email");
            return Err(AppError::authentication(INVALID_CREDENTIALS));
        };

        if !verify_password_blocking(password.to_string(), user.password_hash.clone()).await? {
            debug!(user_id = %user.id, "Login with wrong password");
            return Err(AppError::authentication(INVALID_CREDENTIALS));
        }

        Ok(user.to_public())
    }

    /// # Errors
    /// `NotFound("User")` when the id is unknown.
    pub async fn get_user(&self, user_id: &str) -> Result<PublicUser, AppError> {
        self.store
            .find_by_id(user_id)
            .await?
            .map(|user| user.to_public())
            .ok_or_else(|| AppError::not_found("User"))
    }

    /// # Errors
    /// Returns an internal error if the token cannot be signed.
    pub fn generate_auth_token(&self, user: &PublicUser) -> Result<String, AppError> {
        self.codec.issue(&TokenSubject {
            sub: user.id.clone(),
            email: user.email.clone(),
            role: user.role,
        })
    }

    /// Create an account with role `user` and return it with a fresh token.
    ///
    /// Creation and token issuance are separate steps: a retry after a crash in
    /// between sees `EMAIL_REGISTERED` and has to log in instead.
    ///
    /// # Errors
    /// `AppError::Validation` for bad input or a taken email.
    #[instrument(skip(self, password, name))]
    pub async fn register_user(
        &self,
        email: &str,
        password: &str,
        name: &str,
    ) -> Result<Registration, AppError> {
        let email = normalize_email(email);
        validate_registration(&email, password, name)?;

        if self.store.find_by_email(&email).await?.is_some() {
            return Err(AppError::field(EMAIL_REGISTERED, "email", EMAIL_REGISTERED));
        }

        let password_hash = hash_password_blocking(password.to_string()).await?;
        let record = self
            .store
            .create(NewUser {
                email,
                password_hash,
                name: name.trim().to_string(),
                role: Role::User,
            })
            .await?;

        let user = record.to_public();
        let token = self.generate_auth_token(&user)?;
        info!(user_id = %user.id, "User registered");

        Ok(Registration { user, token })
    }

    /// Replace the password after checking the current one.
    ///
    /// Tokens issued before the change stay valid until they expire.
    ///
    /// # Errors
    /// `NotFound` for an unknown user, `Authentication(INVALID_CURRENT_PASSWORD)`
    /// on mismatch, `Validation` when the new password is too weak. Nothing is
    /// written in any of those cases.
    #[instrument(skip(self, current_password, new_password))]
    pub async fn update_password(
        &self,
        user_id: &str,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), AppError> {
        let user = self
            .store
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::not_found("User"))?;

        if !verify_password_blocking(current_password.to_string(), user.password_hash.clone())
            .await?
        {
            return Err(AppError::authentication(INVALID_CURRENT_PASSWORD));
        }

        let mut errors = FieldErrors::new();
        errors.extend("newPassword", validate_password(new_password));
        errors.into_result("Invalid password")?;

        let password_hash = hash_password_blocking(new_password.to_string()).await?;
        self.store
            .update(user_id, UserUpdate::password_hash(password_hash))
            .await?;
        info!(user_id = %user_id, "Password updated");

        Ok(())
    }

    /// Change name and/or email.
    ///
    /// # Errors
    /// `NotFound` for an unknown user, `Validation` for bad input or an email
    /// owned by someone else.
    #[instrument(skip(self))]
    pub async fn update_profile(
        &self,
        user_id: &str,
        update: ProfileUpdate,
    ) -> Result<PublicUser, AppError> {
        let user = self
            .store
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::not_found("User"))?;

        let email = update.email.as_deref().map(normalize_email);
        validate_profile_update(update.name.as_deref(), email.as_deref())?;

        let email = email.filter(|email| *email != user.email);
        if let Some(email) = &email {
            if let Some(owner) = self.store.find_by_email(email).await? {
                if owner.id != user.id {
                    return Err(email_in_use());
                }
            }
        }

        let changes = UserUpdate {
            email,
            name: update.name,
            ..UserUpdate::default()
        };
        if changes.is_empty() {
            return Ok(user.to_public());
        }

        let updated = self.store.update(user_id, changes).await?;
        Ok(updated.to_public())
    }
}
