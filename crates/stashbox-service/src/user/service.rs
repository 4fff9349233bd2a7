//! Identity store operations.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, warn};
use uuid::Uuid;
use validator::{Validate, ValidationErrors};

use stashbox_auth::{IssuedToken, JwtDecoder, JwtEncoder, PasswordHasher, PasswordValidator};
use stashbox_core::error::AppError;
use stashbox_core::result::AppResult;
use stashbox_database::store::{Stores, UserStore};
use stashbox_entity::analytics::UserActionType;
use stashbox_entity::user::{CreateUser, User};

use crate::analytics::AnalyticsRecorder;
use crate::context::{ClientInfo, RequestContext};

/// Same message for unknown email and wrong password.
const BAD_CREDENTIALS: &str = "Invalid email or password";

/// Registration form.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 1, max = 100, message = "Name is required"))]
    pub name: String,
    #[validate(email(message = "Email address is not valid"))]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
    pub confirm_password: String,
}

/// A successful login.
#[derive(Debug, Clone, Serialize)]
pub struct LoginResponse {
    pub user: User,
    #[serde(flatten)]
    pub token: IssuedToken,
}

/// Registers, authenticates and manages user credentials.
#[derive(Clone)]
pub struct IdentityService {
    users: Arc<dyn UserStore>,
    hasher: Arc<PasswordHasher>,
    validator: PasswordValidator,
    encoder: JwtEncoder,
    decoder: JwtDecoder,
    recorder: AnalyticsRecorder,
}

impl std::fmt::Debug for IdentityService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentityService").finish()
    }
}

fn validation_message(errors: &ValidationErrors) -> String {
    let mut messages: Vec<String> = errors
        .field_errors()
        .into_iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |e| match e.message {
                Some(ref message) => message.to_string(),
                None => format!("{field} is invalid"),
            })
        })
        .collect();
    messages.sort();
    messages.join("; ")
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

impl IdentityService {
    /// Creates a new identity service.
    pub fn new(
        stores: &Stores,
        hasher: Arc<PasswordHasher>,
        validator: PasswordValidator,
        encoder: JwtEncoder,
        decoder: JwtDecoder,
        recorder: AnalyticsRecorder,
    ) -> Self {
        Self {
            users: stores.users.clone(),
            hasher,
            validator,
            encoder,
            decoder,
            recorder,
        }
    }

    /// Creates an account. A taken email is a `Conflict`.
    pub async fn register(&self, mut req: RegisterRequest) -> AppResult<User> {
        req.name = req.name.trim().to_string();
        req.email = normalize_email(&req.email);
        req.validate()
            .map_err(|e| AppError::validation(validation_message(&e)))?;
        self.validator.validate(&req.password, &req.confirm_password)?;

        if self.users.find_by_email(&req.email).await?.is_some() {
            return Err(AppError::conflict("An account with this email already exists"));
        }

        let user = self
            .users
            .create(&CreateUser {
                name: req.name,
                email: req.email,
                password_hash: self.hasher.hash_password(&req.password)?,
            })
            .await?;

        self.recorder
            .record_user_action(user.id, UserActionType::Register, None);
        info!(user_id = %user.id, "User registered");
        Ok(user)
    }

    /// Verifies credentials and issues an access token.
    pub async fn login(
        &self,
        email: &str,
        password: &str,
        client: &ClientInfo,
    ) -> AppResult<LoginResponse> {
        let email = normalize_email(email);
        let Some(user) = self.users.find_by_email(&email).await? else {
            warn!("Login attempt for unknown email");
            return Err(AppError::authentication(BAD_CREDENTIALS));
        };
        if !self.hasher.verify_password(password, &user.password_hash)? {
            warn!(user_id = %user.id, "Login attempt with wrong password");
            return Err(AppError::authentication(BAD_CREDENTIALS));
        }

        let token = self.encoder.issue(&user)?;
        self.recorder.record_user_action(
            user.id,
            UserActionType::Login,
            client
                .ip_address
                .as_ref()
                .map(|ip| json!({ "ip_address": ip })),
        );
        info!(user_id = %user.id, "User logged in");
        Ok(LoginResponse { user, token })
    }

    /// Validates a bearer token and returns the user it was issued to.
    pub fn authenticate(&self, token: &str) -> AppResult<Uuid> {
        self.decoder.decode(token).map(|claims| claims.user_id())
    }

    /// The caller's own account.
    pub async fn current_user(&self, ctx: &RequestContext) -> AppResult<User> {
        self.users
            .find_by_id(ctx.user_id)
            .await?
            .ok_or_else(|| AppError::authentication("Account no longer exists"))
    }

    /// Replaces the caller's password after checking the current one.
    pub async fn change_password(
        &self,
        ctx: &RequestContext,
        current: &str,
        new_password: &str,
        confirmation: &str,
    ) -> AppResult<()> {
        let user = self.current_user(ctx).await?;
        if !self.hasher.verify_password(current, &user.password_hash)? {
            return Err(AppError::validation("Current password is incorrect"));
        }
        self.validator.validate(new_password, confirmation)?;

        let hash = self.hasher.hash_password(new_password)?;
        if !self.users.update_password(user.id, &hash).await? {
            return Err(AppError::authentication("Account no longer exists"));
        }

        self.recorder
            .record_user_action(user.id, UserActionType::PasswordChange, None);
        info!(user_id = %user.id, "Password changed");
        Ok(())
    }
}
