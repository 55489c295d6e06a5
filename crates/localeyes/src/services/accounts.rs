use std::sync::Arc;

use chrono::Utc;
use localeyes_auth::AuthState;
use localeyes_core::auth::{hash_password, verify_password, AuthError};
use localeyes_core::social::{
    derive_tag, dwelling_years, generate_user_id, is_reserved_email, is_reserved_username,
    LoginRequest, Notification, OtpRequest, ResetPasswordRequest, SignupRequest,
    UpdateProfileRequest, User,
};
use localeyes_core::storage::RepositoryError;

use super::error::{Result, ServiceError};
use crate::mailer::OtpMailer;
use crate::repositories::{OtpRepository, PostRepository, UserRepository};

/// Runs Argon2 work on the blocking pool.
async fn blocking<T, F>(work: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> std::result::Result<T, AuthError> + Send + 'static,
{
    let result = tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| AuthError::PasswordHash(e.to_string()))?;
    Ok(result?)
}

async fn hash(password: &str) -> Result<String> {
    let password = password.to_string();
    blocking(move || hash_password(&password)).await
}

async fn verify(password: &str, stored: &str) -> Result<bool> {
    let (password, stored) = (password.to_string(), stored.to_string());
    blocking(move || verify_password(&password, &stored)).await
}

/// Account lifecycle: signup, login, profile and password recovery.
#[derive(Clone)]
pub struct AccountService {
    users: UserRepository,
    posts: PostRepository,
    otps: OtpRepository,
    mailer: Arc<dyn OtpMailer>,
    auth: AuthState,
}

impl AccountService {
    pub fn new(
        users: UserRepository,
        posts: PostRepository,
        otps: OtpRepository,
        mailer: Arc<dyn OtpMailer>,
        auth: AuthState,
    ) -> Self {
        Self {
            users,
            posts,
            otps,
            mailer,
            auth,
        }
    }

    /// Registers a new user.
    ///
    /// Uniqueness is checked up front to report which field is taken; the
    /// conditional create catches a concurrent signup with the same values.
    pub async fn signup(&self, request: SignupRequest) -> Result<User> {
        request.validate()?;
        if is_reserved_username(&request.username)
            || self.auth.is_admin_username(&request.username)
        {
            return Err(ServiceError::ReservedUsername);
        }
        if is_reserved_email(&request.email) {
            return Err(ServiceError::ReservedEmail);
        }
        if self.users.email_exists(&request.email).await? {
            return Err(ServiceError::EmailTaken);
        }
        if self.users.username_exists(&request.username).await? {
            return Err(ServiceError::UsernameTaken);
        }

        let years = request.living_since.as_ref().map(dwelling_years).unwrap_or(0.0);
        let user = User {
            id: generate_user_id(),
            email: request.email,
            username: request.username,
            password_hash: hash(&request.password).await?,
            city: request.city,
            dwelling_age: years,
            is_active: true,
            tag: derive_tag(years),
        };

        self.users.create(&user).await.map_err(|e| match e {
            RepositoryError::AlreadyExists {
                entity_type: "Email",
                ..
            } => ServiceError::EmailTaken,
            RepositoryError::AlreadyExists {
                entity_type: "Username",
                ..
            } => ServiceError::UsernameTaken,
            other => ServiceError::Repository(other),
        })?;

        Ok(user)
    }

    /// Checks the credentials and issues a bearer token.
    ///
    /// An inactive account is reported as such before the password is
    /// looked at.
    pub async fn login(&self, request: LoginRequest) -> Result<String> {
        request.validate()?;

        let user = match self.users.fetch_by_username(&request.username).await {
            Ok(user) => user,
            Err(RepositoryError::NotFound { .. }) => return Err(ServiceError::InvalidCredentials),
            Err(e) => return Err(e.into()),
        };
        if !user.is_active {
            tracing::warn!(username = %user.username, "Login attempt on inactive account");
            return Err(ServiceError::Inactive);
        }
        if !verify(&request.password, &user.password_hash).await? {
            return Err(ServiceError::InvalidCredentials);
        }

        let token = self.auth.issue_token(&user.username, &user.id)?;
        tracing::info!(user_id = %user.id, "User logged in");
        Ok(token)
    }

    /// The caller's own, active account.
    pub async fn profile(&self, user_id: &str) -> Result<User> {
        self.users
            .fetch_by_id(user_id, true)
            .await
            .map_err(ServiceError::user)
    }

    /// Any account, active or not.
    pub async fn get_user(&self, user_id: &str) -> Result<User> {
        self.users.find_by_id(user_id).await.map_err(ServiceError::user)
    }

    /// Updates password, city and living-since of the caller's own profile.
    pub async fn update_profile(
        &self,
        caller_id: &str,
        user_id: &str,
        request: UpdateProfileRequest,
    ) -> Result<User> {
        if caller_id != user_id {
            return Err(ServiceError::Forbidden);
        }
        let living_since = request.validate()?;

        let mut user = self.profile(user_id).await?;
        let years = dwelling_years(&living_since);
        user.password_hash = hash(&request.password).await?;
        user.city = request.city;
        user.dwelling_age = years;
        user.tag = derive_tag(years);

        self.users.update(&user).await.map_err(ServiceError::user)?;
        Ok(user)
    }

    pub async fn deactivate(&self, user_id: &str) -> Result<()> {
        let user = self.profile(user_id).await?;
        self.users
            .set_active_status(&user, false)
            .await
            .map_err(ServiceError::user)
    }

    /// Recent posts by other users.
    pub async fn notifications(&self, user_id: &str) -> Result<Vec<Notification>> {
        Ok(self.posts.notifications(user_id, Utc::now()).await?)
    }

    /// Generates a reset code for a registered email and mails it.
    pub async fn send_otp(&self, request: OtpRequest) -> Result<()> {
        request.validate()?;
        self.registered(&request.email).await?;

        let code = self.otps.generate();
        self.otps.save(&request.email, &code, Utc::now()).await?;
        self.mailer.send_otp(&request.email, &code).await?;
        Ok(())
    }

    /// Replaces the password of the account owning `email` when the code
    /// matches. The code can only be used once.
    pub async fn reset_password(&self, request: ResetPasswordRequest) -> Result<()> {
        request.validate()?;

        match self
            .otps
            .validate(&request.email, &request.otp, Utc::now())
            .await
        {
            Ok(_) => {}
            Err(RepositoryError::NotFound { .. }) => return Err(ServiceError::WrongOtp),
            Err(e) => return Err(e.into()),
        }

        let mut user = self.registered(&request.email).await?;
        user.password_hash = hash(&request.new_password).await?;
        self.users.update(&user).await.map_err(ServiceError::user)?;
        self.otps.consume(&request.email, &request.otp).await?;

        tracing::info!(user_id = %user.id, "Password reset");
        Ok(())
    }

    async fn registered(&self, email: &str) -> Result<User> {
        match self.users.fetch_by_email(email).await {
            Ok(user) => Ok(user),
            Err(RepositoryError::NotFound { .. }) => Err(ServiceError::UnknownEmail),
            Err(e) => Err(e.into()),
        }
    }
}
