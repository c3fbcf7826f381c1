//! Registration, login and token validation.

use std::sync::Arc;

use validator::ValidateEmail;

use crate::domain::{Registration, User, UserSummary, mask_email};
use crate::error::{DomainError, RepoError};
use crate::ports::{AuthError, PasswordService, TokenClaims, TokenService, UserRepository};

/// Hashed once at construction so unknown-email logins still pay for a
/// full password verification.
const TIMING_DUMMY_PASSWORD: &str = "merpati-timing-dummy-password";

/// A freshly issued session token.
#[derive(Debug, Clone)]
pub struct SessionToken {
    pub token: String,
    pub expires_in: i64,
}

/// Credential service: password hashing plus session token issuance.
pub struct CredentialService {
    users: Arc<dyn UserRepository>,
    passwords: Arc<dyn PasswordService>,
    tokens: Arc<dyn TokenService>,
    dummy_hash: String,
}

impl CredentialService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        passwords: Arc<dyn PasswordService>,
        tokens: Arc<dyn TokenService>,
    ) -> Result<Self, AuthError> {
        let dummy_hash = passwords.hash(TIMING_DUMMY_PASSWORD)?;
        Ok(Self {
            users,
            passwords,
            tokens,
            dummy_hash,
        })
    }

    /// Register a new user and return its public summary.
    pub async fn register(
        &self,
        full_name: &str,
        email: &str,
        password: &str,
    ) -> Result<UserSummary, DomainError> {
        let registration = Registration::parse(full_name, email, password)?;

        if self
            .users
            .find_by_email(&registration.email)
            .await?
            .is_some()
        {
            return Err(DomainError::Conflict("email already exists".to_string()));
        }

        let password_hash = self.passwords.hash(&registration.password)?;
        let user = User::new(registration.full_name, registration.email, password_hash);

        let saved = self.users.insert(user).await.map_err(|e| match e {
            RepoError::Constraint(_) => DomainError::Conflict("email already exists".to_string()),
            other => other.into(),
        })?;

        tracing::info!(user_id = %saved.id, email = %mask_email(&saved.email), "User registered");
        Ok(saved.summary())
    }

    /// Exchange credentials for a session token.
    ///
    /// Unknown email and wrong password produce the same error.
    pub async fn login(&self, email: &str, password: &str) -> Result<SessionToken, DomainError> {
        let email = email.trim();
        if !email.validate_email() {
            return Err(DomainError::validation("email must be a valid address"));
        }
        if password.is_empty() {
            return Err(DomainError::validation("password is required"));
        }

        let user = self.users.find_by_email(email).await?;

        let (valid, user) = match user {
            Some(user) => (self.passwords.verify(password, &user.password_hash)?, Some(user)),
            None => {
                // Result ignored; only the cost matters.
                let _ = self.passwords.verify(password, &self.dummy_hash);
                (false, None)
            }
        };

        let user = match (valid, user) {
            (true, Some(user)) => user,
            _ => {
                tracing::debug!(email = %mask_email(email), "Login rejected");
                return Err(AuthError::InvalidCredentials.into());
            }
        };

        let token = self
            .tokens
            .generate_token(user.id, &user.email, &user.full_name)
            .map_err(|e| DomainError::Internal(format!("failed to generate token: {e}")))?;

        Ok(SessionToken {
            token,
            expires_in: self.tokens.expiration_seconds(),
        })
    }

    /// Stateless token verification.
    pub fn validate_token(&self, token: &str) -> Result<TokenClaims, AuthError> {
        self.tokens.validate_token(token)
    }
}
