//! Authentication and authorization ports.

use uuid::Uuid;

/// Claims carried by a session token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenClaims {
    pub user_id: Uuid,
    pub email: String,
    pub full_name: String,
    pub exp: i64,
}

/// Token service trait for signed session tokens.
pub trait TokenService: Send + Sync {
    /// Issue a token for a user.
    fn generate_token(&self, user_id: Uuid, email: &str, full_name: &str)
    -> Result<String, AuthError>;

    /// Validate and decode a token.
    fn validate_token(&self, token: &str) -> Result<TokenClaims, AuthError>;

    /// Lifetime of freshly issued tokens, in seconds.
    fn expiration_seconds(&self) -> i64;
}

/// Password hashing service.
pub trait PasswordService: Send + Sync {
    /// Hash a plain text password.
    fn hash(&self, password: &str) -> Result<String, AuthError>;

    /// Verify a password against a hash.
    fn verify(&self, password: &str, hash: &str) -> Result<bool, AuthError>;
}

/// Authentication errors.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("token expired")]
    TokenExpired,

    #[error("invalid token: {0}")]
    InvalidToken(String),

    #[error("missing authorization header")]
    MissingAuth,

    #[error("invalid format")]
    InvalidFormat,

    #[error("hashing error: {0}")]
    HashingError(String),
}

impl From<AuthError> for crate::error::DomainError {
    fn from(err: AuthError) -> Self {
        use crate::error::DomainError;

        match err {
            AuthError::InvalidCredentials => DomainError::Unauthorized(err.to_string()),
            AuthError::MissingAuth => DomainError::Unauthorized(err.to_string()),
            AuthError::InvalidFormat => DomainError::Unauthorized(err.to_string()),
            AuthError::TokenExpired | AuthError::InvalidToken(_) => {
                DomainError::Unauthorized("invalid or expired token".to_string())
            }
            AuthError::HashingError(msg) => DomainError::Internal(msg),
        }
    }
}
