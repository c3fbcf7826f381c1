use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::error::DomainError;

/// User entity - represents a registered author.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub full_name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Create a new user with generated ID and timestamps.
    pub fn new(full_name: String, email: String, password_hash: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            full_name,
            email,
            password_hash,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn summary(&self) -> UserSummary {
        UserSummary {
            id: self.id,
            full_name: self.full_name.clone(),
            email: self.email.clone(),
            created_at: self.created_at,
        }
    }
}

/// Public view of a user. Never carries the password hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSummary {
    pub id: Uuid,
    pub full_name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

/// Validated registration input.
#[derive(Debug, Clone, Validate)]
pub struct Registration {
    #[validate(length(min = 3, max = 100, message = "full_name must be between 3 and 100 characters"))]
    pub full_name: String,
    #[validate(email(message = "email must be a valid address"))]
    pub email: String,
    #[validate(length(min = 8, message = "password must be at least 8 characters"))]
    pub password: String,
}

impl Registration {
    pub fn parse(full_name: &str, email: &str, password: &str) -> Result<Self, DomainError> {
        let registration = Self {
            full_name: full_name.trim().to_string(),
            email: email.trim().to_string(),
            password: password.to_string(),
        };
        registration.validate()?;
        Ok(registration)
    }
}

/// Mask an email for logging (`j***@example.com`).
pub fn mask_email(email: &str) -> String {
    match email.find('@') {
        Some(at_pos) => {
            let (local, domain) = email.split_at(at_pos);
            let masked_local = match local.chars().next() {
                Some(first) if local.chars().count() > 1 => format!("{first}***"),
                _ => "***".to_string(),
            };
            format!("{masked_local}{domain}")
        }
        None => "***".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registration_rejects_short_fields() {
        assert!(Registration::parse("Al", "al@example.com", "password1").is_err());
        assert!(Registration::parse("Alice", "alice@example.com", "short").is_err());
        assert!(Registration::parse("Alice", "not-an-email", "password1").is_err());
    }

    #[test]
    fn test_registration_trims_name_and_email() {
        let reg = Registration::parse("  Alice  ", " alice@example.com ", "password1").unwrap();
        assert_eq!(reg.full_name, "Alice");
        assert_eq!(reg.email, "alice@example.com");
    }

    #[test]
    fn test_registration_email_shapes() {
        assert!(Registration::parse("Alice", "a@b.co", "password1").is_ok());
        for email in ["@b.co", "a@@b.co", "a b@c.co", "plain"] {
            assert!(
                matches!(
                    Registration::parse("Alice", email, "password1"),
                    Err(DomainError::Validation(msg)) if msg == "email must be a valid address"
                ),
                "{email} accepted"
            );
        }
    }

    #[test]
    fn test_registration_name_counts_characters() {
        assert!(Registration::parse("Zoë", "z@b.co", "password1").is_ok());
        assert!(Registration::parse(&"é".repeat(101), "z@b.co", "password1").is_err());
    }

    #[test]
    fn test_mask_email() {
        assert_eq!(mask_email("jane@example.com"), "j***@example.com");
        assert_eq!(mask_email("j@example.com"), "***@example.com");
        assert_eq!(mask_email("nope"), "***");
    }

    #[test]
    fn test_password_hash_not_serialized() {
        let user = User::new("Alice".into(), "a@b.co".into(), "secret-hash".into());
        let json = serde_json::to_string(&user).unwrap();
        assert!(!json.contains("secret-hash"));
    }
}
