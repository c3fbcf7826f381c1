//! # Merpati Infrastructure
//!
//! Concrete implementations of the ports defined in `merpati-core`.
//! This crate contains the database, authentication and media integrations.
//!
//! ## Feature Flags
//!
//! - `full` (default) - All features enabled
//! - `minimal` - No external dependencies, in-memory only
//! - `postgres` - PostgreSQL database support via SeaORM
//! - `auth` - JWT + Argon2 authentication
//! - `media` - Cloudinary image upload

pub mod database;
pub mod memory;

#[cfg(feature = "auth")]
pub mod auth;

#[cfg(feature = "media")]
pub mod media;

// Re-exports - In-Memory
pub use memory::{
    InMemoryPostRepository, InMemoryTagRepository, InMemoryUserRepository, MemoryStore,
};

pub use database::DatabaseConfig;

// Re-exports - PostgreSQL
#[cfg(feature = "postgres")]
pub use database::{
    DatabaseConnections, PostgresPostRepository, PostgresTagRepository, PostgresUserRepository,
};

#[cfg(feature = "auth")]
pub use auth::{Argon2PasswordService, JwtConfig, JwtTokenService};

#[cfg(feature = "media")]
pub use media::{CloudinaryConfig, CloudinaryStorage};
