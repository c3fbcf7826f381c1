//! Ports - trait definitions for external dependencies.
//! These are the "interfaces" that infrastructure must implement.

mod auth;
mod media;
mod repository;

pub use auth::{AuthError, PasswordService, TokenClaims, TokenService};
pub use media::{MediaError, MediaStorage, UploadRequest};
pub use repository::{BaseRepository, PostRepository, TagRepository, UserRepository};
