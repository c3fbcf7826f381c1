//! Application services - the operations the API surface exposes, written
//! purely against ports.

mod credentials;
mod posts;

pub use credentials::{CredentialService, SessionToken};
pub use posts::PostService;
