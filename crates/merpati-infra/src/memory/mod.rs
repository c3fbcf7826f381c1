//! In-memory repositories - used as fallback when PostgreSQL is unavailable
//! and in tests. Data is lost on process restart.

mod posts;
mod store;
mod tags;
mod users;

pub use posts::InMemoryPostRepository;
pub use store::MemoryStore;
pub use tags::InMemoryTagRepository;
pub use users::InMemoryUserRepository;

#[cfg(test)]
mod tests;
