//! Repository Implementations
//!
//! PostgreSQL-backed implementations of the domain repository traits.

mod membership_repository;
mod message_repository;
mod user_repository;

pub use membership_repository::{PgChannelAccessRepository, PgMentorRepository};
pub use message_repository::PgMessageRepository;
pub use user_repository::PgUserRepository;
