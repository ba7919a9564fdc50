//! Domain Entities
//!
//! Core types and the repository traits that bound this service's view of
//! the wider platform.

mod admission;
mod chat_message;
mod membership;
mod presence;
mod user;

pub use admission::StreamAdmission;
pub use chat_message::{ChatMessage, MessageKind, MessageRepository};
pub use membership::{ChannelAccessRepository, MentorRepository};
pub use presence::PresenceEntry;
pub use user::UserRepository;

#[cfg(test)]
pub use admission::MockStreamAdmission;
#[cfg(test)]
pub use chat_message::MockMessageRepository;
#[cfg(test)]
pub use membership::{MockChannelAccessRepository, MockMentorRepository};
#[cfg(test)]
pub use user::MockUserRepository;
