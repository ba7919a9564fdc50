//! Application Services
//!
//! Business logic over the domain traits: the stream coordinator, the
//! presence wrapper, the unread counter, and the message write path.

mod message_service;
mod presence_service;
mod stream_service;
mod unread_service;

pub use message_service::{MessageService, MAX_BODY_CHARS};
pub use presence_service::PresenceService;
pub use stream_service::{StreamFrame, StreamService};
pub use unread_service::{UnreadService, UNREAD_CAP};
