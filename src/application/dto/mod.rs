//! Data Transfer Objects
//!
//! Request validation and response wire shapes.

pub mod request;
pub mod response;

pub use request::SendMessageRequest;
pub use response::{
    MessageResponse, PresenceResponse, PresenceUserDto, StreamMessageDto, UnreadResponse,
};
